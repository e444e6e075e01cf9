use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::grid::point_grid;
use crate::loader::LoadedPair;
use crate::params::Parameters;
use crate::types::Antialiasing;

use super::bloom::{BloomChain, SCENE_FORMAT};
use super::context::GpuContext;
use super::pipeline::{PipelineLayouts, PointPipeline};
use super::textures::{linear_sampler, PairTextures};
use super::uniforms::CloudUniforms;

/// Which end of the transition blend a pair occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PairSlot {
    /// Sampled as `color1`/`depth1`; shown when `transition` is 0.
    Front,
    /// Sampled as `color2`/`depth2`; shown when `transition` is 1.
    Back,
}

pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    point_pipeline: PointPipeline,
    bloom: BloomChain,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: CloudUniforms,

    pair_sampler: wgpu::Sampler,
    fallback: PairTextures,
    front: Option<PairTextures>,
    back: Option<PairTextures>,
    pair_bind_group: wgpu::BindGroup,

    instance_buffer: wgpu::Buffer,
    instance_count: u32,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
        params: &Parameters,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, antialiasing)?;
        let layouts = PipelineLayouts::new(&context.device);
        let point_pipeline = PointPipeline::new(
            &context.device,
            &layouts,
            SCENE_FORMAT,
            context.sample_count,
        )
        .context("failed to build the point pipeline")?;
        let bloom = BloomChain::new(
            &context.device,
            &layouts,
            context.surface_format,
            context.size,
            context.sample_count,
        )
        .context("failed to build the bloom chain")?;

        let uniforms = CloudUniforms::new(context.size.width, context.size.height, params);
        let uniform_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cloud uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("cloud uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let pair_sampler = linear_sampler(&context.device, "pair sampler");
        let fallback = PairTextures::fallback(&context.device, &context.queue);
        let pair_bind_group = build_pair_bind_group(
            &context.device,
            &layouts,
            &pair_sampler,
            &fallback,
            None,
            None,
        );

        let (instance_buffer, instance_count) =
            build_instance_buffer(&context.device, params.resolution());

        Ok(Self {
            context,
            layouts,
            point_pipeline,
            bloom,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            pair_sampler,
            fallback,
            front: None,
            back: None,
            pair_bind_group,
            instance_buffer,
            instance_count,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.bloom
            .resize(&self.context.device, &self.layouts, new_size);
        self.uniforms
            .set_resolution(new_size.width as f32, new_size.height as f32);
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    /// Replaces the instance buffer after a resolution change. The old
    /// grid is discarded wholesale rather than patched.
    pub(crate) fn rebuild_grid(&mut self, resolution: u32) {
        let (buffer, count) = build_instance_buffer(&self.context.device, resolution);
        self.instance_buffer = buffer;
        self.instance_count = count;
        tracing::debug!(resolution, points = count, "rebuilt point grid");
    }

    /// Uploads a decoded pair into the given slot; `None` rebinds the
    /// neutral fallback there.
    pub(crate) fn bind_pair(&mut self, slot: PairSlot, pair: Option<&LoadedPair>) {
        let textures = pair.map(|loaded| {
            PairTextures::from_images(
                &self.context.device,
                &self.context.queue,
                &loaded.color,
                &loaded.depth,
                &format!("slide {}", loaded.slide),
            )
        });
        match slot {
            PairSlot::Front => self.front = textures,
            PairSlot::Back => self.back = textures,
        }
        self.pair_bind_group = build_pair_bind_group(
            &self.context.device,
            &self.layouts,
            &self.pair_sampler,
            &self.fallback,
            self.front.as_ref(),
            self.back.as_ref(),
        );
    }

    /// Renders one frame. The uniform block is written exactly once
    /// per frame, here, from the values passed in.
    pub(crate) fn render(
        &mut self,
        params: &Parameters,
        time: f32,
        pointer: [f32; 2],
        intro: f32,
        transition: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.uniforms.apply_params(params);
        self.uniforms.set_frame(time, pointer, intro, transition);
        self.context.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("point cloud pass"),
                color_attachments: &[Some(self.bloom.scene_attachment())],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.point_pipeline.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, &self.pair_bind_group, &[]);
            pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            pass.draw(0..4, 0..self.instance_count);
        }

        self.bloom
            .encode(&mut encoder, &self.context.queue, &surface_view, params);

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn build_instance_buffer(device: &wgpu::Device, resolution: u32) -> (wgpu::Buffer, u32) {
    let grid = point_grid(resolution);
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("point grid instances"),
        contents: bytemuck::cast_slice(&grid),
        usage: wgpu::BufferUsages::VERTEX,
    });
    (buffer, grid.len() as u32)
}

fn build_pair_bind_group(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    sampler: &wgpu::Sampler,
    fallback: &PairTextures,
    front: Option<&PairTextures>,
    back: Option<&PairTextures>,
) -> wgpu::BindGroup {
    let front = front.unwrap_or(fallback);
    let back = back.unwrap_or(fallback);
    let views = [
        &front.color_view,
        &front.depth_view,
        &back.color_view,
        &back.depth_view,
    ];
    let mut entries = Vec::with_capacity(8);
    for (index, view) in views.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2,
            resource: wgpu::BindingResource::TextureView(view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2 + 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
    }
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("pair bind group"),
        layout: &layouts.pair_layout,
        entries: &entries,
    })
}
