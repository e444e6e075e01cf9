use anyhow::Result;
use winit::dpi::PhysicalSize;

use crate::compile::{BLOOM_BLUR_GLSL, BLOOM_COMPOSITE_GLSL, BLOOM_THRESHOLD_GLSL};
use crate::params::Parameters;

use super::pipeline::{build_post_pipeline, PipelineLayouts};
use super::textures::linear_sampler;
use super::uniforms::PassUniforms;

/// Internal format for the offscreen scene and the blur intermediates.
/// Additive point accumulation can exceed 1.0, so the chain needs
/// headroom the swapchain format does not have.
pub(crate) const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

fn render_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    sample_count: u32,
    label: &str,
) -> RenderTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: SCENE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    RenderTarget {
        _texture: texture,
        view,
    }
}

fn pass_uniform_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<PassUniforms>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Everything that depends on the surface size: the offscreen targets
/// and the bind groups that sample them. Replaced wholesale on resize.
struct BloomTargets {
    scene: RenderTarget,
    scene_msaa: Option<RenderTarget>,
    bright: RenderTarget,
    blur_pong: RenderTarget,
    half_size: (u32, u32),
    threshold_input: wgpu::BindGroup,
    blur_h_input: wgpu::BindGroup,
    blur_v_input: wgpu::BindGroup,
    composite_input: wgpu::BindGroup,
}

fn build_targets(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    sampler: &wgpu::Sampler,
    sample_count: u32,
    size: PhysicalSize<u32>,
) -> BloomTargets {
    let width = size.width.max(1);
    let height = size.height.max(1);
    let half = (width.div_ceil(2).max(1), height.div_ceil(2).max(1));

    let scene = render_target(device, width, height, 1, "bloom scene");
    let scene_msaa = (sample_count > 1)
        .then(|| render_target(device, width, height, sample_count, "bloom scene msaa"));
    let bright = render_target(device, half.0, half.1, 1, "bloom bright");
    let blur_pong = render_target(device, half.0, half.1, 1, "bloom pong");

    let single_input = |view: &wgpu::TextureView, label: &str| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.single_texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    };
    let threshold_input = single_input(&scene.view, "threshold input");
    let blur_h_input = single_input(&bright.view, "blur h input");
    let blur_v_input = single_input(&blur_pong.view, "blur v input");
    let composite_input = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("composite input"),
        layout: &layouts.composite_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&scene.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&bright.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    BloomTargets {
        scene,
        scene_msaa,
        bright,
        blur_pong,
        half_size: half,
        threshold_input,
        blur_h_input,
        blur_v_input,
        composite_input,
    }
}

/// Threshold, separable blur, composite. The cloud renders into the
/// chain's scene target; `encode` folds the highlights back over it and
/// writes the result to the swapchain view.
pub(crate) struct BloomChain {
    threshold_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,

    threshold_buffer: wgpu::Buffer,
    blur_h_buffer: wgpu::Buffer,
    blur_v_buffer: wgpu::Buffer,
    composite_buffer: wgpu::Buffer,
    threshold_uniform_group: wgpu::BindGroup,
    blur_h_uniform_group: wgpu::BindGroup,
    blur_v_uniform_group: wgpu::BindGroup,
    composite_uniform_group: wgpu::BindGroup,

    sampler: wgpu::Sampler,
    sample_count: u32,
    targets: BloomTargets,
}

impl BloomChain {
    pub fn new(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        surface_format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Result<Self> {
        let threshold_pipeline = build_post_pipeline(
            device,
            layouts,
            &layouts.single_texture_layout,
            BLOOM_THRESHOLD_GLSL,
            SCENE_FORMAT,
            "bloom threshold",
        )?;
        let blur_pipeline = build_post_pipeline(
            device,
            layouts,
            &layouts.single_texture_layout,
            BLOOM_BLUR_GLSL,
            SCENE_FORMAT,
            "bloom blur",
        )?;
        let composite_pipeline = build_post_pipeline(
            device,
            layouts,
            &layouts.composite_layout,
            BLOOM_COMPOSITE_GLSL,
            surface_format,
            "bloom composite",
        )?;

        let threshold_buffer = pass_uniform_buffer(device, "bloom threshold params");
        let blur_h_buffer = pass_uniform_buffer(device, "bloom blur h params");
        let blur_v_buffer = pass_uniform_buffer(device, "bloom blur v params");
        let composite_buffer = pass_uniform_buffer(device, "bloom composite params");

        let uniform_group = |buffer: &wgpu::Buffer, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };
        let threshold_uniform_group = uniform_group(&threshold_buffer, "threshold uniforms");
        let blur_h_uniform_group = uniform_group(&blur_h_buffer, "blur h uniforms");
        let blur_v_uniform_group = uniform_group(&blur_v_buffer, "blur v uniforms");
        let composite_uniform_group = uniform_group(&composite_buffer, "composite uniforms");

        let sampler = linear_sampler(device, "bloom sampler");
        let targets = build_targets(device, layouts, &sampler, sample_count, size);

        Ok(Self {
            threshold_pipeline,
            blur_pipeline,
            composite_pipeline,
            threshold_buffer,
            blur_h_buffer,
            blur_v_buffer,
            composite_buffer,
            threshold_uniform_group,
            blur_h_uniform_group,
            blur_v_uniform_group,
            composite_uniform_group,
            sampler,
            sample_count,
            targets,
        })
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        size: PhysicalSize<u32>,
    ) {
        self.targets = build_targets(device, layouts, &self.sampler, self.sample_count, size);
    }

    /// Color attachment the point pass should render into. With MSAA
    /// the multisampled target resolves straight into the scene
    /// texture.
    pub fn scene_attachment(&self) -> wgpu::RenderPassColorAttachment<'_> {
        let (view, resolve_target) = match &self.targets.scene_msaa {
            Some(msaa) => (&msaa.view, Some(&self.targets.scene.view)),
            None => (&self.targets.scene.view, None),
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }

    fn fullscreen_pass(
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        uniform_group: &wgpu::BindGroup,
        input_group: &wgpu::BindGroup,
        label: &str,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, uniform_group, &[]);
        pass.set_bind_group(1, input_group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Runs threshold, horizontal blur, vertical blur, composite, in
    /// that order, ending on the swapchain view.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        params: &Parameters,
    ) {
        let texel = (
            1.0 / self.targets.half_size.0 as f32,
            1.0 / self.targets.half_size.1 as f32,
        );
        queue.write_buffer(
            &self.threshold_buffer,
            0,
            bytemuck::bytes_of(&PassUniforms {
                params: [params.bloom_threshold, params.bloom_smoothing, 0.0, 0.0],
            }),
        );
        queue.write_buffer(
            &self.blur_h_buffer,
            0,
            bytemuck::bytes_of(&PassUniforms {
                params: [texel.0, 0.0, 0.0, 0.0],
            }),
        );
        queue.write_buffer(
            &self.blur_v_buffer,
            0,
            bytemuck::bytes_of(&PassUniforms {
                params: [0.0, texel.1, 0.0, 0.0],
            }),
        );
        queue.write_buffer(
            &self.composite_buffer,
            0,
            bytemuck::bytes_of(&PassUniforms {
                params: [params.bloom_intensity, 0.0, 0.0, 0.0],
            }),
        );

        Self::fullscreen_pass(
            encoder,
            &self.targets.bright.view,
            &self.threshold_pipeline,
            &self.threshold_uniform_group,
            &self.targets.threshold_input,
            "bloom threshold pass",
        );
        Self::fullscreen_pass(
            encoder,
            &self.targets.blur_pong.view,
            &self.blur_pipeline,
            &self.blur_h_uniform_group,
            &self.targets.blur_h_input,
            "bloom blur h pass",
        );
        Self::fullscreen_pass(
            encoder,
            &self.targets.bright.view,
            &self.blur_pipeline,
            &self.blur_v_uniform_group,
            &self.targets.blur_v_input,
            "bloom blur v pass",
        );
        Self::fullscreen_pass(
            encoder,
            surface_view,
            &self.composite_pipeline,
            &self.composite_uniform_group,
            &self.targets.composite_input,
            "bloom composite pass",
        );
    }
}
