//! Point cloud renderer: turns a deck of color+depth image pairs into
//! an animated 3D particle field.
//!
//! The overall flow is:
//!
//! ```text
//!   CLI / driftcloud
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ frame tick
//!          │                                 │
//!          │                       AnimationDriver / PairLoader
//!          │                                 ▼
//!          └────────────────────────▶ GpuState::render()
//! ```
//!
//! `GpuState` owns every GPU resource (surface, pipelines, textures,
//! the point grid instance buffer); the event loop owns the animation
//! driver, the pointer filter, and the background pair loader, and
//! pushes one uniform snapshot per frame.

mod compile;
mod gpu;

pub mod anim;
pub mod displace;
pub mod grid;
pub mod loader;
pub mod noise;
pub mod params;
pub mod runtime;
pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::anim::{AnimationDriver, PointerFilter};
use crate::gpu::{GpuState, PairSlot};
use crate::loader::{PairLoader, PairOutcome};
use crate::params::Parameters;
use crate::runtime::{SystemTimeSource, TimeSource};

pub use crate::types::{Antialiasing, PairSource, RendererConfig};

/// Thin entry point: validates the config and drives the window event
/// loop.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn run(self) -> Result<()> {
        if self.config.pairs.is_empty() {
            bail!("no slide pairs configured");
        }
        if self.config.initial_slide >= self.config.pairs.len() {
            bail!(
                "initial slide {} out of range ({} slides)",
                self.config.initial_slide,
                self.config.pairs.len()
            );
        }
        run_windowed(self.config)
    }
}

/// Converts a cursor position in physical pixels to the normalized
/// [-1, 1] pointer space the displacement kernel expects, y up.
fn pointer_ndc(position: PhysicalPosition<f64>, size: PhysicalSize<u32>) -> [f32; 2] {
    let width = size.width.max(1) as f64;
    let height = size.height.max(1) as f64;
    [
        ((position.x / width) * 2.0 - 1.0) as f32,
        -((position.y / height) * 2.0 - 1.0) as f32,
    ]
}

/// Live parameter adjustments on the keyboard. Returns `true` when the
/// grid resolution changed, which obliges the caller to rebuild the
/// instance buffer.
fn apply_param_key(key: &Key, params: &mut Parameters) -> bool {
    let Key::Character(value) = key else {
        return false;
    };
    match value.as_str() {
        "+" | "=" => params.set_resolution(params.resolution().saturating_add(32)),
        "-" => params.set_resolution(params.resolution().saturating_sub(32)),
        "]" => {
            params.set_point_size(params.point_size + params::POINT_SIZE_RANGE.step);
            false
        }
        "[" => {
            params.set_point_size(params.point_size - params::POINT_SIZE_RANGE.step);
            false
        }
        "." => {
            params.set_noise_amount(params.noise_amount + params::NOISE_AMOUNT_RANGE.step);
            false
        }
        "," => {
            params.set_noise_amount(params.noise_amount - params::NOISE_AMOUNT_RANGE.step);
            false
        }
        _ => false,
    }
}

/// Maps a pressed key to a navigation target within `slide_count`.
fn navigation_target(key: &Key, current: usize, slide_count: usize) -> Option<usize> {
    match key {
        Key::Named(NamedKey::ArrowRight) | Key::Named(NamedKey::Space) => {
            Some((current + 1) % slide_count)
        }
        Key::Named(NamedKey::ArrowLeft) => Some((current + slide_count - 1) % slide_count),
        Key::Character(value) => {
            let digit = value.as_str().parse::<usize>().ok()?;
            if digit >= 1 && digit <= slide_count {
                Some(digit - 1)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn run_windowed(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title("driftcloud")
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut params = config.params.clone();
    let mut gpu = GpuState::new(
        window.as_ref(),
        window_size,
        config.antialiasing,
        &params,
    )
    .context("failed to initialise GPU state")?;

    let mut time_source = SystemTimeSource::new();
    let mut driver = AnimationDriver::new();
    let mut pointer_filter = PointerFilter::new();
    let mut pointer_raw = [0.0f32; 2];
    let mut loader = PairLoader::new();
    let mut current_slide = config.initial_slide;
    // External transition blend between the two texture slots; both
    // slots carry the same pair here, so it stays at rest.
    let transition = 0.0f32;

    let frame_budget = config
        .target_fps
        .filter(|fps| *fps > 0.0)
        .map(|fps| Duration::from_secs_f32(1.0 / fps));
    let mut last_frame = Instant::now();

    tracing::info!(
        slides = config.pairs.len(),
        initial = current_slide,
        "starting point cloud renderer"
    );
    loader.request(current_slide, config.pairs[current_slide].clone());
    window.request_redraw();

    let pairs = config.pairs.clone();
    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                elwt.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if matches!(logical_key, Key::Named(NamedKey::Escape)) {
                    elwt.exit();
                    return;
                }
                if let Some(target) = navigation_target(&logical_key, current_slide, pairs.len()) {
                    if driver.request_leave(target, current_slide, Instant::now()) {
                        tracing::debug!(from = current_slide, to = target, "navigation accepted");
                    }
                } else if apply_param_key(&logical_key, &mut params) {
                    gpu.rebuild_grid(params.resolution());
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                pointer_raw = pointer_ndc(position, gpu.size());
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let _ = inner_size_writer.request_inner_size(gpu.size());
            }
            WindowEvent::RedrawRequested => {
                let sample = time_source.sample();

                match loader.poll() {
                    Some(PairOutcome::Loaded(pair)) => {
                        gpu.bind_pair(PairSlot::Front, Some(&pair));
                        gpu.bind_pair(PairSlot::Back, Some(&pair));
                        driver.begin_intro(sample.instant);
                    }
                    Some(PairOutcome::Failed { .. }) => {
                        gpu.bind_pair(PairSlot::Front, None);
                        gpu.bind_pair(PairSlot::Back, None);
                        driver.begin_intro(sample.instant);
                    }
                    None => {}
                }

                if let Some(target) = driver.tick(sample.instant) {
                    current_slide = target;
                    loader.request(target, pairs[target].clone());
                    tracing::debug!(slide = target, "outro complete, loading next pair");
                }

                pointer_filter.tick(pointer_raw);

                match gpu.render(
                    &params,
                    sample.seconds,
                    pointer_filter.get(),
                    driver.intro(),
                    transition,
                ) {
                    Ok(()) => {
                        last_frame = sample.instant;
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu.resize(gpu.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("surface out of memory; exiting");
                        elwt.exit();
                    }
                    Err(err) => {
                        tracing::warn!(error = ?err, "surface error; retrying next frame");
                    }
                }
            }
            _ => {}
        },
        Event::AboutToWait => match frame_budget {
            Some(budget) => {
                let deadline = last_frame + budget;
                let now = Instant::now();
                if now >= deadline {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
            }
            None => {
                window.request_redraw();
            }
        },
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
