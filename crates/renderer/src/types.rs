use std::path::PathBuf;

use crate::params::Parameters;

/// One slide's texture pair on disk. The color image supplies the
/// per-point tint; the depth image's red channel supplies z.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairSource {
    pub color: PathBuf,
    pub depth: PathBuf,
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl Default for Antialiasing {
    fn default() -> Self {
        Self::Off
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and the loaded deck: which pairs
/// exist, which one to show first, the window size, and the initial
/// parameter values.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Every pair in the deck, in display order.
    pub pairs: Vec<PairSource>,
    /// Index into `pairs` to reveal first.
    pub initial_slide: usize,
    /// Optional FPS cap; None = render every callback.
    pub target_fps: Option<f32>,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// Starting values for the live parameter surface.
    pub params: Parameters,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            pairs: Vec::new(),
            initial_slide: 0,
            target_fps: None,
            antialiasing: Antialiasing::default(),
            params: Parameters::default(),
        }
    }
}
