use bytemuck::{Pod, Zeroable};

use crate::params::Parameters;

/// CPU mirror of the `CloudParams` uniform block in the vertex shader.
/// Field order and padding are std140; any change here must be made in
/// `compile.rs` as well.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct CloudUniforms {
    pub resolution: [f32; 4],
    pub pointer: [f32; 2],
    pub time: f32,
    pub intro: f32,
    pub transition: f32,
    pub point_size: f32,
    pub depth_scale: f32,
    pub noise_amount: f32,
    pub noise_speed: f32,
    pub noise_scale: f32,
    pub rotate_strength: f32,
    pub _pad0: f32,
}

unsafe impl Zeroable for CloudUniforms {}
unsafe impl Pod for CloudUniforms {}

impl CloudUniforms {
    pub fn new(width: u32, height: u32, params: &Parameters) -> Self {
        let mut uniforms = Self {
            resolution: [width as f32, height as f32, 0.0, 0.0],
            pointer: [0.0, 0.0],
            time: 0.0,
            intro: 0.0,
            transition: 0.0,
            point_size: 0.0,
            depth_scale: 0.0,
            noise_amount: 0.0,
            noise_speed: 0.0,
            noise_scale: 0.0,
            rotate_strength: 0.0,
            _pad0: 0.0,
        };
        uniforms.apply_params(params);
        uniforms
    }

    pub fn set_resolution(&mut self, width: f32, height: f32) {
        self.resolution[0] = width;
        self.resolution[1] = height;
    }

    /// Copies the live parameter surface in. Called once per frame so
    /// parameter mutations between frames coalesce into a single push.
    pub fn apply_params(&mut self, params: &Parameters) {
        self.point_size = params.point_size;
        self.depth_scale = params.depth_scale;
        self.noise_amount = params.noise_amount;
        self.noise_speed = params.noise_speed;
        self.noise_scale = params.noise_scale;
        self.rotate_strength = params.rotate_strength;
    }

    pub fn set_frame(&mut self, time: f32, pointer: [f32; 2], intro: f32, transition: f32) {
        self.time = time;
        self.pointer = pointer;
        self.intro = intro;
        self.transition = transition;
    }
}

/// Small per-pass uniform used by the bloom stages; `params` meaning
/// differs per pass (threshold/knee, blur step, intensity).
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct PassUniforms {
    pub params: [f32; 4],
}

unsafe impl Zeroable for PassUniforms {}
unsafe impl Pod for PassUniforms {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_matches_std140_size() {
        // vec4 + (vec2, float, float) + 4 floats + 4 floats = 64 bytes.
        assert_eq!(std::mem::size_of::<CloudUniforms>(), 64);
        assert_eq!(std::mem::size_of::<PassUniforms>(), 16);
    }

    #[test]
    fn apply_params_copies_the_live_surface() {
        let mut params = Parameters::default();
        params.set_noise_amount(0.01);
        params.set_rotate_strength(0.5);
        let uniforms = CloudUniforms::new(800, 600, &params);
        assert_eq!(uniforms.noise_amount, 0.01);
        assert_eq!(uniforms.rotate_strength, 0.5);
        assert_eq!(uniforms.resolution[0], 800.0);
    }
}
