//! The parameter surface: every named, independently adjustable shader
//! input, with range/step metadata for external controls. The driver
//! and configuration are the only writers; the GPU side only reads a
//! snapshot per frame.

/// Legal range and step granularity for one parameter, consumed by
/// external control panels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamRange {
    const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

pub const RESOLUTION_RANGE: ParamRange = ParamRange::new(2.0, 1024.0, 1.0);
pub const POINT_SIZE_RANGE: ParamRange = ParamRange::new(1.0, 10.0, 0.1);
pub const DEPTH_SCALE_RANGE: ParamRange = ParamRange::new(0.0, 1.0, 0.01);
pub const NOISE_AMOUNT_RANGE: ParamRange = ParamRange::new(0.0, 0.02, 0.001);
pub const NOISE_SPEED_RANGE: ParamRange = ParamRange::new(0.0, 2.0, 0.05);
pub const NOISE_SCALE_RANGE: ParamRange = ParamRange::new(0.0, 8.0, 0.1);
pub const ROTATE_STRENGTH_RANGE: ParamRange = ParamRange::new(0.0, 1.0, 0.01);
pub const BLOOM_INTENSITY_RANGE: ParamRange = ParamRange::new(0.0, 3.0, 0.05);
pub const BLOOM_THRESHOLD_RANGE: ParamRange = ParamRange::new(0.0, 1.0, 0.01);
pub const BLOOM_SMOOTHING_RANGE: ParamRange = ParamRange::new(0.0, 1.0, 0.01);

/// Live parameter values. Everything except `resolution` is applied to
/// the existing geometry on the next frame; changing `resolution` is
/// the one mutation that invalidates the point grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    resolution: u32,
    pub point_size: f32,
    pub depth_scale: f32,
    pub noise_amount: f32,
    pub noise_speed: f32,
    pub noise_scale: f32,
    pub rotate_strength: f32,
    pub bloom_intensity: f32,
    pub bloom_threshold: f32,
    pub bloom_smoothing: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            resolution: 434,
            point_size: 4.5,
            depth_scale: 0.25,
            noise_amount: 0.0,
            noise_speed: 0.25,
            noise_scale: 3.0,
            rotate_strength: 0.12,
            bloom_intensity: 0.8,
            bloom_threshold: 0.2,
            bloom_smoothing: 0.9,
        }
    }
}

impl Parameters {
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Sets the grid resolution, clamped to [`RESOLUTION_RANGE`].
    /// Returns `true` when the value actually changed, which is the
    /// signal that the point grid must be rebuilt from scratch.
    #[must_use = "a true result means the point grid must be rebuilt"]
    pub fn set_resolution(&mut self, resolution: u32) -> bool {
        let clamped = RESOLUTION_RANGE.clamp(resolution as f32) as u32;
        if clamped == self.resolution {
            return false;
        }
        self.resolution = clamped;
        true
    }

    pub fn set_point_size(&mut self, value: f32) {
        self.point_size = POINT_SIZE_RANGE.clamp(value);
    }

    pub fn set_depth_scale(&mut self, value: f32) {
        self.depth_scale = DEPTH_SCALE_RANGE.clamp(value);
    }

    pub fn set_noise_amount(&mut self, value: f32) {
        self.noise_amount = NOISE_AMOUNT_RANGE.clamp(value);
    }

    pub fn set_noise_speed(&mut self, value: f32) {
        self.noise_speed = NOISE_SPEED_RANGE.clamp(value);
    }

    pub fn set_noise_scale(&mut self, value: f32) {
        self.noise_scale = NOISE_SCALE_RANGE.clamp(value);
    }

    pub fn set_rotate_strength(&mut self, value: f32) {
        self.rotate_strength = ROTATE_STRENGTH_RANGE.clamp(value);
    }

    pub fn set_bloom_intensity(&mut self, value: f32) {
        self.bloom_intensity = BLOOM_INTENSITY_RANGE.clamp(value);
    }

    pub fn set_bloom_threshold(&mut self, value: f32) {
        self.bloom_threshold = BLOOM_THRESHOLD_RANGE.clamp(value);
    }

    pub fn set_bloom_smoothing(&mut self, value: f32) {
        self.bloom_smoothing = BLOOM_SMOOTHING_RANGE.clamp(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_resolution_is_clamped_before_the_grid() {
        let mut params = Parameters::default();
        assert!(params.set_resolution(0));
        assert_eq!(params.resolution(), 2);
        assert!(params.set_resolution(1_000_000));
        assert_eq!(params.resolution(), 1024);
    }

    #[test]
    fn only_resolution_reports_a_rebuild() {
        let mut params = Parameters::default();
        assert!(params.set_resolution(128));
        // Same value again: grid already matches, no rebuild.
        assert!(!params.set_resolution(128));
        params.set_point_size(9.0);
        params.set_depth_scale(0.5);
        assert_eq!(params.resolution(), 128);
    }

    #[test]
    fn live_values_clamp_to_their_ranges() {
        let mut params = Parameters::default();
        params.set_point_size(99.0);
        assert_eq!(params.point_size, POINT_SIZE_RANGE.max);
        params.set_noise_amount(-1.0);
        assert_eq!(params.noise_amount, 0.0);
        params.set_bloom_intensity(100.0);
        assert_eq!(params.bloom_intensity, BLOOM_INTENSITY_RANGE.max);
    }

    #[test]
    fn defaults_sit_inside_their_ranges() {
        let params = Parameters::default();
        for (value, range) in [
            (params.point_size, POINT_SIZE_RANGE),
            (params.depth_scale, DEPTH_SCALE_RANGE),
            (params.noise_amount, NOISE_AMOUNT_RANGE),
            (params.noise_speed, NOISE_SPEED_RANGE),
            (params.noise_scale, NOISE_SCALE_RANGE),
            (params.rotate_strength, ROTATE_STRENGTH_RANGE),
            (params.bloom_intensity, BLOOM_INTENSITY_RANGE),
            (params.bloom_threshold, BLOOM_THRESHOLD_RANGE),
            (params.bloom_smoothing, BLOOM_SMOOTHING_RANGE),
        ] {
            assert_eq!(range.clamp(value), value);
        }
        assert_eq!(
            RESOLUTION_RANGE.clamp(params.resolution() as f32) as u32,
            params.resolution()
        );
    }
}
