//! Host-side mirror of the point displacement performed by the vertex
//! stage. The shader in [`crate::compile`] is the rendering authority;
//! these functions restate the same math so the kernel's contract can
//! be checked without a GPU. Constants here and in the GLSL must stay
//! in agreement.

use crate::noise::snoise;
use crate::params::Parameters;

/// Hash constants for the per-point transition window.
pub const TRANSITION_HASH: [f32; 3] = [12.9898, 78.233, 43758.5453];
/// Hash constants for the per-point intro window.
pub const INTRO_HASH: [f32; 3] = [45.233, 91.117, 23758.1234];
/// Width of each point's transition window within the global sweep.
pub const TRANSITION_SPREAD: f32 = 0.4;
/// Width of each point's intro window within the global sweep.
pub const INTRO_SPREAD: f32 = 0.7;

/// `fract(sin(dot(uv, (kx, ky))) * km)` — the classic UV hash the
/// shader uses to stagger per-point animation windows.
pub fn uv_hash(uv: [f32; 2], k: [f32; 3]) -> f32 {
    let value = (uv[0] * k[0] + uv[1] * k[1]).sin() * k[2];
    // GLSL fract: x - floor(x), always in [0, 1).
    value - value.floor()
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// A point's local animation factor given the global sweep value: the
/// point's own window is `[rand·(1-spread), rand·(1-spread)+spread]`,
/// smoothly interpolated. Staggering the windows turns a uniform
/// cross-fade into a wipe.
pub fn stagger_window(rand: f32, spread: f32, global: f32) -> f32 {
    let start = rand * (1.0 - spread);
    smoothstep(start, start + spread, global)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Result of displacing one grid point on the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacedPoint {
    pub position: [f32; 3],
    /// Point diameter in pixels before rasterization.
    pub pixel_size: f32,
    pub color: [f32; 3],
    /// Alpha factor carried to the sprite fragment stage.
    pub intro_alpha: f32,
}

/// Samples provided per point: the two texture pairs at this point's
/// texel, already fetched. Depth is the red channel in [0,1].
#[derive(Debug, Clone, Copy)]
pub struct PointSamples {
    pub depth1: f32,
    pub depth2: f32,
    pub color1: [f32; 3],
    pub color2: [f32; 3],
}

impl PointSamples {
    /// Both slots bound to the neutral fallback texture: mid-gray color
    /// and mid-gray depth, the state before any real pair has loaded.
    pub fn fallback() -> Self {
        Self {
            depth1: 0.5,
            depth2: 0.5,
            color1: [0.5; 3],
            color2: [0.5; 3],
        }
    }
}

/// Mirrors the vertex kernel for one grid point `position ∈ [0,1]²`.
///
/// Rotation order is load-bearing: yaw about the vertical axis by
/// `pointer.x · rotate_strength` first, then pitch about the horizontal
/// axis by `-pointer.y · rotate_strength` on the result.
pub fn displace_point(
    grid_point: [f32; 2],
    samples: PointSamples,
    params: &Parameters,
    transition: f32,
    intro: f32,
    time: f32,
    pointer: [f32; 2],
) -> DisplacedPoint {
    let uv = [grid_point[0], 1.0 - grid_point[1]];

    let intro_rand = uv_hash(uv, INTRO_HASH);
    let intro_t = stagger_window(intro_rand, INTRO_SPREAD, intro);

    let rand = uv_hash(uv, TRANSITION_HASH);
    let local_t = stagger_window(rand, TRANSITION_SPREAD, transition);

    let depth = mix(samples.depth1, samples.depth2, local_t);
    let color = [
        mix(samples.color1[0], samples.color2[0], local_t),
        mix(samples.color1[1], samples.color2[1], local_t),
        mix(samples.color1[2], samples.color2[2], local_t),
    ];

    let mut pos = [
        grid_point[0] * 2.0 - 1.0,
        -(grid_point[1] * 2.0 - 1.0),
        depth * params.depth_scale,
    ];

    // Intro drift: decays quadratically as the point settles.
    let drift = (1.0 - intro_t) * (1.0 - intro_t);
    pos[0] += snoise([uv[0] * 2.0 + 100.0, uv[1] * 2.0 + 100.0, intro_rand * 6.0]) * 0.12 * drift;
    pos[1] += snoise([uv[0] * 2.0 + 200.0, uv[1] * 2.0 + 200.0, intro_rand * 6.0]) * 0.08 * drift;
    pos[2] += drift * 0.2;

    // Ambient noise: decorrelated x/y displacement plus size wobble.
    let t = time * params.noise_speed;
    let nx = snoise([uv[0] * params.noise_scale, uv[1] * params.noise_scale, t]);
    let ny = snoise([
        uv[0] * params.noise_scale + 17.0,
        uv[1] * params.noise_scale + 17.0,
        t + 31.0,
    ]);
    let ns = snoise([
        uv[0] * params.noise_scale + 43.0,
        uv[1] * params.noise_scale + 43.0,
        t * 0.7 + 67.0,
    ]);
    pos[0] += nx * params.noise_amount;
    pos[1] += ny * params.noise_amount;

    let ay = pointer[0] * params.rotate_strength;
    let ax = -pointer[1] * params.rotate_strength;
    let (sy, cy) = ay.sin_cos();
    let (sx, cx) = ax.sin_cos();

    // Yaw first...
    pos = [
        cy * pos[0] + sy * pos[2],
        pos[1],
        -sy * pos[0] + cy * pos[2],
    ];
    // ...then pitch on the rotated result.
    pos = [
        pos[0],
        cx * pos[1] - sx * pos[2],
        sx * pos[1] + cx * pos[2],
    ];

    let pixel_size = params.point_size * (0.3 + depth * 1.7) * (1.0 + ns * 0.3) * intro_t;

    DisplacedPoint {
        position: pos,
        pixel_size,
        color,
        intro_alpha: intro_t,
    }
}

/// Sprite-fragment coverage at `dist` from the sprite centre in local
/// UV space: hard circular cutoff at 0.5, soft edge from 0.35.
pub fn sprite_alpha(dist: f32, intro_alpha: f32) -> Option<f32> {
    if dist > 0.5 {
        return None;
    }
    Some((1.0 - smoothstep(0.35, 0.5, dist)) * intro_alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameters;

    fn params() -> Parameters {
        Parameters::default()
    }

    #[test]
    fn identical_pairs_make_transition_invisible() {
        let samples = PointSamples {
            depth1: 0.7,
            depth2: 0.7,
            color1: [0.2, 0.4, 0.9],
            color2: [0.2, 0.4, 0.9],
        };
        let p = params();
        let a = displace_point([0.25, 0.5], samples, &p, 0.0, 1.0, 1.0, [0.0, 0.0]);
        let b = displace_point([0.25, 0.5], samples, &p, 0.63, 1.0, 1.0, [0.0, 0.0]);
        let c = displace_point([0.25, 0.5], samples, &p, 1.0, 1.0, 1.0, [0.0, 0.0]);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn fallback_depth_sits_at_half_scale() {
        let p = params();
        let out = displace_point(
            [0.5, 0.5],
            PointSamples::fallback(),
            &p,
            0.0,
            1.0,
            0.0,
            [0.0, 0.0],
        );
        // No rotation, intro settled, default noise amount is zero, so
        // z is exactly the blended depth times the scale.
        assert!((out.position[2] - 0.5 * p.depth_scale).abs() < 1e-6);
    }

    #[test]
    fn unrevealed_points_have_zero_size_and_alpha() {
        let out = displace_point(
            [0.1, 0.9],
            PointSamples::fallback(),
            &params(),
            0.0,
            0.0,
            0.0,
            [0.0, 0.0],
        );
        assert_eq!(out.intro_alpha, 0.0);
        assert_eq!(out.pixel_size, 0.0);
    }

    #[test]
    fn rotation_applies_yaw_then_pitch() {
        let mut p = params();
        p.rotate_strength = 1.0;
        let samples = PointSamples::fallback();
        let pointer = [0.8, 0.6];
        let out = displace_point([0.25, 0.75], samples, &p, 0.0, 1.0, 0.0, pointer);

        // Recompute by hand in the mandated order and compare.
        let base = [
            0.25f32 * 2.0 - 1.0,
            -(0.75f32 * 2.0 - 1.0),
            0.5 * p.depth_scale,
        ];
        let ay = pointer[0];
        let ax = -pointer[1];
        let yawed = [
            ay.cos() * base[0] + ay.sin() * base[2],
            base[1],
            -ay.sin() * base[0] + ay.cos() * base[2],
        ];
        let pitched = [
            yawed[0],
            ax.cos() * yawed[1] - ax.sin() * yawed[2],
            ax.sin() * yawed[1] + ax.cos() * yawed[2],
        ];
        for axis in 0..3 {
            assert!((out.position[axis] - pitched[axis]).abs() < 1e-6);
        }

        // The reverse order lands somewhere else; the sequence matters.
        let pitched_first = [
            base[0],
            ax.cos() * base[1] - ax.sin() * base[2],
            ax.sin() * base[1] + ax.cos() * base[2],
        ];
        let then_yawed = [
            ay.cos() * pitched_first[0] + ay.sin() * pitched_first[2],
            pitched_first[1],
            -ay.sin() * pitched_first[0] + ay.cos() * pitched_first[2],
        ];
        assert!((out.position[1] - then_yawed[1]).abs() > 1e-4);
    }

    #[test]
    fn stagger_windows_stay_inside_unit_sweep() {
        for rand in [0.0f32, 0.3, 0.77, 1.0] {
            assert_eq!(stagger_window(rand, TRANSITION_SPREAD, 0.0), 0.0);
            assert_eq!(stagger_window(rand, TRANSITION_SPREAD, 1.0), 1.0);
            assert_eq!(stagger_window(rand, INTRO_SPREAD, 0.0), 0.0);
            assert_eq!(stagger_window(rand, INTRO_SPREAD, 1.0), 1.0);
        }
    }

    #[test]
    fn points_reveal_at_different_sweep_values() {
        // Two points with different hashes cross the half-way mark of
        // their windows at different global intro values.
        let r1 = uv_hash([0.1, 0.9], INTRO_HASH);
        let r2 = uv_hash([0.8, 0.2], INTRO_HASH);
        assert_ne!(r1, r2);
        let mid = 0.5;
        let w1 = stagger_window(r1, INTRO_SPREAD, mid);
        let w2 = stagger_window(r2, INTRO_SPREAD, mid);
        assert_ne!(w1, w2);
    }

    #[test]
    fn sprite_mask_is_circular_with_soft_edge() {
        assert_eq!(sprite_alpha(0.6, 1.0), None);
        assert_eq!(sprite_alpha(0.51, 1.0), None);
        let centre = sprite_alpha(0.0, 1.0).unwrap();
        assert!((centre - 1.0).abs() < 1e-6);
        let edge = sprite_alpha(0.45, 1.0).unwrap();
        assert!(edge > 0.0 && edge < 1.0);
        // Alpha scales with the intro factor from the vertex stage.
        assert!((sprite_alpha(0.0, 0.25).unwrap() - 0.25).abs() < 1e-6);
    }
}
