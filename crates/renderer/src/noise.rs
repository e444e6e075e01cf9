//! Host-side simplex 3D noise (Stefan Gustavson's formulation), kept
//! numerically in step with the GLSL copy embedded in the vertex
//! shader. The GPU is the authority for rendering; this port exists so
//! the displacement model can be exercised without a device.

type Vec3 = [f32; 3];
type Vec4 = [f32; 4];

fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: f32) -> f32 {
    mod289(((x * 34.0) + 1.0) * x)
}

fn taylor_inv_sqrt(r: f32) -> f32 {
    1.792_842_9 - 0.853_734_7 * r
}

fn dot3(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}

/// Simplex noise over R³, deterministic and continuous, with output in
/// approximately [-1, 1].
pub fn snoise(v: Vec3) -> f32 {
    const C_X: f32 = 1.0 / 6.0;
    const C_Y: f32 = 1.0 / 3.0;

    // Skew into simplex cell space and find the base corner.
    let s = (v[0] + v[1] + v[2]) * C_Y;
    let i: Vec3 = [
        (v[0] + s).floor(),
        (v[1] + s).floor(),
        (v[2] + s).floor(),
    ];
    let t = (i[0] + i[1] + i[2]) * C_X;
    let x0: Vec3 = [v[0] - i[0] + t, v[1] - i[1] + t, v[2] - i[2] + t];

    // Rank the components to pick the simplex traversal order.
    let g: Vec3 = [
        step(x0[1], x0[0]),
        step(x0[2], x0[1]),
        step(x0[0], x0[2]),
    ];
    let l: Vec3 = [1.0 - g[0], 1.0 - g[1], 1.0 - g[2]];
    let i1: Vec3 = [g[0].min(l[2]), g[1].min(l[0]), g[2].min(l[1])];
    let i2: Vec3 = [g[0].max(l[2]), g[1].max(l[0]), g[2].max(l[1])];

    let x1: Vec3 = [x0[0] - i1[0] + C_X, x0[1] - i1[1] + C_X, x0[2] - i1[2] + C_X];
    let x2: Vec3 = [x0[0] - i2[0] + C_Y, x0[1] - i2[1] + C_Y, x0[2] - i2[2] + C_Y];
    let x3: Vec3 = [x0[0] - 0.5, x0[1] - 0.5, x0[2] - 0.5];

    let i: Vec3 = [mod289(i[0]), mod289(i[1]), mod289(i[2])];
    let mut p: Vec4 = [0.0; 4];
    let corner_z = [0.0, i1[2], i2[2], 1.0];
    let corner_y = [0.0, i1[1], i2[1], 1.0];
    let corner_x = [0.0, i1[0], i2[0], 1.0];
    for lane in 0..4 {
        p[lane] = permute(permute(permute(i[2] + corner_z[lane]) + i[1] + corner_y[lane]) + i[0] + corner_x[lane]);
    }

    // Gradients: 7x7 points over a square mapped onto an octahedron.
    let n_: f32 = 0.142_857_142_857;
    let ns: Vec3 = [2.0 * n_, 0.5 * n_ - 1.0, n_];

    let corners = [x0, x1, x2, x3];
    let mut gdots: Vec4 = [0.0; 4];
    let mut falloff: Vec4 = [0.0; 4];
    for lane in 0..4 {
        let j = p[lane] - 49.0 * (p[lane] * ns[2] * ns[2]).floor();
        let gx_ = (j * ns[2]).floor();
        let gy_ = (j - 7.0 * gx_).floor();
        let gx = gx_ * ns[0] + ns[1];
        let gy = gy_ * ns[0] + ns[1];
        let h = 1.0 - gx.abs() - gy.abs();

        let sx = gx.floor() * 2.0 + 1.0;
        let sy = gy.floor() * 2.0 + 1.0;
        let sh = -step(h, 0.0);
        let ax = gx + sx * sh;
        let ay = gy + sy * sh;

        let mut grad: Vec3 = [ax, ay, h];
        let norm = taylor_inv_sqrt(dot3(grad, grad));
        grad = [grad[0] * norm, grad[1] * norm, grad[2] * norm];

        let corner = corners[lane];
        let m = (0.6 - dot3(corner, corner)).max(0.0);
        falloff[lane] = m * m;
        gdots[lane] = dot3(grad, corner);
    }

    42.0
        * (falloff[0] * falloff[0] * gdots[0]
            + falloff[1] * falloff[1] * gdots[1]
            + falloff[2] * falloff[2] * gdots[2]
            + falloff[3] * falloff[3] * gdots[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic() {
        let a = snoise([1.3, -2.7, 0.4]);
        let b = snoise([1.3, -2.7, 0.4]);
        assert_eq!(a, b);
    }

    #[test]
    fn stays_within_unit_band() {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for xi in 0..32 {
            for yi in 0..32 {
                for zi in 0..8 {
                    let value = snoise([
                        xi as f32 * 0.37,
                        yi as f32 * 0.29 - 4.0,
                        zi as f32 * 0.53,
                    ]);
                    min = min.min(value);
                    max = max.max(value);
                    assert!(value.is_finite());
                    assert!(value.abs() <= 1.05, "noise escaped unit band: {value}");
                }
            }
        }
        // The field actually varies; a constant field would satisfy the
        // band check while being useless for displacement.
        assert!(max - min > 0.5, "noise range degenerate: [{min}, {max}]");
    }

    #[test]
    fn is_continuous_at_small_steps() {
        let base = [0.91, 2.13, 0.5];
        let here = snoise(base);
        for axis in 0..3 {
            let mut nudged = base;
            nudged[axis] += 1e-3;
            let there = snoise(nudged);
            assert!(
                (here - there).abs() < 0.05,
                "discontinuity along axis {axis}: {here} vs {there}"
            );
        }
    }

    #[test]
    fn varies_across_single_digit_scales() {
        // The shader samples at uv * noiseScale with noiseScale around
        // 3; neighbouring grid points a texel apart must see distinct
        // values without grid-aligned repetition.
        let a = snoise([0.3 * 3.0, 0.3 * 3.0, 0.0]);
        let b = snoise([0.31 * 3.0, 0.3 * 3.0, 0.0]);
        let c = snoise([0.3 * 3.0, 0.31 * 3.0, 0.0]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
