//! Embedded GLSL sources and compilation through naga's GLSL frontend.
//!
//! The point cloud draws each grid point as an instanced four-vertex
//! strip: the vertex stage samples the texture pairs, runs the
//! displacement kernel once per instance, and expands the quad in
//! screen space so the sprite's pixel diameter is exact regardless of
//! depth. The uniform block layout must match `CloudUniforms` in
//! `gpu/uniforms.rs`; the hash constants and noise must match the host
//! mirror in `displace.rs` and `noise.rs`.

use std::borrow::Cow;

use anyhow::Result;
use wgpu::naga::ShaderStage;

pub(crate) fn compile_glsl(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    }))
}

/// The point displacement kernel plus instanced quad expansion.
///
/// Location 0 is the per-instance grid coordinate in [0,1]^2; the four
/// strip vertices of each instance are told apart by gl_VertexIndex.
/// The noise block is Stefan Gustavson's simplex 3D noise, verbatim.
pub(crate) const POINT_VERTEX_GLSL: &str = r"#version 450

layout(std140, set = 0, binding = 0) uniform CloudParams {
    vec4 resolution;
    vec2 pointer;
    float time;
    float intro;
    float transition;
    float point_size;
    float depth_scale;
    float noise_amount;
    float noise_speed;
    float noise_scale;
    float rotate_strength;
    float _pad0;
} ubo;

layout(location = 0) in vec2 grid_point;

layout(location = 0) out vec3 v_color;
layout(location = 1) out vec2 v_local;
layout(location = 2) out float v_alpha;

layout(set = 1, binding = 0) uniform texture2D color1_tex;
layout(set = 1, binding = 1) uniform sampler color1_smp;
layout(set = 1, binding = 2) uniform texture2D depth1_tex;
layout(set = 1, binding = 3) uniform sampler depth1_smp;
layout(set = 1, binding = 4) uniform texture2D color2_tex;
layout(set = 1, binding = 5) uniform sampler color2_smp;
layout(set = 1, binding = 6) uniform texture2D depth2_tex;
layout(set = 1, binding = 7) uniform sampler depth2_smp;

vec3 mod289(vec3 x) { return x - floor(x * (1.0 / 289.0)) * 289.0; }
vec4 mod289(vec4 x) { return x - floor(x * (1.0 / 289.0)) * 289.0; }
vec4 permute(vec4 x) { return mod289(((x * 34.0) + 1.0) * x); }
vec4 taylorInvSqrt(vec4 r) { return 1.79284291400159 - 0.85373472095314 * r; }

float snoise(vec3 v) {
    const vec2 C = vec2(1.0 / 6.0, 1.0 / 3.0);
    const vec4 D = vec4(0.0, 0.5, 1.0, 2.0);

    vec3 i = floor(v + dot(v, C.yyy));
    vec3 x0 = v - i + dot(i, C.xxx);

    vec3 g = step(x0.yzx, x0.xyz);
    vec3 l = 1.0 - g;
    vec3 i1 = min(g.xyz, l.zxy);
    vec3 i2 = max(g.xyz, l.zxy);

    vec3 x1 = x0 - i1 + C.xxx;
    vec3 x2 = x0 - i2 + C.yyy;
    vec3 x3 = x0 - D.yyy;

    i = mod289(i);
    vec4 p = permute(permute(permute(
        i.z + vec4(0.0, i1.z, i2.z, 1.0))
        + i.y + vec4(0.0, i1.y, i2.y, 1.0))
        + i.x + vec4(0.0, i1.x, i2.x, 1.0));

    float n_ = 0.142857142857;
    vec3 ns = n_ * D.wyz - D.xzx;

    vec4 j = p - 49.0 * floor(p * ns.z * ns.z);

    vec4 x_ = floor(j * ns.z);
    vec4 y_ = floor(j - 7.0 * x_);

    vec4 x = x_ * ns.x + ns.yyyy;
    vec4 y = y_ * ns.x + ns.yyyy;
    vec4 h = 1.0 - abs(x) - abs(y);

    vec4 b0 = vec4(x.xy, y.xy);
    vec4 b1 = vec4(x.zw, y.zw);

    vec4 s0 = floor(b0) * 2.0 + 1.0;
    vec4 s1 = floor(b1) * 2.0 + 1.0;
    vec4 sh = -step(h, vec4(0.0));

    vec4 a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    vec4 a1 = b1.xzyw + s1.xzyw * sh.zzww;

    vec3 p0 = vec3(a0.xy, h.x);
    vec3 p1 = vec3(a0.zw, h.y);
    vec3 p2 = vec3(a1.xy, h.z);
    vec3 p3 = vec3(a1.zw, h.w);

    vec4 norm = taylorInvSqrt(vec4(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    vec4 m = max(0.6 - vec4(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), 0.0);
    m = m * m;
    return 42.0 * dot(m * m, vec4(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}

const vec2 corners[4] = vec2[4](
    vec2(-0.5, -0.5),
    vec2(0.5, -0.5),
    vec2(-0.5, 0.5),
    vec2(0.5, 0.5)
);

void main() {
    vec2 uv = vec2(grid_point.x, 1.0 - grid_point.y);

    float introRand = fract(sin(dot(uv, vec2(45.233, 91.117))) * 23758.1234);
    float introStart = introRand * 0.3;
    float introT = smoothstep(introStart, introStart + 0.7, ubo.intro);

    float rand = fract(sin(dot(uv, vec2(12.9898, 78.233))) * 43758.5453);
    float start = rand * 0.6;
    float localT = smoothstep(start, start + 0.4, ubo.transition);

    float depth1 = textureLod(sampler2D(depth1_tex, depth1_smp), uv, 0.0).r;
    float depth2 = textureLod(sampler2D(depth2_tex, depth2_smp), uv, 0.0).r;
    vec3 color1 = textureLod(sampler2D(color1_tex, color1_smp), uv, 0.0).rgb;
    vec3 color2 = textureLod(sampler2D(color2_tex, color2_smp), uv, 0.0).rgb;

    float depth = mix(depth1, depth2, localT);
    vec3 color = mix(color1, color2, localT);

    vec3 pos = vec3(
        grid_point.x * 2.0 - 1.0,
        -(grid_point.y * 2.0 - 1.0),
        depth * ubo.depth_scale
    );

    float drift = (1.0 - introT) * (1.0 - introT);
    pos.x += snoise(vec3(uv * 2.0 + 100.0, introRand * 6.0)) * 0.12 * drift;
    pos.y += snoise(vec3(uv * 2.0 + 200.0, introRand * 6.0)) * 0.08 * drift;
    pos.z += drift * 0.2;

    float t = ubo.time * ubo.noise_speed;
    float nx = snoise(vec3(uv * ubo.noise_scale, t));
    float ny = snoise(vec3(uv * ubo.noise_scale + 17.0, t + 31.0));
    float nS = snoise(vec3(uv * ubo.noise_scale + 43.0, t * 0.7 + 67.0));
    pos.x += nx * ubo.noise_amount;
    pos.y += ny * ubo.noise_amount;

    float ay = ubo.pointer.x * ubo.rotate_strength;
    float ax = -ubo.pointer.y * ubo.rotate_strength;
    float sy = sin(ay);
    float cy = cos(ay);
    float sx = sin(ax);
    float cx = cos(ax);
    pos = vec3(cy * pos.x + sy * pos.z, pos.y, -sy * pos.x + cy * pos.z);
    pos = vec3(pos.x, cx * pos.y - sx * pos.z, sx * pos.y + cx * pos.z);

    float pixelSize = ubo.point_size * (0.3 + depth * 1.7) * (1.0 + nS * 0.3) * introT;

    vec2 corner = corners[gl_VertexIndex];
    vec2 offset = corner * pixelSize * 2.0 / ubo.resolution.xy;

    v_color = color;
    v_local = corner + 0.5;
    v_alpha = introT;
    gl_Position = vec4(pos.xy + offset, 0.0, 1.0);
}
";

/// Circular sprite mask with a soft rim, premultiplied for additive
/// blending.
pub(crate) const POINT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec3 v_color;
layout(location = 1) in vec2 v_local;
layout(location = 2) in float v_alpha;

layout(location = 0) out vec4 outColor;

void main() {
    float dist = distance(v_local, vec2(0.5));
    if (dist > 0.5) {
        discard;
    }
    float alpha = (1.0 - smoothstep(0.35, 0.5, dist)) * v_alpha;
    outColor = vec4(v_color * alpha, alpha);
}
";

/// Minimal full-screen triangle vertex shader for the post passes.
pub(crate) const FULLSCREEN_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Bloom pre-pass: keep everything above the luminance threshold, with
/// a smooth knee so the cutoff does not shimmer.
pub(crate) const BLOOM_THRESHOLD_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform PassParams {
    vec4 params;
} pass;

layout(set = 1, binding = 0) uniform texture2D scene_tex;
layout(set = 1, binding = 1) uniform sampler scene_smp;

void main() {
    vec3 color = texture(sampler2D(scene_tex, scene_smp), v_uv).rgb;
    float luma = dot(color, vec3(0.2126, 0.7152, 0.0722));
    float threshold = pass.params.x;
    float knee = max(pass.params.y, 1e-4);
    float weight = smoothstep(threshold, threshold + knee, luma);
    outColor = vec4(color * weight, 1.0);
}
";

/// Separable 9-tap gaussian; `params.xy` is the step between taps in
/// UV space (texel size times blur direction).
pub(crate) const BLOOM_BLUR_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform PassParams {
    vec4 params;
} pass;

layout(set = 1, binding = 0) uniform texture2D source_tex;
layout(set = 1, binding = 1) uniform sampler source_smp;

const float weights[5] = float[5](0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);

void main() {
    vec2 tap = pass.params.xy;
    vec3 acc = texture(sampler2D(source_tex, source_smp), v_uv).rgb * weights[0];
    for (int i = 1; i < 5; i++) {
        vec2 offset = tap * float(i);
        acc += texture(sampler2D(source_tex, source_smp), v_uv + offset).rgb * weights[i];
        acc += texture(sampler2D(source_tex, source_smp), v_uv - offset).rgb * weights[i];
    }
    outColor = vec4(acc, 1.0);
}
";

/// Final composite: scene plus the blurred highlights scaled by the
/// bloom intensity.
pub(crate) const BLOOM_COMPOSITE_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform PassParams {
    vec4 params;
} pass;

layout(set = 1, binding = 0) uniform texture2D scene_tex;
layout(set = 1, binding = 1) uniform sampler scene_smp;
layout(set = 1, binding = 2) uniform texture2D bloom_tex;
layout(set = 1, binding = 3) uniform sampler bloom_smp;

void main() {
    vec3 scene = texture(sampler2D(scene_tex, scene_smp), v_uv).rgb;
    vec3 bloom = texture(sampler2D(bloom_tex, bloom_smp), v_uv).rgb;
    outColor = vec4(scene + bloom * pass.params.x, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_kernel_embeds_the_displacement_constants() {
        assert!(POINT_VERTEX_GLSL.contains("12.9898, 78.233"));
        assert!(POINT_VERTEX_GLSL.contains("43758.5453"));
        assert!(POINT_VERTEX_GLSL.contains("45.233, 91.117"));
        assert!(POINT_VERTEX_GLSL.contains("23758.1234"));
        assert!(POINT_VERTEX_GLSL.contains("float snoise(vec3 v)"));
        assert!(POINT_VERTEX_GLSL.contains("gl_VertexIndex"));
    }

    #[test]
    fn stages_declare_matching_uniform_block() {
        assert!(POINT_VERTEX_GLSL.contains("uniform CloudParams"));
        assert!(POINT_VERTEX_GLSL.contains("float rotate_strength"));
    }

    #[test]
    fn fragment_uses_circular_mask() {
        assert!(POINT_FRAGMENT_GLSL.contains("discard"));
        assert!(POINT_FRAGMENT_GLSL.contains("smoothstep(0.35, 0.5"));
    }
}
