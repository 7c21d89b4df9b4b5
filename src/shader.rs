//! WGSL assembly for the masking pass.
//!
//! The full shader is built from three pieces: the built-in fullscreen
//! vertex shader, the compiled predicate (constants + `mask_keep`), and the
//! fragment template that loads the three input textures and discards the
//! pixel when the predicate says so.

use crate::predicate::CompiledPredicate;

/// Vertex shader drawing a fullscreen triangle (3 vertices, no vertex
/// buffer). Shared by every mask pipeline.
pub(crate) const FULLSCREEN_TRIANGLE_VS: &str = r#"
struct MaskOutput {
    @builtin(position) position: vec4<f32>,
};

@vertex
fn vs_mask(@builtin(vertex_index) vi: u32) -> MaskOutput {
    // Fullscreen triangle trick: 3 vertices cover the entire screen
    let uv = vec2<f32>(f32((vi << 1u) & 2u), f32(vi & 2u));
    var out: MaskOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    return out;
}
"#;

/// Fragment template. Texture loads use the pixel coordinate from
/// `@builtin(position)`, so no sampler is needed and depth values arrive
/// unfiltered.
pub(crate) const MASK_FS_TEMPLATE: &str = r#"
@group(0) @binding(0) var t_color: texture_2d<f32>;
@group(0) @binding(1) var t_depth0: texture_depth_2d;
@group(0) @binding(2) var t_depth1: texture_depth_2d;

@fragment
fn fs_mask(in: MaskOutput) -> @location(0) vec4<f32> {
    let px = vec2<i32>(in.position.xy);
    let d0 = textureLoad(t_depth0, px, 0);
    let d1 = textureLoad(t_depth1, px, 0);
    if (!mask_keep(d0, d1)) {
        discard;
    }
    return textureLoad(t_color, px, 0);
}
"#;

/// Concatenate the built-in vertex shader, the compiled predicate, and the
/// fragment template into a single WGSL module.
pub(crate) fn build_mask_wgsl(predicate: &CompiledPredicate) -> String {
    format!(
        "{FULLSCREEN_TRIANGLE_VS}\n{}\n{MASK_FS_TEMPLATE}",
        predicate.wgsl_function()
    )
}

#[cfg(test)]
mod tests {
    use super::build_mask_wgsl;
    use crate::config::DepthMaskConfig;
    use crate::predicate::MaskPredicateCompiler;

    #[test]
    fn assembled_module_contains_all_entry_points() {
        let config = DepthMaskConfig::new();
        let mut compiler = MaskPredicateCompiler::new();
        let wgsl = build_mask_wgsl(compiler.compile(&config));
        assert!(wgsl.contains("fn vs_mask"));
        assert!(wgsl.contains("fn fs_mask"));
        assert!(wgsl.contains("fn mask_keep(d0: f32, d1: f32) -> bool"));
        assert!(wgsl.contains("const EPSILON: f32"));
    }

    #[test]
    fn assembled_module_is_deterministic() {
        let config = DepthMaskConfig::new();
        let mut compiler = MaskPredicateCompiler::new();
        let a = build_mask_wgsl(compiler.compile(&config));
        let b = build_mask_wgsl(compiler.compile(&config));
        assert_eq!(a, b);
    }
}
