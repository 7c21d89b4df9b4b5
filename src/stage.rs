//! The host-facing masking stage.
//!
//! [`MaskStage`] owns the configuration, the predicate compiler, and a small
//! LRU cache of device pipelines keyed by predicate hash. The host prepares
//! the stage before a draw (which recompiles only when the configuration
//! changed), binds its three input textures, and lets the stage record a
//! fullscreen masked-copy pass into its command encoder.

use std::num::NonZeroUsize;

use crate::cache::PipelineCache;
use crate::config::DepthMaskConfig;
use crate::predicate::{CompiledPredicate, MaskPredicateCompiler};
use crate::shader::build_mask_wgsl;

/// Maximum number of compiled pipelines kept per stage. A stage rarely
/// toggles between more than a couple of configurations.
const PIPELINE_CACHE_SIZE: usize = 8;

/// A depth-comparison masking stage.
///
/// Decides per pixel whether the color sample survives, based on the
/// configured comparison between the two depth buffers. The stage never
/// writes the depth buffers; it only samples them.
pub struct MaskStage {
    config: DepthMaskConfig,
    compiler: MaskPredicateCompiler,
    pipelines: PipelineCache,
    input_bind_group_layout: Option<wgpu::BindGroupLayout>,
}

impl Default for MaskStage {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskStage {
    /// Creates a stage with default settings: `Less` comparison, epsilon
    /// `1e-5`, keep-at-max-depth.
    pub fn new() -> Self {
        Self {
            config: DepthMaskConfig::new(),
            compiler: MaskPredicateCompiler::new(),
            // PIPELINE_CACHE_SIZE is a non-zero constant
            pipelines: PipelineCache::new(NonZeroUsize::new(PIPELINE_CACHE_SIZE).unwrap()),
            input_bind_group_layout: None,
        }
    }

    /// Read access to the stage's configuration.
    pub fn config(&self) -> &DepthMaskConfig {
        &self.config
    }

    /// Mutable access to the stage's configuration. Any setter call marks
    /// the compiled predicate stale; the next [`prepare`](Self::prepare) or
    /// [`predicate`](Self::predicate) recompiles.
    pub fn config_mut(&mut self) -> &mut DepthMaskConfig {
        &mut self.config
    }

    /// The compiled predicate for the current configuration, recompiling
    /// first if a setter has run since the last read.
    pub fn predicate(&mut self) -> &CompiledPredicate {
        self.compiler.compile(&self.config)
    }

    /// Bind group layout for the stage's three inputs: color texture,
    /// depth buffer 0, depth buffer 1. Created once per stage.
    pub fn input_bind_group_layout(&mut self, device: &wgpu::Device) -> &wgpu::BindGroupLayout {
        self.input_bind_group_layout
            .get_or_insert_with(|| create_mask_input_bind_group_layout(device))
    }

    /// Creates a bind group for one set of input textures. The depth views
    /// must be depth-format views; all three must match the target size.
    pub fn create_input_bind_group(
        &mut self,
        device: &wgpu::Device,
        color: &wgpu::TextureView,
        depth0: &wgpu::TextureView,
        depth1: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        let layout = self.input_bind_group_layout(device);
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mask_input_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(depth0),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(depth1),
                },
            ],
        })
    }

    /// Returns the render pipeline for the current configuration, building
    /// and caching it on miss. Pipelines are keyed by predicate hash, so an
    /// unchanged configuration is a pure cache lookup.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let predicate = self.compiler.compile(&self.config).clone();
        let hash = predicate.hash();

        if let Some(pipeline) = self.pipelines.get_pipeline(&hash) {
            tracing::trace!(hash, "mask pipeline cache hit");
            return pipeline;
        }

        tracing::debug!(hash, ?target_format, "building mask pipeline");
        let layout = self.input_bind_group_layout(device).clone();
        let pipeline = create_mask_pipeline(device, &layout, &predicate, target_format);
        self.pipelines.insert_pipeline(hash, pipeline.clone());
        pipeline
    }

    /// Number of device pipelines currently cached.
    pub fn cached_pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Records the masked-copy pass: a fullscreen triangle that writes each
    /// kept color sample to `target` and discards the rest. The target is
    /// loaded, not cleared, so previously composited content survives.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        inputs: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("depth_mask_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, inputs, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// Bind group layout for mask input: color texture plus the two depth
/// textures, all read via `textureLoad` (no sampler).
pub(crate) fn create_mask_input_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("mask_input_bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
        ],
    })
}

/// Builds the mask render pipeline for one compiled predicate.
pub(crate) fn create_mask_pipeline(
    device: &wgpu::Device,
    input_layout: &wgpu::BindGroupLayout,
    predicate: &CompiledPredicate,
    target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let wgsl = build_mask_wgsl(predicate);
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("mask_shader"),
        source: wgpu::ShaderSource::Wgsl(wgsl.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mask_pipeline_layout"),
        bind_group_layouts: &[input_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("mask_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_mask"),
            compilation_options: Default::default(),
            buffers: &[], // Fullscreen triangle — no vertex buffers
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_mask"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                // Discard handles masking; surviving samples overwrite
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::MaskStage;
    use crate::compare::DepthCompareMode;

    #[test]
    fn stage_predicate_tracks_config_mutation() {
        let mut stage = MaskStage::new();
        let before = stage.predicate().keep_expr().to_string();
        stage.config_mut().set_mode(DepthCompareMode::Greater);
        let after = stage.predicate().keep_expr().to_string();
        assert_ne!(before, after);
        assert!(after.contains("d0 < d1"));
    }

    #[test]
    fn fresh_stage_has_empty_pipeline_cache() {
        let stage = MaskStage::new();
        assert_eq!(stage.cached_pipeline_count(), 0);
    }
}
