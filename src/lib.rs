//! A depth-comparison masking stage for wgpu multi-pass compositing.
//!
//! Given two depth buffers and a color buffer, the stage decides per pixel
//! whether the color sample survives, based on a configurable comparison
//! between the two depth values. Settings are compiled into a WGSL predicate
//! and baked into a cached device pipeline; mutating a setting marks the
//! artifact stale and the next prepare recompiles it.
//!
//! ```no_run
//! use depthmask::{DepthCompareMode, MaskStage, MaxDepthStrategy};
//!
//! let mut stage = MaskStage::new();
//! stage.config_mut().set_mode(DepthCompareMode::LessOrEqual);
//! stage.config_mut().set_epsilon(1e-4)?;
//! stage
//!     .config_mut()
//!     .set_max_depth_strategy(MaxDepthStrategy::KeepMax);
//!
//! // Per frame, before the draw:
//! // let pipeline = stage.prepare(&device, target_format);
//! // let inputs = stage.create_input_bind_group(&device, &color, &d0, &d1);
//! // stage.encode(&mut encoder, &target, &pipeline, &inputs);
//! # Ok::<(), depthmask::ConfigError>(())
//! ```

pub use wgpu;

mod cache;
mod compare;
mod config;
mod predicate;
mod shader;
mod stage;

pub use compare::{DepthCompareMode, MAX_DEPTH};
pub use config::{ConfigError, DepthMaskConfig, MaxDepthStrategy, DEFAULT_EPSILON};
pub use predicate::{CompiledPredicate, MaskPredicateCompiler};
pub use stage::MaskStage;
