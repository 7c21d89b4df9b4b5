//! Compilation of a [`DepthMaskConfig`] into per-pixel predicate source.
//!
//! The compiler is pure and deterministic: the same configuration always
//! yields a byte-identical artifact, so the host can cache device pipelines
//! on the artifact's hash instead of recompiling every frame. The cached
//! artifact has two states, stale and fresh, tracked by comparing the
//! config's revision counter against the revision captured at compile time.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::compare::{DepthCompareMode, MAX_DEPTH};
use crate::config::{DepthMaskConfig, MaxDepthStrategy};

/// A compiled per-pixel keep/discard predicate.
///
/// The artifact is WGSL text: a constant block the host splices into its
/// shader, and a `mask_keep(d0, d1) -> bool` function whose body is the
/// comparison expression for the snapshot's mode, epsilon, and max-depth
/// strategy. [`evaluate`](Self::evaluate) mirrors that function on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    mode: DepthCompareMode,
    strategy: MaxDepthStrategy,
    epsilon: f64,
    keep_expr: String,
    constants: String,
    revision: u64,
    hash: u64,
}

impl CompiledPredicate {
    fn build(config: &DepthMaskConfig) -> Self {
        let mode = config.mode();
        let strategy = config.max_depth_strategy();
        let epsilon = config.epsilon();

        let base = mode.wgsl_keep_expr();
        // The overlay replaces the base decision whenever either sample sits
        // at the sentinel; Unmodified emits the base expression untouched.
        let keep_expr = match strategy {
            MaxDepthStrategy::Unmodified => base.to_string(),
            MaxDepthStrategy::KeepMax => {
                format!("(d0 == MAX_DEPTH || d1 == MAX_DEPTH) || ({base})")
            }
            MaxDepthStrategy::DiscardMax => {
                format!("!(d0 == MAX_DEPTH || d1 == MAX_DEPTH) && ({base})")
            }
        };

        // `{:?}` on f64 is the shortest round-trip representation, which is
        // also a valid WGSL abstract-float literal. Formatting happens only
        // here; the config stores the native f64.
        let constants = format!(
            "const MAX_DEPTH: f32 = {MAX_DEPTH:?};\n\
             const EPSILON: f32 = {epsilon:?};\n\
             const MAX_DEPTH_MODE: u32 = {}u;\n",
            strategy.code()
        );

        let mut hasher = DefaultHasher::new();
        keep_expr.hash(&mut hasher);
        constants.hash(&mut hasher);

        Self {
            mode,
            strategy,
            epsilon,
            keep_expr,
            constants,
            revision: config.revision(),
            hash: hasher.finish(),
        }
    }

    /// The WGSL boolean expression over `d0` and `d1`.
    pub fn keep_expr(&self) -> &str {
        &self.keep_expr
    }

    /// The WGSL constant block the expression reads: `MAX_DEPTH`, `EPSILON`,
    /// and the numeric `MAX_DEPTH_MODE` strategy code.
    pub fn constants_wgsl(&self) -> &str {
        &self.constants
    }

    /// The full predicate as a WGSL function, constants included.
    pub fn wgsl_function(&self) -> String {
        format!(
            "{}fn mask_keep(d0: f32, d1: f32) -> bool {{\n    return {};\n}}\n",
            self.constants, self.keep_expr
        )
    }

    /// Hash identifying this artifact. Equal configurations hash equally, so
    /// this is a valid device-pipeline cache key.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn mode(&self) -> DepthCompareMode {
        self.mode
    }

    pub fn max_depth_strategy(&self) -> MaxDepthStrategy {
        self.strategy
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// CPU evaluation of the predicate, overlay included. Matches the
    /// emitted WGSL decision for the same inputs.
    pub fn evaluate(&self, d0: f32, d1: f32) -> bool {
        let base = self.mode.keeps(d0, d1, self.epsilon as f32);
        let at_sentinel = d0 == MAX_DEPTH || d1 == MAX_DEPTH;
        match self.strategy {
            MaxDepthStrategy::Unmodified => base,
            MaxDepthStrategy::KeepMax => at_sentinel || base,
            MaxDepthStrategy::DiscardMax => !at_sentinel && base,
        }
    }
}

/// Lazily recompiles a [`CompiledPredicate`] whenever the configuration has
/// moved past the revision the cached artifact was built from.
#[derive(Debug, Default)]
pub struct MaskPredicateCompiler {
    cached: Option<CompiledPredicate>,
}

impl MaskPredicateCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the predicate for the current configuration, recompiling only
    /// if a setter has run since the last compile. Calling this repeatedly
    /// without intervening mutation returns the identical cached artifact.
    pub fn compile(&mut self, config: &DepthMaskConfig) -> &CompiledPredicate {
        let stale = self
            .cached
            .as_ref()
            .map(|p| p.revision() != config.revision())
            .unwrap_or(true);
        if stale {
            let predicate = CompiledPredicate::build(config);
            tracing::debug!(
                mode = ?predicate.mode(),
                strategy = ?predicate.max_depth_strategy(),
                epsilon = predicate.epsilon(),
                hash = predicate.hash(),
                "recompiled depth mask predicate"
            );
            self.cached = Some(predicate);
        }
        // Populated just above when it was empty
        self.cached.as_ref().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::MaskPredicateCompiler;
    use crate::compare::{DepthCompareMode, MAX_DEPTH};
    use crate::config::{DepthMaskConfig, MaxDepthStrategy};

    fn compile_snapshot(config: &DepthMaskConfig) -> super::CompiledPredicate {
        MaskPredicateCompiler::new().compile(config).clone()
    }

    #[test]
    fn compile_is_idempotent_without_mutation() {
        let config = DepthMaskConfig::new();
        let mut compiler = MaskPredicateCompiler::new();
        let first = compiler.compile(&config).wgsl_function();
        let second = compiler.compile(&config).wgsl_function();
        assert_eq!(first, second);
    }

    #[test]
    fn setter_invalidates_even_with_unchanged_value() {
        let mut config = DepthMaskConfig::new();
        let mut compiler = MaskPredicateCompiler::new();
        let before = compiler.compile(&config).revision();
        config.set_mode(config.mode());
        let after = compiler.compile(&config).revision();
        assert_ne!(before, after, "unchanged-value setter must still recompile");
    }

    #[test]
    fn identical_configs_produce_identical_artifacts() {
        let mut a = DepthMaskConfig::new();
        let mut b = DepthMaskConfig::new();
        a.set_mode(DepthCompareMode::Equal);
        a.set_epsilon(0.01).unwrap();
        b.set_mode(DepthCompareMode::Equal);
        b.set_epsilon(0.01).unwrap();
        // b was mutated once more; the artifact text must not depend on that
        b.set_max_depth_strategy(b.max_depth_strategy());

        let pa = compile_snapshot(&a);
        let pb = compile_snapshot(&b);
        assert_eq!(pa.wgsl_function(), pb.wgsl_function());
        assert_eq!(pa.hash(), pb.hash());
    }

    #[test]
    fn unmodified_strategy_emits_bare_expression() {
        let mut config = DepthMaskConfig::new();
        config.set_max_depth_strategy(MaxDepthStrategy::Unmodified);
        let predicate = compile_snapshot(&config);
        assert_eq!(predicate.keep_expr(), "d0 > d1");
    }

    #[test]
    fn keep_max_overlay_wraps_base_expression() {
        let mut config = DepthMaskConfig::new();
        config.set_mode(DepthCompareMode::Greater);
        config.set_max_depth_strategy(MaxDepthStrategy::KeepMax);
        let predicate = compile_snapshot(&config);
        assert_eq!(
            predicate.keep_expr(),
            "(d0 == MAX_DEPTH || d1 == MAX_DEPTH) || (d0 < d1)"
        );
    }

    #[test]
    fn overlay_forces_keep_at_sentinel() {
        let mut config = DepthMaskConfig::new();
        config.set_mode(DepthCompareMode::Greater);
        config.set_max_depth_strategy(MaxDepthStrategy::KeepMax);
        let predicate = compile_snapshot(&config);
        // Base Greater would discard (d0 > d1), but the overlay wins
        assert!(predicate.evaluate(MAX_DEPTH, 0.2));
        assert!(predicate.evaluate(0.2, MAX_DEPTH));
    }

    #[test]
    fn overlay_forces_discard_at_sentinel() {
        let mut config = DepthMaskConfig::new();
        config.set_mode(DepthCompareMode::Always);
        config.set_max_depth_strategy(MaxDepthStrategy::DiscardMax);
        let predicate = compile_snapshot(&config);
        assert!(!predicate.evaluate(MAX_DEPTH, 0.2));
        assert!(!predicate.evaluate(0.2, MAX_DEPTH));
        assert!(predicate.evaluate(0.2, 0.3));
    }

    #[test]
    fn unmodified_strategy_never_overrides_at_sentinel() {
        let mut config = DepthMaskConfig::new();
        config.set_mode(DepthCompareMode::Less);
        config.set_max_depth_strategy(MaxDepthStrategy::Unmodified);
        let predicate = compile_snapshot(&config);
        // Less keeps when d0 > d1; sentinel on d0 makes that true
        assert!(predicate.evaluate(MAX_DEPTH, 0.2));
        assert!(!predicate.evaluate(0.2, MAX_DEPTH));
    }

    #[test]
    fn tiny_epsilon_survives_text_emission() {
        let mut config = DepthMaskConfig::new();
        config.set_epsilon(1e-12).unwrap();
        let predicate = compile_snapshot(&config);
        assert!(
            predicate.constants_wgsl().contains("EPSILON: f32 = 1e-12"),
            "emitted constants were: {}",
            predicate.constants_wgsl()
        );
    }

    #[test]
    fn constants_block_carries_strategy_code() {
        let mut config = DepthMaskConfig::new();
        config.set_max_depth_strategy(MaxDepthStrategy::DiscardMax);
        let predicate = compile_snapshot(&config);
        assert!(predicate.constants_wgsl().contains("MAX_DEPTH_MODE: u32 = 2u"));
    }

    #[test]
    fn wgsl_function_has_two_named_inputs() {
        let predicate = compile_snapshot(&DepthMaskConfig::new());
        assert!(predicate
            .wgsl_function()
            .contains("fn mask_keep(d0: f32, d1: f32) -> bool"));
    }
}
