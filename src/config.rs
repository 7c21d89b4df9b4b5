//! Configuration surface of the masking stage.
//!
//! [`DepthMaskConfig`] holds the three settings that drive the compiled
//! predicate: the comparison mode, the equality epsilon, and the max-depth
//! strategy. Every successful mutation bumps a revision counter; the
//! predicate compiler compares that counter against the revision it last
//! compiled to decide whether its cached artifact is stale.

use crate::compare::DepthCompareMode;

/// Errors raised by the configuration surface.
///
/// All of these are raised synchronously at the setter or conversion call
/// site; an invalid value never reaches compile time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `set_epsilon` was called with a tolerance that is negative, not
    /// finite, or too large for the emitted `f32` constant.
    #[error("depth comparison epsilon must be finite, non-negative, and at most f32::MAX, got {0}")]
    InvalidEpsilon(f64),
    /// A numeric comparison-mode code outside the enumeration.
    #[error("unknown depth comparison mode code {0}")]
    UnknownCompareMode(u32),
    /// A numeric max-depth strategy code outside the enumeration.
    #[error("unknown max-depth strategy code {0}")]
    UnknownStrategy(u32),
}

/// What to do when either depth sample equals the max-depth sentinel
/// ([`MAX_DEPTH`](crate::MAX_DEPTH)), i.e. when one of the buffers has no
/// geometry at the pixel.
///
/// The strategy is an overlay: it is applied after the comparison mode's
/// base decision and, when it fires, replaces that decision entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaxDepthStrategy {
    /// No overlay; the comparison mode's result stands even at the sentinel.
    Unmodified,
    /// Force-keep the pixel when either depth is at the sentinel. This is
    /// the default: an empty region never masks out valid data from the
    /// other buffer.
    #[default]
    KeepMax,
    /// Force-discard the pixel when either depth is at the sentinel.
    DiscardMax,
}

impl MaxDepthStrategy {
    /// Stable numeric code, emitted into the predicate's constant block.
    pub fn code(self) -> u32 {
        match self {
            MaxDepthStrategy::Unmodified => 0,
            MaxDepthStrategy::KeepMax => 1,
            MaxDepthStrategy::DiscardMax => 2,
        }
    }

    /// Inverse of [`code`](Self::code); unknown codes are rejected.
    pub fn from_code(code: u32) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(MaxDepthStrategy::Unmodified),
            1 => Ok(MaxDepthStrategy::KeepMax),
            2 => Ok(MaxDepthStrategy::DiscardMax),
            other => Err(ConfigError::UnknownStrategy(other)),
        }
    }
}

/// Default epsilon for `Equal`/`NotEqual` comparisons.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Settings for the depth-comparison masking stage.
///
/// Created once per stage with defaults (`Less`, epsilon `1e-5`,
/// [`MaxDepthStrategy::KeepMax`]) and mutated only through the setters.
/// Setters are atomic: on error neither the stored value nor the revision
/// counter changes.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMaskConfig {
    mode: DepthCompareMode,
    epsilon: f64,
    strategy: MaxDepthStrategy,
    revision: u64,
}

impl Default for DepthMaskConfig {
    fn default() -> Self {
        Self {
            mode: DepthCompareMode::default(),
            epsilon: DEFAULT_EPSILON,
            strategy: MaxDepthStrategy::default(),
            revision: 0,
        }
    }
}

impl DepthMaskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DepthCompareMode {
        self.mode
    }

    /// Sets the comparison mode. Always accepted; the enumeration is closed.
    pub fn set_mode(&mut self, mode: DepthCompareMode) {
        self.mode = mode;
        self.revision += 1;
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Sets the `Equal`/`NotEqual` tolerance. Values that are negative, not
    /// finite, or beyond `f32::MAX` are rejected here rather than surfacing
    /// later as an invalid literal in the emitted shader.
    ///
    /// Stored at double precision; the value is only formatted as text when
    /// the predicate is emitted, so very small tolerances survive intact.
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<(), ConfigError> {
        if !epsilon.is_finite() || epsilon < 0.0 || epsilon > f32::MAX as f64 {
            return Err(ConfigError::InvalidEpsilon(epsilon));
        }
        self.epsilon = epsilon;
        self.revision += 1;
        Ok(())
    }

    pub fn max_depth_strategy(&self) -> MaxDepthStrategy {
        self.strategy
    }

    /// Sets the max-depth sentinel strategy. Always accepted.
    pub fn set_max_depth_strategy(&mut self, strategy: MaxDepthStrategy) {
        self.strategy = strategy;
        self.revision += 1;
    }

    /// Legacy boolean alias: `true` maps to [`MaxDepthStrategy::KeepMax`],
    /// `false` to [`MaxDepthStrategy::DiscardMax`].
    #[deprecated(since = "0.3.0", note = "use set_max_depth_strategy instead")]
    pub fn set_keep_far(&mut self, keep_far: bool) {
        self.set_max_depth_strategy(if keep_far {
            MaxDepthStrategy::KeepMax
        } else {
            MaxDepthStrategy::DiscardMax
        });
    }

    /// Legacy boolean alias readback. Reports `true` for any strategy other
    /// than [`MaxDepthStrategy::DiscardMax`], matching the old callers'
    /// keep-biased default.
    #[deprecated(since = "0.3.0", note = "use max_depth_strategy instead")]
    pub fn keep_far(&self) -> bool {
        self.strategy != MaxDepthStrategy::DiscardMax
    }

    /// Monotonic revision counter. Bumped by every successful setter call,
    /// even when the new value equals the old one, so a dependent artifact
    /// can never miss an invalidation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
