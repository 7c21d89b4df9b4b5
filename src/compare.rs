//! Depth comparison modes and their per-pixel keep semantics.
//!
//! A mode decides, given the two depth samples `d0` and `d1` at a pixel,
//! whether the color sample survives the masking pass. `Equal` and `NotEqual`
//! are tolerance-based and read the configured epsilon; the other modes
//! ignore it.

use crate::config::ConfigError;

/// The depth value that means "no geometry was rendered at this pixel" —
/// the far end of the normalized depth range.
pub const MAX_DEPTH: f32 = 1.0;

/// Per-pixel depth comparison mode for the masking stage.
///
/// The keep condition is evaluated over `d0` (depth buffer 0) and `d1`
/// (depth buffer 1); `true` keeps the color sample, `false` discards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthCompareMode {
    /// Never keep the pixel.
    Never,
    /// Always keep the pixel.
    Always,
    /// Keep when `abs(d1 - d0) <= epsilon`.
    Equal,
    /// Keep when `abs(d1 - d0) > epsilon`.
    NotEqual,
    /// Keep when `d0 > d1`.
    #[default]
    Less,
    /// Keep when `d0 >= d1`.
    LessOrEqual,
    /// Keep when `d0 < d1`.
    Greater,
    /// Keep when `d0 <= d1`.
    GreaterOrEqual,
}

impl DepthCompareMode {
    /// Stable numeric code for host interop.
    pub fn code(self) -> u32 {
        match self {
            DepthCompareMode::Never => 0,
            DepthCompareMode::Always => 1,
            DepthCompareMode::Equal => 2,
            DepthCompareMode::NotEqual => 3,
            DepthCompareMode::Less => 4,
            DepthCompareMode::LessOrEqual => 5,
            DepthCompareMode::Greater => 6,
            DepthCompareMode::GreaterOrEqual => 7,
        }
    }

    /// Inverse of [`code`](Self::code). Codes outside the enumeration are
    /// rejected rather than silently mapped to a fallback mode.
    pub fn from_code(code: u32) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(DepthCompareMode::Never),
            1 => Ok(DepthCompareMode::Always),
            2 => Ok(DepthCompareMode::Equal),
            3 => Ok(DepthCompareMode::NotEqual),
            4 => Ok(DepthCompareMode::Less),
            5 => Ok(DepthCompareMode::LessOrEqual),
            6 => Ok(DepthCompareMode::Greater),
            7 => Ok(DepthCompareMode::GreaterOrEqual),
            other => Err(ConfigError::UnknownCompareMode(other)),
        }
    }

    /// Whether this mode reads the epsilon tolerance.
    pub fn uses_epsilon(self) -> bool {
        matches!(self, DepthCompareMode::Equal | DepthCompareMode::NotEqual)
    }

    /// The WGSL keep expression over `d0`, `d1` and the emitted `EPSILON`
    /// constant. This is the text spliced into the compiled predicate.
    pub(crate) fn wgsl_keep_expr(self) -> &'static str {
        match self {
            DepthCompareMode::Never => "false",
            DepthCompareMode::Always => "true",
            DepthCompareMode::Equal => "abs(d1 - d0) <= EPSILON",
            DepthCompareMode::NotEqual => "abs(d1 - d0) > EPSILON",
            DepthCompareMode::Less => "d0 > d1",
            DepthCompareMode::LessOrEqual => "d0 >= d1",
            DepthCompareMode::Greater => "d0 < d1",
            DepthCompareMode::GreaterOrEqual => "d0 <= d1",
        }
    }

    /// CPU evaluation of the keep condition. Mirrors the WGSL expression
    /// exactly, including the epsilon handling for `Equal`/`NotEqual`.
    pub fn keeps(self, d0: f32, d1: f32, epsilon: f32) -> bool {
        match self {
            DepthCompareMode::Never => false,
            DepthCompareMode::Always => true,
            DepthCompareMode::Equal => (d1 - d0).abs() <= epsilon,
            DepthCompareMode::NotEqual => (d1 - d0).abs() > epsilon,
            DepthCompareMode::Less => d0 > d1,
            DepthCompareMode::LessOrEqual => d0 >= d1,
            DepthCompareMode::Greater => d0 < d1,
            DepthCompareMode::GreaterOrEqual => d0 <= d1,
        }
    }
}
