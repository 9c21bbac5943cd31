// error.rs — Harness error type.
//
// Every verdict in this crate is a synchronous `Result`. A comparison that
// fails returns one of the mismatch variants with enough context to debug
// without re-running: coordinate, expected vs. actual, magnitude vs.
// tolerance.
//
// `UnsupportedFeature` is the odd one out: it is not a failure. The
// registry turns it into a skipped test case (see `Error::is_skip`).

use thiserror::Error;

use crate::gpu::device::GpuError;
use crate::mat::{ElemType, Size};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the harness.
#[derive(Debug, Error)]
pub enum Error {
    /// Device index beyond the number of physically present devices.
    #[error("device index {index} out of range ({available} device(s) present)")]
    OutOfRange { index: usize, available: usize },

    /// Two buffers disagree on size or element type.
    #[error("shape mismatch: {lhs_size} {lhs_type} vs {rhs_size} {rhs_type}")]
    ShapeMismatch {
        lhs_size: Size,
        lhs_type: ElemType,
        rhs_size: Size,
        rhs_type: ElemType,
    },

    /// Element values differ beyond tolerance. Reports the first offending
    /// element in row-major scan order and the overall maximum difference.
    #[error(
        "value mismatch at (x={x}, y={y}, channel={channel}): expected {expected}, got {actual}, \
         |diff| = {diff} > eps = {eps} (max |diff| over buffer = {max_diff})"
    )]
    ValueMismatch {
        x: usize,
        y: usize,
        channel: usize,
        expected: f64,
        actual: f64,
        diff: f64,
        eps: f64,
        max_diff: f64,
    },

    /// Similarity score above tolerance (0 = identical).
    #[error("buffers not similar: score {score} > eps = {eps}")]
    Dissimilar { score: f64, eps: f64 },

    /// A single component of a scalar or point differs beyond tolerance.
    #[error("{what}: expected {expected}, got {actual} (eps = {eps})")]
    ComponentMismatch {
        what: String,
        expected: f64,
        actual: f64,
        eps: f64,
    },

    /// Device or build lacks a capability. Signals "skip", not "fail".
    #[error("device '{device}' does not support {feature}")]
    UnsupportedFeature { device: String, feature: String },

    /// Keypoint sets lack a bidirectional correspondence.
    #[error(
        "keypoint mismatch: {gold_len} gold vs {actual_len} actual; \
         unmatched gold {unmatched_gold:?}, unmatched actual {unmatched_actual:?}"
    )]
    KeypointMismatch {
        gold_len: usize,
        actual_len: usize,
        unmatched_gold: Vec<usize>,
        unmatched_actual: Vec<usize>,
    },

    /// A caller-supplied argument is malformed (bad mask, channel count, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration value could not be parsed.
    #[error("invalid configuration {key}={value}: {reason}")]
    Config {
        key: String,
        value: String,
        reason: String,
    },

    /// Only 8-bit buffers with 1, 3 or 4 channels can be written as PNG.
    #[error("cannot dump {0} buffer as an image (need 8U with 1, 3 or 4 channels)")]
    UnsupportedDump(ElemType),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[cfg(feature = "viewer")]
    #[error("viewer window: {0}")]
    Viewer(#[from] minifb::Error),
}

impl Error {
    /// True when the error means "this case cannot run here" rather than
    /// "this case found a defect".
    pub fn is_skip(&self) -> bool {
        matches!(self, Error::UnsupportedFeature { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::Depth;

    #[test]
    fn test_only_unsupported_feature_skips() {
        let skip = Error::UnsupportedFeature {
            device: "llvmpipe".into(),
            feature: "NATIVE_DOUBLE".into(),
        };
        assert!(skip.is_skip());
        assert!(!Error::OutOfRange { index: 3, available: 1 }.is_skip());
    }

    #[test]
    fn test_value_mismatch_message_has_context() {
        let e = Error::ValueMismatch {
            x: 2,
            y: 1,
            channel: 0,
            expected: 10.0,
            actual: 12.5,
            diff: 2.5,
            eps: 1.0,
            max_diff: 2.5,
        };
        let msg = e.to_string();
        assert!(msg.contains("x=2, y=1"), "{msg}");
        assert!(msg.contains("expected 10"), "{msg}");
        assert!(msg.contains("eps = 1"), "{msg}");
    }

    #[test]
    fn test_shape_mismatch_message() {
        let e = Error::ShapeMismatch {
            lhs_size: Size::new(4, 4),
            lhs_type: ElemType::new(Depth::U8, 1),
            rhs_size: Size::new(4, 3),
            rhs_type: ElemType::new(Depth::F32, 3),
        };
        assert_eq!(e.to_string(), "shape mismatch: 4x4 8UC1 vs 4x3 32FC3");
    }
}
