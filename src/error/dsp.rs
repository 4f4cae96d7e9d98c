// Signal-processing error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// DSP error code constants
///
/// Single source of truth for the numeric codes reported by [`DspError`].
///
/// Error code range: 1001-1005
pub struct DspErrorCodes {}

impl DspErrorCodes {
    /// FFT input length is not a power of two
    pub const INVALID_LENGTH: i32 = 1001;

    /// An operation that needs samples received none
    pub const EMPTY_SIGNAL: i32 = 1002;

    /// Chirp configuration violates its invariants
    pub const INVALID_CHIRP_CONFIG: i32 = 1003;

    /// Stored feature vector has the wrong number of slots
    pub const FEATURE_LENGTH_MISMATCH: i32 = 1004;

    /// Signal sample rate differs from the one an extractor was built for
    pub const SAMPLE_RATE_MISMATCH: i32 = 1005;
}

/// Log a DSP error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_dsp_error(err: &DspError, context: &str) {
    error!(
        "DSP error in {}: code={}, component=SignalPipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Contract violations detected by the signal-processing core
///
/// Numerical degeneracies (silence, empty frame sets) are never reported
/// here; they resolve to documented sentinel values instead.
#[derive(Debug, Clone, PartialEq)]
pub enum DspError {
    /// FFT input length must be a power of two (or 0/1)
    InvalidLength { length: usize },

    /// Operation requires a non-empty signal
    EmptySignal { context: String },

    /// Chirp configuration is inconsistent
    InvalidChirpConfig { reason: String },

    /// Raw feature vector length differs from the fixed layout
    FeatureLengthMismatch { expected: usize, actual: usize },

    /// Sample rate differs from the configured one
    SampleRateMismatch { expected: u32, actual: u32 },
}

impl ErrorCode for DspError {
    fn code(&self) -> i32 {
        match self {
            DspError::InvalidLength { .. } => DspErrorCodes::INVALID_LENGTH,
            DspError::EmptySignal { .. } => DspErrorCodes::EMPTY_SIGNAL,
            DspError::InvalidChirpConfig { .. } => DspErrorCodes::INVALID_CHIRP_CONFIG,
            DspError::FeatureLengthMismatch { .. } => DspErrorCodes::FEATURE_LENGTH_MISMATCH,
            DspError::SampleRateMismatch { .. } => DspErrorCodes::SAMPLE_RATE_MISMATCH,
        }
    }

    fn message(&self) -> String {
        match self {
            DspError::InvalidLength { length } => {
                format!("FFT length must be a power of two (got {})", length)
            }
            DspError::EmptySignal { context } => {
                format!("Empty signal passed to {}", context)
            }
            DspError::InvalidChirpConfig { reason } => {
                format!("Invalid chirp configuration: {}", reason)
            }
            DspError::FeatureLengthMismatch { expected, actual } => {
                format!(
                    "Feature vector length mismatch: expected {}, got {}",
                    expected, actual
                )
            }
            DspError::SampleRateMismatch { expected, actual } => {
                format!(
                    "Sample rate mismatch: expected {} Hz, got {} Hz",
                    expected, actual
                )
            }
        }
    }
}

impl fmt::Display for DspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DspError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DspError {}
