// Capture error types and constants

use crate::error::{DspError, ErrorCode};
use log::error;
use std::fmt;

/// Capture error code constants
///
/// Error code range: 2001-2006
pub struct CaptureErrorCodes {}

impl CaptureErrorCodes {
    /// Microphone permission denied
    pub const PERMISSION_DENIED: i32 = 2001;

    /// Capture or playback device is unavailable
    pub const DEVICE_UNAVAILABLE: i32 = 2002;

    /// Source delivered fewer samples than requested
    pub const SHORT_CAPTURE: i32 = 2003;

    /// Capture session is already running
    pub const ALREADY_RUNNING: i32 = 2004;

    /// Capture session is not running
    pub const NOT_RUNNING: i32 = 2005;

    /// Probe signal could not be produced
    pub const SIGNAL: i32 = 2006;
}

/// Log a capture error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_capture_error(err: &CaptureError, context: &str) {
    error!(
        "Capture error in {}: code={}, component=CaptureSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Capture-side errors
///
/// These cover the platform collaborators (microphone, speaker) and the
/// lifecycle of a [`crate::capture::CaptureSession`]. Orientation sensor
/// failures are not errors; they surface as missing orientation data.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Microphone permission denied
    PermissionDenied,

    /// Audio device could not be opened
    DeviceUnavailable { details: String },

    /// Source returned fewer samples than the requested duration
    ShortCapture { expected: usize, actual: usize },

    /// Session already started
    AlreadyRunning,

    /// Session not started
    NotRunning,

    /// Probe signal generation failed
    Signal { reason: String },
}

impl ErrorCode for CaptureError {
    fn code(&self) -> i32 {
        match self {
            CaptureError::PermissionDenied => CaptureErrorCodes::PERMISSION_DENIED,
            CaptureError::DeviceUnavailable { .. } => CaptureErrorCodes::DEVICE_UNAVAILABLE,
            CaptureError::ShortCapture { .. } => CaptureErrorCodes::SHORT_CAPTURE,
            CaptureError::AlreadyRunning => CaptureErrorCodes::ALREADY_RUNNING,
            CaptureError::NotRunning => CaptureErrorCodes::NOT_RUNNING,
            CaptureError::Signal { .. } => CaptureErrorCodes::SIGNAL,
        }
    }

    fn message(&self) -> String {
        match self {
            CaptureError::PermissionDenied => "Microphone permission denied".to_string(),
            CaptureError::DeviceUnavailable { details } => {
                format!("Audio device unavailable: {}", details)
            }
            CaptureError::ShortCapture { expected, actual } => {
                format!(
                    "Capture too short: need {} samples, got {}",
                    expected, actual
                )
            }
            CaptureError::AlreadyRunning => {
                "Capture session already running. Call stop() first.".to_string()
            }
            CaptureError::NotRunning => {
                "Capture session not running. Call start() first.".to_string()
            }
            CaptureError::Signal { reason } => {
                format!("Probe signal error: {}", reason)
            }
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CaptureError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CaptureError {}

impl From<DspError> for CaptureError {
    fn from(err: DspError) -> Self {
        CaptureError::Signal {
            reason: err.message(),
        }
    }
}
