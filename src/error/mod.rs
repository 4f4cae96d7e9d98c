// Error types for the room fingerprint pipeline
//
// This module defines custom error types for signal-processing and capture
// operations, providing structured error handling with numeric codes that
// survive a process boundary.

mod capture;
mod dsp;

pub use capture::{log_capture_error, CaptureError, CaptureErrorCodes};
pub use dsp::{log_dsp_error, DspError, DspErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and CLI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
