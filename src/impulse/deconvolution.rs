// Deconvolution module - recover the room impulse response from a recording
//
// The recording y is the emitted chirp x convolved with the room response h.
// In the frequency domain H = Y·conj(X) / (|X|² + ε): a Wiener-style inverse
// that stays bounded where the chirp has little energy.

use crate::config::TrimConfig;
use crate::dsp::{fft, next_power_of_two, normalize, rms, Complex};
use crate::error::DspError;

/// Regularized spectral deconvolution of `recorded` by `chirp`
///
/// The FFT size is the next power of two ≥ len(recorded) + len(chirp) − 1 so
/// the linear convolution does not wrap. The inverse transform is truncated
/// to the recording length *before* peak normalization: samples past
/// len(recorded) only hold acausal wraparound, so they neither appear in the
/// output nor set the normalization peak.
///
/// # Errors
/// `EmptySignal` if either input is empty.
pub fn deconvolve(recorded: &[f32], chirp: &[f32], epsilon: f32) -> Result<Vec<f32>, DspError> {
    if recorded.is_empty() || chirp.is_empty() {
        return Err(DspError::EmptySignal {
            context: "deconvolve".to_string(),
        });
    }

    let fft_size = next_power_of_two(recorded.len() + chirp.len() - 1);
    let y = fft::rfft_padded(recorded, fft_size)?;
    let x = fft::rfft_padded(chirp, fft_size)?;

    let half = fft_size / 2;
    let mut h = vec![Complex::new(0.0, 0.0); fft_size];
    for k in 0..=half.min(fft_size - 1) {
        h[k] = y[k] * x[k].conj() / (x[k].norm_sqr() + epsilon);
    }
    // Conjugate symmetry of a real impulse response
    for k in half + 1..fft_size {
        h[k] = h[fft_size - k].conj();
    }

    let mut impulse = fft::irfft(&h)?;
    impulse.truncate(recorded.len());
    Ok(normalize(&impulse))
}

/// Cut the impulse response down to the direct sound and its decay
///
/// Starts `pre_peak_margin_ms` before the absolute peak, then slides an RMS
/// window forward until the level drops below peak × `threshold_ratio`.
/// Length is kept within [`min_length_ms`, `max_length_seconds`] (bounded by
/// the available samples).
pub fn trim_impulse_response(ir: &[f32], sample_rate: u32, config: &TrimConfig) -> Vec<f32> {
    if ir.is_empty() {
        return Vec::new();
    }

    let to_samples = |ms: f32| ((ms / 1000.0) * sample_rate as f32).round() as usize;

    let (peak_idx, peak_amp) = ir
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |(best_i, best), (i, &x)| {
            if x.abs() > best {
                (i, x.abs())
            } else {
                (best_i, best)
            }
        });

    let start = peak_idx.saturating_sub(to_samples(config.pre_peak_margin_ms));
    let window = to_samples(config.rms_window_ms).max(1);
    let hop = (window / 2).max(1);
    let max_len = to_samples(config.max_length_seconds * 1000.0).max(1);
    let min_len = to_samples(config.min_length_ms);
    let threshold = peak_amp * config.threshold_ratio;

    let mut end = ir.len();
    let mut pos = peak_idx;
    while pos + window <= ir.len() && pos - start < max_len {
        if rms(&ir[pos..pos + window]) < threshold {
            end = pos;
            break;
        }
        pos += hop;
    }

    let end = end
        .max(start + min_len)
        .min(start + max_len)
        .min(ir.len());
    ir[start..end].to_vec()
}
