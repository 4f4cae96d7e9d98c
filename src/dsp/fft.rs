// FFT module - Fast Fourier Transform computation
//
// The kernel transforms (`fft`, `ifft`, `rfft`, `irfft`) are an iterative
// radix-2 Cooley-Tukey implementation: bit-reversal permutation followed by
// log2(N) butterfly stages, twiddle e^(-2πi·j/s) for stage size s.
//
// `FftProcessor` wraps a rustfft plan for a fixed frame size; the framed
// MFCC and ambient analyses run hundreds of same-size transforms and reuse
// that plan instead of rebuilding twiddles per frame.

use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::DspError;

/// Single-precision complex sample
pub type Complex = rustfft::num_complex::Complex<f32>;

/// Smallest power of two ≥ `n` (1 for `n == 0`)
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Forward FFT
///
/// # Errors
/// `InvalidLength` when the length is greater than 1 and not a power of two.
/// Callers are expected to zero-pad.
pub fn fft(input: &[Complex]) -> Result<Vec<Complex>, DspError> {
    check_length(input.len())?;
    let mut data = input.to_vec();
    fft_in_place(&mut data);
    Ok(data)
}

/// Inverse FFT: conjugate, forward transform, conjugate, scale by 1/N
pub fn ifft(input: &[Complex]) -> Result<Vec<Complex>, DspError> {
    check_length(input.len())?;
    let mut data: Vec<Complex> = input.iter().map(|c| c.conj()).collect();
    ifft_conjugated_in_place(&mut data);
    Ok(data)
}

/// FFT of a real signal zero-padded to the next power of two
///
/// Returns the full complex spectrum (not halved).
pub fn rfft(signal: &[f32]) -> Vec<Complex> {
    let mut data = real_to_complex(signal, next_power_of_two(signal.len()));
    fft_in_place(&mut data);
    data
}

/// FFT of a real signal zero-padded to exactly `size` samples
///
/// # Errors
/// `InvalidLength` if `size` is not a power of two or is shorter than the signal.
pub fn rfft_padded(signal: &[f32], size: usize) -> Result<Vec<Complex>, DspError> {
    check_length(size)?;
    if size < signal.len() {
        return Err(DspError::InvalidLength { length: size });
    }
    let mut data = real_to_complex(signal, size);
    fft_in_place(&mut data);
    Ok(data)
}

/// Inverse transform of a full spectrum, keeping the real part
pub fn irfft(spectrum: &[Complex]) -> Result<Vec<f32>, DspError> {
    Ok(ifft(spectrum)?.into_iter().map(|c| c.re).collect())
}

/// One-sided power spectrum |X|²/N (N/2+1 bins) of a zero-padded real signal
pub fn power_spectrum(signal: &[f32]) -> Vec<f32> {
    let spectrum = rfft(signal);
    let n = spectrum.len();
    spectrum[..n / 2 + 1]
        .iter()
        .map(|c| c.norm_sqr() / n as f32)
        .collect()
}

fn check_length(length: usize) -> Result<(), DspError> {
    if length > 1 && !length.is_power_of_two() {
        return Err(DspError::InvalidLength { length });
    }
    Ok(())
}

fn real_to_complex(signal: &[f32], size: usize) -> Vec<Complex> {
    let mut data = vec![Complex::new(0.0, 0.0); size];
    for (slot, &sample) in data.iter_mut().zip(signal.iter()) {
        slot.re = sample;
    }
    data
}

fn ifft_conjugated_in_place(data: &mut [Complex]) {
    fft_in_place(data);
    let scale = 1.0 / data.len().max(1) as f32;
    for c in data.iter_mut() {
        *c = c.conj() * scale;
    }
}

/// Radix-2 butterfly network; `data.len()` must be a power of two (or ≤ 1)
fn fft_in_place(data: &mut [Complex]) {
    let n = data.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two());

    bit_reverse_permute(data);

    // Twiddles computed in f64 per index so large transforms do not drift
    let twiddles: Vec<Complex> = (0..n / 2)
        .map(|k| {
            let angle = -2.0 * PI * k as f64 / n as f64;
            Complex::new(angle.cos() as f32, angle.sin() as f32)
        })
        .collect();

    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let stride = n / size;
        for start in (0..n).step_by(size) {
            for j in 0..half {
                let t = twiddles[j * stride] * data[start + j + half];
                let u = data[start + j];
                data[start + j] = u + t;
                data[start + j + half] = u - t;
            }
        }
        size *= 2;
    }
}

fn bit_reverse_permute(data: &mut [Complex]) {
    let n = data.len();
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            data.swap(i, j);
        }
    }
}

/// FFT processor that computes power spectra of fixed-size frames
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - transform size; frames shorter than this are zero-padded
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(1);
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            fft_size,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of one-sided bins produced per frame
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// One-sided power spectrum |X|²/N of an (already windowed) frame
    ///
    /// Frames longer than the FFT size are truncated.
    pub fn power_spectrum(&self, frame: &[f32]) -> Vec<f32> {
        let mut buffer = real_to_complex(&frame[..frame.len().min(self.fft_size)], self.fft_size);
        self.fft.process(&mut buffer);

        let n = self.fft_size as f32;
        buffer[..self.num_bins()]
            .iter()
            .map(|c| c.norm_sqr() / n)
            .collect()
    }

    /// One-sided magnitude spectrum |X| of an (already windowed) frame
    pub fn magnitude_spectrum(&self, frame: &[f32]) -> Vec<f32> {
        let n = self.fft_size as f32;
        self.power_spectrum(frame)
            .into_iter()
            .map(|p| (p * n).sqrt())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn to_complex(signal: &[f32]) -> Vec<Complex> {
        signal.iter().map(|&x| Complex::new(x, 0.0)).collect()
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let input = vec![Complex::new(1.0, 0.0); 6];
        assert_eq!(fft(&input), Err(DspError::InvalidLength { length: 6 }));
        assert_eq!(ifft(&input), Err(DspError::InvalidLength { length: 6 }));
    }

    #[test]
    fn test_trivial_lengths() {
        assert!(fft(&[]).unwrap().is_empty());
        let single = fft(&[Complex::new(3.0, -1.0)]).unwrap();
        assert_eq!(single, vec![Complex::new(3.0, -1.0)]);
    }

    #[test]
    fn test_impulse_has_flat_spectrum() {
        let mut signal = vec![0.0f32; 16];
        signal[0] = 1.0;
        let spectrum = fft(&to_complex(&signal)).unwrap();
        for bin in spectrum {
            assert!((bin.re - 1.0).abs() < 1e-6);
            assert!(bin.im.abs() < 1e-6);
        }
    }

    #[test]
    fn test_sine_energy_lands_in_expected_bin() {
        let n = 64;
        let signal: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 5.0 * i as f32 / n as f32).sin())
            .collect();
        let spectrum = fft(&to_complex(&signal)).unwrap();
        let peak = spectrum[..n / 2]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 5);
    }

    #[test]
    fn test_round_trip_reconstructs_signal() {
        let mut rng = StdRng::seed_from_u64(7);
        let signal: Vec<f32> = (0..1000).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let spectrum = rfft(&signal);
        assert_eq!(spectrum.len(), 1024);

        let restored = irfft(&spectrum).unwrap();
        for (i, &x) in signal.iter().enumerate() {
            assert!(
                (restored[i] - x).abs() < 1e-5,
                "sample {} differs: {} vs {}",
                i,
                restored[i],
                x
            );
        }
        for &pad in &restored[1000..] {
            assert!(pad.abs() < 1e-5);
        }
    }

    #[test]
    fn test_real_input_spectrum_is_conjugate_symmetric() {
        let mut rng = StdRng::seed_from_u64(11);
        let signal: Vec<f32> = (0..128).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let spectrum = rfft(&signal);
        let n = spectrum.len();
        assert!(spectrum[0].im.abs() < 1e-4);
        assert!(spectrum[n / 2].im.abs() < 1e-4);
        for k in 1..n / 2 {
            let diff = spectrum[k] - spectrum[n - k].conj();
            assert!(diff.norm() < 1e-3);
        }
    }

    #[test]
    fn test_rfft_padded_validates_size() {
        let signal = vec![1.0f32; 10];
        assert!(rfft_padded(&signal, 8).is_err());
        assert!(rfft_padded(&signal, 12).is_err());
        assert_eq!(rfft_padded(&signal, 16).unwrap().len(), 16);
    }

    #[test]
    fn test_power_spectrum_parseval() {
        let mut rng = StdRng::seed_from_u64(3);
        let signal: Vec<f32> = (0..256).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let power = power_spectrum(&signal);
        assert_eq!(power.len(), 129);

        // Two-sided sum of |X|²/N equals time-domain energy
        let n = power.len() - 1;
        let two_sided: f32 = power[0] + power[n] + 2.0 * power[1..n].iter().sum::<f32>();
        let energy: f32 = signal.iter().map(|x| x * x).sum();
        assert!((two_sided - energy).abs() / energy < 1e-3);
    }

    #[test]
    fn test_processor_matches_kernel() {
        let mut rng = StdRng::seed_from_u64(5);
        let frame: Vec<f32> = (0..512).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let processor = FftProcessor::new(512);
        let planned = processor.power_spectrum(&frame);
        let kernel = power_spectrum(&frame);
        assert_eq!(planned.len(), kernel.len());
        for (a, b) in planned.iter().zip(kernel.iter()) {
            assert!((a - b).abs() < 1e-3 * (1.0 + b.abs()));
        }
    }

    #[test]
    fn test_processor_zero_pads_short_frames() {
        let processor = FftProcessor::new(64);
        let spectrum = processor.magnitude_spectrum(&[1.0]);
        assert_eq!(spectrum.len(), 33);
        for bin in spectrum {
            assert!((bin - 1.0).abs() < 1e-5);
        }
    }
}
