// MFCC module - framed mel-frequency cepstral analysis
//
// Pipeline per frame: Hamming window → power spectrum (cached rustfft plan)
// → triangular mel filterbank → natural log → Type-II DCT.

use crate::dsp::{apply_window, dct, frame_signal, hamming, mel_filterbank, next_power_of_two};
use crate::dsp::{FftProcessor, Frames, ENERGY_FLOOR};

/// Framed MFCC analyzer for one sample rate and frame geometry
pub struct MfccExtractor {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft: FftProcessor,
    filterbank: Vec<Vec<f32>>,
    num_coeffs: usize,
}

impl MfccExtractor {
    /// Create an analyzer
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `frame_ms` / `hop_ms` - frame length and hop in milliseconds
    /// * `num_filters` - mel filters spanning `low_hz` … Nyquist
    /// * `num_coeffs` - cepstral coefficients kept per frame
    pub fn new(
        sample_rate: u32,
        frame_ms: f32,
        hop_ms: f32,
        num_filters: usize,
        low_hz: f32,
        num_coeffs: usize,
    ) -> Self {
        let to_samples = |ms: f32| ((ms / 1000.0) * sample_rate as f32).round().max(1.0) as usize;
        let frame_size = to_samples(frame_ms);
        let hop_size = to_samples(hop_ms);
        let fft_size = next_power_of_two(frame_size);

        Self {
            frame_size,
            hop_size,
            window: hamming(frame_size),
            fft: FftProcessor::new(fft_size),
            filterbank: mel_filterbank(
                num_filters,
                fft_size,
                sample_rate,
                low_hz,
                sample_rate as f32 / 2.0,
            ),
            num_coeffs,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn fft_size(&self) -> usize {
        self.fft.fft_size()
    }

    pub fn num_coeffs(&self) -> usize {
        self.num_coeffs
    }

    /// Analysis frames of `signal` (empty if shorter than one frame)
    pub fn frames<'a>(&self, signal: &'a [f32]) -> Frames<'a> {
        frame_signal(signal, self.frame_size, self.hop_size)
    }

    /// Windowed one-sided power spectrum of a single frame
    pub fn frame_power(&self, frame: &[f32]) -> Vec<f32> {
        self.fft.power_spectrum(&apply_window(frame, &self.window))
    }

    /// Cepstral coefficients from a frame's power spectrum
    pub fn coefficients_from_power(&self, power: &[f32]) -> Vec<f32> {
        let log_mel: Vec<f32> = self
            .filterbank
            .iter()
            .map(|filter| {
                let energy: f32 = filter.iter().zip(power.iter()).map(|(w, p)| w * p).sum();
                energy.max(ENERGY_FLOOR).ln()
            })
            .collect();
        dct(&log_mel, self.num_coeffs)
    }

    /// Coefficients of every frame of `signal`
    pub fn compute(&self, signal: &[f32]) -> Vec<Vec<f32>> {
        self.frames(signal)
            .map(|frame| self.coefficients_from_power(&self.frame_power(frame)))
            .collect()
    }
}

/// Per-coefficient mean and population variance across frames
///
/// Zero frames give all-zero statistics.
pub fn coefficient_statistics(frames: &[Vec<f32>], num_coeffs: usize) -> (Vec<f32>, Vec<f32>) {
    let mut mean = vec![0.0f32; num_coeffs];
    let mut variance = vec![0.0f32; num_coeffs];
    if frames.is_empty() {
        return (mean, variance);
    }

    let count = frames.len() as f32;
    for frame in frames {
        for (m, &c) in mean.iter_mut().zip(frame.iter()) {
            *m += c / count;
        }
    }
    for frame in frames {
        for ((v, &m), &c) in variance.iter_mut().zip(mean.iter()).zip(frame.iter()) {
            *v += (c - m) * (c - m) / count;
        }
    }
    (mean, variance)
}

/// Per-coefficient mean of frame-to-frame first differences
pub fn coefficient_deltas(frames: &[Vec<f32>], num_coeffs: usize) -> Vec<f32> {
    let mut delta = vec![0.0f32; num_coeffs];
    if frames.len() < 2 {
        return delta;
    }

    let count = (frames.len() - 1) as f32;
    for pair in frames.windows(2) {
        for ((d, &prev), &curr) in delta.iter_mut().zip(pair[0].iter()).zip(pair[1].iter()) {
            *d += (curr - prev) / count;
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: u32, frequency: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn chirp_extractor() -> MfccExtractor {
        MfccExtractor::new(48000, 25.0, 10.0, 26, 20.0, 13)
    }

    #[test]
    fn test_frame_geometry() {
        let mfcc = chirp_extractor();
        assert_eq!(mfcc.frame_size(), 1200);
        assert_eq!(mfcc.hop_size(), 480);
        assert_eq!(mfcc.fft_size(), 2048);
    }

    #[test]
    fn test_short_signal_has_no_frames() {
        let mfcc = chirp_extractor();
        assert!(mfcc.compute(&[0.5; 1000]).is_empty());
        let (mean, variance) = coefficient_statistics(&[], 13);
        assert_eq!(mean, vec![0.0; 13]);
        assert_eq!(variance, vec![0.0; 13]);
    }

    #[test]
    fn test_stationary_sine_has_low_variance() {
        let mfcc = chirp_extractor();
        let frames = mfcc.compute(&sine(48000, 1000.0, 48000));
        assert_eq!(frames.len(), (48000 - 1200) / 480 + 1);
        assert!(frames.iter().all(|f| f.len() == 13));

        let (mean, variance) = coefficient_statistics(&frames, 13);
        assert!(mean.iter().all(|m| m.is_finite()));
        for (i, v) in variance.iter().enumerate() {
            assert!(*v < 1.0, "coefficient {} variance {}", i, v);
        }
    }

    #[test]
    fn test_different_tones_differ() {
        let mfcc = chirp_extractor();
        let (low, _) = coefficient_statistics(&mfcc.compute(&sine(48000, 300.0, 24000)), 13);
        let (high, _) = coefficient_statistics(&mfcc.compute(&sine(48000, 6000.0, 24000)), 13);
        let distance: f32 = low.iter().zip(&high).map(|(a, b)| (a - b).powi(2)).sum();
        assert!(distance > 1.0, "distance {}", distance);
    }

    #[test]
    fn test_statistics_and_deltas() {
        let frames = vec![vec![1.0, 2.0], vec![3.0, 2.0], vec![5.0, 2.0]];
        let (mean, variance) = coefficient_statistics(&frames, 2);
        assert_eq!(mean, vec![3.0, 2.0]);
        assert!((variance[0] - 8.0 / 3.0).abs() < 1e-6);
        assert_eq!(variance[1], 0.0);
        assert_eq!(coefficient_deltas(&frames, 2), vec![2.0, 0.0]);
        assert_eq!(coefficient_deltas(&frames[..1], 2), vec![0.0, 0.0]);
    }
}
