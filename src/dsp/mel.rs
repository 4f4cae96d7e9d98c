// Mel module - mel-scale filterbank and Type-II DCT

/// Convert frequency in Hz to mel: 2595·log10(1 + f/700)
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Inverse of [`hz_to_mel`]
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Build triangular mel filters over the one-sided spectrum of `fft_size`
///
/// Mel points are spaced evenly between `low_freq` and `high_freq`, mapped
/// back to FFT bins; filter `i` rises from bin(i) to bin(i+1) and falls to
/// bin(i+2). Each filter has `fft_size / 2 + 1` weights.
pub fn mel_filterbank(
    num_filters: usize,
    fft_size: usize,
    sample_rate: u32,
    low_freq: f32,
    high_freq: f32,
) -> Vec<Vec<f32>> {
    let num_bins = fft_size / 2 + 1;
    let nyquist = sample_rate as f32 / 2.0;
    let high_freq = high_freq.min(nyquist);
    let low_freq = low_freq.clamp(0.0, high_freq);

    let low_mel = hz_to_mel(low_freq);
    let high_mel = hz_to_mel(high_freq);
    let step = (high_mel - low_mel) / (num_filters + 1) as f32;

    let bins: Vec<usize> = (0..num_filters + 2)
        .map(|i| {
            let hz = mel_to_hz(low_mel + step * i as f32);
            let bin = ((fft_size + 1) as f32 * hz / sample_rate as f32).floor() as usize;
            bin.min(num_bins - 1)
        })
        .collect();

    (0..num_filters)
        .map(|i| {
            let (left, center, right) = (bins[i], bins[i + 1], bins[i + 2]);
            let mut filter = vec![0.0f32; num_bins];
            for (k, weight) in filter.iter_mut().enumerate().take(right + 1).skip(left) {
                *weight = if k < center {
                    (k - left) as f32 / (center - left) as f32
                } else if k == center {
                    1.0
                } else {
                    (right - k) as f32 / (right - center) as f32
                };
            }
            filter
        })
        .collect()
}

/// Type-II DCT with orthonormal scaling
///
/// X[k] = √(2/N) Σ x[n]·cos(πk(2n+1)/(2N)), with X[0] additionally scaled
/// by 1/√2. Returns `num_coeffs` values (zeros for empty input).
pub fn dct(input: &[f32], num_coeffs: usize) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; num_coeffs];
    }
    let scale = (2.0 / n as f32).sqrt();
    (0..num_coeffs)
        .map(|k| {
            let sum: f32 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f32::consts::PI * k as f32 * (2 * i + 1) as f32 / (2 * n) as f32)
                        .cos()
                })
                .sum();
            let coeff = scale * sum;
            if k == 0 {
                coeff * std::f32::consts::FRAC_1_SQRT_2
            } else {
                coeff
            }
        })
        .collect()
}
