// Stats module - descriptive statistics and level conversions
//
// Empty inputs produce 0.0 rather than NaN; level conversions floor their
// argument at ENERGY_FLOOR so silence maps to a finite dB value.

/// Floor applied before taking logarithms of amplitudes or energies
pub const ENERGY_FLOOR: f32 = 1e-10;

pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population variance
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&x| (x - m) * (x - m)).sum::<f32>() / values.len() as f32
}

pub fn std_dev(values: &[f32]) -> f32 {
    variance(values).sqrt()
}

/// Percentile (0-100) with linear interpolation between order statistics
pub fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f32;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn rms(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&x| x * x).sum::<f32>() / values.len() as f32).sqrt()
}

/// Amplitude to decibels: 20·log10(max(x, 1e-10))
pub fn linear_to_db(value: f32) -> f32 {
    20.0 * value.max(ENERGY_FLOOR).log10()
}

/// Decibels to amplitude: 10^(dB/20)
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Energy or power to decibels: 10·log10(max(x, 1e-10))
pub fn power_to_db(value: f32) -> f32 {
    10.0 * value.max(ENERGY_FLOOR).log10()
}

/// Scale a signal so its peak absolute value is 1
///
/// A silent signal (peak exactly 0) is returned unchanged.
pub fn normalize(signal: &[f32]) -> Vec<f32> {
    let peak = signal.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    if peak == 0.0 {
        return signal.to_vec();
    }
    signal.iter().map(|&x| x / peak).collect()
}
