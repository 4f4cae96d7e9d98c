// Decay module - Schroeder backward integration and decay-time estimates
//
// The Schroeder curve E(t) = ∫_t^∞ h²(τ)dτ / ∫_0^∞ h²(τ)dτ gives a smooth,
// monotonically decreasing energy decay from a single impulse response.
// RT60 uses the T30 method (−5 dB to −35 dB, doubled); EDT extrapolates the
// first 10 dB of decay by six.

use crate::dsp::power_to_db;

/// RT60 bounds in seconds
pub const RT60_RANGE: (f32, f32) = (0.1, 5.0);

/// EDT bounds in seconds
pub const EDT_RANGE: (f32, f32) = (0.05, 3.0);

/// Decay time reported when the curve never reaches the required level
pub const DECAY_FALLBACK_SECONDS: f32 = 0.5;

/// Normalized backward cumulative energy of `ir`
///
/// Starts at 1.0 and decreases to the last sample's share of the energy.
/// A silent response yields all zeros.
pub fn schroeder_integration(ir: &[f32]) -> Vec<f32> {
    let mut curve = vec![0.0f32; ir.len()];
    let mut cumulative = 0.0f64;
    for (i, &x) in ir.iter().enumerate().rev() {
        cumulative += (x as f64) * (x as f64);
        curve[i] = cumulative as f32;
    }

    let total = cumulative;
    if total <= 0.0 {
        return curve;
    }
    for value in curve.iter_mut() {
        *value = (*value as f64 / total) as f32;
    }
    curve
}

/// Schroeder curve in dB (0 dB at the start)
pub fn schroeder_decay_db(ir: &[f32]) -> Vec<f32> {
    schroeder_integration(ir)
        .into_iter()
        .map(power_to_db)
        .collect()
}

/// Reverberation time via T30 extrapolation, clamped to [0.1 s, 5 s]
pub fn estimate_rt60(ir: &[f32], sample_rate: u32) -> f32 {
    let Some(decay) = audible_decay_db(ir) else {
        return DECAY_FALLBACK_SECONDS;
    };
    let rt60 = match (
        first_crossing(&decay, -5.0),
        first_crossing(&decay, -35.0),
    ) {
        (Some(t5), Some(t35)) => 2.0 * t35.saturating_sub(t5) as f32 / sample_rate as f32,
        _ => DECAY_FALLBACK_SECONDS,
    };
    rt60.clamp(RT60_RANGE.0, RT60_RANGE.1)
}

/// Early decay time (first 10 dB × 6), clamped to [0.05 s, 3 s]
pub fn estimate_edt(ir: &[f32], sample_rate: u32) -> f32 {
    let Some(decay) = audible_decay_db(ir) else {
        return DECAY_FALLBACK_SECONDS;
    };
    let edt = match first_crossing(&decay, -10.0) {
        Some(t10) => 6.0 * t10 as f32 / sample_rate as f32,
        None => DECAY_FALLBACK_SECONDS,
    };
    edt.clamp(EDT_RANGE.0, EDT_RANGE.1)
}

/// Decay curve in dB, or None for an empty or silent response
fn audible_decay_db(ir: &[f32]) -> Option<Vec<f32>> {
    let curve = schroeder_integration(ir);
    match curve.first() {
        Some(&start) if start > 0.0 => Some(curve.into_iter().map(power_to_db).collect()),
        _ => None,
    }
}

fn first_crossing(decay_db: &[f32], level_db: f32) -> Option<usize> {
    decay_db.iter().position(|&db| db <= level_db)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Amplitude envelope exp(-n/(sr·τ)) whose energy falls 60 dB in `rt60` seconds
    fn exponential_decay(sample_rate: u32, rt60: f32, seconds: f32) -> Vec<f32> {
        let tau = rt60 / (3.0 * std::f32::consts::LN_10);
        let len = (seconds * sample_rate as f32) as usize;
        (0..len)
            .map(|n| (-(n as f32) / (sample_rate as f32 * tau)).exp())
            .collect()
    }

    #[test]
    fn test_schroeder_starts_at_one_and_decreases() {
        let ir = exponential_decay(8000, 0.5, 1.0);
        let curve = schroeder_integration(&ir);
        assert!((curve[0] - 1.0).abs() < 1e-6);
        for pair in curve.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_schroeder_of_silence_is_zero() {
        let curve = schroeder_integration(&[0.0; 16]);
        assert!(curve.iter().all(|&v| v == 0.0));
        assert!(schroeder_integration(&[]).is_empty());
    }

    #[test]
    fn test_rt60_matches_analytic_decay() {
        let sample_rate = 16000;
        let ir = exponential_decay(sample_rate, 1.0, 3.0);
        let rt60 = estimate_rt60(&ir, sample_rate);
        assert!(
            (rt60 - 1.0).abs() < 0.2,
            "expected RT60 ≈ 1.0 s, got {} s",
            rt60
        );
    }

    #[test]
    fn test_edt_matches_analytic_decay() {
        let sample_rate = 16000;
        let ir = exponential_decay(sample_rate, 0.6, 2.0);
        let edt = estimate_edt(&ir, sample_rate);
        assert!((edt - 0.6).abs() < 0.12, "expected EDT ≈ 0.6 s, got {} s", edt);
    }

    #[test]
    fn test_rt60_clamps_extremes() {
        let sample_rate = 48000;
        let mut impulse = vec![0.0f32; 4800];
        impulse[0] = 1.0;
        assert_eq!(estimate_rt60(&impulse, sample_rate), RT60_RANGE.0);

        let slow = exponential_decay(8000, 20.0, 30.0);
        assert_eq!(estimate_rt60(&slow, 8000), RT60_RANGE.1);
    }

    #[test]
    fn test_edt_clamps_extremes() {
        let mut impulse = vec![0.0f32; 4800];
        impulse[0] = 1.0;
        assert_eq!(estimate_edt(&impulse, 48000), EDT_RANGE.0);

        let slow = exponential_decay(8000, 20.0, 30.0);
        assert_eq!(estimate_edt(&slow, 8000), EDT_RANGE.1);
    }

    #[test]
    fn test_degenerate_input_uses_fallback() {
        assert_eq!(estimate_rt60(&[], 48000), DECAY_FALLBACK_SECONDS);
        assert_eq!(estimate_edt(&[0.0; 100], 48000), DECAY_FALLBACK_SECONDS);
    }
}
