// Window module - analysis windows and signal framing

use std::f32::consts::PI;

/// Hann window: w[i] = 0.5(1 − cos(2πi/(L−1)))
pub fn hann(length: usize) -> Vec<f32> {
    cosine_window(length, 0.5, 0.5)
}

/// Hamming window: w[i] = 0.54 − 0.46·cos(2πi/(L−1))
pub fn hamming(length: usize) -> Vec<f32> {
    cosine_window(length, 0.54, 0.46)
}

fn cosine_window(length: usize, a0: f32, a1: f32) -> Vec<f32> {
    if length == 1 {
        return vec![1.0];
    }
    let denom = length as f32 - 1.0;
    (0..length)
        .map(|i| a0 - a1 * (2.0 * PI * i as f32 / denom).cos())
        .collect()
}

/// Multiply a signal by a window elementwise
///
/// Output has the signal's length; samples beyond the window are zero.
pub fn apply_window(signal: &[f32], window: &[f32]) -> Vec<f32> {
    signal
        .iter()
        .enumerate()
        .map(|(i, &x)| window.get(i).map_or(0.0, |&w| x * w))
        .collect()
}

/// Split a signal into equal-length, possibly overlapping frames
///
/// The returned iterator is lazy and cheap to clone, so it can be restarted.
/// A trailing partial frame is dropped. A hop of 0 is treated as 1.
pub fn frame_signal(signal: &[f32], frame_size: usize, hop_size: usize) -> Frames<'_> {
    Frames {
        signal,
        frame_size,
        hop_size: hop_size.max(1),
        position: 0,
    }
}

/// Lazy iterator over analysis frames
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    signal: &'a [f32],
    frame_size: usize,
    hop_size: usize,
    position: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a [f32];

    fn next(&mut self) -> Option<Self::Item> {
        if self.frame_size == 0 || self.position + self.frame_size > self.signal.len() {
            return None;
        }
        let frame = &self.signal[self.position..self.position + self.frame_size];
        self.position += self.hop_size;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.frame_size == 0 || self.position + self.frame_size > self.signal.len()
        {
            0
        } else {
            (self.signal.len() - self.position - self.frame_size) / self.hop_size + 1
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_endpoints_and_peak() {
        let w = hann(9);
        assert!(w[0].abs() < 1e-6);
        assert!(w[8].abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hamming_endpoints() {
        let w = hamming(11);
        assert!((w[0] - 0.08).abs() < 1e-6);
        assert!((w[5] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_sample_window() {
        assert_eq!(hann(1), vec![1.0]);
        assert!(hamming(0).is_empty());
    }

    #[test]
    fn test_apply_window_zero_outside_overlap() {
        let out = apply_window(&[2.0, 2.0, 2.0, 2.0], &[0.5, 1.0]);
        assert_eq!(out, vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_frames_drop_partial_tail() {
        let signal: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let frames: Vec<&[f32]> = frame_signal(&signal, 4, 3).collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(frames[2], &[6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_frames_are_restartable() {
        let signal = vec![1.0f32; 100];
        let frames = frame_signal(&signal, 10, 5);
        assert_eq!(frames.len(), 19);
        let first_pass = frames.clone().count();
        let second_pass = frames.count();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_signal_shorter_than_frame_yields_nothing() {
        let signal = vec![1.0f32; 5];
        assert_eq!(frame_signal(&signal, 10, 5).count(), 0);
        assert_eq!(frame_signal(&signal, 0, 5).count(), 0);
    }
}
