// DSP kernel - numeric primitives shared by every extractor
//
// Module organization:
// - fft: radix-2 FFT/IFFT, real-signal wrappers, cached-plan FftProcessor
// - window: Hann/Hamming windows and lazy signal framing
// - mel: mel filterbank and Type-II DCT
// - stats: mean/variance/percentile, RMS, dB conversion, normalization
//
// Every function here is a pure transform over borrowed input and returns
// freshly allocated output, so callers may run them on any thread.

pub mod fft;
pub mod mel;
pub mod stats;
pub mod window;

pub use fft::{
    fft, ifft, irfft, next_power_of_two, power_spectrum, rfft, rfft_padded, Complex,
    FftProcessor,
};
pub use mel::{dct, hz_to_mel, mel_filterbank, mel_to_hz};
pub use stats::{
    db_to_linear, linear_to_db, mean, normalize, percentile, power_to_db, rms, std_dev,
    variance, ENERGY_FLOOR,
};
pub use window::{apply_window, frame_signal, hamming, hann, Frames};
