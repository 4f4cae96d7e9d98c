// Room Fingerprint Core - acoustic room identification
// Chirp deconvolution, reverberation/cepstral features and orientation diversity

// Module declarations
pub mod ambient;
pub mod capture;
pub mod chirp;
pub mod config;
pub mod decomposition;
pub mod dsp;
pub mod error;
pub mod features;
pub mod impulse;
pub mod orientation;
pub mod pipeline;
pub mod wav;

// Re-exports for convenience
pub use ambient::{extract_ambient_features, AmbientFeatureExtractor, AmbientFeatureVector};
pub use capture::{
    AmbientCaptureResult, AudioSink, AudioSource, CaptureResult, CaptureSession, NoOrientation,
    OrientationSource,
};
pub use chirp::{generate_chirp, ChirpConfig, ChirpMode};
pub use config::PipelineConfig;
pub use decomposition::{
    detect_mixing_time, extract_orientation_aware_features, OrientationAwareExtractor,
    OrientationAwareFeatures,
};
pub use error::{CaptureError, DspError, ErrorCode};
pub use features::{extract_features, FeatureExtractor, FeatureVector};
pub use impulse::{ImpulseResponse, ImpulseResponseExtractor};
pub use orientation::{analyze_orientation_diversity, DeviceOrientation, Octant, OrientationStats};
pub use pipeline::{FeatureSample, RoomFingerprinter};
