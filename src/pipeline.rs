// Pipeline module - capture → impulse response → feature vector
//
// This is the composition layer: the feature extractors never call the
// impulse-response extractor themselves, the fingerprinter wires them.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ambient::{AmbientFeatureExtractor, AmbientFeatureVector};
use crate::capture::{AmbientCaptureResult, CaptureResult};
use crate::config::PipelineConfig;
use crate::decomposition::{OrientationAwareExtractor, OrientationAwareFeatures};
use crate::error::{log_dsp_error, DspError};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::impulse::{ImpulseResponse, ImpulseResponseExtractor};

/// One training/inference sample, tagged by capture mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureSample {
    Chirp(FeatureVector),
    Ambient(AmbientFeatureVector),
}

impl FeatureSample {
    /// Fixed-length numeric vector (60 for chirp, 73 for ambient)
    pub fn raw(&self) -> &[f32] {
        match self {
            FeatureSample::Chirp(features) => &features.raw,
            FeatureSample::Ambient(features) => &features.raw,
        }
    }

    pub fn is_chirp(&self) -> bool {
        matches!(self, FeatureSample::Chirp(_))
    }
}

/// Turns captures into feature vectors using one configuration
#[derive(Debug, Clone, Default)]
pub struct RoomFingerprinter {
    config: PipelineConfig,
}

impl RoomFingerprinter {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Deconvolve and trim a chirp capture
    pub fn extract_impulse_response(&self, capture: &CaptureResult) -> Result<ImpulseResponse, DspError> {
        let ir = ImpulseResponseExtractor::new(self.config.deconvolution.clone()).extract(capture)?;
        tracing::debug!(
            samples = ir.len(),
            duration_seconds = ir.duration_seconds,
            "[Pipeline] Impulse response extracted"
        );
        Ok(ir)
    }

    /// 60-slot chirp fingerprint of a capture
    pub fn extract_features_from_capture(&self, capture: &CaptureResult) -> Result<FeatureVector, DspError> {
        let ir = self.extract_impulse_response(capture)?;
        let features = FeatureExtractor::with_config(ir.sample_rate, self.config.chirp_features.clone())
            .extract(&ir)?;
        tracing::info!(
            rt60 = features.rt60,
            edt = features.edt,
            c50 = features.c50,
            "[Pipeline] Chirp features extracted"
        );
        Ok(features)
    }

    /// 68-slot early/late split of a capture
    pub fn extract_orientation_aware_from_capture(
        &self,
        capture: &CaptureResult,
    ) -> Result<OrientationAwareFeatures, DspError> {
        let ir = self.extract_impulse_response(capture)?;
        let features = OrientationAwareExtractor::with_config(
            ir.sample_rate,
            self.config.mixing_time.clone(),
            self.config.chirp_features.clone(),
        )
        .extract(&ir)?;
        tracing::info!(
            mixing_time_ms = features.metadata.mixing_time_ms,
            confidence = features.metadata.confidence,
            "[Pipeline] Orientation-aware features extracted"
        );
        Ok(features)
    }

    /// 73-slot passive fingerprint of a recording
    pub fn extract_ambient_from_capture(&self, capture: &AmbientCaptureResult) -> AmbientFeatureVector {
        let features = AmbientFeatureExtractor::with_config(capture.sample_rate, self.config.ambient.clone())
            .extract(&capture.audio);
        tracing::info!(
            noise_floor_db = features.noise_floor_db,
            samples = capture.audio.len(),
            "[Pipeline] Ambient features extracted"
        );
        features
    }

    pub fn sample_from_chirp(&self, capture: &CaptureResult) -> Result<FeatureSample, DspError> {
        self.extract_features_from_capture(capture)
            .map(FeatureSample::Chirp)
    }

    pub fn sample_from_ambient(&self, capture: &AmbientCaptureResult) -> FeatureSample {
        FeatureSample::Ambient(self.extract_ambient_from_capture(capture))
    }

    /// Extract features of many independent captures in parallel
    ///
    /// Results keep the input order; one failing capture does not affect
    /// the others.
    pub fn extract_batch(&self, captures: &[CaptureResult]) -> Vec<Result<FeatureVector, DspError>> {
        tracing::info!(captures = captures.len(), "[Pipeline] Batch extraction starting");
        captures
            .par_iter()
            .map(|capture| {
                self.extract_features_from_capture(capture).inspect_err(|err| {
                    log_dsp_error(err, "extract_batch");
                })
            })
            .collect()
    }
}
