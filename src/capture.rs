// Capture module - probe playback, recording and orientation snapshots
//
// Platform I/O lives behind three traits. A `CaptureSession` owns one of
// each and runs the timing contract the deconvolver relies on: recording
// starts first, playback begins after the pre-delay, and recording covers
// pre-delay + chirp + reverb tail. The samples the sink reports as rendered
// are kept as the deconvolution reference.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::chirp::{generate_chirp, ChirpConfig};
use crate::config::CaptureTimingConfig;
use crate::error::{log_capture_error, CaptureError};
use crate::orientation::DeviceOrientation;

/// Microphone-like input
pub trait AudioSource: Send + Sync {
    /// Record `duration_seconds` of mono audio
    ///
    /// Must deliver at least `ceil(duration_seconds · sample_rate)` samples.
    fn capture(
        &self,
        duration_seconds: f32,
        sample_rate: u32,
    ) -> impl Future<Output = Result<Vec<f32>, CaptureError>> + Send;
}

/// Speaker-like output
pub trait AudioSink: Send + Sync {
    /// Play `signal` and resolve with the exact samples rendered
    fn play(
        &self,
        signal: &[f32],
        volume: f32,
    ) -> impl Future<Output = Result<Vec<f32>, CaptureError>> + Send;
}

/// Best-effort orientation sensor
pub trait OrientationSource: Send + Sync {
    fn snapshot(&self) -> Option<DeviceOrientation>;
}

/// Orientation source for devices without a sensor
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOrientation;

impl OrientationSource for NoOrientation {
    fn snapshot(&self) -> Option<DeviceOrientation> {
        None
    }
}

/// Recording of one chirp probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub captured: Vec<f32>,
    /// Samples actually emitted, phase-aligned with playback
    pub chirp_reference: Vec<f32>,
    pub sample_rate: u32,
    pub config: ChirpConfig,
    pub timestamp_ms: u64,
    pub orientation: Option<DeviceOrientation>,
}

/// Passive recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientCaptureResult {
    pub audio: Vec<f32>,
    pub sample_rate: u32,
    pub duration_seconds: f32,
    pub timestamp_ms: u64,
    pub orientation: Option<DeviceOrientation>,
}

/// Caller-owned capture handle with explicit start/stop lifecycle
pub struct CaptureSession<S, K, O = NoOrientation> {
    source: S,
    sink: K,
    orientation: O,
    timing: CaptureTimingConfig,
    running: AtomicBool,
}

impl<S, K> CaptureSession<S, K, NoOrientation>
where
    S: AudioSource,
    K: AudioSink,
{
    /// Session without an orientation sensor
    pub fn without_orientation(source: S, sink: K, timing: CaptureTimingConfig) -> Self {
        Self::new(source, sink, NoOrientation, timing)
    }
}

impl<S, K, O> CaptureSession<S, K, O>
where
    S: AudioSource,
    K: AudioSink,
    O: OrientationSource,
{
    pub fn new(source: S, sink: K, orientation: O, timing: CaptureTimingConfig) -> Self {
        Self {
            source,
            sink,
            orientation,
            timing,
            running: AtomicBool::new(false),
        }
    }

    pub fn timing(&self) -> &CaptureTimingConfig {
        &self.timing
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// # Errors
    /// `AlreadyRunning` if the session was already started.
    pub fn start(&self) -> Result<(), CaptureError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CaptureError::AlreadyRunning)?;
        tracing::info!("[CaptureSession] Started");
        Ok(())
    }

    /// # Errors
    /// `NotRunning` if the session is not started.
    pub fn stop(&self) -> Result<(), CaptureError> {
        self.running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CaptureError::NotRunning)?;
        tracing::info!("[CaptureSession] Stopped");
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), CaptureError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(CaptureError::NotRunning)
        }
    }

    /// Play a chirp and record the room's response
    ///
    /// # Errors
    /// * `NotRunning` before `start()`
    /// * `Signal` for an invalid chirp configuration
    /// * any source/sink failure, or `ShortCapture` if the recording is short
    pub async fn capture_chirp(&self, config: &ChirpConfig) -> Result<CaptureResult, CaptureError> {
        self.ensure_running()?;
        let chirp = generate_chirp(config)?;

        let chirp_ms = (config.duration_seconds as f64 * 1000.0).round() as u64;
        let total_ms = self.timing.pre_delay_ms + chirp_ms + self.timing.reverb_tail_ms;
        let total_seconds = total_ms as f64 / 1000.0;
        let orientation = self.orientation.snapshot();

        tracing::debug!(
            total_ms,
            sample_rate = config.sample_rate,
            chirp_samples = chirp.len(),
            "[CaptureSession] Chirp capture starting"
        );

        let recording = self.source.capture(total_seconds as f32, config.sample_rate);
        let playback = async {
            tokio::time::sleep(Duration::from_millis(self.timing.pre_delay_ms)).await;
            self.sink.play(&chirp, self.timing.volume).await
        };
        let (captured, rendered) = tokio::join!(recording, playback);
        let captured = captured?;
        let chirp_reference = rendered?;

        check_length(captured.len(), total_seconds, config.sample_rate)?;
        tracing::info!(
            captured = captured.len(),
            rendered = chirp_reference.len(),
            has_orientation = orientation.is_some(),
            "[CaptureSession] Chirp capture complete"
        );

        Ok(CaptureResult {
            captured,
            chirp_reference,
            sample_rate: config.sample_rate,
            config: config.clone(),
            timestamp_ms: now_ms(),
            orientation,
        })
    }

    /// Record the room without emitting anything
    pub async fn capture_ambient(
        &self,
        duration_seconds: f32,
        sample_rate: u32,
    ) -> Result<AmbientCaptureResult, CaptureError> {
        self.ensure_running()?;
        let orientation = self.orientation.snapshot();
        let audio = self.source.capture(duration_seconds, sample_rate).await?;
        check_length(audio.len(), duration_seconds as f64, sample_rate)?;
        tracing::info!(
            samples = audio.len(),
            has_orientation = orientation.is_some(),
            "[CaptureSession] Ambient capture complete"
        );

        Ok(AmbientCaptureResult {
            audio,
            sample_rate,
            duration_seconds,
            timestamp_ms: now_ms(),
            orientation,
        })
    }
}

/// Samples a source must deliver for `seconds` at `sample_rate`
pub fn expected_samples(seconds: f64, sample_rate: u32) -> usize {
    // Tolerate float noise such as 1.6 × 48000 = 76800.000001
    (seconds * sample_rate as f64 - 1e-6).ceil().max(0.0) as usize
}

fn check_length(actual: usize, seconds: f64, sample_rate: u32) -> Result<(), CaptureError> {
    let expected = expected_samples(seconds, sample_rate);
    if actual < expected {
        let err = CaptureError::ShortCapture { expected, actual };
        log_capture_error(&err, "check_length");
        return Err(err);
    }
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Sink that records what it rendered; source that returns that signal
    /// delayed by the pre-delay plus one echo
    #[derive(Clone, Default)]
    struct Loopback {
        rendered: Arc<Mutex<Vec<f32>>>,
    }

    struct LoopbackSource {
        room: Loopback,
        delay_samples: usize,
        truncate_to: Option<usize>,
    }

    impl AudioSource for LoopbackSource {
        fn capture(
            &self,
            duration_seconds: f32,
            sample_rate: u32,
        ) -> impl Future<Output = Result<Vec<f32>, CaptureError>> + Send {
            let rendered = self.room.rendered.clone();
            let delay = self.delay_samples;
            let truncate_to = self.truncate_to;
            async move {
                // Long enough for playback to have started and finished
                tokio::time::sleep(Duration::from_millis(50)).await;
                let len = (duration_seconds as f64 * sample_rate as f64).round() as usize;
                let mut out = vec![0.0f32; len];
                let signal = rendered.lock().unwrap().clone();
                for (i, &x) in signal.iter().enumerate() {
                    if let Some(slot) = out.get_mut(i + delay) {
                        *slot += x;
                    }
                    if let Some(slot) = out.get_mut(i + delay + 400) {
                        *slot += 0.4 * x;
                    }
                }
                if let Some(n) = truncate_to {
                    out.truncate(n);
                }
                Ok(out)
            }
        }
    }

    impl AudioSink for Loopback {
        fn play(
            &self,
            signal: &[f32],
            volume: f32,
        ) -> impl Future<Output = Result<Vec<f32>, CaptureError>> + Send {
            let rendered: Vec<f32> = signal.iter().map(|x| x * volume).collect();
            let store = self.rendered.clone();
            async move {
                *store.lock().unwrap() = rendered.clone();
                Ok(rendered)
            }
        }
    }

    struct DeniedSource;

    impl AudioSource for DeniedSource {
        async fn capture(&self, _: f32, _: u32) -> Result<Vec<f32>, CaptureError> {
            Err(CaptureError::PermissionDenied)
        }
    }

    struct FixedOrientation(DeviceOrientation);

    impl OrientationSource for FixedOrientation {
        fn snapshot(&self) -> Option<DeviceOrientation> {
            Some(self.0)
        }
    }

    fn fast_timing() -> CaptureTimingConfig {
        CaptureTimingConfig {
            pre_delay_ms: 10,
            reverb_tail_ms: 200,
            volume: 0.5,
        }
    }

    fn loopback_session(truncate_to: Option<usize>) -> CaptureSession<LoopbackSource, Loopback> {
        let room = Loopback::default();
        let source = LoopbackSource {
            room: room.clone(),
            delay_samples: 480,
            truncate_to,
        };
        CaptureSession::without_orientation(source, room, fast_timing())
    }

    #[test]
    fn test_lifecycle() {
        let session = loopback_session(None);
        assert!(!session.is_running());
        assert_eq!(session.stop(), Err(CaptureError::NotRunning));
        session.start().unwrap();
        assert_eq!(session.start(), Err(CaptureError::AlreadyRunning));
        session.stop().unwrap();
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_capture_requires_start() {
        let session = loopback_session(None);
        let result = session.capture_chirp(&ChirpConfig::audible(16000)).await;
        assert_eq!(result.unwrap_err(), CaptureError::NotRunning);
    }

    #[tokio::test]
    async fn test_chirp_capture_keeps_rendered_reference() {
        let session = loopback_session(None);
        session.start().unwrap();
        let config = ChirpConfig::audible(44100);
        let result = session.capture_chirp(&config).await.unwrap();

        let chirp = generate_chirp(&config).unwrap();
        assert_eq!(result.chirp_reference.len(), chirp.len());
        assert!((result.chirp_reference[1000] - 0.5 * chirp[1000]).abs() < 1e-7);
        // 10 ms pre-delay + 500 ms chirp + 200 ms tail
        assert_eq!(result.captured.len(), expected_samples(0.71, 44100));
        assert_eq!(result.sample_rate, 44100);
        assert_eq!(result.orientation, None);
        assert!(result.timestamp_ms > 0);
    }

    #[tokio::test]
    async fn test_short_recording_rejected() {
        let session = loopback_session(Some(1000));
        session.start().unwrap();
        let err = session
            .capture_chirp(&ChirpConfig::audible(44100))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CaptureError::ShortCapture {
                expected: 31311,
                actual: 1000
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_chirp_surfaces_as_signal_error() {
        let session = loopback_session(None);
        session.start().unwrap();
        let mut config = ChirpConfig::audible(16000);
        config.start_frequency = 5000.0;
        config.end_frequency = 1000.0;
        let err = session.capture_chirp(&config).await.unwrap_err();
        assert!(matches!(err, CaptureError::Signal { .. }));
    }

    #[tokio::test]
    async fn test_permission_denied_propagates() {
        let session = CaptureSession::new(
            DeniedSource,
            Loopback::default(),
            NoOrientation,
            fast_timing(),
        );
        session.start().unwrap();
        let err = session.capture_ambient(1.0, 16000).await.unwrap_err();
        assert_eq!(err, CaptureError::PermissionDenied);
    }

    #[tokio::test]
    async fn test_ambient_capture_attaches_orientation() {
        let room = Loopback::default();
        let source = LoopbackSource {
            room: room.clone(),
            delay_samples: 0,
            truncate_to: None,
        };
        let pose = DeviceOrientation::new(90.0, 30.0, 0.0, 7);
        let session = CaptureSession::new(source, room, FixedOrientation(pose), fast_timing());
        session.start().unwrap();

        let result = session.capture_ambient(0.25, 16000).await.unwrap();
        assert_eq!(result.audio.len(), 4000);
        assert_eq!(result.duration_seconds, 0.25);
        assert_eq!(result.orientation, Some(pose));
    }

    #[test]
    fn test_expected_samples_tolerates_float_noise() {
        assert_eq!(expected_samples(1.6, 48000), 76800);
        assert_eq!(expected_samples(0.0, 48000), 0);
        assert_eq!(expected_samples(0.5, 3), 2);
    }
}
