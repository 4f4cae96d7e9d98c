use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use room_fingerprint::capture::{AmbientCaptureResult, CaptureResult};
use room_fingerprint::chirp::{generate_chirp, ChirpConfig, ChirpMode};
use room_fingerprint::config::PipelineConfig;
use room_fingerprint::impulse::{estimate_edt, estimate_rt60};
use room_fingerprint::orientation::{analyze_orientation_diversity, DeviceOrientation};
use room_fingerprint::pipeline::RoomFingerprinter;
use room_fingerprint::wav::{read_wav, write_wav};

#[derive(Parser, Debug)]
#[command(name = "room_cli", about = "Offline room fingerprinting over WAV files")]
struct Cli {
    /// JSON pipeline configuration; missing sections use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a probe sweep to a WAV file
    Chirp {
        #[arg(long, value_enum, default_value_t = ProbeMode::Audible)]
        mode: ProbeMode,
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
        #[arg(long)]
        output: PathBuf,
    },
    /// Deconvolve a recording against its probe and report decay times
    Impulse {
        #[arg(long)]
        recorded: PathBuf,
        #[arg(long)]
        reference: PathBuf,
        /// Optional WAV destination for the trimmed impulse response
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Chirp fingerprint of a recording (60 slots, or 68 with --orientation-aware)
    Features {
        #[arg(long)]
        recorded: PathBuf,
        #[arg(long)]
        reference: PathBuf,
        #[arg(long)]
        orientation_aware: bool,
    },
    /// Passive fingerprint of an ambient recording (73 slots)
    Ambient {
        #[arg(long)]
        input: PathBuf,
    },
    /// Octant coverage of a JSON list of device orientations
    Diversity {
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ProbeMode {
    Audible,
    Ultrasonic,
}

impl From<ProbeMode> for ChirpMode {
    fn from(mode: ProbeMode) -> Self {
        match mode {
            ProbeMode::Audible => ChirpMode::Audible,
            ProbeMode::Ultrasonic => ChirpMode::Ultrasonic,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli
        .config
        .as_deref()
        .map(PipelineConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Chirp {
            mode,
            sample_rate,
            output,
        } => run_chirp(mode.into(), sample_rate, &output),
        Commands::Impulse {
            recorded,
            reference,
            output,
        } => run_impulse(config, &recorded, &reference, output.as_deref()),
        Commands::Features {
            recorded,
            reference,
            orientation_aware,
        } => run_features(config, &recorded, &reference, orientation_aware),
        Commands::Ambient { input } => run_ambient(config, &input),
        Commands::Diversity { input } => run_diversity(config, &input),
    }
}

fn run_chirp(mode: ChirpMode, sample_rate: u32, output: &Path) -> Result<ExitCode> {
    let config = ChirpConfig::for_mode(mode, sample_rate);
    let chirp = generate_chirp(&config).context("generating probe sweep")?;
    write_wav(output, &chirp, sample_rate)?;
    emit_json(&ChirpPayload {
        output: output.display().to_string(),
        config: &config,
        samples: chirp.len(),
    })?;
    Ok(ExitCode::from(0))
}

fn run_impulse(
    config: PipelineConfig,
    recorded: &Path,
    reference: &Path,
    output: Option<&Path>,
) -> Result<ExitCode> {
    let capture = load_capture(recorded, reference)?;
    let ir = RoomFingerprinter::new(config)
        .extract_impulse_response(&capture)
        .context("extracting impulse response")?;

    if let Some(path) = output {
        write_wav(path, &ir.data, ir.sample_rate)?;
    }

    emit_json(&ImpulsePayload {
        sample_rate: ir.sample_rate,
        samples: ir.len(),
        duration_seconds: ir.duration_seconds,
        rt60: estimate_rt60(&ir.data, ir.sample_rate),
        edt: estimate_edt(&ir.data, ir.sample_rate),
    })?;
    Ok(ExitCode::from(0))
}

fn run_features(
    config: PipelineConfig,
    recorded: &Path,
    reference: &Path,
    orientation_aware: bool,
) -> Result<ExitCode> {
    let capture = load_capture(recorded, reference)?;
    let fingerprinter = RoomFingerprinter::new(config);

    if orientation_aware {
        let features = fingerprinter
            .extract_orientation_aware_from_capture(&capture)
            .context("extracting orientation-aware features")?;
        emit_json(&features)?;
    } else {
        let features = fingerprinter
            .extract_features_from_capture(&capture)
            .context("extracting chirp features")?;
        emit_json(&features)?;
    }
    Ok(ExitCode::from(0))
}

fn run_ambient(config: PipelineConfig, input: &Path) -> Result<ExitCode> {
    let (audio, sample_rate) = read_wav(input)?;
    let capture = AmbientCaptureResult {
        duration_seconds: audio.len() as f32 / sample_rate as f32,
        audio,
        sample_rate,
        timestamp_ms: 0,
        orientation: None,
    };
    let features = RoomFingerprinter::new(config).extract_ambient_from_capture(&capture);
    emit_json(&features)?;
    Ok(ExitCode::from(0))
}

fn run_diversity(config: PipelineConfig, input: &Path) -> Result<ExitCode> {
    let contents =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let orientations: Vec<DeviceOrientation> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing orientations from {}", input.display()))?;

    let stats = analyze_orientation_diversity(&orientations, &config.diversity);
    emit_json(&stats)?;

    if stats.is_sufficient(&config.diversity) {
        Ok(ExitCode::from(0))
    } else {
        for warning in &stats.warnings {
            eprintln!("warning: {warning}");
        }
        Ok(ExitCode::from(2))
    }
}

/// Pair a recording with the probe it captured
fn load_capture(recorded: &Path, reference: &Path) -> Result<CaptureResult> {
    let (captured, sample_rate) = read_wav(recorded)?;
    let (chirp_reference, reference_rate) = read_wav(reference)?;
    if sample_rate != reference_rate {
        bail!(
            "sample rate mismatch: {} is {} Hz but {} is {} Hz",
            recorded.display(),
            sample_rate,
            reference.display(),
            reference_rate
        );
    }

    let mut config = ChirpConfig::audible(sample_rate);
    config.duration_seconds = chirp_reference.len() as f32 / sample_rate as f32;

    Ok(CaptureResult {
        captured,
        chirp_reference,
        sample_rate,
        config,
        timestamp_ms: 0,
        orientation: None,
    })
}

fn emit_json<T: Serialize>(payload: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

#[derive(Serialize)]
struct ChirpPayload<'a> {
    output: String,
    config: &'a ChirpConfig,
    samples: usize,
}

#[derive(Serialize)]
struct ImpulsePayload {
    sample_rate: u32,
    samples: usize,
    duration_seconds: f32,
    rt60: f32,
    edt: f32,
}
