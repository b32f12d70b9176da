mod settings;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use facemesh_id_core::enrollment::domain::enrollment_session::{EnrollmentError, EnrollmentSession};
use facemesh_id_core::features::domain::feature_extractor::FeatureExtractor;
use facemesh_id_core::features::domain::signature::Signature;
use facemesh_id_core::landmarks::infrastructure::replay_landmark_detector::{
    LandmarkRecording, ReplayLandmarkDetector,
};
use facemesh_id_core::matching::domain::matcher::{MatchPolicy, Matcher};
use facemesh_id_core::pipeline::face_pipeline::{FacePipeline, FrameRecognition};
use facemesh_id_core::pipeline::infrastructure::threaded_face_pipeline::{
    PipelineEvent, ThreadedFacePipeline,
};
use facemesh_id_core::pipeline::recognize_faces_use_case::RecognizeFacesUseCase;
use facemesh_id_core::shared::frame::Frame;
use facemesh_id_core::templates::domain::template::label_counts;
use facemesh_id_core::templates::domain::template_store::TemplateStore;
use facemesh_id_core::templates::infrastructure::json_file_template_store::JsonFileTemplateStore;
use facemesh_id_core::templates::infrastructure::timeout_template_store::TimeoutTemplateStore;

use settings::Settings;

/// Face identification from face-mesh landmark recordings.
#[derive(Parser)]
#[command(name = "facemesh-id")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Template store file (defaults to the settings value, then the data directory).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Per-component difference above which two signature components disagree.
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// A template matches while the disagreeing fraction stays below this (0.0-1.0).
    #[arg(long, global = true)]
    accept_ratio: Option<f64>,

    /// Upper bound on each template store call, in milliseconds.
    #[arg(long, global = true)]
    store_timeout_ms: Option<u64>,

    /// Persist the effective settings as the new defaults.
    #[arg(long, global = true)]
    save_settings: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Enroll one person from the faces of a landmark recording.
    Enroll {
        /// Landmark recording (JSON).
        input: PathBuf,

        /// Name stored with every captured sample.
        #[arg(long)]
        label: String,

        /// Only capture from these frame indices (comma-separated).
        #[arg(long, value_delimiter = ',')]
        frames: Option<Vec<usize>>,
    },
    /// Match every face of a landmark recording against the enrolled templates.
    Recognize {
        /// Landmark recording (JSON).
        input: PathBuf,
    },
    /// Match one signature, written as `[d0, d1, ...]`, against the enrolled templates.
    Match {
        signature: Signature,
    },
    /// List enrolled labels with their sample counts.
    List {
        /// Print every template with its signature instead of counts.
        #[arg(long)]
        verbose: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = effective_settings(&cli, Settings::load());
    validate(&cli, &settings)?;

    if cli.save_settings {
        let path = settings.save()?;
        log::info!("Settings written to {}", path.display());
    }

    let store_path = settings
        .store_path()
        .ok_or("No data directory available; pass --store")?;
    let store = open_store(&store_path, settings.store_timeout_ms);
    let policy = MatchPolicy::new(settings.tolerance, settings.accept_ratio)?;

    match cli.command {
        Command::Enroll {
            ref input,
            ref label,
            ref frames,
        } => run_enroll(input, label, frames.as_deref(), store, policy),
        Command::Recognize { ref input } => run_recognize(input, store, policy),
        Command::Match { ref signature } => run_match(signature, store.as_ref(), policy),
        Command::List { verbose } => run_list(store.as_ref(), &store_path, verbose),
    }
}

fn run_enroll(
    input: &Path,
    label: &str,
    frames: Option<&[usize]>,
    store: Arc<dyn TemplateStore>,
    policy: MatchPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let recording = LandmarkRecording::load(input)?;
    let mut pipeline = build_pipeline(&recording, store, policy);

    pipeline.start_enrollment()?;
    for index in recording.frame_indices() {
        if frames.is_some_and(|wanted| !wanted.contains(&index)) {
            continue;
        }
        pipeline.process_frame(&Frame::placeholder(index))?;
        match pipeline.capture_sample() {
            Ok(samples) => log::info!("Frame {index}: captured sample {samples}"),
            Err(e @ (EnrollmentError::NoFaceDetected | EnrollmentError::AmbiguousFace { .. })) => {
                log::warn!("Frame {index}: {e}, skipped");
            }
            Err(EnrollmentError::Landmarks(e)) => {
                log::warn!("Frame {index}: unusable landmarks ({e}), skipped");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let report = match pipeline.finish_enrollment(label) {
        Ok(report) => report,
        Err(EnrollmentError::EmptyEnrollment) => {
            pipeline.cancel_enrollment()?;
            return Err(format!("No usable face in {}", input.display()).into());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "Enrolled '{}': {} samples stored",
        report.label, report.committed
    );
    for failure in &report.failures {
        if failure.outcome_unknown() {
            eprintln!(
                "  sample {} may have been stored: {}",
                failure.sample_index, failure.error
            );
        } else {
            eprintln!("  sample {} not stored: {}", failure.sample_index, failure.error);
        }
    }
    if !report.is_complete() {
        let unknown = report.unknown_count();
        return Err(format!(
            "{} samples not stored, {} with unknown outcome; run `list` before enrolling again",
            report.failures.len() - unknown,
            unknown
        )
        .into());
    }
    Ok(())
}

fn run_recognize(
    input: &Path,
    store: Arc<dyn TemplateStore>,
    policy: MatchPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let recording = LandmarkRecording::load(input)?;
    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let worker = ThreadedFacePipeline::spawn(build_pipeline(&recording, store, policy), events_tx);

    // Frames are offered one at a time so none are dropped for being early.
    for index in recording.frame_indices() {
        if !worker.submit_frame(Frame::placeholder(index)) {
            return Err(format!("Pipeline stopped before frame {index}").into());
        }
        match events_rx.recv()? {
            PipelineEvent::Recognized(recognition) => print_recognition(&recognition),
            PipelineEvent::DetectorFailed {
                frame_index,
                message,
            } => eprintln!("frame {frame_index}: detection failed: {message}"),
            other => log::debug!("Ignoring pipeline event {other:?}"),
        }
    }

    worker.shutdown()?;
    Ok(())
}

fn run_match(
    signature: &Signature,
    store: &dyn TemplateStore,
    policy: MatchPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let templates = store.get_all()?;
    let result = Matcher::new(policy).find_match(signature, &templates)?;
    println!("{}", result.matched_label.as_deref().unwrap_or("unknown"));
    Ok(())
}

fn run_list(
    store: &dyn TemplateStore,
    store_path: &Path,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let templates = store.get_all()?;
    if templates.is_empty() {
        println!("No templates in {}", store_path.display());
        return Ok(());
    }
    if verbose {
        for template in &templates {
            println!("{}\t{}", template.label, template.signature);
        }
        return Ok(());
    }
    for (label, count) in label_counts(&templates) {
        println!("{label}\t{count}");
    }
    Ok(())
}

fn print_recognition(recognition: &FrameRecognition) {
    if recognition.faces.is_empty() {
        println!("frame {}: no faces", recognition.frame_index);
        return;
    }
    for face in &recognition.faces {
        let verdict = match &face.outcome {
            Ok(result) => result
                .matched_label
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            Err(e) => format!("skipped ({e})"),
        };
        println!(
            "frame {} face {}: {verdict}",
            recognition.frame_index, face.face_index
        );
    }
}

fn build_pipeline(
    recording: &LandmarkRecording,
    store: Arc<dyn TemplateStore>,
    policy: MatchPolicy,
) -> FacePipeline {
    let extractor = FeatureExtractor::default();
    FacePipeline::new(
        Box::new(ReplayLandmarkDetector::from_recording(recording)),
        RecognizeFacesUseCase::new(extractor, Matcher::new(policy), store.clone()),
        EnrollmentSession::new(extractor, store),
    )
}

fn open_store(path: &Path, timeout_ms: u64) -> Arc<dyn TemplateStore> {
    log::debug!("Using template store {}", path.display());
    Arc::new(TimeoutTemplateStore::new(
        Arc::new(JsonFileTemplateStore::new(path)),
        Duration::from_millis(timeout_ms),
    ))
}

fn effective_settings(cli: &Cli, mut settings: Settings) -> Settings {
    if let Some(tolerance) = cli.tolerance {
        settings.tolerance = tolerance;
    }
    if let Some(ratio) = cli.accept_ratio {
        settings.accept_ratio = ratio;
    }
    if let Some(ms) = cli.store_timeout_ms {
        settings.store_timeout_ms = ms;
    }
    if let Some(ref store) = cli.store {
        settings.store_path = Some(store.clone());
    }
    settings
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Enroll { input, label, .. } => {
            if !input.exists() {
                return Err(format!("Input file not found: {}", input.display()).into());
            }
            if label.trim().is_empty() {
                return Err("Label must not be blank".into());
            }
        }
        Command::Recognize { input } => {
            if !input.exists() {
                return Err(format!("Input file not found: {}", input.display()).into());
            }
        }
        Command::Match { .. } | Command::List { .. } => {}
    }
    if !settings.tolerance.is_finite() || settings.tolerance < 0.0 {
        return Err(format!(
            "Tolerance must be a non-negative number, got {}",
            settings.tolerance
        )
        .into());
    }
    if !(0.0..=1.0).contains(&settings.accept_ratio) {
        return Err(format!(
            "Accept ratio must be between 0.0 and 1.0, got {}",
            settings.accept_ratio
        )
        .into());
    }
    if settings.store_timeout_ms == 0 {
        return Err("Store timeout must be at least 1 ms".into());
    }
    Ok(())
}
