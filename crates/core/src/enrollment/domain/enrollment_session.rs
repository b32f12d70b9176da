use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::features::domain::feature_extractor::FeatureExtractor;
use crate::features::domain::signature::Signature;
use crate::landmarks::domain::detected_face::DetectedFace;
use crate::landmarks::domain::landmark_selector::LandmarkError;
use crate::templates::domain::template_store::{StoreError, TemplateStore};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrollmentError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("{count} faces detected, exactly one is required")]
    AmbiguousFace { count: usize },
    #[error("nothing captured: capture at least one sample before finishing")]
    EmptyEnrollment,
    #[error("an enrollment session is already active")]
    SessionAlreadyActive,
    #[error("no enrollment session is collecting samples")]
    NotCollecting,
    #[error("enrollment label must not be blank")]
    EmptyLabel,
    #[error("face landmarks unusable: {0}")]
    Landmarks(#[from] LandmarkError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnrollmentState {
    Idle,
    Collecting,
    Committing,
}

impl fmt::Display for EnrollmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentState::Idle => write!(f, "idle"),
            EnrollmentState::Collecting => write!(f, "collecting"),
            EnrollmentState::Committing => write!(f, "committing"),
        }
    }
}

/// A buffered sample the store refused during [`EnrollmentSession::finish`].
#[derive(Debug)]
pub struct SampleFailure {
    pub sample_index: usize,
    pub error: StoreError,
}

impl SampleFailure {
    /// The store gave no answer in time, so the sample may have been written.
    pub fn outcome_unknown(&self) -> bool {
        self.error.is_indeterminate()
    }
}

/// Outcome of committing a session. Failed samples are reported, not rolled back.
#[derive(Debug)]
pub struct EnrollmentReport {
    pub label: String,
    pub committed: usize,
    pub failures: Vec<SampleFailure>,
}

impl EnrollmentReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failed samples that may nevertheless be in the store.
    pub fn unknown_count(&self) -> usize {
        self.failures.iter().filter(|f| f.outcome_unknown()).count()
    }
}

/// User-facing feedback emitted while enrolling.
#[derive(Clone, Debug, PartialEq)]
pub enum EnrollmentEvent {
    StateChanged {
        from: EnrollmentState,
        to: EnrollmentState,
    },
    SampleCaptured {
        samples: usize,
    },
    CaptureRejected {
        reason: EnrollmentError,
    },
    Committed {
        label: String,
        committed: usize,
        failed: usize,
    },
    Cancelled {
        discarded: usize,
    },
}

pub type EnrollmentListener = Box<dyn Fn(&EnrollmentEvent) + Send>;

/// Collects signatures of one subject and commits them under a label.
///
/// `Idle → Collecting → Committing → Idle`, or `Collecting → Idle` on cancel.
/// Calls that do not fit the current state are rejected without side effects.
pub struct EnrollmentSession {
    state: EnrollmentState,
    samples: Vec<Signature>,
    extractor: FeatureExtractor,
    store: Arc<dyn TemplateStore>,
    listener: Option<EnrollmentListener>,
}

impl EnrollmentSession {
    pub fn new(extractor: FeatureExtractor, store: Arc<dyn TemplateStore>) -> Self {
        Self {
            state: EnrollmentState::Idle,
            samples: Vec::new(),
            extractor,
            store,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: EnrollmentListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn state(&self) -> EnrollmentState {
        self.state
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn start(&mut self) -> Result<(), EnrollmentError> {
        if self.state != EnrollmentState::Idle {
            return Err(EnrollmentError::SessionAlreadyActive);
        }
        self.samples.clear();
        self.transition(EnrollmentState::Collecting);
        Ok(())
    }

    /// Extracts and buffers a signature when exactly one face is present.
    ///
    /// Returns the number of buffered samples.
    pub fn capture_sample(&mut self, faces: &[DetectedFace]) -> Result<usize, EnrollmentError> {
        self.require_collecting()?;
        match self.signature_of_single(faces) {
            Ok(signature) => {
                self.samples.push(signature);
                let samples = self.samples.len();
                log::debug!("Captured enrollment sample {samples}");
                self.emit(&EnrollmentEvent::SampleCaptured { samples });
                Ok(samples)
            }
            Err(reason) => {
                log::debug!("Rejected enrollment sample: {reason}");
                self.emit(&EnrollmentEvent::CaptureRejected {
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    /// Writes every buffered sample as a `(label, signature)` template.
    ///
    /// A failed write does not stop the remaining ones; failures come back in
    /// the report. The buffer is cleared and the session is idle afterwards
    /// regardless.
    pub fn finish(&mut self, label: &str) -> Result<EnrollmentReport, EnrollmentError> {
        self.require_collecting()?;
        let label = label.trim();
        if label.is_empty() {
            return Err(EnrollmentError::EmptyLabel);
        }
        if self.samples.is_empty() {
            return Err(EnrollmentError::EmptyEnrollment);
        }

        self.transition(EnrollmentState::Committing);
        let samples = std::mem::take(&mut self.samples);
        let mut failures = Vec::new();
        for (sample_index, signature) in samples.iter().enumerate() {
            if let Err(error) = self.store.put(label, signature) {
                if error.is_indeterminate() {
                    log::warn!("Sample {sample_index} for '{label}' may have been stored: {error}");
                } else {
                    log::warn!("Failed to store sample {sample_index} for '{label}': {error}");
                }
                failures.push(SampleFailure {
                    sample_index,
                    error,
                });
            }
        }

        let report = EnrollmentReport {
            label: label.to_string(),
            committed: samples.len() - failures.len(),
            failures,
        };
        log::info!(
            "Enrolled '{}': {} stored, {} failed",
            report.label,
            report.committed,
            report.failures.len()
        );
        self.emit(&EnrollmentEvent::Committed {
            label: report.label.clone(),
            committed: report.committed,
            failed: report.failures.len(),
        });
        self.transition(EnrollmentState::Idle);
        Ok(report)
    }

    /// Drops the buffer without writing. Returns how many samples were discarded.
    pub fn cancel(&mut self) -> Result<usize, EnrollmentError> {
        self.require_collecting()?;
        let discarded = self.samples.len();
        self.samples.clear();
        self.emit(&EnrollmentEvent::Cancelled { discarded });
        self.transition(EnrollmentState::Idle);
        Ok(discarded)
    }

    fn signature_of_single(&self, faces: &[DetectedFace]) -> Result<Signature, EnrollmentError> {
        match faces {
            [] => Err(EnrollmentError::NoFaceDetected),
            [face] => Ok(self.extractor.signature(face)?),
            _ => Err(EnrollmentError::AmbiguousFace { count: faces.len() }),
        }
    }

    fn require_collecting(&self) -> Result<(), EnrollmentError> {
        if self.state == EnrollmentState::Collecting {
            Ok(())
        } else {
            Err(EnrollmentError::NotCollecting)
        }
    }

    fn transition(&mut self, to: EnrollmentState) {
        let from = self.state;
        self.state = to;
        log::info!("Enrollment {from} -> {to}");
        self.emit(&EnrollmentEvent::StateChanged { from, to });
    }

    fn emit(&self, event: &EnrollmentEvent) {
        if let Some(ref listener) = self.listener {
            listener(event);
        }
    }
}
