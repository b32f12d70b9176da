use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::enrollment::domain::enrollment_session::{EnrollmentError, EnrollmentEvent};
use crate::pipeline::face_pipeline::{FacePipeline, FrameRecognition};
use crate::shared::frame::Frame;

/// Operator actions, applied between frames.
///
/// A frame already accepted by [`ThreadedFacePipeline::submit_frame`] is
/// processed before any command sent after it.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineCommand {
    StartEnrollment,
    /// Captures from the faces of the last frame submitted before this command.
    CaptureSample,
    FinishEnrollment { label: String },
    CancelEnrollment,
}

/// Everything the presentation layer needs to render.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    Recognized(FrameRecognition),
    DetectorFailed { frame_index: usize, message: String },
    Enrollment(EnrollmentEvent),
    CommandRejected {
        command: PipelineCommand,
        error: EnrollmentError,
    },
}

/// Runs a [`FacePipeline`] on a dedicated worker thread.
///
/// Frames go through a queue of depth one: while a frame waits, newer ones
/// are dropped, so the worker never falls behind the camera. Commands are
/// never dropped. Frames and commands are handled one at a time by the same
/// worker, which keeps the enrollment buffer single-writer.
pub struct ThreadedFacePipeline {
    frame_tx: Option<Sender<Frame>>,
    command_tx: Option<Sender<PipelineCommand>>,
    dropped_frames: Arc<AtomicUsize>,
    worker: Option<JoinHandle<FacePipeline>>,
}

impl ThreadedFacePipeline {
    /// Starts the worker. Events are delivered on the returned receiver.
    ///
    /// Enrollment events only appear there if the pipeline's session was
    /// built with [`event_listener`].
    pub fn spawn(pipeline: FacePipeline, events: Sender<PipelineEvent>) -> Self {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(1);
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<PipelineCommand>();

        let worker = std::thread::spawn(move || run_worker(pipeline, frame_rx, command_rx, events));

        Self {
            frame_tx: Some(frame_tx),
            command_tx: Some(command_tx),
            dropped_frames: Arc::new(AtomicUsize::new(0)),
            worker: Some(worker),
        }
    }

    /// Offers a frame. Returns `false` when it was dropped because another
    /// frame is still waiting or the worker is gone.
    pub fn submit_frame(&self, frame: Frame) -> bool {
        let Some(ref tx) = self.frame_tx else {
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                log::debug!("Dropping frame {}: pipeline busy", frame.index());
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn send(&self, command: PipelineCommand) -> bool {
        self.command_tx
            .as_ref()
            .is_some_and(|tx| tx.send(command).is_ok())
    }

    pub fn dropped_frames(&self) -> usize {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Stops accepting input, lets the worker finish the queued frame and
    /// pending commands, and hands the pipeline back.
    pub fn shutdown(mut self) -> Result<FacePipeline, Box<dyn std::error::Error>> {
        self.stop()
    }

    fn stop(&mut self) -> Result<FacePipeline, Box<dyn std::error::Error>> {
        self.command_tx = None;
        self.frame_tx = None;
        let dropped = self.dropped_frames();
        if dropped > 0 {
            log::warn!("Pipeline dropped {dropped} frames while busy");
        }
        let worker = self.worker.take().ok_or("Pipeline worker already stopped")?;
        worker
            .join()
            .map_err(|_| "Pipeline worker panicked".into())
    }
}

impl Drop for ThreadedFacePipeline {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop();
        }
    }
}

/// Forwards enrollment events from a session listener to the event channel.
pub fn event_listener(
    events: Sender<PipelineEvent>,
) -> crate::enrollment::domain::enrollment_session::EnrollmentListener {
    Box::new(move |event| {
        let _ = events.send(PipelineEvent::Enrollment(event.clone()));
    })
}

fn run_worker(
    mut pipeline: FacePipeline,
    frame_rx: Receiver<Frame>,
    command_rx: Receiver<PipelineCommand>,
    events: Sender<PipelineEvent>,
) -> FacePipeline {
    loop {
        crossbeam_channel::select! {
            recv(command_rx) -> msg => match msg {
                Ok(command) => {
                    process_queued_frames(&mut pipeline, &frame_rx, &events);
                    apply_command(&mut pipeline, command, &events);
                }
                Err(_) => break,
            },
            recv(frame_rx) -> msg => match msg {
                Ok(frame) => process_frame(&mut pipeline, &frame, &events),
                Err(_) => break,
            },
        }
    }

    process_queued_frames(&mut pipeline, &frame_rx, &events);
    for command in command_rx.try_iter() {
        apply_command(&mut pipeline, command, &events);
    }
    pipeline
}

/// A frame accepted before a command was sent must be seen by that command.
fn process_queued_frames(
    pipeline: &mut FacePipeline,
    frame_rx: &Receiver<Frame>,
    events: &Sender<PipelineEvent>,
) {
    for frame in frame_rx.try_iter() {
        process_frame(pipeline, &frame, events);
    }
}

fn process_frame(pipeline: &mut FacePipeline, frame: &Frame, events: &Sender<PipelineEvent>) {
    let event = match pipeline.process_frame(frame) {
        Ok(recognition) => PipelineEvent::Recognized(recognition),
        Err(e) => {
            log::warn!("Landmark detection failed on frame {}: {e}", frame.index());
            PipelineEvent::DetectorFailed {
                frame_index: frame.index(),
                message: e.to_string(),
            }
        }
    };
    let _ = events.send(event);
}

fn apply_command(
    pipeline: &mut FacePipeline,
    command: PipelineCommand,
    events: &Sender<PipelineEvent>,
) {
    let result = match command {
        PipelineCommand::StartEnrollment => pipeline.start_enrollment(),
        PipelineCommand::CaptureSample => pipeline.capture_sample().map(|_| ()),
        PipelineCommand::FinishEnrollment { ref label } => {
            pipeline.finish_enrollment(label).map(|_| ())
        }
        PipelineCommand::CancelEnrollment => pipeline.cancel_enrollment().map(|_| ()),
    };
    if let Err(error) = result {
        let _ = events.send(PipelineEvent::CommandRejected { command, error });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::enrollment::domain::enrollment_session::{EnrollmentSession, EnrollmentState};
    use crate::features::domain::feature_extractor::FeatureExtractor;
    use crate::landmarks::domain::detected_face::DetectedFace;
    use crate::landmarks::domain::fixtures::synthetic_face;
    use crate::landmarks::domain::landmark_detector::LandmarkDetector;
    use crate::matching::domain::matcher::{MatchPolicy, MatchResult, Matcher};
    use crate::pipeline::recognize_faces_use_case::RecognizeFacesUseCase;
    use crate::templates::domain::template_store::TemplateStore;
    use crate::templates::infrastructure::in_memory_template_store::InMemoryTemplateStore;

    // --- Stubs ---

    /// Blocks each detection until the test releases it.
    struct GatedDetector {
        faces: HashMap<usize, Vec<DetectedFace>>,
        gate: Receiver<()>,
    }

    impl LandmarkDetector for GatedDetector {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
            self.gate.recv().map_err(|_| "gate closed")?;
            self.faces
                .get(&frame.index())
                .cloned()
                .ok_or_else(|| format!("no faces scripted for frame {}", frame.index()).into())
        }
    }

    // --- Helpers ---

    const WAIT: Duration = Duration::from_secs(5);

    fn spawn_pipeline(
        faces: HashMap<usize, Vec<DetectedFace>>,
        store: Arc<dyn TemplateStore>,
    ) -> (ThreadedFacePipeline, Receiver<PipelineEvent>, Sender<()>) {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let extractor = FeatureExtractor::default();
        let matcher = Matcher::new(MatchPolicy::new(0.01, 0.4).unwrap());
        let session = EnrollmentSession::new(extractor, store.clone())
            .with_listener(event_listener(events_tx.clone()));
        let pipeline = FacePipeline::new(
            Box::new(GatedDetector {
                faces,
                gate: gate_rx,
            }),
            RecognizeFacesUseCase::new(extractor, matcher, store),
            session,
        );
        (
            ThreadedFacePipeline::spawn(pipeline, events_tx),
            events_rx,
            gate_tx,
        )
    }

    fn next_recognition(events: &Receiver<PipelineEvent>) -> FrameRecognition {
        loop {
            match events.recv_timeout(WAIT).unwrap() {
                PipelineEvent::Recognized(r) => return r,
                _ => continue,
            }
        }
    }

    // --- Tests ---

    #[test]
    fn test_recognizes_submitted_frame() {
        let store: Arc<dyn TemplateStore> = Arc::new(InMemoryTemplateStore::new());
        let (pipeline, events, gate) =
            spawn_pipeline(HashMap::from([(0, vec![synthetic_face(1.0)])]), store);

        assert!(pipeline.submit_frame(Frame::placeholder(0)));
        gate.send(()).unwrap();

        let recognition = next_recognition(&events);
        assert_eq!(recognition.frame_index, 0);
        assert_eq!(recognition.faces[0].outcome, Ok(MatchResult::no_match()));
        pipeline.shutdown().unwrap();
    }

    #[test]
    fn test_frames_dropped_while_one_is_waiting() {
        let store: Arc<dyn TemplateStore> = Arc::new(InMemoryTemplateStore::new());
        let faces = HashMap::from([(0, vec![]), (1, vec![]), (2, vec![])]);
        let (pipeline, events, gate) = spawn_pipeline(faces, store);

        // Frame 0 is taken by the worker and blocks in the detector.
        assert!(pipeline.submit_frame(Frame::placeholder(0)));
        let deadline = std::time::Instant::now() + WAIT;
        while !pipeline.submit_frame(Frame::placeholder(1)) {
            assert!(std::time::Instant::now() < deadline, "queue never drained");
            std::thread::sleep(Duration::from_millis(1));
        }
        // Frame 1 now waits in the queue, so frame 2 is dropped.
        assert!(!pipeline.submit_frame(Frame::placeholder(2)));
        assert!(pipeline.dropped_frames() >= 1);

        gate.send(()).unwrap();
        gate.send(()).unwrap();
        assert_eq!(next_recognition(&events).frame_index, 0);
        assert_eq!(next_recognition(&events).frame_index, 1);
        pipeline.shutdown().unwrap();
    }

    #[test]
    fn test_enrollment_commands_and_events() {
        let store: Arc<dyn TemplateStore> = Arc::new(InMemoryTemplateStore::new());
        let alice = synthetic_face(1.0);
        let (pipeline, events, gate) = spawn_pipeline(
            HashMap::from([(0, vec![alice.clone()]), (1, vec![alice])]),
            store.clone(),
        );

        assert!(pipeline.send(PipelineCommand::StartEnrollment));
        assert!(pipeline.submit_frame(Frame::placeholder(0)));
        gate.send(()).unwrap();
        next_recognition(&events);
        assert!(pipeline.send(PipelineCommand::CaptureSample));
        assert!(pipeline.send(PipelineCommand::FinishEnrollment {
            label: "alice".into()
        }));
        assert!(pipeline.send(PipelineCommand::FinishEnrollment {
            label: "again".into()
        }));

        let returned = pipeline.shutdown().unwrap();
        assert_eq!(returned.enrollment_state(), EnrollmentState::Idle);
        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].label, "alice");

        let remaining: Vec<PipelineEvent> = events.try_iter().collect();
        assert!(remaining.contains(&PipelineEvent::Enrollment(EnrollmentEvent::SampleCaptured {
            samples: 1
        })));
        assert!(remaining.contains(&PipelineEvent::CommandRejected {
            command: PipelineCommand::FinishEnrollment {
                label: "again".into()
            },
            error: EnrollmentError::NotCollecting,
        }));
        drop(gate);
    }

    #[test]
    fn test_detector_failure_becomes_event() {
        let store: Arc<dyn TemplateStore> = Arc::new(InMemoryTemplateStore::new());
        let (pipeline, events, gate) = spawn_pipeline(HashMap::new(), store);

        assert!(pipeline.submit_frame(Frame::placeholder(4)));
        gate.send(()).unwrap();

        match events.recv_timeout(WAIT).unwrap() {
            PipelineEvent::DetectorFailed { frame_index, .. } => assert_eq!(frame_index, 4),
            other => panic!("unexpected event {other:?}"),
        }
        pipeline.shutdown().unwrap();
    }

    #[test]
    fn test_queued_frame_is_processed_on_shutdown() {
        let store: Arc<dyn TemplateStore> = Arc::new(InMemoryTemplateStore::new());
        let (pipeline, events, gate) =
            spawn_pipeline(HashMap::from([(0, vec![]), (1, vec![])]), store);
        gate.send(()).unwrap();
        gate.send(()).unwrap();

        assert!(pipeline.submit_frame(Frame::placeholder(0)));
        let deadline = std::time::Instant::now() + WAIT;
        while !pipeline.submit_frame(Frame::placeholder(1)) {
            assert!(std::time::Instant::now() < deadline, "queue never drained");
            std::thread::sleep(Duration::from_millis(1));
        }
        pipeline.shutdown().unwrap();

        let processed: Vec<usize> = events
            .try_iter()
            .filter_map(|e| match e {
                PipelineEvent::Recognized(r) => Some(r.frame_index),
                _ => None,
            })
            .collect();
        assert_eq!(processed, vec![0, 1]);
    }

    #[test]
    fn test_capture_sees_frame_submitted_before_it() {
        let store: Arc<dyn TemplateStore> = Arc::new(InMemoryTemplateStore::new());
        let (pipeline, events, gate) = spawn_pipeline(
            HashMap::from([(0, vec![]), (1, vec![synthetic_face(1.0)])]),
            store.clone(),
        );
        assert!(pipeline.submit_frame(Frame::placeholder(0)));
        gate.send(()).unwrap();
        assert!(next_recognition(&events).faces.is_empty());

        assert!(pipeline.send(PipelineCommand::StartEnrollment));
        assert!(pipeline.submit_frame(Frame::placeholder(1)));
        assert!(pipeline.send(PipelineCommand::CaptureSample));
        gate.send(()).unwrap();
        assert!(pipeline.send(PipelineCommand::FinishEnrollment {
            label: "alice".into()
        }));
        pipeline.shutdown().unwrap();

        let rejected = events
            .try_iter()
            .any(|e| matches!(e, PipelineEvent::CommandRejected { .. }));
        assert!(!rejected);
        assert_eq!(store.get_all().unwrap().len(), 1);
    }
}
