use crate::enrollment::domain::enrollment_session::{
    EnrollmentError, EnrollmentReport, EnrollmentSession, EnrollmentState,
};
use crate::landmarks::domain::detected_face::DetectedFace;
use crate::landmarks::domain::landmark_detector::LandmarkDetector;
use crate::pipeline::recognize_faces_use_case::{FaceRecognition, RecognizeFacesUseCase};
use crate::shared::frame::Frame;

/// Everything derived from one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecognition {
    pub frame_index: usize,
    pub faces: Vec<FaceRecognition>,
}

/// Single-writer controller: detection, recognition and the one enrollment
/// session of a capture stream.
///
/// Enrollment captures use the faces of the most recently processed frame,
/// so every call must come from the same thread of control, one at a time.
pub struct FacePipeline {
    detector: Box<dyn LandmarkDetector>,
    recognizer: RecognizeFacesUseCase,
    session: EnrollmentSession,
    latest_faces: Vec<DetectedFace>,
}

impl FacePipeline {
    pub fn new(
        detector: Box<dyn LandmarkDetector>,
        recognizer: RecognizeFacesUseCase,
        session: EnrollmentSession,
    ) -> Self {
        Self {
            detector,
            recognizer,
            session,
            latest_faces: Vec::new(),
        }
    }

    /// Detects faces in `frame`, remembers them for enrollment and matches each.
    ///
    /// A detector failure is returned untouched and clears the remembered faces.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
    ) -> Result<FrameRecognition, Box<dyn std::error::Error>> {
        let faces = match self.detector.detect(frame) {
            Ok(faces) => faces,
            Err(e) => {
                self.latest_faces.clear();
                return Err(e);
            }
        };
        let recognized = self.recognizer.execute(&faces);
        self.latest_faces = faces;
        Ok(FrameRecognition {
            frame_index: frame.index(),
            faces: recognized,
        })
    }

    pub fn latest_faces(&self) -> &[DetectedFace] {
        &self.latest_faces
    }

    pub fn enrollment_state(&self) -> EnrollmentState {
        self.session.state()
    }

    pub fn start_enrollment(&mut self) -> Result<(), EnrollmentError> {
        self.session.start()
    }

    pub fn capture_sample(&mut self) -> Result<usize, EnrollmentError> {
        self.session.capture_sample(&self.latest_faces)
    }

    pub fn finish_enrollment(&mut self, label: &str) -> Result<EnrollmentReport, EnrollmentError> {
        self.session.finish(label)
    }

    pub fn cancel_enrollment(&mut self) -> Result<usize, EnrollmentError> {
        self.session.cancel()
    }
}
