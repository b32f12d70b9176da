use crate::landmarks::domain::detected_face::DetectedFace;
use crate::shared::frame::Frame;

/// Domain interface for the external face mesh detector.
///
/// Failures are reported to the caller as-is; the core never retries.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
