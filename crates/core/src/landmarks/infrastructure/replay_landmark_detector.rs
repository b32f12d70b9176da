use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmarks::domain::detected_face::DetectedFace;
use crate::landmarks::domain::landmark_detector::LandmarkDetector;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("failed to read landmark recording {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed landmark recording {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Detector output captured ahead of time, one entry per frame.
///
/// On disk: `{"frames": [{"index": 0, "faces": [{"groups": [[[x, y, z], ...], ...]}]}]}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LandmarkRecording {
    pub frames: Vec<RecordedFrame>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub index: usize,
    #[serde(default)]
    pub faces: Vec<RecordedFace>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedFace {
    pub groups: Vec<Vec<[f64; 3]>>,
}

impl RecordedFace {
    fn to_face(&self) -> DetectedFace {
        let groups = self
            .groups
            .iter()
            .map(|points| points.iter().map(|&[x, y, z]| (x, y, z)).collect())
            .collect();
        DetectedFace::from_coordinates(groups)
    }
}

impl LandmarkRecording {
    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let json = fs::read_to_string(path).map_err(|source| RecordingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| RecordingError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Frame indices in recording order.
    pub fn frame_indices(&self) -> Vec<usize> {
        self.frames.iter().map(|f| f.index).collect()
    }
}

/// Replays recorded faces by frame index in place of a live mesh detector.
///
/// Frames absent from the recording yield no faces.
pub struct ReplayLandmarkDetector {
    faces: Arc<HashMap<usize, Vec<DetectedFace>>>,
}

impl ReplayLandmarkDetector {
    pub fn new(faces: Arc<HashMap<usize, Vec<DetectedFace>>>) -> Self {
        Self { faces }
    }

    pub fn from_recording(recording: &LandmarkRecording) -> Self {
        let faces = recording
            .frames
            .iter()
            .map(|f| (f.index, f.faces.iter().map(RecordedFace::to_face).collect()))
            .collect();
        Self::new(Arc::new(faces))
    }
}

impl LandmarkDetector for ReplayLandmarkDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        Ok(self.faces.get(&frame.index()).cloned().unwrap_or_default())
    }
}
