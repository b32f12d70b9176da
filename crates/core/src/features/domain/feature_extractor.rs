//! Geometric signature of a face: for each selected group, the distance
//! between its boundary points and from each boundary point to the root.
//!
//! No normalization is applied, so signatures depend on how far the subject
//! sits from the camera.

use crate::features::domain::signature::Signature;
use crate::landmarks::domain::detected_face::DetectedFace;
use crate::landmarks::domain::landmark_point::LandmarkPoint;
use crate::landmarks::domain::landmark_selector::{
    LandmarkError, LandmarkSelector, SelectedLandmarks,
};
use crate::shared::constants::DISTANCES_PER_GROUP;

/// Euclidean distance in 3-D, always evaluated in the same operation order.
pub fn distance(a: &LandmarkPoint, b: &LandmarkPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Produces `3 * G` values: `d(first, last)`, `d(first, root)`, `d(last, root)`
/// for each group in ascending order.
///
/// Fails only when the detector handed over non-finite coordinates.
pub fn extract(selected: &SelectedLandmarks) -> Result<Signature, LandmarkError> {
    let root = selected.root();
    let mut components = Vec::with_capacity(selected.group_count() * DISTANCES_PER_GROUP);
    for pair in selected.boundary().chunks_exact(2) {
        let (first, last) = (&pair[0], &pair[1]);
        let values = [
            distance(first, last),
            distance(first, root),
            distance(last, root),
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(LandmarkError::NonFiniteDistance { group: first.group });
        }
        components.extend_from_slice(&values);
    }
    Signature::new(components).map_err(|_| LandmarkError::InvalidSelection("no groups selected"))
}

/// Select-then-extract for whole faces.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureExtractor {
    selector: LandmarkSelector,
}

impl FeatureExtractor {
    pub fn new(selector: LandmarkSelector) -> Self {
        Self { selector }
    }

    /// Length of every signature this extractor produces.
    pub fn signature_len(&self) -> usize {
        self.selector.group_count() * DISTANCES_PER_GROUP
    }

    pub fn signature(&self, face: &DetectedFace) -> Result<Signature, LandmarkError> {
        let selected = self.selector.select(face)?;
        extract(&selected)
    }
}
