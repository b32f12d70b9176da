use std::sync::Arc;

use crate::features::domain::feature_extractor::FeatureExtractor;
use crate::landmarks::domain::detected_face::DetectedFace;
use crate::landmarks::domain::landmark_selector::LandmarkError;
use crate::matching::domain::matcher::{MatchResult, Matcher};
use crate::templates::domain::template::Template;
use crate::templates::domain::template_store::TemplateStore;

/// Recognition verdict for one face of one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRecognition {
    pub face_index: usize,
    /// `Err` when the face's landmarks could not produce a signature.
    pub outcome: Result<MatchResult, LandmarkError>,
    /// Templates skipped because their signature length differs.
    pub incompatible_templates: usize,
}

/// Per-frame recognition: signature per face, matched against the store.
///
/// Stateless across frames. A store read failure is treated as an empty
/// store for that frame.
pub struct RecognizeFacesUseCase {
    extractor: FeatureExtractor,
    matcher: Matcher,
    store: Arc<dyn TemplateStore>,
}

impl RecognizeFacesUseCase {
    pub fn new(extractor: FeatureExtractor, matcher: Matcher, store: Arc<dyn TemplateStore>) -> Self {
        Self {
            extractor,
            matcher,
            store,
        }
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    /// One result per face, in detection order.
    pub fn execute(&self, faces: &[DetectedFace]) -> Vec<FaceRecognition> {
        if faces.is_empty() {
            return Vec::new();
        }
        let templates = self.load_templates();
        faces
            .iter()
            .enumerate()
            .map(|(face_index, face)| self.recognize(face_index, face, &templates))
            .collect()
    }

    fn load_templates(&self) -> Vec<Template> {
        match self.store.get_all() {
            Ok(templates) => templates,
            Err(e) => {
                log::warn!("Template store unavailable, matching against nothing: {e}");
                Vec::new()
            }
        }
    }

    fn recognize(&self, face_index: usize, face: &DetectedFace, templates: &[Template]) -> FaceRecognition {
        let signature = match self.extractor.signature(face) {
            Ok(signature) => signature,
            Err(e) => {
                log::warn!("Skipping face {face_index}: {e}");
                return FaceRecognition {
                    face_index,
                    outcome: Err(e),
                    incompatible_templates: 0,
                };
            }
        };

        let scan = self.matcher.scan(&signature, templates);
        if !scan.incompatible.is_empty() {
            log::warn!(
                "Face {face_index}: {} templates have a different signature length than {}",
                scan.incompatible.len(),
                signature.len()
            );
        }
        match scan.result.matched_label {
            Some(ref label) => log::debug!("Face {face_index} matches '{label}'"),
            None => log::debug!("Face {face_index} matches no enrolled template"),
        }

        FaceRecognition {
            face_index,
            outcome: Ok(scan.result),
            incompatible_templates: scan.incompatible.len(),
        }
    }
}
