use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use facemesh_id_core::enrollment::domain::enrollment_session::{EnrollmentSession, EnrollmentState};
use facemesh_id_core::features::domain::feature_extractor::FeatureExtractor;
use facemesh_id_core::landmarks::domain::detected_face::DetectedFace;
use facemesh_id_core::landmarks::infrastructure::replay_landmark_detector::ReplayLandmarkDetector;
use facemesh_id_core::matching::domain::matcher::{MatchPolicy, MatchResult, Matcher};
use facemesh_id_core::pipeline::face_pipeline::FacePipeline;
use facemesh_id_core::pipeline::recognize_faces_use_case::RecognizeFacesUseCase;
use facemesh_id_core::shared::frame::Frame;
use facemesh_id_core::templates::domain::template_store::TemplateStore;
use facemesh_id_core::templates::infrastructure::json_file_template_store::JsonFileTemplateStore;
use facemesh_id_core::templates::infrastructure::timeout_template_store::TimeoutTemplateStore;

fn face(scale: f64) -> DetectedFace {
    let groups = (1..=12)
        .map(|g| {
            (0..5)
                .map(|j| {
                    let (g, j) = (g as f64, j as f64);
                    ((g * 7.0 + j) * scale, (g - j * 2.0) * scale, (g * 0.5 + j) * scale)
                })
                .collect()
        })
        .collect();
    DetectedFace::from_coordinates(groups)
}

fn open_store(path: &std::path::Path) -> Arc<dyn TemplateStore> {
    Arc::new(TimeoutTemplateStore::new(
        Arc::new(JsonFileTemplateStore::new(path)),
        Duration::from_secs(5),
    ))
}

fn pipeline(frames: HashMap<usize, Vec<DetectedFace>>, store: Arc<dyn TemplateStore>) -> FacePipeline {
    let extractor = FeatureExtractor::default();
    let matcher = Matcher::new(MatchPolicy::new(0.01, 0.4).unwrap());
    FacePipeline::new(
        Box::new(ReplayLandmarkDetector::new(Arc::new(frames))),
        RecognizeFacesUseCase::new(extractor, matcher, store.clone()),
        EnrollmentSession::new(extractor, store),
    )
}

#[test]
fn enrolled_face_is_recognized_after_reopening_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");

    let mut enroll = pipeline(
        HashMap::from([(0, vec![face(1.0)]), (1, vec![face(1.0)])]),
        open_store(&path),
    );
    enroll.start_enrollment().unwrap();
    for index in 0..2 {
        enroll.process_frame(&Frame::placeholder(index)).unwrap();
        enroll.capture_sample().unwrap();
    }
    let report = enroll.finish_enrollment("  alice ").unwrap();
    assert!(report.is_complete());
    assert_eq!(report.label, "alice");
    assert_eq!(report.committed, 2);
    assert_eq!(enroll.enrollment_state(), EnrollmentState::Idle);

    let reopened = open_store(&path);
    assert_eq!(reopened.get_all().unwrap().len(), 2);

    let mut recognize = pipeline(
        HashMap::from([(0, vec![face(4.0), face(1.0)])]),
        reopened,
    );
    let frame = recognize.process_frame(&Frame::placeholder(0)).unwrap();

    assert_eq!(frame.faces.len(), 2);
    assert_eq!(frame.faces[0].outcome, Ok(MatchResult::no_match()));
    assert_eq!(frame.faces[1].outcome, Ok(MatchResult::matched("alice")));
}

#[test]
fn missing_store_file_means_nobody_is_enrolled() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("absent.json"));

    let mut p = pipeline(HashMap::from([(0, vec![face(1.0)])]), store);
    let frame = p.process_frame(&Frame::placeholder(0)).unwrap();

    assert_eq!(frame.faces[0].outcome, Ok(MatchResult::no_match()));
}
