//! Synthetic faces shared by unit tests.

use crate::landmarks::domain::detected_face::DetectedFace;
use crate::shared::constants::LANDMARK_GROUP_COUNT;

/// A full 12-group face whose geometry scales linearly with `scale`.
///
/// Group `g` holds `4 + g % 3` points so the root point (group 12, index 3)
/// always exists.
pub(crate) fn synthetic_face(scale: f64) -> DetectedFace {
    let groups = (1..=LANDMARK_GROUP_COUNT)
        .map(|g| {
            let count = 4 + g % 3;
            (0..count)
                .map(|j| {
                    let (g, j) = (g as f64, j as f64);
                    (
                        (g * 10.0 + j * 2.0) * scale,
                        (g * 3.0 - j * 1.5) * scale,
                        (g + j * 0.5) * scale,
                    )
                })
                .collect()
        })
        .collect();
    DetectedFace::from_coordinates(groups)
}

pub(crate) fn translated(face: &DetectedFace, dx: f64, dy: f64, dz: f64) -> DetectedFace {
    let groups = face
        .groups()
        .iter()
        .map(|g| {
            g.points()
                .iter()
                .map(|p| (p.x + dx, p.y + dy, p.z + dz))
                .collect()
        })
        .collect();
    DetectedFace::from_coordinates(groups)
}
