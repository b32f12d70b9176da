use thiserror::Error;

use crate::landmarks::domain::detected_face::DetectedFace;
use crate::landmarks::domain::landmark_point::LandmarkPoint;
use crate::shared::constants::{LANDMARK_GROUP_COUNT, ROOT_GROUP, ROOT_POINT_INDEX};

/// Detector output that cannot yield a signature. The face is skipped for
/// the frame; retrying the same output would fail the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("landmark group {group} missing: face has {available} groups")]
    MissingGroup { group: usize, available: usize },
    #[error("landmark group {group} has no points")]
    EmptyGroup { group: usize },
    #[error("root point {index} missing from group {group}: group has {available} points")]
    MissingRootPoint {
        group: usize,
        index: usize,
        available: usize,
    },
    #[error("landmark group {group} produced a non-finite distance")]
    NonFiniteDistance { group: usize },
    #[error("invalid landmark selection: {0}")]
    InvalidSelection(&'static str),
}

/// Boundary points of every selected group plus the shared root point.
///
/// Only [`LandmarkSelector::select`] builds this, so `boundary` always holds
/// exactly two points per group and at least one group.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedLandmarks {
    root: LandmarkPoint,
    boundary: Vec<LandmarkPoint>,
}

impl SelectedLandmarks {
    pub fn root(&self) -> &LandmarkPoint {
        &self.root
    }

    /// `[first(1), last(1), first(2), last(2), ...]`.
    pub fn boundary(&self) -> &[LandmarkPoint] {
        &self.boundary
    }

    pub fn group_count(&self) -> usize {
        self.boundary.len() / 2
    }
}

/// Picks the first and last point of groups `1..=group_count` and one root point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkSelector {
    group_count: usize,
    root_group: usize,
    root_point: usize,
}

impl LandmarkSelector {
    pub fn new(
        group_count: usize,
        root_group: usize,
        root_point: usize,
    ) -> Result<Self, LandmarkError> {
        if group_count == 0 {
            return Err(LandmarkError::InvalidSelection("group count must be >= 1"));
        }
        if root_group == 0 {
            return Err(LandmarkError::InvalidSelection("root group is 1-based"));
        }
        Ok(Self {
            group_count,
            root_group,
            root_point,
        })
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn select(&self, face: &DetectedFace) -> Result<SelectedLandmarks, LandmarkError> {
        let available = face.groups().len();

        let root_group = face
            .group(self.root_group)
            .ok_or(LandmarkError::MissingGroup {
                group: self.root_group,
                available,
            })?;
        let root = *root_group
            .get(self.root_point)
            .ok_or(LandmarkError::MissingRootPoint {
                group: self.root_group,
                index: self.root_point,
                available: root_group.len(),
            })?;

        let mut boundary = Vec::with_capacity(self.group_count * 2);
        for id in 1..=self.group_count {
            let group = face
                .group(id)
                .ok_or(LandmarkError::MissingGroup {
                    group: id,
                    available,
                })?;
            let (Some(first), Some(last)) = (group.first(), group.last()) else {
                return Err(LandmarkError::EmptyGroup { group: id });
            };
            boundary.push(*first);
            boundary.push(*last);
        }

        Ok(SelectedLandmarks { root, boundary })
    }
}

impl Default for LandmarkSelector {
    fn default() -> Self {
        Self {
            group_count: LANDMARK_GROUP_COUNT,
            root_group: ROOT_GROUP,
            root_point: ROOT_POINT_INDEX,
        }
    }
}
