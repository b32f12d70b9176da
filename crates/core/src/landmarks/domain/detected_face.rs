use crate::landmarks::domain::landmark_point::{LandmarkGroup, LandmarkPoint};

/// Mesh landmarks of one face found in one frame.
///
/// `groups()[0]` is group 1. Only valid for the frame it was detected in.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    groups: Vec<LandmarkGroup>,
}

impl DetectedFace {
    pub fn new(groups: Vec<LandmarkGroup>) -> Self {
        Self { groups }
    }

    /// Builds a face from raw `(x, y, z)` triples, numbering groups from 1.
    pub fn from_coordinates(groups: Vec<Vec<(f64, f64, f64)>>) -> Self {
        let groups = groups
            .into_iter()
            .enumerate()
            .map(|(g, coords)| {
                let id = g + 1;
                let points = coords
                    .into_iter()
                    .enumerate()
                    .map(|(i, (x, y, z))| LandmarkPoint::new(id, i, x, y, z))
                    .collect();
                LandmarkGroup::new(id, points)
            })
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[LandmarkGroup] {
        &self.groups
    }

    /// Looks up a group by its 1-based id.
    pub fn group(&self, id: usize) -> Option<&LandmarkGroup> {
        id.checked_sub(1).and_then(|i| self.groups.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_coordinates_numbers_groups_from_one() {
        let face = DetectedFace::from_coordinates(vec![
            vec![(0.0, 0.0, 0.0)],
            vec![(1.0, 1.0, 1.0), (2.0, 2.0, 2.0)],
        ]);
        assert_eq!(face.groups().len(), 2);
        assert_eq!(face.group(1).unwrap().id(), 1);
        let second = face.group(2).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second.last().unwrap().group, 2);
        assert_eq!(second.last().unwrap().index, 1);
    }

    #[test]
    fn test_group_zero_and_out_of_range_are_none() {
        let face = DetectedFace::from_coordinates(vec![vec![(0.0, 0.0, 0.0)]]);
        assert!(face.group(0).is_none());
        assert!(face.group(2).is_none());
    }
}
