/// A single 3-D mesh landmark as reported by the detector.
///
/// Coordinates are in whatever unit the detector uses; nothing here rescales them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkPoint {
    /// 1-based group this point belongs to.
    pub group: usize,
    /// 0-based position inside its group.
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(group: usize, index: usize, x: f64, y: f64, z: f64) -> Self {
        Self {
            group,
            index,
            x,
            y,
            z,
        }
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Ordered points sharing one semantic group (e.g. one facial contour).
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkGroup {
    id: usize,
    points: Vec<LandmarkPoint>,
}

impl LandmarkGroup {
    pub fn new(id: usize, points: Vec<LandmarkPoint>) -> Self {
        Self { id, points }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&LandmarkPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&LandmarkPoint> {
        self.points.last()
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }
}
