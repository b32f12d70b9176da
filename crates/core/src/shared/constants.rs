/// Number of mesh landmark groups read per face.
pub const LANDMARK_GROUP_COUNT: usize = 12;

/// 1-based group holding the root point every boundary point is measured against.
pub const ROOT_GROUP: usize = 12;
/// 0-based index of the root point within [`ROOT_GROUP`].
pub const ROOT_POINT_INDEX: usize = 3;

/// Three distances per group: span, first-to-root, last-to-root.
pub const DISTANCES_PER_GROUP: usize = 3;

/// Per-component absolute difference above which two components disagree.
/// Same unit as the detector's landmark coordinates.
pub const DEFAULT_TOLERANCE: f64 = 1.0;

/// A template matches while fewer than this fraction of components disagree.
pub const DEFAULT_ACCEPT_RATIO: f64 = 0.4;

/// Upper bound on a single template store call.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

pub const TEMPLATE_FILE_VERSION: u32 = 1;
