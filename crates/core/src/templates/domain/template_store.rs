use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::features::domain::signature::Signature;
use crate::templates::domain::template::Template;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("template store I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template store {path} is malformed: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("template store {path} has unsupported version {found}")]
    UnsupportedVersion { path: PathBuf, found: u32 },
    /// The call was handed to the backend but no answer came in time. A
    /// write may still land.
    #[error("template store call timed out after {0:?}; outcome unknown")]
    Timeout(Duration),
    /// An earlier call is still pending; this one was never sent.
    #[error("template store busy with an earlier call")]
    Busy,
    #[error("template store worker disconnected")]
    Disconnected,
    #[error("template store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// True when the failed call may nevertheless have taken effect.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

/// Domain interface for durable template storage.
///
/// A `get_all` that starts after a `put` returned must observe that write.
/// Iteration order is insertion order; the matcher relies on it.
pub trait TemplateStore: Send + Sync {
    fn put(&self, label: &str, signature: &Signature) -> Result<(), StoreError>;

    fn get_all(&self) -> Result<Vec<Template>, StoreError>;
}
