use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::features::domain::signature::Signature;
use crate::shared::constants::TEMPLATE_FILE_VERSION;
use crate::templates::domain::template::Template;
use crate::templates::domain::template_store::{StoreError, TemplateStore};

#[derive(Serialize, Deserialize)]
struct TemplateFile {
    version: u32,
    templates: Vec<Template>,
}

/// Templates persisted as one JSON document.
///
/// Each `put` rewrites the file through a sibling temp file and a rename, so
/// readers see either the old document or the new one, never a torn write.
/// A missing file reads as an empty store.
pub struct JsonFileTemplateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<Vec<Template>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        let file: TemplateFile =
            serde_json::from_str(&json).map_err(|source| StoreError::Format {
                path: self.path.clone(),
                source,
            })?;
        if file.version != TEMPLATE_FILE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: self.path.clone(),
                found: file.version,
            });
        }
        Ok(file.templates)
    }

    fn write(&self, templates: Vec<Template>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let file = TemplateFile {
            version: TEMPLATE_FILE_VERSION,
            templates,
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl TemplateStore for JsonFileTemplateStore {
    fn put(&self, label: &str, signature: &Signature) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut templates = self.read()?;
        templates.push(Template::new(label, signature.clone()));
        self.write(templates)?;
        log::debug!("Stored template for '{label}' in {}", self.path.display());
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Template>, StoreError> {
        self.read()
    }
}
