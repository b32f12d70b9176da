use std::sync::RwLock;

use crate::features::domain::signature::Signature;
use crate::templates::domain::template::Template;
use crate::templates::domain::template_store::{StoreError, TemplateStore};

/// Process-local store. Readers run concurrently; each `put` is visible
/// to every `get_all` that starts after it returns.
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<Vec<Template>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn put(&self, label: &str, signature: &Signature) -> Result<(), StoreError> {
        self.templates
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .push(Template::new(label, signature.clone()));
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Template>, StoreError> {
        Ok(self
            .templates
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .clone())
    }
}
