use serde::{Deserialize, Serialize};

use crate::features::domain::signature::Signature;

/// One enrolled sample. Several templates may share a label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub label: String,
    pub signature: Signature,
}

impl Template {
    pub fn new(label: impl Into<String>, signature: Signature) -> Self {
        Self {
            label: label.into(),
            signature,
        }
    }
}

/// Number of templates per label, in first-seen order.
pub fn label_counts(templates: &[Template]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for t in templates {
        match counts.iter_mut().find(|(label, _)| *label == t.label) {
            Some((_, n)) => *n += 1,
            None => counts.push((t.label.clone(), 1)),
        }
    }
    counts
}
