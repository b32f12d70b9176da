//! Component-vote matching of a live signature against enrolled templates.
//!
//! A component disagrees when it differs from the template's by more than
//! `tolerance`. A template matches when the disagreeing fraction is strictly
//! below `accept_ratio`. The first matching template in store order wins;
//! there is no ranking.

use thiserror::Error;

use crate::features::domain::signature::Signature;
use crate::shared::constants::{DEFAULT_ACCEPT_RATIO, DEFAULT_TOLERANCE};
use crate::templates::domain::template::Template;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("signature length mismatch: candidate has {expected} components, template has {found}")]
    SignatureLengthMismatch { expected: usize, found: usize },
    #[error("invalid match policy: {0}")]
    InvalidPolicy(&'static str),
}

/// Tuning knobs for [`Matcher`]. Both must be chosen per deployment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchPolicy {
    tolerance: f64,
    accept_ratio: f64,
}

impl MatchPolicy {
    pub fn new(tolerance: f64, accept_ratio: f64) -> Result<Self, MatchError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(MatchError::InvalidPolicy(
                "tolerance must be finite and >= 0",
            ));
        }
        if !(0.0..=1.0).contains(&accept_ratio) {
            return Err(MatchError::InvalidPolicy(
                "accept ratio must be within [0, 1]",
            ));
        }
        Ok(Self {
            tolerance,
            accept_ratio,
        })
    }

    /// Tolerance 1.0 and accept ratio 0.4, the values deployed capture apps used.
    ///
    /// With these values almost any two faces match; tune before relying on it.
    pub fn observed() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            accept_ratio: DEFAULT_ACCEPT_RATIO,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn accept_ratio(&self) -> f64 {
        self.accept_ratio
    }
}

/// Verdict for one candidate against the whole template set.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub is_match: bool,
    pub matched_label: Option<String>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            is_match: false,
            matched_label: None,
        }
    }

    pub fn matched(label: impl Into<String>) -> Self {
        Self {
            is_match: true,
            matched_label: Some(label.into()),
        }
    }
}

/// Outcome of [`Matcher::scan`]: the verdict plus the positions of templates
/// that could not be compared.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchScan {
    pub result: MatchResult,
    pub incompatible: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
pub struct Matcher {
    policy: MatchPolicy,
}

impl Matcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Number of components differing by more than the tolerance.
    pub fn mismatch_count(
        &self,
        candidate: &Signature,
        reference: &Signature,
    ) -> Result<usize, MatchError> {
        if candidate.len() != reference.len() {
            return Err(MatchError::SignatureLengthMismatch {
                expected: candidate.len(),
                found: reference.len(),
            });
        }
        Ok(candidate
            .components()
            .iter()
            .zip(reference.components())
            .filter(|(a, b)| (*a - *b).abs() > self.policy.tolerance)
            .count())
    }

    pub fn is_match(&self, candidate: &Signature, reference: &Signature) -> Result<bool, MatchError> {
        let mismatches = self.mismatch_count(candidate, reference)?;
        let ratio = mismatches as f64 / candidate.len() as f64;
        Ok(ratio < self.policy.accept_ratio)
    }

    /// First template in `templates` order that matches.
    ///
    /// Any template of a different length aborts the query.
    pub fn find_match(
        &self,
        candidate: &Signature,
        templates: &[Template],
    ) -> Result<MatchResult, MatchError> {
        for template in templates {
            if self.is_match(candidate, &template.signature)? {
                return Ok(MatchResult::matched(template.label.clone()));
            }
        }
        Ok(MatchResult::no_match())
    }

    /// Like [`find_match`](Self::find_match), but skips incompatible templates
    /// instead of failing, recording their positions.
    pub fn scan(&self, candidate: &Signature, templates: &[Template]) -> MatchScan {
        let mut incompatible = Vec::new();
        for (i, template) in templates.iter().enumerate() {
            match self.is_match(candidate, &template.signature) {
                Ok(true) => {
                    return MatchScan {
                        result: MatchResult::matched(template.label.clone()),
                        incompatible,
                    }
                }
                Ok(false) => {}
                Err(_) => incompatible.push(i),
            }
        }
        MatchScan {
            result: MatchResult::no_match(),
            incompatible,
        }
    }
}
