use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("signature has no components")]
    Empty,
    #[error("signature component {index} is not a non-negative finite distance: {value}")]
    InvalidComponent { index: usize, value: f64 },
    #[error("signature text must be enclosed in brackets")]
    MissingBrackets,
    #[error("signature component {index} is not a number: {text:?}")]
    Unparsable { index: usize, text: String },
}

/// Fixed-order vector of landmark distances; the unit of comparison.
///
/// Never empty, every component finite and non-negative. Component order is
/// the persisted format, so it must never be rearranged.
///
/// Canonical text form is `[d0, d1, ...]` using shortest round-trip float
/// formatting, so `to_string` followed by `parse` is bit-exact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Signature {
    components: Vec<f64>,
}

impl Signature {
    pub fn new(components: Vec<f64>) -> Result<Self, SignatureError> {
        if components.is_empty() {
            return Err(SignatureError::Empty);
        }
        if let Some((index, &value)) = components
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(SignatureError::InvalidComponent { index, value });
        }
        Ok(Self { components })
    }

    pub fn components(&self) -> &[f64] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always false; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl TryFrom<Vec<f64>> for Signature {
    type Error = SignatureError;

    fn try_from(components: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(components)
    }
}

impl From<Signature> for Vec<f64> {
    fn from(signature: Signature) -> Self {
        signature.components
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value:?}")?;
        }
        write!(f, "]")
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or(SignatureError::MissingBrackets)?;
        if inner.trim().is_empty() {
            return Err(SignatureError::Empty);
        }
        let components = inner
            .split(',')
            .enumerate()
            .map(|(index, text)| {
                text.trim()
                    .parse::<f64>()
                    .map_err(|_| SignatureError::Unparsable {
                        index,
                        text: text.trim().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_accepts_zero_and_positive() {
        let sig = Signature::new(vec![0.0, 1.5, 42.0]).unwrap();
        assert_eq!(sig.len(), 3);
        assert!(!sig.is_empty());
    }

    #[test]
    fn test_new_rejects_empty() {
        assert_eq!(Signature::new(vec![]), Err(SignatureError::Empty));
    }

    #[rstest]
    #[case::negative(-0.5)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn test_new_rejects_invalid_component(#[case] bad: f64) {
        let err = Signature::new(vec![1.0, bad]).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidComponent { index: 1, .. }));
    }

    #[test]
    fn test_display_format() {
        let sig = Signature::new(vec![1.0, 2.5, 0.1]).unwrap();
        assert_eq!(sig.to_string(), "[1.0, 2.5, 0.1]");
    }

    #[test]
    fn test_text_form_preserves_awkward_values_exactly() {
        let values = vec![0.1 + 0.2, 1.0 / 3.0, 12345.678901234567, f64::MIN_POSITIVE];
        let sig = Signature::new(values.clone()).unwrap();
        let parsed: Signature = sig.to_string().parse().unwrap();
        for (a, b) in parsed.components().iter().zip(&values) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_parse_accepts_legacy_spacing() {
        let sig: Signature = " [3.0,4.5 , 6] ".parse().unwrap();
        assert_eq!(sig.components(), &[3.0, 4.5, 6.0]);
    }

    #[rstest]
    #[case::no_brackets("1.0, 2.0", SignatureError::MissingBrackets)]
    #[case::empty("[]", SignatureError::Empty)]
    #[case::garbage("[1.0, abc]", SignatureError::Unparsable { index: 1, text: "abc".into() })]
    fn test_parse_errors(#[case] text: &str, #[case] expected: SignatureError) {
        assert_eq!(text.parse::<Signature>().unwrap_err(), expected);
    }

    #[test]
    fn test_json_rejects_negative_component() {
        let result: Result<Signature, _> = serde_json::from_str("[1.0, -2.0]");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_is_plain_array() {
        let sig = Signature::new(vec![1.25, 2.0]).unwrap();
        assert_eq!(serde_json::to_string(&sig).unwrap(), "[1.25,2.0]");
    }
}
