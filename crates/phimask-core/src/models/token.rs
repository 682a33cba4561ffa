//! The `{{TYPE_ID}}` token literal.
//!
//! `TYPE` is `[A-Za-z0-9]+` and `ID` is `[0-9]+`. Entity types that carry other
//! characters (`PHONE_OR_FAX`) are normalised by dropping them, so every
//! token the masker writes is one the unmasker can parse.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::models::entity::Entity;

/// Label used when an entity type has no alphanumeric characters at all.
pub const FALLBACK_LABEL: &str = "PHI";

static INTERIOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9]+)_([0-9]+)$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub label: String,
    pub id: u64,
}

impl Token {
    pub fn new(entity_type: &str, id: u64) -> Self {
        Self {
            label: normalize_label(entity_type),
            id,
        }
    }

    pub fn for_entity(entity: &Entity) -> Self {
        Self::new(&entity.entity_type, entity.id)
    }

    /// The lookup key `TYPE_ID`, i.e. the token without its braces.
    pub fn key(&self) -> String {
        format!("{}_{}", self.label, self.id)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}_{}}}}}", self.label, self.id)
    }
}

impl FromStr for Token {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let interior = s
            .strip_prefix("{{")
            .and_then(|rest| rest.strip_suffix("}}"))
            .ok_or_else(|| CoreError::MalformedToken(s.to_string()))?;

        let (label, digits) =
            split_interior(interior).ok_or_else(|| CoreError::MalformedToken(s.to_string()))?;
        let id = digits
            .parse()
            .map_err(|_| CoreError::MalformedToken(s.to_string()))?;

        Ok(Self {
            label: label.to_string(),
            id,
        })
    }
}

/// Split a token interior into `(TYPE, ID)` if it matches the grammar.
///
/// The digits are returned as text: ids too large for `u64` are still
/// grammatical, they just never resolve.
pub fn split_interior(interior: &str) -> Option<(&str, &str)> {
    let caps = INTERIOR.captures(interior)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Reduce an entity type to the `[A-Za-z0-9]+` token alphabet.
pub fn normalize_label(entity_type: &str) -> String {
    let label: String = entity_type
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if label.is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        label
    }
}
