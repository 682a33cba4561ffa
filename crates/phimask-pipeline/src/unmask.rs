//! Restoring original text from `{{TYPE_ID}}` tokens.
//!
//! Never fails: anything that cannot be restored is left in place and
//! reported, because dropping clinical text is worse than showing a token.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use phimask_core::models::entity::Entity;
use phimask_core::models::masking::UnmaskingResult;
use phimask_core::models::token::{split_interior, Token};

/// `{{...}}` on one line. The interior excludes braces so a stray `{` just
/// before a token does not swallow it.
pub(crate) static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}\n]*)\}\}").expect("static regex"));

pub fn unmask(masked_text: &str, masked_entities: &[Entity]) -> UnmaskingResult {
    let lookup: HashMap<String, &str> = masked_entities
        .iter()
        .map(|e| (Token::for_entity(e).key(), e.text.as_str()))
        .collect();

    let mut unmasked_text = String::with_capacity(masked_text.len());
    let mut invalid_tokens = Vec::new();
    let mut unresolved_tokens = Vec::new();
    let mut cursor = 0;

    for caps in BRACKETED.captures_iter(masked_text) {
        let (Some(whole), Some(interior)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        unmasked_text.push_str(&masked_text[cursor..whole.start()]);
        cursor = whole.end();

        if split_interior(interior.as_str()).is_none() {
            invalid_tokens.push(whole.as_str().to_string());
            unmasked_text.push_str(whole.as_str());
            continue;
        }

        match lookup.get(interior.as_str()) {
            Some(original) => unmasked_text.push_str(original),
            None => {
                unresolved_tokens.push(whole.as_str().to_string());
                unmasked_text.push_str(whole.as_str());
            }
        }
    }
    unmasked_text.push_str(&masked_text[cursor..]);

    UnmaskingResult {
        unmasked_text,
        invalid_tokens,
        unresolved_tokens,
    }
}
