use serde::{Deserialize, Serialize};

use super::token::Token;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub source: String,
    pub target: String,
}

impl TranslationEntry {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        TranslationEntry {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Entries for one trigger, bound to the span they were fetched for.
///
/// The first entry is the headline (full-phrase) translation; the rest keep
/// the order the service returned them in, duplicates included.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub entries: Vec<TranslationEntry>,
    pub span: Token,
}

impl TranslationResult {
    pub fn headline(&self) -> Option<&TranslationEntry> {
        self.entries.first()
    }
}
