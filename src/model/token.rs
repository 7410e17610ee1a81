use serde::{Deserialize, Serialize};

/// A run of translatable characters around the caret.
///
/// Offsets count Unicode scalar values (chars), not bytes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Token {
    #[serde(default)]
    pub text: String,

    #[serde(default, alias = "startOffset")]
    pub start: usize,

    #[serde(default)]
    pub length: usize,
}

impl Token {
    /// The "nothing to translate" token anchored at `offset`.
    pub fn empty(offset: usize) -> Self {
        Token {
            text: String::new(),
            start: offset,
            length: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}
