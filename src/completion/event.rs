use serde::{Deserialize, Serialize};

use crate::model::token::Token;
use crate::model::translation::TranslationEntry;

/// A keystroke or editor command, already translated from host key codes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditorEvent {
    /// A character was typed; the snapshot already contains it.
    TypeChar { ch: char },
    /// A character was deleted; the snapshot already reflects it.
    Backspace,
    /// Explicit "complete word" command.
    CompleteWord,
    /// Explicit "show completions" command.
    AutoComplete,
    Return,
    Tab,
    /// Escape.
    Cancel,
}

/// The caret's line at the time of the event. `caret` counts chars.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct EditorSnapshot {
    #[serde(default)]
    pub line: String,

    #[serde(default)]
    pub caret: usize,
}

impl EditorSnapshot {
    pub fn new(line: impl Into<String>, caret: usize) -> Self {
        Self {
            line: line.into(),
            caret,
        }
    }
}

/// What the popup should currently display.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CompletionView {
    pub session: u64,
    pub span: Token,
    pub entries: Vec<TranslationEntry>,
    /// Index into `entries` of the highlighted item.
    pub selected: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    Translating { token: String },
    Idle,
    Failed { message: String },
}

/// A request from the core to the host UI.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Open or refresh the popup.
    Show(CompletionView),
    /// Close the popup without inserting anything.
    Dismiss { session: u64 },
    /// Replace `span` with `text` and close the popup.
    Commit { session: u64, span: Token, text: String },
    /// Best-effort status line.
    Status(Status),
}
