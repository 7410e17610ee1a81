//! Caret-token translation for code editors.
//!
//! Finds the run of non-Latin characters under the caret, looks it up on a
//! translation endpoint, and drives an autocomplete-style popup with the
//! results. The host editor talks to it through [`completion::Orchestrator`]
//! directly, or over the JSON-lines [`protocol`] used by the binary.

pub mod completion;
pub mod config;
pub mod error;
pub mod model;
pub mod protocol;
pub mod services;

pub use completion::{Action, EditorEvent, EditorSnapshot, Orchestrator};
pub use config::TranslatorConfig;
pub use error::FetchError;
pub use model::token::Token;
pub use model::translation::{TranslationEntry, TranslationResult};
pub use services::provider::{fetch_translations, TranslationProvider};
pub use services::token::extract_token;
