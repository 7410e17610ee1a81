//! Editor-facing completion flow.
//!
//! The host forwards keystrokes as [`EditorEvent`]s together with the current
//! line and caret. A chain of [`handler::CommandHandler`]s decides what each
//! event means, lookups run on the [`fetch::FetchWorker`], and everything the
//! host should render comes back as [`Action`]s.

pub mod event;
pub mod fetch;
pub mod handler;
pub mod orchestrator;
pub mod session;

pub use event::{Action, CompletionView, EditorEvent, EditorSnapshot, Status};
pub use orchestrator::{Dispatch, Orchestrator};
pub use session::{CompletionSession, SessionState};
