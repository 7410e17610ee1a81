//! Keystroke handler chain.
//!
//! Handlers run in order for every [`EditorEvent`]; the first one that
//! returns [`HandleStatus::Handled`] stops the chain. Default order (see
//! [`default_chain`]):
//! - [`TriggerHandler`]: explicit completion commands and space start a lookup
//! - [`CommitHandler`]: Return / Tab commit the highlighted entry
//! - [`CancelHandler`]: Escape closes the popup
//! - [`FilterHandler`]: other typing re-filters the open popup

use super::event::{Action, EditorEvent};
use super::orchestrator::CompletionContext;

/// Whether a handler consumed the event.
///
/// For `Return`, `Tab`, `Cancel` and the completion commands, `Handled` tells
/// the host not to run its own command for the key. `TypeChar` and
/// `Backspace` arrive after the host already applied them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    Handled,
    NotHandled,
}

pub trait CommandHandler: Send {
    fn handle(
        &mut self,
        ctx: &mut CompletionContext,
        event: &EditorEvent,
    ) -> (HandleStatus, Vec<Action>);
}

pub fn default_chain() -> Vec<Box<dyn CommandHandler>> {
    vec![
        Box::new(TriggerHandler),
        Box::new(CommitHandler),
        Box::new(CancelHandler),
        Box::new(FilterHandler),
    ]
}

pub struct TriggerHandler;

impl CommandHandler for TriggerHandler {
    fn handle(
        &mut self,
        ctx: &mut CompletionContext,
        event: &EditorEvent,
    ) -> (HandleStatus, Vec<Action>) {
        match *event {
            EditorEvent::CompleteWord | EditorEvent::AutoComplete => {
                if !ctx.is_suggestion_needed() {
                    return (HandleStatus::NotHandled, Vec::new());
                }
                let (_, actions) = ctx.start_session();
                (HandleStatus::Handled, actions)
            }
            EditorEvent::TypeChar { ch: ' ' } => {
                let (started, actions) = ctx.start_session();
                if started {
                    (HandleStatus::Handled, actions)
                } else {
                    (HandleStatus::NotHandled, actions)
                }
            }
            _ => (HandleStatus::NotHandled, Vec::new()),
        }
    }
}

pub struct CommitHandler;

impl CommandHandler for CommitHandler {
    fn handle(
        &mut self,
        ctx: &mut CompletionContext,
        event: &EditorEvent,
    ) -> (HandleStatus, Vec<Action>) {
        match *event {
            EditorEvent::Return => ctx.complete(false),
            EditorEvent::Tab => ctx.complete(true),
            _ => (HandleStatus::NotHandled, Vec::new()),
        }
    }
}

pub struct CancelHandler;

impl CommandHandler for CancelHandler {
    fn handle(
        &mut self,
        ctx: &mut CompletionContext,
        event: &EditorEvent,
    ) -> (HandleStatus, Vec<Action>) {
        match *event {
            EditorEvent::Cancel => {
                if !ctx.has_open_session() {
                    return (HandleStatus::NotHandled, Vec::new());
                }
                (HandleStatus::Handled, ctx.dismiss_open())
            }
            _ => (HandleStatus::NotHandled, Vec::new()),
        }
    }
}

pub struct FilterHandler;

impl CommandHandler for FilterHandler {
    fn handle(
        &mut self,
        ctx: &mut CompletionContext,
        event: &EditorEvent,
    ) -> (HandleStatus, Vec<Action>) {
        match *event {
            EditorEvent::TypeChar { .. } | EditorEvent::Backspace => {
                if !ctx.has_open_session() {
                    return (HandleStatus::NotHandled, Vec::new());
                }
                (HandleStatus::Handled, ctx.filter())
            }
            _ => (HandleStatus::NotHandled, Vec::new()),
        }
    }
}
