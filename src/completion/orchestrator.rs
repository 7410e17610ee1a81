use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::event::{Action, EditorEvent, EditorSnapshot, Status};
use super::fetch::{FetchCompletion, FetchWorker};
use super::handler::{default_chain, CommandHandler, HandleStatus};
use super::session::{CompletionSession, SessionState};
use crate::config::CommitText;
use crate::services::provider::TranslationProvider;
use crate::services::token::extract_token;

/// State shared by the handler chain: the current snapshot, the one session
/// and the fetch worker.
pub struct CompletionContext {
    worker: FetchWorker,
    session: Option<CompletionSession>,
    snapshot: EditorSnapshot,
    next_session: u64,
    commit_text: CommitText,
}

impl CompletionContext {
    fn new(provider: Arc<dyn TranslationProvider>, commit_text: CommitText) -> Self {
        Self {
            worker: FetchWorker::new(provider),
            session: None,
            snapshot: EditorSnapshot::default(),
            next_session: 0,
            commit_text,
        }
    }

    pub fn snapshot(&self) -> &EditorSnapshot {
        &self.snapshot
    }

    pub fn session(&self) -> Option<&CompletionSession> {
        self.session.as_ref()
    }

    pub fn has_open_session(&self) -> bool {
        self.session.as_ref().is_some_and(CompletionSession::is_open)
    }

    /// Whether the caret sits on a translatable token.
    pub fn is_suggestion_needed(&self) -> bool {
        !extract_token(&self.snapshot.line, self.snapshot.caret).is_empty()
    }

    /// Closes whatever session is open and starts a lookup for the token
    /// under the caret. Returns `false` when there is nothing to translate.
    pub fn start_session(&mut self) -> (bool, Vec<Action>) {
        let mut actions = self.dismiss_open();

        let token = extract_token(&self.snapshot.line, self.snapshot.caret);
        if token.is_empty() {
            return (false, actions);
        }

        self.next_session += 1;
        let id = self.next_session;
        let generation = self.worker.submit(token.clone());
        info!(session = id, generation, token = %token.text, "translation session started");

        actions.push(Action::Status(Status::Translating {
            token: token.text.clone(),
        }));
        self.session = Some(CompletionSession::new(id, token));

        (true, actions)
    }

    /// Dismisses the open session, cancelling its lookup if still pending.
    pub fn dismiss_open(&mut self) -> Vec<Action> {
        let Some(mut session) = self.session.take() else {
            return Vec::new();
        };

        let state = session.state();
        if session.dismiss().is_err() {
            return Vec::new();
        }

        debug!(session = session.id(), ?state, "session dismissed");
        match state {
            SessionState::Created => {
                self.worker.cancel_in_flight();
                vec![Action::Status(Status::Idle)]
            }
            _ => vec![Action::Dismiss {
                session: session.id(),
            }],
        }
    }

    /// Commits the highlighted entry of the visible popup.
    ///
    /// Unless `force` is set, a popup without a matching selection is
    /// dismissed and the key is left to the editor.
    pub fn complete(&mut self, force: bool) -> (HandleStatus, Vec<Action>) {
        let Some(session) = self.session.as_mut() else {
            return (HandleStatus::NotHandled, Vec::new());
        };

        if !session.is_active() {
            let actions = self.dismiss_open();
            return (HandleStatus::NotHandled, actions);
        }

        match session.commit(force) {
            Ok(Some(entry)) => {
                let text = match self.commit_text {
                    CommitText::Source => entry.source,
                    CommitText::Target => entry.target,
                };
                let action = Action::Commit {
                    session: session.id(),
                    span: session.span().clone(),
                    text,
                };
                info!(session = session.id(), "session committed");
                self.session = None;
                (HandleStatus::Handled, vec![action])
            }
            Ok(None) => (HandleStatus::NotHandled, self.dismiss_open()),
            Err(e) => {
                warn!(error = %e, "commit rejected");
                (HandleStatus::NotHandled, self.dismiss_open())
            }
        }
    }

    /// Re-filters the visible popup against the current snapshot.
    pub fn filter(&mut self) -> Vec<Action> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        // Results not in yet; they are filtered on arrival.
        if !session.is_active() {
            return Vec::new();
        }

        if session.refilter(&self.snapshot.line, self.snapshot.caret) {
            vec![Action::Show(session.view())]
        } else {
            self.dismiss_open()
        }
    }

    fn apply(&mut self, completion: FetchCompletion) -> Vec<Action> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.state() != SessionState::Created {
            return Vec::new();
        }

        let id = session.id();
        match completion.outcome {
            Ok(entries) if !entries.is_empty() => {
                let count = entries.len();
                match session.activate(entries, &self.snapshot.line, self.snapshot.caret) {
                    Ok(true) => {
                        debug!(session = id, count, "showing translations");
                        vec![Action::Status(Status::Idle), Action::Show(session.view())]
                    }
                    Ok(false) => {
                        debug!(session = id, "caret left the span before results arrived");
                        self.close_session();
                        vec![Action::Status(Status::Idle)]
                    }
                    Err(e) => {
                        warn!(error = %e, "could not activate session");
                        self.close_session();
                        vec![Action::Status(Status::Idle)]
                    }
                }
            }
            Ok(_) => {
                debug!(session = id, "no translations");
                self.close_session();
                vec![Action::Status(Status::Idle)]
            }
            Err(err) => {
                self.close_session();
                vec![Action::Status(Status::Failed {
                    message: err.to_string(),
                })]
            }
        }
    }

    /// Drops the current session quietly, moving it to `Dismissed` first.
    fn close_session(&mut self) -> Option<CompletionSession> {
        let mut session = self.session.take()?;
        if let Err(e) = session.dismiss() {
            warn!(error = %e, "could not dismiss session");
        }
        debug!(session = session.id(), state = ?session.state(), "session closed");
        Some(session)
    }
}

/// Outcome of dispatching one event through the handler chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub status: HandleStatus,
    pub actions: Vec<Action>,
}

impl Dispatch {
    pub fn handled(&self) -> bool {
        self.status == HandleStatus::Handled
    }
}

/// Drives token extraction, lookups and the popup session for one editor view.
pub struct Orchestrator {
    ctx: CompletionContext,
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn TranslationProvider>, commit_text: CommitText) -> Self {
        Self::with_handlers(provider, commit_text, default_chain())
    }

    pub fn with_handlers(
        provider: Arc<dyn TranslationProvider>,
        commit_text: CommitText,
        handlers: Vec<Box<dyn CommandHandler>>,
    ) -> Self {
        Self {
            ctx: CompletionContext::new(provider, commit_text),
            handlers,
        }
    }

    pub fn context(&self) -> &CompletionContext {
        &self.ctx
    }

    pub fn session_state(&self) -> Option<SessionState> {
        self.ctx.session().map(CompletionSession::state)
    }

    /// Runs `event` through the handler chain with `snapshot` as the current
    /// editor state. Results that already arrived are applied first.
    pub fn handle(&mut self, event: &EditorEvent, snapshot: EditorSnapshot) -> Dispatch {
        self.ctx.snapshot = snapshot;

        let mut actions = self.poll();
        let mut status = HandleStatus::NotHandled;

        for handler in &mut self.handlers {
            let (s, mut a) = handler.handle(&mut self.ctx, event);
            actions.append(&mut a);
            if s == HandleStatus::Handled {
                status = s;
                break;
            }
        }

        Dispatch { status, actions }
    }

    /// Closes the open popup or pending lookup, as if the user cancelled it.
    pub fn dismiss(&mut self) -> Vec<Action> {
        self.ctx.dismiss_open()
    }

    /// Applies the pending lookup's result if it has arrived.
    pub fn poll(&mut self) -> Vec<Action> {
        match self.ctx.worker.try_recv() {
            Some(completion) => self.ctx.apply(completion),
            None => Vec::new(),
        }
    }

    /// Like [`poll`](Self::poll), but blocks up to `timeout` for the result.
    pub fn wait(&mut self, timeout: Duration) -> Vec<Action> {
        match self.ctx.worker.recv_timeout(timeout) {
            Some(completion) => self.ctx.apply(completion),
            None => Vec::new(),
        }
    }
}
