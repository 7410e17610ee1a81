use serde::{Deserialize, Serialize};

use super::event::CompletionView;
use crate::error::SessionError;
use crate::model::token::Token;
use crate::model::translation::{TranslationEntry, TranslationResult};
use crate::services::token::{span_from, typed_text};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the lookup started for `span`.
    Created,
    /// Popup visible.
    Active,
    Committed,
    Dismissed,
}

impl SessionState {
    pub fn is_finished(self) -> bool {
        matches!(self, SessionState::Committed | SessionState::Dismissed)
    }
}

/// One popup's lifetime: `Created -> Active -> (Committed | Dismissed)`.
///
/// A session that never received results goes `Created -> Dismissed`.
#[derive(Debug, Clone)]
pub struct CompletionSession {
    id: u64,
    state: SessionState,
    result: TranslationResult,
    visible: Vec<usize>,
    best: Option<usize>,
    // True when `best` actually matches what the user typed.
    matched: bool,
}

impl CompletionSession {
    pub fn new(id: u64, span: Token) -> Self {
        Self {
            id,
            state: SessionState::Created,
            result: TranslationResult {
                entries: Vec::new(),
                span,
            },
            visible: Vec::new(),
            best: None,
            matched: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn span(&self) -> &Token {
        &self.result.span
    }

    pub fn result(&self) -> &TranslationResult {
        &self.result
    }

    pub fn is_open(&self) -> bool {
        !self.state.is_finished()
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Whether the highlighted item matches the typed text.
    pub fn has_selection(&self) -> bool {
        self.matched && self.best.is_some()
    }

    fn transition(&mut self, to: SessionState) -> Result<(), SessionError> {
        let allowed = matches!(
            (self.state, to),
            (SessionState::Created, SessionState::Active)
                | (SessionState::Created, SessionState::Dismissed)
                | (SessionState::Active, SessionState::Committed)
                | (SessionState::Active, SessionState::Dismissed)
        );

        if !allowed {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }

        self.state = to;
        Ok(())
    }

    /// Attaches the fetched entries and opens the popup.
    ///
    /// Returns `Ok(false)` if the caret is no longer inside the span.
    pub fn activate(
        &mut self,
        entries: Vec<TranslationEntry>,
        line: &str,
        caret: usize,
    ) -> Result<bool, SessionError> {
        self.transition(SessionState::Active)?;
        self.result.entries = entries;
        Ok(self.refilter(line, caret))
    }

    /// Narrows the visible entries to what the user has typed into the span.
    ///
    /// Returns `false` when the caret has left the span or the span was
    /// erased; the caller should dismiss the session.
    pub fn refilter(&mut self, line: &str, caret: usize) -> bool {
        let start = self.result.span.start;
        let Some(span) = span_from(line, start, caret).filter(|span| !span.is_empty()) else {
            return false;
        };
        self.result.span = span;

        let typed = typed_text(line, start, caret);
        let entries = &self.result.entries;

        let prefix_matches: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !typed.is_empty() && e.source.starts_with(typed.as_str()))
            .map(|(i, _)| i)
            .collect();

        let exact = prefix_matches
            .iter()
            .copied()
            .find(|&i| entries[i].source == typed);

        self.matched = !prefix_matches.is_empty();
        self.best = exact.or_else(|| prefix_matches.first().copied());
        self.visible = if prefix_matches.is_empty() {
            (0..entries.len()).collect()
        } else {
            prefix_matches
        };

        if self.best.is_none() && !self.visible.is_empty() {
            self.best = Some(self.visible[0]);
        }

        true
    }

    pub fn view(&self) -> CompletionView {
        CompletionView {
            session: self.id,
            span: self.result.span.clone(),
            entries: self
                .visible
                .iter()
                .map(|&i| self.result.entries[i].clone())
                .collect(),
            selected: self
                .best
                .and_then(|best| self.visible.iter().position(|&i| i == best)),
        }
    }

    /// Commits the highlighted entry.
    ///
    /// Without `force`, only a selection that matches the typed text is
    /// committed. Returns `Ok(None)` when there is nothing to commit; the
    /// session stays open in that case.
    pub fn commit(&mut self, force: bool) -> Result<Option<TranslationEntry>, SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Committed,
            });
        }

        if !force && !self.has_selection() {
            return Ok(None);
        }

        let Some(best) = self.best else {
            return Ok(None);
        };

        let entry = self.result.entries[best].clone();
        self.transition(SessionState::Committed)?;
        Ok(Some(entry))
    }

    pub fn dismiss(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Dismissed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries() -> Vec<TranslationEntry> {
        vec![
            TranslationEntry::new("今日", "today"),
            TranslationEntry::new("今日", "today, this day"),
            TranslationEntry::new("今", "now"),
            TranslationEntry::new("本日", "today"),
        ]
    }

    fn active(line: &str, caret: usize) -> CompletionSession {
        let token = crate::services::token::extract_token(line, caret);
        let mut session = CompletionSession::new(1, token);
        assert!(session.activate(entries(), line, caret).unwrap());
        session
    }

    #[test]
    fn lifecycle_rejects_illegal_transitions() {
        let mut session = CompletionSession::new(7, Token::empty(0));
        assert_eq!(session.state(), SessionState::Created);

        assert!(session.commit(true).is_err());

        session.dismiss().unwrap();
        assert_eq!(session.state(), SessionState::Dismissed);
        assert_eq!(
            session.dismiss(),
            Err(SessionError::InvalidTransition {
                from: SessionState::Dismissed,
                to: SessionState::Dismissed,
            })
        );
        assert!(session.activate(entries(), "今日", 2).is_err());
    }

    #[test]
    fn typed_prefix_narrows_and_selects_exact_match() {
        let session = active("今日", 2);
        let view = session.view();

        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].target, "today");
        assert_eq!(view.selected, Some(0));
        assert!(session.has_selection());
    }

    #[test]
    fn shorter_prefix_prefers_exact_entry() {
        let mut session = active("今日", 2);
        assert!(session.refilter("今日", 1));

        let view = session.view();
        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.entries[view.selected.unwrap()].source, "今");
        assert_eq!(view.span.text, "今日");
    }

    #[test]
    fn no_match_keeps_everything_visible_but_unselected() {
        let mut session = active("今日", 2);
        assert!(session.refilter("今日は", 3));

        let view = session.view();
        assert_eq!(view.entries.len(), 4);
        assert_eq!(view.selected, Some(0));
        assert!(!session.has_selection());

        assert_eq!(session.commit(false).unwrap(), None);
        assert!(session.is_active());

        let forced = session.commit(true).unwrap();
        assert_eq!(forced, Some(TranslationEntry::new("今日", "today")));
        assert_eq!(session.state(), SessionState::Committed);
    }

    #[test]
    fn caret_leaving_the_span_is_reported() {
        let mut session = active("x今日", 3);
        assert_eq!(session.span().start, 1);

        assert!(!session.refilter("x今日", 0));
        assert!(!session.refilter("x", 1));
    }
}
