use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::model::translation::TranslationEntry;

/// A source of translations for a single token.
///
/// Implementations do exactly one lookup per call; retries, caching and
/// cancellation live outside.
pub trait TranslationProvider: Send + Sync {
    fn fetch(&self, token: &str) -> Result<Vec<TranslationEntry>, FetchError>;
}

impl<P: TranslationProvider + ?Sized> TranslationProvider for std::sync::Arc<P> {
    fn fetch(&self, token: &str) -> Result<Vec<TranslationEntry>, FetchError> {
        (**self).fetch(token)
    }
}

/// Looks up `token`, never letting a provider failure escape.
///
/// A blank token short-circuits to an empty list without calling the
/// provider. A panicking provider is reported as [`FetchError::Unknown`].
pub fn fetch_translations(
    provider: &dyn TranslationProvider,
    token: &str,
) -> Result<Vec<TranslationEntry>, FetchError> {
    if token.trim().is_empty() {
        return Ok(Vec::new());
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| provider.fetch(token)))
        .unwrap_or_else(|_| Err(FetchError::Unknown("translation provider panicked".into())));

    match &outcome {
        Ok(entries) => debug!(token, count = entries.len(), "translation fetched"),
        Err(err) => warn!(token, kind = err.kind(), error = %err, "translation failed"),
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl TranslationProvider for Counting {
        fn fetch(&self, token: &str) -> Result<Vec<TranslationEntry>, FetchError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![TranslationEntry::new(token, "x")])
        }
    }

    struct Exploding;

    impl TranslationProvider for Exploding {
        fn fetch(&self, _token: &str) -> Result<Vec<TranslationEntry>, FetchError> {
            panic!("boom")
        }
    }

    #[test]
    fn blank_token_skips_the_provider() {
        let provider = Counting(AtomicUsize::new(0));

        assert!(fetch_translations(&provider, "").unwrap().is_empty());
        assert!(fetch_translations(&provider, "  ").unwrap().is_empty());
        assert_eq!(provider.0.load(Ordering::SeqCst), 0);

        assert_eq!(fetch_translations(&provider, "猫").unwrap().len(), 1);
        assert_eq!(provider.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panics_become_unknown_errors() {
        let err = fetch_translations(&Exploding, "猫").unwrap_err();
        assert_eq!(err.kind(), "unknown");
    }
}
