use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::completion::{Action, EditorEvent, EditorSnapshot, Orchestrator};
use crate::config::TranslatorConfig;
use crate::error::{ConfigError, FetchError};
use crate::services::cache::CachedProvider;
use crate::services::google::GoogleTranslateClient;
use crate::services::provider::{fetch_translations, TranslationProvider};
use crate::services::token::extract_token;

mod command;
use command::Command;

// Upper bound for `editor.poll`'s `wait_ms`.
const MAX_POLL_WAIT_MS: u64 = 30_000;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn fetch_err(id: Value, error: &FetchError) -> String {
    json!({
        "id": id,
        "status": "error",
        "kind": error.kind(),
        "message": error.to_string()
    })
    .to_string()
}

fn parse_snapshot(payload: &Value) -> Result<EditorSnapshot, String> {
    let line = payload
        .get("line")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "payload.line must be a string".to_string())?;
    let caret = payload
        .get("caret")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| "payload.caret must be a non-negative integer".to_string())?;

    Ok(EditorSnapshot::new(line, caret as usize))
}

/// Stateful request handler behind the JSON-lines binary.
///
/// Holds one editor view's orchestrator plus the cached provider it shares
/// with the synchronous `translate` command.
pub struct Server {
    config: TranslatorConfig,
    base: Arc<dyn TranslationProvider>,
    // Whether `base` is the HTTP client built from `config`.
    http_backed: bool,
    provider: Arc<CachedProvider<Arc<dyn TranslationProvider>>>,
    orchestrator: Orchestrator,
}

impl Server {
    /// A server talking to the configured endpoint.
    pub fn new(config: TranslatorConfig) -> Result<Self, ConfigError> {
        let client = GoogleTranslateClient::new(&config)?;
        Ok(Self::build(config, Arc::new(client), true))
    }

    /// A server backed by `base` instead of the HTTP client.
    ///
    /// `config.set` keeps using `base` rather than building a new client.
    pub fn with_provider(config: TranslatorConfig, base: Arc<dyn TranslationProvider>) -> Self {
        Self::build(config, base, false)
    }

    fn build(
        config: TranslatorConfig,
        base: Arc<dyn TranslationProvider>,
        http_backed: bool,
    ) -> Self {
        let provider = Arc::new(CachedProvider::new(
            Arc::clone(&base),
            config.cache_capacity,
        ));
        let orchestrator = Orchestrator::new(provider.clone(), config.commit_text);

        Self {
            config,
            base,
            http_backed,
            provider,
            orchestrator,
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Applies `config`, rebuilding the provider and orchestrator. Returns the
    /// actions that close whatever popup the old orchestrator had open.
    fn reconfigure(&mut self, config: TranslatorConfig) -> Result<Vec<Action>, ConfigError> {
        config.validate()?;

        let base: Arc<dyn TranslationProvider> = if self.http_backed {
            Arc::new(GoogleTranslateClient::new(&config)?)
        } else {
            Arc::clone(&self.base)
        };

        let actions = self.orchestrator.dismiss();

        info!(
            endpoint = %config.endpoint,
            source = %config.source_lang,
            target = %config.target_lang,
            "configuration updated"
        );

        *self = Self::build(config, base, self.http_backed);
        Ok(actions)
    }

    pub fn handle(&mut self, input: &str) -> String {
        let req: Value = match serde_json::from_str(input) {
            Ok(v) => v,
            Err(_) => {
                return json!({
                    "status": "error",
                    "message": "invalid json"
                })
                .to_string();
            }
        };

        let id = get_id(&req);
        let payload = get_payload(&req);

        match Command::from(get_cmd(&req)) {
            Command::Ping => ok(id, json!({ "message": "intellitranslate-core alive" })),

            Command::ConfigGet => ok(id, json!({ "config": self.config })),

            Command::ConfigSet => {
                let config_val = payload.get("config").cloned().unwrap_or(Value::Null);
                if config_val.is_null() {
                    return err(id, "payload.config is required");
                }

                let config: TranslatorConfig = match serde_json::from_value(config_val) {
                    Ok(v) => v,
                    Err(e) => return err(id, format!("invalid payload.config: {e}")),
                };

                match self.reconfigure(config) {
                    Ok(actions) => ok(id, json!({ "config": self.config, "actions": actions })),
                    Err(e) => err(id, e.to_string()),
                }
            }

            Command::ExtractToken => match parse_snapshot(payload) {
                Ok(snapshot) => {
                    let token = extract_token(&snapshot.line, snapshot.caret);
                    ok(id, json!({ "token": token }))
                }
                Err(e) => err(id, e),
            },

            Command::Translate => {
                let text = payload.get("text").and_then(|v| v.as_str()).unwrap_or("");
                if text.trim().is_empty() {
                    return err(id, "payload.text is required");
                }

                match fetch_translations(&*self.provider, text) {
                    Ok(entries) => ok(id, json!({ "entries": entries })),
                    Err(e) => fetch_err(id, &e),
                }
            }

            Command::EditorEvent => {
                let event_val = payload.get("event").cloned().unwrap_or(Value::Null);
                let event: EditorEvent = match serde_json::from_value(event_val) {
                    Ok(v) => v,
                    Err(e) => return err(id, format!("invalid payload.event: {e}")),
                };
                let snapshot = match parse_snapshot(payload) {
                    Ok(v) => v,
                    Err(e) => return err(id, e),
                };

                let dispatch = self.orchestrator.handle(&event, snapshot);
                ok(
                    id,
                    json!({ "handled": dispatch.handled(), "actions": dispatch.actions }),
                )
            }

            Command::EditorPoll => {
                let wait_ms = payload
                    .get("wait_ms")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0)
                    .min(MAX_POLL_WAIT_MS);

                let actions = if wait_ms == 0 {
                    self.orchestrator.poll()
                } else {
                    self.orchestrator.wait(Duration::from_millis(wait_ms))
                };
                ok(id, json!({ "actions": actions }))
            }

            Command::SessionState => {
                let session = self.orchestrator.context().session();
                let view = session.filter(|s| s.is_active()).map(|s| s.view());
                ok(
                    id,
                    json!({
                        "state": session.map(|s| s.state()),
                        "view": view
                    }),
                )
            }

            Command::CacheClear => {
                let cleared = self.provider.cache().len();
                self.provider.cache().clear();
                ok(id, json!({ "cleared": cleared }))
            }

            Command::Unknown => {
                warn!(cmd = get_cmd(&req), "unknown command");
                err(id, "unknown command")
            }
        }
    }
}
