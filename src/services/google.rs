use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, REFERER};
use tracing::debug;
use url::Url;

use crate::config::TranslatorConfig;
use crate::error::{ConfigError, FetchError};
use crate::model::translation::TranslationEntry;
use crate::services::provider::TranslationProvider;
use crate::services::{encoding, response};

const CLIENT: &str = "t";

// Service parameters the endpoint expects after the language codes.
const FIXED_PARAMS: &[(&str, &str)] = &[
    ("ie", "UTF-8"),
    ("oe", "UTF-8"),
    ("multires", "1"),
    ("oc", "2"),
    ("otf", "1"),
    ("ssel", "6"),
    ("tsel", "3"),
    ("sc", "1"),
];

const BODY_SNIPPET_CHARS: usize = 200;

/// Client for the unofficial `translate_a/t` endpoint.
pub struct GoogleTranslateClient {
    http: Client,
    endpoint: Url,
    source_lang: String,
    target_lang: String,
    ui_lang: String,
    referer: String,
}

impl GoogleTranslateClient {
    pub fn new(cfg: &TranslatorConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let http = Client::builder()
            .timeout(cfg.timeout())
            .user_agent(cfg.user_agent.as_str())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: cfg.endpoint_url()?,
            source_lang: cfg.source_lang.clone(),
            target_lang: cfg.target_lang.clone(),
            ui_lang: cfg.ui_lang.clone(),
            referer: cfg.referer.clone(),
        })
    }

    /// Full request URL for `token`, with the token form-encoded into `q`.
    pub fn request_url(&self, token: &str) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            query.append_pair("client", CLIENT);
            query.append_pair("hl", &self.ui_lang);
            query.append_pair("sl", &self.source_lang);
            query.append_pair("tl", &self.target_lang);
            for (name, value) in FIXED_PARAMS {
                query.append_pair(name, value);
            }
            query.append_pair("q", token);
        }
        url
    }
}

impl TranslationProvider for GoogleTranslateClient {
    fn fetch(&self, token: &str) -> Result<Vec<TranslationEntry>, FetchError> {
        let url = self.request_url(token);
        debug!(%url, "requesting translation");

        let resp = self
            .http
            .get(url)
            .header(REFERER, self.referer.as_str())
            .send()?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = resp.bytes()?;

        if !status.is_success() {
            let body = encoding::decode_body(&bytes, content_type.as_deref());
            return Err(FetchError::Transport(http_error_message(status.as_u16(), &body)));
        }

        let body = encoding::decode_body(&bytes, content_type.as_deref());
        response::parse_response(&body)
    }
}

fn http_error_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }

    let snippet: String = trimmed.chars().take(BODY_SNIPPET_CHARS).collect();
    if snippet.len() < trimmed.len() {
        format!("HTTP {status}: {snippet}...")
    } else {
        format!("HTTP {status}: {snippet}")
    }
}
