use std::net::TcpListener;
use std::time::Duration;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;

use intellitranslate_core::config::{TranslatorConfig, DEFAULT_REFERER, DEFAULT_USER_AGENT};
use intellitranslate_core::services::google::GoogleTranslateClient;
use intellitranslate_core::{fetch_translations, FetchError, TranslationEntry};

const PATH: &str = "/translate_a/t";

const TODAY_BODY: &str = r#"[[["今日","today","Kyō",""]],[["noun",["today","this day"],[["今日",["today","this day"],null,0.61]],"今日",1]],"ja"]"#;

fn client_for(server: &MockServer) -> GoogleTranslateClient {
    let cfg = TranslatorConfig {
        endpoint: server.url(PATH),
        timeout_ms: 2_000,
        ..TranslatorConfig::default()
    };
    GoogleTranslateClient::new(&cfg).expect("client")
}

#[test]
fn fetch_returns_headline_then_alternatives() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("client", "t")
            .query_param("hl", "ja")
            .query_param("sl", "ja")
            .query_param("tl", "en")
            .query_param("ie", "UTF-8")
            .query_param("oe", "UTF-8")
            .query_param("multires", "1")
            .query_param("oc", "2")
            .query_param("otf", "1")
            .query_param("ssel", "6")
            .query_param("tsel", "3")
            .query_param("sc", "1")
            .query_param("q", "今日")
            .header("referer", DEFAULT_REFERER)
            .header("user-agent", DEFAULT_USER_AGENT);
        then.status(200)
            .header("content-type", "application/json; charset=UTF-8")
            .body(TODAY_BODY);
    });

    let client = client_for(&server);
    let entries = fetch_translations(&client, "今日").unwrap();

    mock.assert();
    assert_eq!(
        entries,
        vec![
            TranslationEntry::new("今日", "today"),
            TranslationEntry::new("今日", "today, this day"),
        ]
    );
}

#[test]
fn every_call_reaches_the_endpoint_without_a_cache() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("q", "今日");
        then.status(200).body(TODAY_BODY);
    });

    let client = client_for(&server);
    fetch_translations(&client, "今日").unwrap();
    fetch_translations(&client, "今日").unwrap();

    mock.assert_hits(2);
}

#[test]
fn legacy_charset_bodies_are_decoded() {
    let server = MockServer::start();
    let (sjis, _, _) = encoding_rs::SHIFT_JIS.encode(TODAY_BODY);
    let body = sjis.into_owned();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200)
            .header("content-type", "text/javascript; charset=Shift_JIS")
            .body(body);
    });

    let entries = fetch_translations(&client_for(&server), "今日").unwrap();
    assert_eq!(entries[0], TranslationEntry::new("今日", "today"));
}

#[test]
fn non_success_status_is_a_transport_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(503).body("busy");
    });

    let err = fetch_translations(&client_for(&server), "今日").unwrap_err();
    assert_eq!(err, FetchError::Transport("HTTP 503: busy".into()));
}

#[test]
fn unexpected_body_is_a_parse_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200).body("<html>unusual traffic</html>");
    });

    let err = fetch_translations(&client_for(&server), "今日").unwrap_err();
    assert_eq!(err.kind(), "parse");
}

#[test]
fn connection_refused_is_a_transport_error() {
    // Grab a free port and release it so nothing is listening there.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let cfg = TranslatorConfig {
        endpoint: format!("http://127.0.0.1:{port}{PATH}"),
        timeout_ms: 2_000,
        ..TranslatorConfig::default()
    };
    let client = GoogleTranslateClient::new(&cfg).unwrap();

    let err = fetch_translations(&client, "今日").unwrap_err();
    assert_eq!(err.kind(), "transport");
}

#[test]
fn slow_responses_time_out_as_transport_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200)
            .delay(Duration::from_millis(1_500))
            .body(TODAY_BODY);
    });

    let cfg = TranslatorConfig {
        endpoint: server.url(PATH),
        timeout_ms: 200,
        ..TranslatorConfig::default()
    };
    let client = GoogleTranslateClient::new(&cfg).unwrap();

    let err = fetch_translations(&client, "今日").unwrap_err();
    assert_eq!(err, FetchError::Transport("request timed out".into()));
}
