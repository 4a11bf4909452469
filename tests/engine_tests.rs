//! Integration tests for the language engine.
//!
//! These tests drive the full activation flow against a mock HTTP server:
//! resolution, fetching, atomic state swap, subscriber fan-out, and the
//! optional style projection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use langpack::{
    Direction, LanguageDescriptor, LanguageEngine, MemoryStore, PreferenceStore, Scope,
    StaticLocales, StyleAware, StyleBlock, StyleSink, SubscribeOptions,
};

// ==================== Test Helpers ====================

/// Pack document used across the tests: style metadata plus a string table.
#[derive(Debug, Deserialize)]
struct Pack {
    #[serde(flatten)]
    style: StyleBlock,
    #[serde(default)]
    strings: HashMap<String, String>,
}

impl StyleAware for Pack {
    fn style(&self) -> &StyleBlock {
        &self.style
    }
}

/// Style sink recording every projected property.
#[derive(Default)]
struct RecordingSink {
    props: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn recorded(&self) -> Vec<(String, String)> {
        self.props.lock().unwrap().clone()
    }
}

impl StyleSink for RecordingSink {
    fn set_property(&self, name: &str, value: &str) {
        self.props
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
    }
}

fn pack_json(direction: &str, title: &str) -> String {
    format!(
        r#"{{
            "direction": "{direction}",
            "fonts": {{
                "regular": {{
                    "family": "X",
                    "weight": "400",
                    "style": "normal"
                }}
            }},
            "strings": {{ "title": "{title}" }}
        }}"#
    )
}

/// Mount `body` at `/i18n/{file}` on the mock server.
async fn serve_pack(server: &MockServer, file: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/i18n/{file}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Route engine logs to the test output when RUST_LOG is set.
fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn builder_for(server: &MockServer) -> langpack::EngineBuilder<Pack> {
    init_logs();
    LanguageEngine::<Pack>::builder()
        .base_url(format!("{}/i18n", server.uri()))
        .register(vec![
            LanguageDescriptor::file("en", "English", "en.json"),
            LanguageDescriptor::file("de", "Deutsch", "de.json"),
            LanguageDescriptor::file("he", "עברית", "he.json"),
        ])
        .expect("registration should succeed")
        .aliases([
            ("en", vec!["en", "en-US", "en-GB"]),
            ("de", vec!["de", "de-DE"]),
            ("he", vec!["he", "he-IL", "iw"]),
        ])
}

// ==================== Activation Tests ====================

#[tokio::test]
async fn test_activation_loads_document_and_sections() {
    let server = MockServer::start().await;
    serve_pack(&server, "de.json", pack_json("rtl", "hallo")).await;

    let engine = builder_for(&server).build();
    assert!(!engine.loaded());

    assert_ok!(engine.activate("de").await);

    assert!(engine.loaded());
    assert_eq!(engine.current_key().as_deref(), Some("de"));
    assert_eq!(
        engine.section_unchecked(|p: &Pack| p.style.direction).get(),
        Direction::Rtl
    );
    assert_eq!(
        engine
            .section(|p: &Pack| p.strings.get("title").cloned())
            .get()
            .flatten()
            .as_deref(),
        Some("hallo")
    );
}

#[tokio::test]
async fn test_style_projection_writes_direction_and_fonts() {
    let server = MockServer::start().await;
    serve_pack(&server, "de.json", pack_json("rtl", "hallo")).await;

    let sink = RecordingSink::new();
    let engine = builder_for(&server).project_style(sink.clone()).build();
    assert!(engine.style_projection_enabled());

    assert_ok!(engine.activate("de").await);

    assert_eq!(
        sink.recorded(),
        vec![
            ("--ls_dir".to_string(), "rtl".to_string()),
            ("--ls_regular_font-family".to_string(), "X".to_string()),
            ("--ls_regular_font-style".to_string(), "normal".to_string()),
            ("--ls_regular_font-weight".to_string(), "400".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_builtin_projection_runs_before_user_handlers() {
    let server = MockServer::start().await;
    serve_pack(&server, "en.json", pack_json("ltr", "hello")).await;

    let order = Arc::new(Mutex::new(Vec::new()));

    struct OrderSink {
        order: Arc<Mutex<Vec<&'static str>>>,
    }
    impl StyleSink for OrderSink {
        fn set_property(&self, name: &str, _value: &str) {
            if name == "--ls_dir" {
                self.order.lock().unwrap().push("projection");
            }
        }
    }

    let engine = builder_for(&server)
        .project_style(Arc::new(OrderSink {
            order: order.clone(),
        }))
        .build();

    let user_order = order.clone();
    engine.on_change(move |_: &Pack| user_order.lock().unwrap().push("user"));

    assert_ok!(engine.activate("en").await);
    assert_eq!(*order.lock().unwrap(), vec!["projection", "user"]);
}

#[tokio::test]
async fn test_failed_fetch_changes_nothing_and_notifies_nobody() {
    let server = MockServer::start().await;
    serve_pack(&server, "en.json", pack_json("ltr", "hello")).await;
    Mock::given(method("GET"))
        .and(path("/i18n/de.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = builder_for(&server).build();
    assert_ok!(engine.activate("en").await);

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    engine.on_change(move |_: &Pack| *counter.lock().unwrap() += 1);

    // The failed activation is recovered silently: previous language stays.
    assert_ok!(engine.activate("de").await);

    assert_eq!(engine.current_key().as_deref(), Some("en"));
    assert!(engine.loaded());
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_language_is_surfaced_to_the_caller() {
    let server = MockServer::start().await;
    let engine = builder_for(&server).build();

    let result = engine.activate("fr").await;
    assert!(matches!(
        result,
        Err(langpack::EngineError::UnknownLanguage(key)) if key == "fr"
    ));
}

#[tokio::test]
async fn test_repeated_activation_is_idempotent() {
    let server = MockServer::start().await;
    serve_pack(&server, "de.json", pack_json("rtl", "hallo")).await;

    let engine = builder_for(&server).build();
    assert_ok!(engine.activate("de").await);
    assert_ok!(engine.activate("de").await);

    assert_eq!(engine.current_key().as_deref(), Some("de"));
    assert_eq!(
        engine
            .section(|p: &Pack| p.strings.get("title").cloned())
            .get()
            .flatten()
            .as_deref(),
        Some("hallo")
    );
}

// ==================== Overlapping Activation Tests ====================

#[tokio::test]
async fn test_stale_fetch_is_discarded_when_a_newer_activation_wins() {
    let server = MockServer::start().await;

    // "en" answers slowly, "de" immediately.
    Mock::given(method("GET"))
        .and(path("/i18n/en.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(pack_json("ltr", "hello"))
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&server)
        .await;
    serve_pack(&server, "de.json", pack_json("rtl", "hallo")).await;

    let engine = builder_for(&server).build();

    let slow = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.activate("en").await })
    };
    // Give the slow activation time to be issued first.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_ok!(engine.activate("de").await);

    assert_ok!(slow.await.expect("activation task completes"));

    // The slow response completed last but was issued first: discarded.
    assert_eq!(engine.current_key().as_deref(), Some("de"));
    assert_eq!(
        engine.section_unchecked(|p: &Pack| p.style.direction).get(),
        Direction::Rtl
    );
}

// ==================== Subscription Tests ====================

#[tokio::test]
async fn test_run_now_fires_exactly_once_for_an_already_loaded_pack() {
    let server = MockServer::start().await;
    serve_pack(&server, "en.json", pack_json("ltr", "hello")).await;

    let engine = builder_for(&server).build();
    assert_ok!(engine.activate("en").await);

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    engine.on_change_with(
        SubscribeOptions {
            run_now: true,
            scope: None,
        },
        move |_: &Pack| *counter.lock().unwrap() += 1,
    );

    // Invoked synchronously once for the current document, and not again
    // until an actual change.
    assert_eq!(*calls.lock().unwrap(), 1);

    assert_ok!(engine.activate("en").await);
    assert_eq!(*calls.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_scope_end_stops_notifications() {
    let server = MockServer::start().await;
    serve_pack(&server, "en.json", pack_json("ltr", "hello")).await;

    let engine = builder_for(&server).build();
    let scope = Scope::new();

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    engine.on_change_scoped(&scope, move |_: &Pack| *counter.lock().unwrap() += 1);

    assert_ok!(engine.activate("en").await);
    assert_eq!(*calls.lock().unwrap(), 1);

    scope.end();
    assert_ok!(engine.activate("en").await);
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_manual_dispose_stops_notifications() {
    let server = MockServer::start().await;
    serve_pack(&server, "en.json", pack_json("ltr", "hello")).await;

    let engine = builder_for(&server).build();

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let subscription = engine.on_change(move |_: &Pack| *counter.lock().unwrap() += 1);

    assert_ok!(engine.activate("en").await);
    subscription.dispose();
    subscription.dispose();
    assert_ok!(engine.activate("en").await);

    assert_eq!(*calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_shared_handler_resubscribe_replaces_not_duplicates() {
    let server = MockServer::start().await;
    serve_pack(&server, "en.json", pack_json("ltr", "hello")).await;

    let engine = builder_for(&server).build();

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let handler: Arc<dyn Fn(&Pack) + Send + Sync> =
        Arc::new(move |_: &Pack| *counter.lock().unwrap() += 1);

    engine.on_change_arc(SubscribeOptions::default(), handler.clone());
    engine.on_change_arc(SubscribeOptions::default(), handler.clone());

    assert_ok!(engine.activate("en").await);
    assert_eq!(*calls.lock().unwrap(), 1);
}

// ==================== Resolution Tests ====================

#[tokio::test]
async fn test_set_preferred_full_precedence_chain() {
    let server = MockServer::start().await;
    serve_pack(&server, "en.json", pack_json("ltr", "hello")).await;
    serve_pack(&server, "de.json", pack_json("rtl", "hallo")).await;
    serve_pack(&server, "he.json", pack_json("rtl", "שלום")).await;

    // Persisted choice wins over locale inference and the fallback.
    let store = Arc::new(MemoryStore::new());
    store.set("ls-ln", "he");
    let engine = builder_for(&server)
        .persist(store.clone())
        .locales(Arc::new(StaticLocales::new(["de-DE"])))
        .build();
    assert_ok!(engine.set_preferred("en").await);
    assert_eq!(engine.current_key().as_deref(), Some("he"));

    // Without a persisted value, the locale list wins over the fallback.
    let engine = builder_for(&server)
        .persist(Arc::new(MemoryStore::new()))
        .locales(Arc::new(StaticLocales::new(["fr-FR", "de-DE"])))
        .build();
    assert_ok!(engine.set_preferred("en").await);
    assert_eq!(engine.current_key().as_deref(), Some("de"));

    // With neither, the fallback is used.
    let engine = builder_for(&server)
        .locales(Arc::new(StaticLocales::new(["fr-FR"])))
        .build();
    assert_ok!(engine.set_preferred("en").await);
    assert_eq!(engine.current_key().as_deref(), Some("en"));
}

#[tokio::test]
async fn test_activation_persists_choice_for_the_next_session() {
    let server = MockServer::start().await;
    serve_pack(&server, "de.json", pack_json("rtl", "hallo")).await;

    let store = Arc::new(MemoryStore::new());
    let engine = builder_for(&server).persist(store.clone()).build();

    assert_ok!(engine.activate("de").await);
    assert_eq!(store.get("ls-ln"), Some("de".to_string()));

    // A fresh engine over the same store resolves straight to "de".
    let engine = builder_for(&server)
        .persist(store)
        .locales(Arc::new(StaticLocales::new(["en-US"])))
        .build();
    assert_ok!(engine.set_preferred("en").await);
    assert_eq!(engine.current_key().as_deref(), Some("de"));
}

// ==================== Transport Tests ====================

#[tokio::test]
async fn test_http_transport_reports_status_errors() {
    use langpack::{Transport, TransportError};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/i18n/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = langpack::HttpTransport::new();
    let result = transport
        .fetch(&format!("{}/i18n/missing.json", server.uri()))
        .await;

    assert!(matches!(
        result,
        Err(TransportError::Status { status: 404, .. })
    ));
}
