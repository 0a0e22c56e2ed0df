use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tempfile::tempdir;
use tideline_core::error::{ApiError, ErrorBody};
use tideline_core::http::{ApiClient, Method, Payload, RawResponse, Request, ScriptedTransport};
use tideline_core::notifier::{ExpirySource, NotifierState};
use tideline_core::session::SessionContext;
use tideline_core::store::{FileTokenStore, MemoryTokenStore};
use tideline_core::token::{Claims, encode_unsigned};
use tideline_core::watchdog::{Navigator, SessionWatchdog, WatchdogSettings};

fn client(store: MemoryTokenStore) -> (ApiClient<ScriptedTransport>, ScriptedTransport) {
    let transport = ScriptedTransport::new();
    let session = SessionContext::new(store, 3);
    (
        ApiClient::new("http://localhost:3000/", session, transport.clone()),
        transport,
    )
}

fn token_expiring_in(secs: i64) -> String {
    encode_unsigned(&Claims {
        username: Some("marin".to_string()),
        exp: Some(Utc::now().timestamp() + secs),
        ..Claims::default()
    })
    .expect("encode token")
}

#[tokio::test(flavor = "current_thread")]
async fn anonymous_request_sends_only_default_headers() {
    let (client, transport) = client(MemoryTokenStore::new());
    transport.on(
        Method::Get,
        "/tags",
        RawResponse::json(200, &json!([{ "id": 1, "name": "home" }])),
    );

    let tags: Option<Value> = client.fetch(Request::get("/tags")).await.expect("fetch");
    assert_eq!(tags, Some(json!([{ "id": 1, "name": "home" }])));

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "http://localhost:3000/tags");
    assert_eq!(sent[0].header("content-type"), Some("application/json"));
    assert_eq!(sent[0].header("authorization"), None);
}

#[tokio::test(flavor = "current_thread")]
async fn no_content_is_a_value_not_an_error() {
    let (client, transport) = client(MemoryTokenStore::with_token("a.b.c"));
    transport.on(Method::Post, "/tasks/4/complete", RawResponse::empty(204));

    let body: Option<Value> = client
        .fetch(Request::post("/tasks/4/complete"))
        .await
        .expect("204 is success");
    assert_eq!(body, None);
    assert_eq!(
        transport.requests()[0].header("Authorization"),
        Some("Bearer a.b.c")
    );
}

#[tokio::test(flavor = "current_thread")]
async fn unauthorized_clears_token_and_signals_once() {
    let (client, transport) = client(MemoryTokenStore::with_token("a.b.c"));
    transport.on(Method::Get, "/habits", RawResponse::text(401, "token expired"));
    transport.on(Method::Get, "/habits", RawResponse::text(401, "token expired"));

    let first = client.execute(Request::get("/habits")).await;
    assert!(matches!(first, Err(ApiError::SessionExpired)));
    assert!(!client.session().is_logged_in());
    assert_eq!(
        client.session().notifier().state(),
        NotifierState::Firing {
            source: ExpirySource::Unauthorized,
            remaining_secs: 3,
        }
    );

    let mut rx = client.session().subscribe();
    let second = client.execute(Request::get("/habits")).await;
    assert!(matches!(second, Err(ApiError::SessionExpired)));
    assert!(!rx.has_changed().expect("sender alive"));
    assert_eq!(transport.requests()[1].header("authorization"), None);
}

#[tokio::test(flavor = "current_thread")]
async fn other_failures_leave_the_session_alone() {
    let (client, transport) = client(MemoryTokenStore::with_token("a.b.c"));
    transport.on(
        Method::Patch,
        "/tasks/9",
        RawResponse::json(400, &json!({ "message": ["title must not be empty", "bad priority"] })),
    );
    transport.on(Method::Get, "/tasks/9", RawResponse::text(500, "upstream down"));
    transport.fail(Method::Get, "/notes", "connection refused");

    let bad = client
        .execute(Request::patch("/tasks/9").json(&json!({ "title": "" })).expect("json"))
        .await
        .expect_err("400");
    match &bad {
        ApiError::Status { status, body, .. } => {
            assert_eq!(*status, 400);
            assert_eq!(
                body.message().as_deref(),
                Some("title must not be empty; bad priority")
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let down = client.execute(Request::get("/tasks/9")).await.expect_err("500");
    assert_eq!(down.status(), Some(500));
    assert!(matches!(
        down,
        ApiError::Status {
            body: ErrorBody::Text(_),
            ..
        }
    ));

    let offline = client.execute(Request::get("/notes")).await.expect_err("transport");
    assert!(matches!(offline, ApiError::Transport(_)));

    assert!(client.session().is_logged_in());
    assert!(!client.session().notifier().has_fired());
}

#[tokio::test(flavor = "current_thread")]
async fn malformed_json_is_a_decode_error() {
    let (client, transport) = client(MemoryTokenStore::new());
    transport.on(
        Method::Get,
        "/moods",
        RawResponse::new(
            200,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Content-Length".to_string(), "9".to_string()),
            ],
            "{not json",
        ),
    );

    let err = client
        .fetch::<Value>(Request::get("/moods"))
        .await
        .expect_err("decode");
    assert!(matches!(err, ApiError::Decode { ref path, .. } if path == "/moods"));
}

#[tokio::test(flavor = "current_thread")]
async fn missing_content_length_means_no_value() {
    let (client, transport) = client(MemoryTokenStore::with_token("a.b.c"));
    transport.on(
        Method::Get,
        "/tasks/1",
        RawResponse::new(
            200,
            vec![("content-type".to_string(), "application/json".to_string())],
            r#"{"id":1}"#,
        ),
    );
    transport.on(
        Method::Get,
        "/tasks/2",
        RawResponse::new(
            200,
            vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("content-length".to_string(), "0".to_string()),
            ],
            r#"{"id":2}"#,
        ),
    );

    assert_eq!(client.send(Request::get("/tasks/1")).await.expect("send"), Payload::Empty);
    let second: Option<Value> = client.fetch(Request::get("/tasks/2")).await.expect("fetch");
    assert_eq!(second, None);
}

#[tokio::test(flavor = "current_thread")]
async fn plain_text_success_comes_back_as_text() {
    let (client, transport) = client(MemoryTokenStore::new());
    transport.on(Method::Get, "/health", RawResponse::text(200, "ok"));

    let payload = client.send(Request::get("/health")).await.expect("send");
    assert_eq!(payload, Payload::Text("ok".to_string()));
}

#[derive(Default)]
struct Visits(Mutex<Vec<String>>);

impl Navigator for Visits {
    fn redirect(&self, target: &str) {
        self.0.lock().push(target.to_string());
    }
}

#[tokio::test(start_paused = true)]
async fn expired_token_on_disk_is_removed_after_the_countdown() {
    let dir = tempdir().expect("tempdir");
    let store = FileTokenStore::open(dir.path()).expect("open store");
    let token_path = store.path().to_path_buf();

    let session = SessionContext::new(store, 3);
    session.set_token(&token_expiring_in(-30)).expect("store token");
    assert!(token_path.exists());

    let visits = Arc::new(Visits::default());
    let mut states = session.subscribe();
    let handle = SessionWatchdog::new(
        session.clone(),
        WatchdogSettings {
            poll_interval: std::time::Duration::from_secs(5),
            login_path: "/login".to_string(),
        },
        visits.clone(),
    )
    .spawn();

    let mut seen = Vec::new();
    while states.changed().await.is_ok() {
        let state = *states.borrow_and_update();
        seen.push(state);
        if state == NotifierState::Done {
            break;
        }
    }
    handle.finished().await;

    assert_eq!(
        seen,
        vec![
            NotifierState::Firing {
                source: ExpirySource::Poll,
                remaining_secs: 3,
            },
            NotifierState::Firing {
                source: ExpirySource::Poll,
                remaining_secs: 2,
            },
            NotifierState::Firing {
                source: ExpirySource::Poll,
                remaining_secs: 1,
            },
            NotifierState::Done,
        ]
    );
    assert_eq!(*visits.0.lock(), vec!["/login".to_string()]);
    assert!(!token_path.exists());
    assert_eq!(session.token(), None);
}

#[tokio::test(start_paused = true)]
async fn live_token_survives_many_polls() {
    let session = SessionContext::new(MemoryTokenStore::with_token(token_expiring_in(3600)), 3);
    let visits = Arc::new(Visits::default());
    let handle = SessionWatchdog::new(session.clone(), WatchdogSettings::default(), visits.clone())
        .spawn();

    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    assert!(!handle.is_finished());
    handle.stop().await;

    assert!(visits.0.lock().is_empty());
    assert!(session.is_logged_in());
    assert_eq!(session.notifier().state(), NotifierState::Armed);
}
