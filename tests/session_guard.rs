//! Integration tests for the session guard.
//!
//! These start a real Axum stub backend on a random port and drive the
//! guard against it over HTTP, verifying the core contract: bearer
//! attachment from storage at send time, 401-triggered teardown with
//! exactly one login redirect per response, and idempotent teardown.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use reqwest::Method;
use tempfile::TempDir;
use url::Url;

use qanouni::session::{LoginBoundary, SessionGuard, SessionStore, TOKEN_KEY, USER_KEY};

/// Records the Authorization header of every request that reaches the stub.
#[derive(Default)]
struct Seen {
    auth_headers: Mutex<Vec<Option<String>>>,
}

impl Seen {
    fn headers(&self) -> Vec<Option<String>> {
        self.auth_headers.lock().unwrap().clone()
    }
}

async fn record_auth(State(seen): State<Arc<Seen>>, headers: HeaderMap) -> &'static str {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.auth_headers.lock().unwrap().push(auth);
    "ok"
}

async fn expired() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

async fn start_stub() -> (SocketAddr, Arc<Seen>) {
    let seen = Arc::new(Seen::default());
    let app = Router::new()
        .route("/api/echo-auth", get(record_auth))
        .route("/api/expired", get(expired))
        .route("/health", get(record_auth))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

#[derive(Default)]
struct CountingBoundary {
    redirects: AtomicUsize,
}

impl LoginBoundary for CountingBoundary {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

fn guard_for(addr: SocketAddr, dir: &TempDir, boundary: Arc<CountingBoundary>) -> SessionGuard {
    let store = SessionStore::new(dir.path());
    SessionGuard::new(
        Url::parse(&format!("http://{addr}/api")).unwrap(),
        Duration::from_secs(5),
        store,
        boundary,
    )
    .unwrap()
}

fn signed_in(store: &SessionStore, token: &str) {
    store.put(TOKEN_KEY, token).unwrap();
    store
        .put(USER_KEY, r#"{"full_name":"Test","role":"normal"}"#)
        .unwrap();
}

#[tokio::test]
async fn bearer_attached_when_credential_in_storage() {
    let (addr, seen) = start_stub().await;
    let dir = TempDir::new().unwrap();
    let guard = guard_for(addr, &dir, Arc::new(CountingBoundary::default()));
    signed_in(guard.store(), "tok-123");

    let response = guard
        .send(guard.request(Method::GET, "echo-auth").unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        seen.headers(),
        vec![Some("Bearer tok-123".to_string())],
    );
}

#[tokio::test]
async fn no_header_when_signed_out() {
    let (addr, seen) = start_stub().await;
    let dir = TempDir::new().unwrap();
    let guard = guard_for(addr, &dir, Arc::new(CountingBoundary::default()));

    guard
        .send(guard.request(Method::GET, "echo-auth").unwrap())
        .await
        .unwrap();

    assert_eq!(seen.headers(), vec![None]);
}

#[tokio::test]
async fn storage_is_the_source_of_truth_not_a_snapshot() {
    let (addr, seen) = start_stub().await;
    let dir = TempDir::new().unwrap();
    let guard = guard_for(addr, &dir, Arc::new(CountingBoundary::default()));
    signed_in(guard.store(), "tok-1");

    guard
        .send(guard.request(Method::GET, "echo-auth").unwrap())
        .await
        .unwrap();

    // A teardown between requests is respected immediately.
    guard.teardown();

    guard
        .send(guard.request(Method::GET, "echo-auth").unwrap())
        .await
        .unwrap();

    assert_eq!(
        seen.headers(),
        vec![Some("Bearer tok-1".to_string()), None],
    );
}

#[tokio::test]
async fn unauthorized_tears_down_and_redirects_exactly_once() {
    let (addr, _seen) = start_stub().await;
    let dir = TempDir::new().unwrap();
    let boundary = Arc::new(CountingBoundary::default());
    let guard = guard_for(addr, &dir, boundary.clone());
    signed_in(guard.store(), "stale");

    let response = guard
        .send(guard.request(Method::GET, "expired").unwrap())
        .await
        .unwrap();

    // The response is still handed back unmodified.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // But the session is gone and the login boundary was invoked once.
    assert_eq!(guard.store().get(TOKEN_KEY).unwrap(), None);
    assert_eq!(guard.store().get(USER_KEY).unwrap(), None);
    assert_eq!(boundary.redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn each_unauthorized_response_redirects_once() {
    let (addr, _seen) = start_stub().await;
    let dir = TempDir::new().unwrap();
    let boundary = Arc::new(CountingBoundary::default());
    let guard = guard_for(addr, &dir, boundary.clone());
    signed_in(guard.store(), "stale");

    for _ in 0..2 {
        guard
            .send(guard.request(Method::GET, "expired").unwrap())
            .await
            .unwrap();
    }

    assert_eq!(boundary.redirects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn non_api_targets_get_no_credential() {
    let (addr, seen) = start_stub().await;
    let dir = TempDir::new().unwrap();
    let guard = guard_for(addr, &dir, Arc::new(CountingBoundary::default()));
    signed_in(guard.store(), "tok-123");

    let url = Url::parse(&format!("http://{addr}/health")).unwrap();
    guard
        .send(guard.request_url(Method::GET, url))
        .await
        .unwrap();

    assert_eq!(seen.headers(), vec![None]);
}

#[tokio::test]
async fn teardown_is_idempotent() {
    let (addr, _seen) = start_stub().await;
    let dir = TempDir::new().unwrap();
    let guard = guard_for(addr, &dir, Arc::new(CountingBoundary::default()));
    signed_in(guard.store(), "tok");

    guard.teardown();
    guard.teardown();

    assert_eq!(guard.store().get(TOKEN_KEY).unwrap(), None);
    assert_eq!(guard.store().get(USER_KEY).unwrap(), None);
}
