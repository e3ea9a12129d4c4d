#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use mansei_api::config::ServerConfig;
use mansei_api::router::build_app_router;
use mansei_api::state::AppState;
use mansei_notify::{ConfirmationEmail, EmailError, EmailSender, NotificationSender};
use mansei_store::{BookingStore, QuoteMirror, TtlConfig};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        booking_idle_ttl_secs: 1800,
        booking_read_grace_secs: 600,
        quote_idle_ttl_secs: 3600,
        quote_retention_secs: 600,
        sweep_interval_secs: 60,
    }
}

// ---------------------------------------------------------------------------
// Mock email transport
// ---------------------------------------------------------------------------

/// Recording [`EmailSender`]: keeps every (recipient, mail) pair and can be
/// scripted to fail sends whose recipient contains a given substring.
pub struct MockSender {
    sent: Mutex<Vec<(String, ConfirmationEmail)>>,
    fail_matching: Mutex<Option<String>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_matching: Mutex::new(None),
        }
    }

    /// Fail every send whose recipient address contains `pattern`.
    pub fn fail_recipients_matching(&self, pattern: &str) {
        *self.fail_matching.lock().unwrap() = Some(pattern.to_string());
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }

    pub fn last_body_to(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(recipient, _)| recipient == to)
            .map(|(_, mail)| mail.body.clone())
    }
}

#[async_trait]
impl EmailSender for MockSender {
    async fn send(&self, to: &str, mail: &ConfirmationEmail) -> Result<(), EmailError> {
        let should_fail = self
            .fail_matching
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|pattern| to.contains(pattern.as_str()));
        if should_fail {
            return Err(EmailError::Build("scripted mock failure".to_string()));
        }
        self.sent.lock().unwrap().push((to.to_string(), mail.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

/// A fully wired application plus handles on its injected collaborators.
pub struct TestContext {
    pub app: Router,
    pub bookings: Arc<BookingStore>,
    pub quotes: Arc<QuoteMirror>,
    pub mailer: Arc<MockSender>,
}

/// Build the real router (same middleware stack as production) around
/// in-memory stores and a recording mock mailer.
pub fn test_context() -> TestContext {
    test_context_with(TtlConfig::default(), TtlConfig::default())
}

pub fn test_context_with(booking_ttl: TtlConfig, quote_ttl: TtlConfig) -> TestContext {
    let config = test_config();
    let bookings = Arc::new(BookingStore::new(booking_ttl));
    let quotes = Arc::new(QuoteMirror::new(quote_ttl));
    let mailer = Arc::new(MockSender::new());

    // Millisecond retry backoff so scripted failures don't slow the suite.
    let notifier = Arc::new(NotificationSender::with_retry_delays(
        Arc::clone(&mailer) as Arc<dyn EmailSender>,
        vec![Duration::from_millis(1), Duration::from_millis(1)],
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        bookings: Arc::clone(&bookings),
        quotes: Arc::clone(&quotes),
        notifier,
    };

    TestContext {
        app: build_app_router(state, &config),
        bookings,
        quotes,
        mailer,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Decode a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert status and decode in one step.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
