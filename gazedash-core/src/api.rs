//! Session API gateway.
//!
//! Thin typed wrappers over [`HttpClient`] for the backend endpoints:
//! - `GET  /health`
//! - `GET  /sessions`
//! - `GET  /sessions/{id}`
//! - `GET  /sessions/{id}/events`
//! - `GET  /sessions/{id}/stats`
//! - `POST /sessions/{id}/events`
//!
//! Response shapes are passed through untouched; the wire schema is the
//! in-memory schema.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::ApiConfig;
use crate::error::GazeDashError;
use crate::http::{HttpClient, RequestError, RequestOptions};
use crate::models::{Event, Session, Stats};

/// Result of `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    pub ok: bool,
}

/// Abstraction over the session backend, so the controller can run against
/// either the HTTP gateway or an in-process fake.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    async fn list_sessions(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Session>, RequestError>;

    async fn get_session(
        &self,
        id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Session, RequestError>;

    async fn get_session_events(
        &self,
        id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Event>, RequestError>;

    async fn get_session_stats(
        &self,
        id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Stats, RequestError>;

    /// Append events to a session. The response is returned uninterpreted.
    async fn post_session_events(
        &self,
        id: &str,
        events: &[Event],
        cancel: Option<&CancellationToken>,
    ) -> Result<Value, RequestError>;

    async fn health(&self, cancel: Option<&CancellationToken>) -> Result<Health, RequestError>;
}

// ============================================================================
// HttpSessionGateway
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpSessionGateway {
    http: HttpClient,
    base_url: String,
}

impl HttpSessionGateway {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a gateway (and its HTTP client) from the `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Result<Self, GazeDashError> {
        let http = HttpClient::new(config.timeout())?;
        Ok(Self::new(http, config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn sessions_url(&self) -> String {
        format!("{}/sessions", self.base_url)
    }

    fn session_url(&self, id: &str) -> String {
        format!("{}/sessions/{}", self.base_url, urlencoding::encode(id))
    }
}

#[async_trait]
impl SessionGateway for HttpSessionGateway {
    async fn list_sessions(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Session>, RequestError> {
        self.http
            .request_json(&self.sessions_url(), RequestOptions::get(cancel))
            .await
    }

    async fn get_session(
        &self,
        id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Session, RequestError> {
        self.http
            .request_json(&self.session_url(id), RequestOptions::get(cancel))
            .await
    }

    async fn get_session_events(
        &self,
        id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Event>, RequestError> {
        let url = format!("{}/events", self.session_url(id));
        self.http.request_json(&url, RequestOptions::get(cancel)).await
    }

    async fn get_session_stats(
        &self,
        id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Stats, RequestError> {
        let url = format!("{}/stats", self.session_url(id));
        self.http.request_json(&url, RequestOptions::get(cancel)).await
    }

    async fn post_session_events(
        &self,
        id: &str,
        events: &[Event],
        cancel: Option<&CancellationToken>,
    ) -> Result<Value, RequestError> {
        let url = format!("{}/events", self.session_url(id));
        let opts = RequestOptions::post(events, cancel)?;
        self.http.request_json(&url, opts).await
    }

    async fn health(&self, cancel: Option<&CancellationToken>) -> Result<Health, RequestError> {
        let url = format!("{}/health", self.base_url);
        self.http.request_json(&url, RequestOptions::get(cancel)).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, EventValue};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> HttpSessionGateway {
        let http = HttpClient::new(None).expect("Failed to create client");
        HttpSessionGateway::new(http, format!("{}/", server.uri()))
    }

    fn session_json(id: &str) -> Value {
        json!({
            "id": id,
            "started_at": "2026-03-01T10:00:00+00:00",
            "source": "mock",
            "notes": "First test session"
        })
    }

    #[tokio::test]
    async fn test_list_sessions() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                session_json("s1"),
                { "id": "s2", "started_at": "2026-03-01T11:00:00+00:00", "source": "mock" }
            ])))
            .mount(&mock_server)
            .await;

        let sessions = gateway(&mock_server).list_sessions(None).await.unwrap();

        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().any(|s| s.id == "s1"));
        assert_eq!(sessions[0].notes.as_deref(), Some("First test session"));
        assert_eq!(sessions[1].notes, None);
    }

    #[tokio::test]
    async fn test_session_event_and_stats_urls() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("s1")))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sessions/s1/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ts": "2026-03-01T10:00:00Z", "type": "attention", "value": 0.9, "confidence": 0.95 }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sessions/s1/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events_total": 1,
                "duration_sec": 0.0,
                "attention_avg": 0.9,
                "attention_pct": 100.0,
                "offroad_pct": 0.0,
                "phone_pct": 0.0,
                "drowsy_pct": 0.0
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let gw = gateway(&mock_server);
        let session = gw.get_session("s1", None).await.unwrap();
        let events = gw.get_session_events("s1", None).await.unwrap();
        let stats = gw.get_session_stats("s1", None).await.unwrap();

        assert_eq!(session.id, "s1");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value, EventValue::Number(0.9));
        assert_eq!(stats.events_total, 1);
        assert_eq!(stats.attention_avg, Some(0.9));
        assert_eq!(stats.phone_count, None);
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_base_url() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ApiConfig {
            base_url: format!("{}/", mock_server.uri()),
            timeout_seconds: Some(5),
        };
        let gw = HttpSessionGateway::from_config(&config).expect("gateway should build");

        assert_eq!(gw.base_url(), mock_server.uri());
        assert!(gw.health(None).await.unwrap().ok);
    }

    #[tokio::test]
    async fn test_events_with_null_confidence_still_decode() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/s1/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ts": "2026-03-01T10:00:00Z", "type": "attention", "value": 0.9, "confidence": 0.95 },
                { "ts": "2026-03-01T10:00:01Z", "type": "phone", "value": true, "confidence": null }
            ])))
            .mount(&mock_server)
            .await;

        let events = gateway(&mock_server)
            .get_session_events("s1", None)
            .await
            .expect("a null confidence should not fail the request");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].confidence, Confidence::Score(0.95));
        assert_eq!(events[1].confidence, Confidence::Other(Value::Null));
    }

    #[tokio::test]
    async fn test_session_id_is_path_encoded() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/a%2Fb/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let events = gateway(&mock_server)
            .get_session_events("a/b", None)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_missing_session_404() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/nope"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "detail": "session not found" })),
            )
            .mount(&mock_server)
            .await;

        let err = gateway(&mock_server)
            .get_session("nope", None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail().as_deref(), Some("session not found"));
    }

    #[tokio::test]
    async fn test_post_session_events_sends_event_array() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions/s1/events"))
            .and(body_json(json!([
                { "ts": "2026-03-01T10:00:00Z", "type": "phone", "value": true, "confidence": 0.8 }
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ts": "2026-03-01T10:00:00Z", "type": "phone", "value": true, "confidence": 0.8
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let events = vec![Event {
            ts: "2026-03-01T10:00:00Z".to_string(),
            kind: "phone".to_string(),
            value: EventValue::Flag(true),
            confidence: Confidence::Score(0.8),
        }];
        let response = gateway(&mock_server)
            .post_session_events("s1", &events, None)
            .await
            .unwrap();
        assert_eq!(response["type"], "phone");
    }

    #[tokio::test]
    async fn test_health() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&mock_server)
            .await;

        let health = gateway(&mock_server).health(None).await.unwrap();
        assert!(health.ok);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let http = HttpClient::new(None).unwrap();
        let gw = HttpSessionGateway::new(http, "http://127.0.0.1:8000///");
        assert_eq!(gw.base_url(), "http://127.0.0.1:8000");
        assert_eq!(gw.session_url("s1"), "http://127.0.0.1:8000/sessions/s1");
    }
}
