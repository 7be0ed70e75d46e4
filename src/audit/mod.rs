//! Append-only audit trail for permitted mutations.
//!
//! Recording is best effort: a failing sink is logged and otherwise ignored,
//! so an audit outage never blocks the write it describes.

pub mod postgres;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::permission::{Action, EntityType};

pub use postgres::PostgresAuditSink;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Caller details captured from the HTTP request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// First hop of `x-forwarded-for`, then `x-real-ip`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let ip = header("x-forwarded-for")
            .and_then(|list| list.split(',').next().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .or_else(|| header("x-real-ip"));

        Self {
            ip,
            user_agent: header("user-agent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub actor_id: Option<i64>,
    pub action: Action,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(actor_id: Option<i64>, action: Action, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            actor_id,
            action,
            entity_type,
            entity_id: entity_id.into(),
            old_values: None,
            new_values: None,
            ip: None,
            user_agent: None,
            timestamp: Utc::now(),
        }
    }

    pub fn old_values(mut self, values: Option<Value>) -> Self {
        self.old_values = values;
        self
    }

    pub fn new_values(mut self, values: Option<Value>) -> Self {
        self.new_values = values;
        self
    }

    pub fn request(mut self, meta: &RequestMeta) -> Self {
        self.ip = meta.ip.clone();
        self.user_agent = meta.user_agent.clone();
        self
    }
}

/// Storage for audit records. Implementations only ever append.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    enabled: bool,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink, enabled: true }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Never fails; sink errors are logged and dropped.
    pub async fn record(&self, record: AuditRecord) {
        if !self.enabled {
            return;
        }

        match self.sink.append(&record).await {
            Ok(()) => tracing::debug!(
                action = %record.action,
                entity_type = %record.entity_type,
                entity_id = %record.entity_id,
                "Audit record written"
            ),
            Err(e) => tracing::warn!(
                action = %record.action,
                entity_type = %record.entity_type,
                entity_id = %record.entity_id,
                "Failed to write audit record: {}",
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<AuditRecord>>,
    }

    #[async_trait]
    impl AuditSink for MemorySink {
        async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::Sqlx(sqlx::Error::PoolTimedOut))
        }
    }

    fn sample() -> AuditRecord {
        AuditRecord::new(Some(3), Action::Update, EntityType::MarketplaceAds, "17")
            .old_values(Some(json!({ "title": "Old" })))
            .new_values(Some(json!({ "title": "New" })))
            .request(&RequestMeta {
                ip: Some("203.0.113.9".into()),
                user_agent: Some("curl/8".into()),
            })
    }

    #[tokio::test]
    async fn writes_through_to_sink() {
        let sink = Arc::new(MemorySink::default());
        let recorder = AuditRecorder::new(sink.clone());

        recorder.record(sample()).await;

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_id, "17");
        assert_eq!(records[0].ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(records[0].new_values, Some(json!({ "title": "New" })));
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed() {
        let recorder = AuditRecorder::new(Arc::new(FailingSink));
        // must return normally
        recorder.record(sample()).await;
    }

    #[tokio::test]
    async fn disabled_recorder_skips_sink() {
        let sink = Arc::new(MemorySink::default());
        let recorder = AuditRecorder::new(sink.clone()).enabled(false);
        recorder.record(sample()).await;
        assert!(sink.records.lock().unwrap().is_empty());
    }

    #[test]
    fn request_meta_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.1, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        headers.insert("user-agent", HeaderValue::from_static("AwardsApp/2.1"));

        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip.as_deref(), Some("198.51.100.1"));
        assert_eq!(meta.user_agent.as_deref(), Some("AwardsApp/2.1"));
    }

    #[test]
    fn request_meta_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(meta.user_agent, None);
    }
}
