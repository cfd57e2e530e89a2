//! Spreadsheet webhook sync.
//!
//! Every logged set can be mirrored to an HTTP endpoint (typically a
//! spreadsheet script) as a JSON POST. Delivery is best-effort: failures
//! are logged and never reach the workout.

use std::time::Duration;

use reqwest::{Url, redirect};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::model::WorkoutLogEntry;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a delivery failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(String),

    #[error("webhook returned HTTP {0}")]
    HttpStatus(u16),

    #[error("webhook timed out")]
    Timeout,
}

/// Row shape sent to the webhook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncRow<'a> {
    date: String,
    exercise_name: &'a str,
    workout_type: &'a str,
    weight: f64,
    reached_failure: bool,
    profile: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    reps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rpe: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

impl<'a> From<&'a WorkoutLogEntry> for SyncRow<'a> {
    fn from(e: &'a WorkoutLogEntry) -> Self {
        Self {
            date: e.date.to_rfc3339(),
            exercise_name: &e.exercise_name,
            workout_type: &e.workout_type,
            weight: e.weight,
            reached_failure: e.reached_failure,
            profile: e.profile.number(),
            reps: e.reps,
            rpe: e.rpe,
            notes: e.notes.as_deref(),
        }
    }
}

/// Webhook client.
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl SyncClient {
    /// Builds a client for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] unless `url` is an absolute
    /// http(s) URL.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let invalid = |expected: &str| ConfigError::InvalidValue {
            field: "sync.webhook_url".to_string(),
            value: url.to_string(),
            expected: expected.to_string(),
        };
        let parsed = Url::parse(url).map_err(|_| invalid("an absolute URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("an http or https URL"));
        }
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::limited(3))
            .build()
            .map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            client,
            url: parsed,
            timeout,
        })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Posts one entry and waits for the response.
    ///
    /// # Errors
    ///
    /// Network failures, timeouts and non-2xx responses.
    pub async fn send(&self, entry: &WorkoutLogEntry) -> Result<(), SyncError> {
        let row = SyncRow::from(entry);
        debug!(url = %self.url, exercise = %entry.exercise_name, "syncing log entry");

        let response = tokio::time::timeout(
            self.timeout,
            self.client.post(self.url.clone()).json(&row).send(),
        )
        .await
        .map_err(|_| SyncError::Timeout)?
        .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }

    /// Sends in the background. Returns whether a task was spawned; outside
    /// a tokio runtime the entry is skipped.
    pub fn push(&self, entry: &WorkoutLogEntry) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(exercise = %entry.exercise_name, "no async runtime, webhook sync skipped");
            return false;
        };
        let client = self.clone();
        let entry = entry.clone();
        handle.spawn(async move {
            if let Err(e) = client.send(&entry).await {
                warn!(error = %e, exercise = %entry.exercise_name, "webhook sync failed");
            }
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use uuid::Uuid;

    use super::*;
    use crate::model::Profile;

    fn entry() -> WorkoutLogEntry {
        WorkoutLogEntry {
            id: Uuid::new_v4(),
            date: Utc::now(),
            exercise_name: "Leg Press".to_string(),
            workout_type: "workout".to_string(),
            weight: 140.0,
            reached_failure: true,
            profile: Profile::PRIMARY,
            rpe: Some(9),
            notes: None,
            duration: None,
            reps: None,
        }
    }

    /// Accepts one connection, answers with `status`, returns the request.
    async fn one_shot_server(status: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = String::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.push_str(&String::from_utf8_lossy(&buf[..n]));
                if n == 0 || request.contains("\"reachedFailure\"") {
                    break;
                }
            }
            let reply = format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            socket.write_all(reply.as_bytes()).await.unwrap();
            request
        });
        (format!("http://{addr}/hook"), handle)
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(SyncClient::new("ftp://example.com/x", DEFAULT_TIMEOUT).is_err());
        assert!(SyncClient::new("not a url", DEFAULT_TIMEOUT).is_err());
        assert!(SyncClient::new("https://example.com/hook", DEFAULT_TIMEOUT).is_ok());
    }

    #[test]
    fn push_without_runtime_is_skipped() {
        let client = SyncClient::new("http://127.0.0.1:9/hook", DEFAULT_TIMEOUT).unwrap();
        assert!(!client.push(&entry()));
    }

    #[tokio::test]
    async fn send_posts_camel_case_row() {
        let (url, server) = one_shot_server("200 OK").await;
        let client = SyncClient::new(&url, DEFAULT_TIMEOUT).unwrap();
        client.send(&entry()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /hook"));
        assert!(request.contains("\"exerciseName\":\"Leg Press\""));
        assert!(request.contains("\"rpe\":9"));
        assert!(!request.contains("\"notes\""));
    }

    #[tokio::test]
    async fn send_reports_http_status() {
        let (url, server) = one_shot_server("500 Internal Server Error").await;
        let client = SyncClient::new(&url, DEFAULT_TIMEOUT).unwrap();
        let err = client.send(&entry()).await.unwrap_err();
        assert!(matches!(err, SyncError::HttpStatus(500)));
        server.await.unwrap();
    }
}
