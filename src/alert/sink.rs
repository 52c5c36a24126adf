//! Notification delivery.
//!
//! The panel hands each [`Notification`](super::Notification) to a
//! [`NotificationSink`]. Delivery is best effort: a failed send is logged and
//! the notifier's state is left as it is.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sensor_panel::alert::{NotificationSink, PushoverSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = PushoverSink::builder()
//!         .credentials("app-token", "user-key")
//!         .build()?;
//!
//!     sink.send("cpu detected 81.0 > 80.0", "cpu alarm")?;
//!     Ok(())
//! }
//! ```

use std::fmt::Debug;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Pushover message endpoint.
pub const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No async runtime to deliver on.
    #[error("Notification runtime unavailable: {0}")]
    Unavailable(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("Notification rejected with status {0}")]
    Rejected(u16),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotifyError::Timeout
        } else if err.is_connect() {
            NotifyError::Connection(err.to_string())
        } else {
            NotifyError::Http(err.to_string())
        }
    }
}

/// Destination for alarm and clear notifications.
pub trait NotificationSink: Send + Debug {
    /// Queue a notification. Returns once the message is handed off.
    fn send(&self, message: &str, title: &str) -> Result<(), NotifyError>;

    /// Human-readable description of the sink.
    fn description(&self) -> &str;
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn send(&self, message: &str, title: &str) -> Result<(), NotifyError> {
        warn!(title, "{}", message);
        Ok(())
    }

    fn description(&self) -> &str {
        "log"
    }
}

#[derive(Debug, Serialize)]
struct PushoverMessage<'a> {
    token: &'a str,
    user: &'a str,
    message: &'a str,
    title: &'a str,
}

/// Sends notifications through the Pushover HTTP API.
///
/// `send` spawns the request on the current tokio runtime and returns
/// immediately, so a slow or unreachable service never stalls the panel.
#[derive(Debug, Clone)]
pub struct PushoverSink {
    client: Client,
    endpoint: String,
    token: String,
    user: String,
}

impl PushoverSink {
    pub fn builder() -> PushoverSinkBuilder {
        PushoverSinkBuilder::default()
    }

    async fn deliver(
        client: Client,
        endpoint: String,
        token: String,
        user: String,
        message: String,
        title: String,
    ) -> Result<(), NotifyError> {
        let body = PushoverMessage {
            token: &token,
            user: &user,
            message: &message,
            title: &title,
        };
        let response = client.post(&endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

impl NotificationSink for PushoverSink {
    fn send(&self, message: &str, title: &str) -> Result<(), NotifyError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| NotifyError::Unavailable(e.to_string()))?;

        let title = title.to_string();
        let delivery = Self::deliver(
            self.client.clone(),
            self.endpoint.clone(),
            self.token.clone(),
            self.user.clone(),
            message.to_string(),
            title.clone(),
        );
        handle.spawn(async move {
            match delivery.await {
                Ok(()) => debug!(title, "Notification delivered"),
                Err(e) => warn!(title, error = %e, "Notification delivery failed"),
            }
        });
        Ok(())
    }

    fn description(&self) -> &str {
        "pushover"
    }
}

/// Builder for PushoverSink.
#[derive(Debug, Default)]
pub struct PushoverSinkBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    user: Option<String>,
    timeout: Option<Duration>,
}

impl PushoverSinkBuilder {
    /// Override the message endpoint (default: the public Pushover API).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the application token and user key.
    pub fn credentials(mut self, token: impl Into<String>, user: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self.user = Some(user.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<PushoverSink, NotifyError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(PushoverSink {
            client,
            endpoint: self.endpoint.unwrap_or_else(|| PUSHOVER_ENDPOINT.to_string()),
            token: self.token.unwrap_or_default(),
            user: self.user.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let sink = PushoverSink::builder().build().unwrap();
        assert_eq!(sink.endpoint, PUSHOVER_ENDPOINT);
        assert!(sink.token.is_empty());
        assert_eq!(sink.description(), "pushover");
    }

    #[test]
    fn test_builder_custom() {
        let sink = PushoverSink::builder()
            .endpoint("http://127.0.0.1:9/messages.json")
            .credentials("tok", "usr")
            .build()
            .unwrap();
        assert_eq!(sink.endpoint, "http://127.0.0.1:9/messages.json");
        assert_eq!(sink.token, "tok");
        assert_eq!(sink.user, "usr");
    }

    #[test]
    fn test_message_body() {
        let body = PushoverMessage {
            token: "tok",
            user: "usr",
            message: "cpu detected 81.0 > 80.0",
            title: "cpu alarm",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["token"], "tok");
        assert_eq!(json["user"], "usr");
        assert_eq!(json["message"], "cpu detected 81.0 > 80.0");
        assert_eq!(json["title"], "cpu alarm");
    }

    #[test]
    fn test_send_without_runtime() {
        let sink = PushoverSink::builder().build().unwrap();
        assert!(matches!(sink.send("m", "t"), Err(NotifyError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_send_does_not_wait_for_delivery() {
        let sink = PushoverSink::builder()
            .endpoint("http://127.0.0.1:9/messages.json")
            .credentials("tok", "usr")
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        assert!(sink.send("m", "t").is_ok());
    }

    #[test]
    fn test_log_sink() {
        assert!(LogSink.send("gas detected 11 > 10", "gas alarm").is_ok());
        assert_eq!(LogSink.description(), "log");
    }
}
