//! Best-effort notification relay to an embedding host.
//!
//! Mutation events are offered to whatever host is configured; when none is,
//! the calls degrade to logged no-ops. Nothing here may block the caller
//! beyond its own short timeout, and nothing here ever fails the mutation
//! that triggered it.

use std::time::Duration;

use tracing::{debug, warn};

/// Lifecycle event relayed for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Created,
    Updated,
    Deleted,
}

impl TaskAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskAction::Created => "created",
            TaskAction::Updated => "updated",
            TaskAction::Deleted => "deleted",
        }
    }
}

/// Fire-and-forget event sink. No return value: callers never observe
/// delivery.
pub trait NotificationSink {
    fn notify(&self, task_id: &str, action: TaskAction);
}

/// Sink used when no host is configured.
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn notify(&self, task_id: &str, action: TaskAction) {
        debug!(task_id, action = action.as_str(), "no notification host; dropping event");
    }
}

/// Posts `{type, action, taskId}` to a host-configured URL. Delivery errors
/// are logged and swallowed.
pub struct WebhookSink {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookSink {
    pub fn new(url: String) -> Option<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .ok()?;
        Some(WebhookSink { url, client })
    }
}

impl NotificationSink for WebhookSink {
    fn notify(&self, task_id: &str, action: TaskAction) {
        let body = serde_json::json!({
            "type": "task",
            "action": action.as_str(),
            "taskId": task_id,
        });
        match self.client.post(&self.url).json(&body).send() {
            Ok(_) => debug!(task_id, action = action.as_str(), "notified host"),
            Err(err) => warn!(error = %err, "notification host unreachable"),
        }
    }
}

/// The sink for the current environment: a webhook when `YARIMAUSU_NOTIFY_URL`
/// is set, otherwise the no-op.
pub fn sink_from_env() -> Box<dyn NotificationSink> {
    match std::env::var("YARIMAUSU_NOTIFY_URL") {
        Ok(url) if !url.is_empty() => match WebhookSink::new(url) {
            Some(sink) => Box::new(sink),
            None => Box::new(NoopSink),
        },
        _ => Box::new(NoopSink),
    }
}
