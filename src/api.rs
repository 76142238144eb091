//! REST boundary for the Yarimausu service.
//!
//! The mutation coordinator talks to the service exclusively through the
//! [`Remote`] trait, so tests can substitute an in-memory fake. [`HttpRemote`]
//! is the real implementation over a blocking reqwest client.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::fields::Status;
use crate::task::{Comment, ListSnapshot, Task, TaskList};

/// Result alias for boundary operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error taxonomy the coordinator distinguishes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Entity deleted or the id is wrong. Terminal; no retry.
    #[error("not found")]
    NotFound,
    /// 429 from the service. Rolled back like any failure, but surfaced
    /// with its own message.
    #[error("server busy, retry later")]
    RateLimited,
    /// Rejected client-side before any request was issued.
    #[error("{0}")]
    Validation(String),
    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),
    /// Any other non-2xx status.
    #[error("server error (status {0})")]
    Server(u16),
    /// 2xx with a body we could not decode.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the bounded-backoff initial fetch should try again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Server(_) | ApiError::RateLimited
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Partial task update. Only set fields are serialised, matching the
/// service's any-subset PATCH contract.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

/// One `{id, position}` pair of a batch reorder request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionUpdate {
    pub id: String,
    pub position: i64,
}

/// Initial task supplied when creating a list.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

/// Operations the coordinator needs from the service.
pub trait Remote {
    /// Create a list with its initial tasks; returns the new list id.
    fn create_list(&self, title: &str, description: &str, tasks: &[NewTask]) -> ApiResult<String>;
    fn fetch_list(&self, list_id: &str) -> ApiResult<ListSnapshot>;
    fn update_list(&self, list_id: &str, title: &str, description: &str) -> ApiResult<TaskList>;
    fn create_task(
        &self,
        list_id: &str,
        title: &str,
        description: &str,
        priority: Option<f64>,
    ) -> ApiResult<Task>;
    fn update_task(&self, list_id: &str, task_id: &str, patch: &TaskPatch) -> ApiResult<Task>;
    fn delete_task(&self, list_id: &str, task_id: &str) -> ApiResult<()>;
    /// Batch position update. Items that failed server-side are omitted from
    /// the response, not retried.
    fn reorder(&self, list_id: &str, updates: &[PositionUpdate]) -> ApiResult<Vec<Task>>;
    fn comments(&self, task_id: &str) -> ApiResult<Vec<Comment>>;
    fn add_comment(&self, task_id: &str, content: &str, user_name: Option<&str>)
        -> ApiResult<Comment>;
}

/// Attempts for the initial list fetch, counting the first try.
pub const FETCH_ATTEMPTS: u32 = 3;
/// Base delay before the first re-attempt; grows by 1.5x per attempt.
pub const FETCH_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Run `op` with bounded exponential backoff. Only transient errors are
/// retried; after the last attempt the error is returned as-is.
pub fn with_retry<T>(
    mut op: impl FnMut() -> ApiResult<T>,
    attempts: u32,
    base_delay: Duration,
) -> ApiResult<T> {
    let mut delay = base_delay;
    let mut remaining = attempts.max(1);
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && remaining > 1 => {
                remaining -= 1;
                warn!(error = %err, retries_left = remaining, "retrying after transient error");
                thread::sleep(delay);
                delay = delay.mul_f64(1.5);
            }
            Err(err) => return Err(err),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct CreatedBody {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListBody {
    task_list: TaskList,
}

#[derive(Deserialize)]
struct TaskBody {
    task: Task,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderBody {
    updated_tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct CommentsBody {
    comments: Vec<Comment>,
}

#[derive(Deserialize)]
struct CommentBody {
    comment: Comment,
}

/// Blocking HTTP implementation of the boundary.
pub struct HttpRemote {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpRemote {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("yarimausu-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpRemote {
            base: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Map a response to the error taxonomy, or decode its JSON body.
    fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::blocking::Response,
    ) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().map_err(ApiError::from);
        }
        match status.as_u16() {
            404 => Err(ApiError::NotFound),
            429 => Err(ApiError::RateLimited),
            400 => {
                let message = response
                    .json::<ErrorBody>()
                    .map(|b| b.error)
                    .unwrap_or_else(|_| "invalid request".to_string());
                Err(ApiError::Validation(message))
            }
            code => Err(ApiError::Server(code)),
        }
    }
}

impl Remote for HttpRemote {
    fn create_list(&self, title: &str, description: &str, tasks: &[NewTask]) -> ApiResult<String> {
        let response = self
            .client
            .post(self.url("/lists"))
            .json(&serde_json::json!({
                "title": title,
                "description": description,
                "tasks": tasks,
            }))
            .send()?;
        Self::decode::<CreatedBody>(response).map(|b| b.id)
    }

    fn fetch_list(&self, list_id: &str) -> ApiResult<ListSnapshot> {
        let response = self.client.get(self.url(&format!("/lists/{list_id}"))).send()?;
        Self::decode(response)
    }

    fn update_list(&self, list_id: &str, title: &str, description: &str) -> ApiResult<TaskList> {
        let response = self
            .client
            .patch(self.url(&format!("/lists/{list_id}")))
            .json(&serde_json::json!({ "title": title, "description": description }))
            .send()?;
        Self::decode::<ListBody>(response).map(|b| b.task_list)
    }

    fn create_task(
        &self,
        list_id: &str,
        title: &str,
        description: &str,
        priority: Option<f64>,
    ) -> ApiResult<Task> {
        let mut body = serde_json::json!({ "title": title, "description": description });
        if let Some(p) = priority {
            body["priority"] = serde_json::json!(p);
        }
        let response = self
            .client
            .post(self.url(&format!("/lists/{list_id}/tasks")))
            .json(&body)
            .send()?;
        Self::decode::<TaskBody>(response).map(|b| b.task)
    }

    fn update_task(&self, list_id: &str, task_id: &str, patch: &TaskPatch) -> ApiResult<Task> {
        let response = self
            .client
            .patch(self.url(&format!("/lists/{list_id}/tasks/{task_id}")))
            .json(patch)
            .send()?;
        Self::decode::<TaskBody>(response).map(|b| b.task)
    }

    fn delete_task(&self, list_id: &str, task_id: &str) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/lists/{list_id}/tasks/{task_id}")))
            .send()?;
        Self::decode::<serde_json::Value>(response).map(|_| ())
    }

    fn reorder(&self, list_id: &str, updates: &[PositionUpdate]) -> ApiResult<Vec<Task>> {
        let response = self
            .client
            .patch(self.url(&format!("/lists/{list_id}/tasks/reorder")))
            .json(&serde_json::json!({ "tasks": updates }))
            .send()?;
        Self::decode::<ReorderBody>(response).map(|b| b.updated_tasks)
    }

    fn comments(&self, task_id: &str) -> ApiResult<Vec<Comment>> {
        let response = self
            .client
            .get(self.url(&format!("/tasks/{task_id}/comments")))
            .send()?;
        Self::decode::<CommentsBody>(response).map(|b| b.comments)
    }

    fn add_comment(
        &self,
        task_id: &str,
        content: &str,
        user_name: Option<&str>,
    ) -> ApiResult<Comment> {
        let mut body = serde_json::json!({ "content": content });
        if let Some(name) = user_name {
            body["userName"] = serde_json::json!(name);
        }
        let response = self
            .client
            .post(self.url(&format!("/tasks/{task_id}/comments")))
            .json(&body)
            .send()?;
        Self::decode::<CommentBody>(response).map(|b| b.comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_stops_after_bounded_attempts() {
        let calls = Cell::new(0u32);
        let result: ApiResult<()> = with_retry(
            || {
                calls.set(calls.get() + 1);
                Err(ApiError::Server(500))
            },
            3,
            Duration::from_millis(1),
        );
        assert!(matches!(result, Err(ApiError::Server(500))));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn retry_returns_first_success() {
        let calls = Cell::new(0u32);
        let result = with_retry(
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(ApiError::Network("connection reset".into()))
                } else {
                    Ok(42)
                }
            },
            3,
            Duration::from_millis(1),
        );
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn not_found_is_never_retried() {
        let calls = Cell::new(0u32);
        let result: ApiResult<()> = with_retry(
            || {
                calls.set(calls.get() + 1);
                Err(ApiError::NotFound)
            },
            3,
            Duration::from_millis(1),
        );
        assert!(matches!(result, Err(ApiError::NotFound)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn patch_serialises_only_set_fields() {
        let patch = TaskPatch {
            completed: Some(true),
            progress_percentage: Some(100),
            assigned_to: Some("mika".into()),
            ..TaskPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "completed": true,
                "progressPercentage": 100,
                "assignedTo": "mika",
            })
        );
    }
}
