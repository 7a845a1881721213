//! External REST backend: the contract this service consumes, never defines.
//!
//! Stores and wizard submissions depend on the `BackendClient` trait, so the real
//! HTTP client can be swapped for a test double without touching business logic.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationDraft, ApplicationStatus};
use crate::models::job::{Job, JobDraft};
use crate::models::resume::{Resume, ResumeDraft};
use crate::models::user::{AuthResponse, AuthTokens, LoginRequest, ProfileUpdate, RegisterRequest, User};

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod oauth;

pub use http::HttpBackendClient;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Not signed in")]
    NotAuthenticated,
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::NotAuthenticated => Some(401),
            BackendError::Http(e) => e.status().map(|s| s.as_u16()),
            BackendError::Decode(_) => None,
        }
    }

    /// Short text fit for a toast or inline banner.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Http(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            BackendError::Http(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            BackendError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            BackendError::Api { .. } => "The request failed. Please try again.".to_string(),
            BackendError::Decode(_) => "The server sent an unexpected response.".to_string(),
            BackendError::NotAuthenticated => "Please sign in to continue.".to_string(),
        }
    }
}

/// Pulls a human-readable message out of an error body.
/// Looks at `detail`, then `message`, then `error.message`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    match value.get("detail") {
        Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
        // Field-level validation lists: [{ "msg": "..." }, ...]
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").and_then(Value::as_str))
                .collect();
            if !msgs.is_empty() {
                return Some(msgs.join("; "));
            }
        }
        _ => {}
    }

    if let Some(msg) = value.get("message").and_then(Value::as_str) {
        if !msg.trim().is_empty() {
            return Some(msg.to_string());
        }
    }

    match value.get("error") {
        Some(Value::Object(err)) => err
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

#[async_trait]
pub trait BackendClient: Send + Sync {
    // Session tokens
    async fn set_tokens(&self, tokens: Option<AuthTokens>);
    async fn tokens(&self) -> Option<AuthTokens>;

    // Auth
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, BackendError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, BackendError>;
    async fn logout(&self) -> Result<(), BackendError>;
    async fn fetch_profile(&self) -> Result<User, BackendError>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, BackendError>;

    // Jobs
    async fn list_jobs(&self) -> Result<Vec<Job>, BackendError>;
    async fn create_job(&self, draft: &JobDraft) -> Result<Job, BackendError>;
    async fn update_job(&self, id: Uuid, draft: &JobDraft) -> Result<Job, BackendError>;
    async fn delete_job(&self, id: Uuid) -> Result<(), BackendError>;

    // Applications
    async fn list_applications(&self) -> Result<Vec<Application>, BackendError>;
    async fn create_application(
        &self,
        draft: &ApplicationDraft,
    ) -> Result<Application, BackendError>;
    async fn update_application(
        &self,
        id: Uuid,
        draft: &ApplicationDraft,
    ) -> Result<Application, BackendError>;
    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, BackendError>;
    async fn delete_application(&self, id: Uuid) -> Result<(), BackendError>;

    // Resumes
    async fn list_resumes(&self) -> Result<Vec<Resume>, BackendError>;
    async fn create_resume(&self, draft: &ResumeDraft) -> Result<Resume, BackendError>;
    async fn update_resume(&self, id: Uuid, draft: &ResumeDraft) -> Result<Resume, BackendError>;
    async fn delete_resume(&self, id: Uuid) -> Result<(), BackendError>;
}
