use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{extract_error_message, BackendClient, BackendError};
use crate::models::application::{Application, ApplicationDraft, ApplicationStatus, StatusUpdate};
use crate::models::job::{Job, JobDraft};
use crate::models::resume::{Resume, ResumeDraft};
use crate::models::user::{AuthResponse, AuthTokens, LoginRequest, ProfileUpdate, RegisterRequest, User};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    /// Some backends rotate the refresh token, some keep the old one.
    refresh_token: Option<String>,
}

/// `BackendClient` over the REST API with bearer auth.
///
/// A 401 on an authenticated call triggers one refresh-and-retry. If the refresh
/// fails the session tokens are cleared and the original 401 is returned.
/// Refreshes are serialized, so concurrent 401s spend the refresh token once.
pub struct HttpBackendClient {
    client: Client,
    base_url: String,
    tokens: RwLock<Option<AuthTokens>>,
    refresh_lock: Mutex<()>,
}

impl HttpBackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends with the current bearer token and returns the token that was used.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(Response, Option<String>), BackendError> {
        let access_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone());
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(token) = &access_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        debug!("{} {}", method, path);
        Ok((request.send().await?, access_token))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, BackendError> {
        let (response, sent_with) = self.send(method.clone(), path, body.as_ref()).await?;
        if response.status() == StatusCode::UNAUTHORIZED
            && self.try_refresh(sent_with.as_deref()).await
        {
            let (retried, _) = self.send(method, path, body.as_ref()).await?;
            return decode(retried).await;
        }
        decode(response).await
    }

    async fn request_with<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let body = serde_json::to_value(body).map_err(|e| BackendError::Decode(e.to_string()))?;
        self.request(method, path, Some(body)).await
    }

    /// Makes sure an access token other than `rejected` is in place. Returns true
    /// when the caller should retry. A request that waited on another caller's
    /// refresh retries with the new token without refreshing again.
    async fn try_refresh(&self, rejected: Option<&str>) -> bool {
        let _refreshing = self.refresh_lock.lock().await;
        let Some(current) = self.tokens.read().await.clone() else {
            return false;
        };
        if rejected != Some(current.access_token.as_str()) {
            debug!("Access token already replaced, retrying");
            return true;
        }
        match self.refresh(&current.refresh_token).await {
            Ok(tokens) => {
                info!("Access token refreshed");
                *self.tokens.write().await = Some(tokens);
                true
            }
            Err(e) => {
                warn!("Token refresh failed, signing out: {e}");
                *self.tokens.write().await = None;
                false
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = extract_error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
        return Err(BackendError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn set_tokens(&self, tokens: Option<AuthTokens>) {
        *self.tokens.write().await = tokens;
    }

    async fn tokens(&self) -> Option<AuthTokens> {
        self.tokens.read().await.clone()
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        self.request_with(Method::POST, "/auth/login", request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        self.request_with(Method::POST, "/auth/register", request).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, BackendError> {
        // Sent without the bearer header; the expired access token is useless here.
        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let refreshed: RefreshResponse = decode(response).await?;
        Ok(AuthTokens {
            access_token: refreshed.access_token,
            refresh_token: refreshed
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
        })
    }

    async fn logout(&self) -> Result<(), BackendError> {
        let result: Result<IgnoredAny, _> = self.request(Method::POST, "/auth/logout", None).await;
        // Local sign-out happens regardless of what the server says.
        *self.tokens.write().await = None;
        result.map(|_| ())
    }

    async fn fetch_profile(&self) -> Result<User, BackendError> {
        if self.tokens.read().await.is_none() {
            return Err(BackendError::NotAuthenticated);
        }
        self.request(Method::GET, "/auth/me", None).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, BackendError> {
        self.request_with(Method::PUT, "/auth/me", update).await
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, BackendError> {
        self.request(Method::GET, "/jobs", None).await
    }

    async fn create_job(&self, draft: &JobDraft) -> Result<Job, BackendError> {
        self.request_with(Method::POST, "/jobs", draft).await
    }

    async fn update_job(&self, id: Uuid, draft: &JobDraft) -> Result<Job, BackendError> {
        self.request_with(Method::PUT, &format!("/jobs/{id}"), draft)
            .await
    }

    async fn delete_job(&self, id: Uuid) -> Result<(), BackendError> {
        self.request::<IgnoredAny>(Method::DELETE, &format!("/jobs/{id}"), None)
            .await
            .map(|_| ())
    }

    async fn list_applications(&self) -> Result<Vec<Application>, BackendError> {
        self.request(Method::GET, "/applications", None).await
    }

    async fn create_application(
        &self,
        draft: &ApplicationDraft,
    ) -> Result<Application, BackendError> {
        self.request_with(Method::POST, "/applications", draft).await
    }

    async fn update_application(
        &self,
        id: Uuid,
        draft: &ApplicationDraft,
    ) -> Result<Application, BackendError> {
        self.request_with(Method::PUT, &format!("/applications/{id}"), draft)
            .await
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, BackendError> {
        self.request_with(
            Method::PATCH,
            &format!("/applications/{id}/status"),
            &StatusUpdate { status },
        )
        .await
    }

    async fn delete_application(&self, id: Uuid) -> Result<(), BackendError> {
        self.request::<IgnoredAny>(Method::DELETE, &format!("/applications/{id}"), None)
            .await
            .map(|_| ())
    }

    async fn list_resumes(&self) -> Result<Vec<Resume>, BackendError> {
        self.request(Method::GET, "/resumes", None).await
    }

    async fn create_resume(&self, draft: &ResumeDraft) -> Result<Resume, BackendError> {
        self.request_with(Method::POST, "/resumes", draft).await
    }

    async fn update_resume(&self, id: Uuid, draft: &ResumeDraft) -> Result<Resume, BackendError> {
        self.request_with(Method::PUT, &format!("/resumes/{id}"), draft)
            .await
    }

    async fn delete_resume(&self, id: Uuid) -> Result<(), BackendError> {
        self.request::<IgnoredAny>(Method::DELETE, &format!("/resumes/{id}"), None)
            .await
            .map(|_| ())
    }
}
