use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::user_message;
use crate::backend::oauth::parse_callback_fragment;
use crate::backend::{BackendClient, BackendError};
use crate::errors::AppError;
use crate::models::user::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Session state for the signed-in user. Tokens live in the backend client so
/// that its transparent refresh stays the single source of truth.
pub struct AuthStore {
    backend: Arc<dyn BackendClient>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            backend,
            state: RwLock::new(AuthState::default()),
        }
    }

    pub async fn snapshot(&self) -> AuthState {
        self.state.read().await.clone()
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.is_loading = true;
        state.error = None;
    }

    async fn finish<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        let mut state = self.state.write().await;
        state.is_loading = false;
        if let Err(e) = &result {
            state.error = Some(user_message(e));
        }
        result
    }

    async fn sign_in(&self, response: AuthResponse) -> User {
        self.backend.set_tokens(Some(response.tokens())).await;
        let mut state = self.state.write().await;
        state.user = Some(response.user.clone());
        state.is_authenticated = true;
        info!("Signed in as {}", response.user.email);
        response.user
    }

    async fn sign_out_locally(&self) {
        self.backend.set_tokens(None).await;
        let mut state = self.state.write().await;
        state.user = None;
        state.is_authenticated = false;
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<User, AppError> {
        self.begin().await;
        let result: Result<User, AppError> = async {
            let response = self.backend.login(request).await?;
            Ok(self.sign_in(response).await)
        }
        .await;
        self.finish(result).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        self.begin().await;
        let result: Result<User, AppError> = async {
            let response = self.backend.register(request).await?;
            Ok(self.sign_in(response).await)
        }
        .await;
        self.finish(result).await
    }

    /// Signs out locally even when the server call fails.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.begin().await;
        if let Err(e) = self.backend.logout().await {
            warn!("Server-side logout failed: {e}");
        }
        self.sign_out_locally().await;
        self.finish(Ok(())).await
    }

    pub async fn refresh(&self) -> Result<(), AppError> {
        self.begin().await;
        let result: Result<(), AppError> = async {
            let tokens = self.backend.tokens().await.ok_or(AppError::Unauthorized)?;
            match self.backend.refresh(&tokens.refresh_token).await {
                Ok(fresh) => {
                    self.backend.set_tokens(Some(fresh)).await;
                    Ok(())
                }
                Err(e) => {
                    self.sign_out_locally().await;
                    Err(e.into())
                }
            }
        }
        .await;
        self.finish(result).await
    }

    pub async fn fetch_profile(&self) -> Result<User, AppError> {
        self.begin().await;
        let result = self.load_profile().await;
        self.finish(result).await
    }

    async fn load_profile(&self) -> Result<User, AppError> {
        match self.backend.fetch_profile().await {
            Ok(user) => {
                let mut state = self.state.write().await;
                state.user = Some(user.clone());
                state.is_authenticated = true;
                Ok(user)
            }
            Err(e) => {
                if e.status() == Some(401) {
                    self.sign_out_locally().await;
                }
                Err(e.into())
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, AppError> {
        self.begin().await;
        let result: Result<User, AppError> = async {
            let user = self.backend.update_profile(update).await?;
            self.state.write().await.user = Some(user.clone());
            Ok(user)
        }
        .await;
        self.finish(result).await
    }

    /// Finishes an OAuth redirect: store the fragment's tokens, then load the profile.
    pub async fn complete_oauth(&self, fragment: &str) -> Result<User, AppError> {
        self.begin().await;
        let result: Result<User, AppError> = async {
            let tokens = parse_callback_fragment(fragment)
                .map_err(|e| AppError::Validation(e.to_string()))?;
            self.backend.set_tokens(Some(tokens)).await;
            self.load_profile().await.map_err(|e| {
                if matches!(e, AppError::Backend(BackendError::NotAuthenticated)) {
                    AppError::Unauthorized
                } else {
                    e
                }
            })
        }
        .await;
        if result.is_err() {
            self.sign_out_locally().await;
        }
        self.finish(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, PASSWORD};
    use crate::models::user::UserRole;

    fn store() -> (Arc<MockBackend>, AuthStore) {
        let backend = Arc::new(MockBackend::new());
        (backend.clone(), AuthStore::new(backend))
    }

    fn login(password: &str) -> LoginRequest {
        LoginRequest {
            email: "student@example.com".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_sets_user_and_tokens() {
        let (backend, store) = store();
        let user = store.login(&login(PASSWORD)).await.unwrap();
        assert_eq!(user.email, "student@example.com");

        let state = store.snapshot().await;
        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert!(backend.tokens().await.is_some());
    }

    #[tokio::test]
    async fn test_failed_login_records_message_and_clears_loading() {
        let (_, store) = store();
        assert!(store.login(&login("nope")).await.is_err());
        let state = store.snapshot().await;
        assert!(!state.is_loading);
        assert!(!state.is_authenticated);
        assert_eq!(state.error.as_deref(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_register_signs_in_with_role() {
        let (_, store) = store();
        let user = store
            .register(&RegisterRequest {
                email: "hr@acme.io".to_string(),
                password: "secret123".to_string(),
                full_name: "Acme HR".to_string(),
                role: UserRole::Company,
            })
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Company);
        assert!(store.snapshot().await.is_authenticated);
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_if_server_fails() {
        let (backend, store) = store();
        store.login(&login(PASSWORD)).await.unwrap();
        backend.fail_with(500, "boom");
        store.logout().await.unwrap();
        let state = store.snapshot().await;
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert!(backend.tokens().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_session_is_unauthorized() {
        let (_, store) = store();
        assert!(matches!(store.refresh().await, Err(AppError::Unauthorized)));
        assert!(!store.snapshot().await.is_loading);
    }

    #[tokio::test]
    async fn test_refresh_failure_signs_out() {
        let (backend, store) = store();
        store.login(&login(PASSWORD)).await.unwrap();
        backend.fail_with(401, "Refresh token expired");
        assert!(store.refresh().await.is_err());
        assert!(!store.snapshot().await.is_authenticated);
        assert!(backend.tokens().await.is_none());
    }

    #[tokio::test]
    async fn test_complete_oauth_loads_profile() {
        let (backend, store) = store();
        let user = store
            .complete_oauth("#access_token=abc&refresh_token=def")
            .await
            .unwrap();
        assert_eq!(user.full_name, "OAuth User");
        assert_eq!(backend.tokens().await.unwrap().access_token, "abc");
        assert!(store.snapshot().await.is_authenticated);
    }

    #[tokio::test]
    async fn test_complete_oauth_rejects_bad_fragment() {
        let (backend, store) = store();
        let err = store.complete_oauth("#access_token=abc").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(backend.tokens().await.is_none());
        assert!(store.snapshot().await.error.is_some());
        assert!(!backend.calls().contains(&"fetch_profile".to_string()));
    }

    #[tokio::test]
    async fn test_update_profile_replaces_user() {
        let (_, store) = store();
        store.login(&login(PASSWORD)).await.unwrap();
        let user = store
            .update_profile(&ProfileUpdate {
                full_name: Some("Renamed".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(user.full_name, "Renamed");
        assert_eq!(
            store.snapshot().await.user.map(|u| u.full_name).as_deref(),
            Some("Renamed")
        );
    }
}
