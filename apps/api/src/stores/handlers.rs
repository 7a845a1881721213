//! Axum route handlers for auth and the cached backend resources.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{Application, StatusUpdate};
use crate::models::job::Job;
use crate::models::resume::Resume;
use crate::models::user::{LoginRequest, ProfileUpdate, RegisterRequest, User};
use crate::state::AppState;
use crate::stores::auth::AuthState;
use crate::stores::{Resource, ResourceStore};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackRequest {
    /// Raw URL fragment, e.g. `#access_token=...&refresh_token=...`.
    pub fragment: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

// ────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/auth/session
pub async fn handle_session(State(state): State<AppState>) -> Json<AuthState> {
    Json(state.auth.snapshot().await)
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }
    let user = state.auth.login(&request).await?;
    Ok(Json(UserResponse { user }))
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.auth.register(&request).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.auth.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/refresh
pub async fn handle_refresh(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.auth.refresh().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/oauth/callback
pub async fn handle_oauth_callback(
    State(state): State<AppState>,
    Json(request): Json<OAuthCallbackRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth.complete_oauth(&request.fragment).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /api/v1/auth/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth.fetch_profile().await?;
    Ok(Json(UserResponse { user }))
}

/// PUT /api/v1/auth/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth.update_profile(&update).await?;
    Ok(Json(UserResponse { user }))
}

// ────────────────────────────────────────────────────────────────────────────
// Resources
// ────────────────────────────────────────────────────────────────────────────

/// Picks the store a resource type is cached in.
pub trait Cached: Resource {
    fn store(state: &AppState) -> &ResourceStore<Self>;
}

impl Cached for Job {
    fn store(state: &AppState) -> &ResourceStore<Self> {
        &state.jobs
    }
}

impl Cached for Application {
    fn store(state: &AppState) -> &ResourceStore<Self> {
        &state.applications
    }
}

impl Cached for Resume {
    fn store(state: &AppState) -> &ResourceStore<Self> {
        &state.resumes
    }
}

/// GET /api/v1/{jobs,applications,resumes}
pub async fn handle_list<R: Cached>(
    State(state): State<AppState>,
) -> Result<Json<Vec<R>>, AppError> {
    Ok(Json(R::store(&state).fetch_all().await?))
}

/// POST /api/v1/{jobs,applications,resumes}
pub async fn handle_create<R: Cached>(
    State(state): State<AppState>,
    Json(draft): Json<R::Draft>,
) -> Result<(StatusCode, Json<R>), AppError> {
    let item = R::store(&state).create(&draft).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/v1/{jobs,applications,resumes}/:id
///
/// Served from the cache; reloads the list once on a miss.
pub async fn handle_get<R: Cached>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<R>, AppError> {
    let store = R::store(&state);
    if let Some(item) = store.get(id).await {
        return Ok(Json(item));
    }
    store.fetch_all().await?;
    store
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", R::NAME)))
}

/// PUT /api/v1/{jobs,applications,resumes}/:id
pub async fn handle_update<R: Cached>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<R::Draft>,
) -> Result<Json<R>, AppError> {
    Ok(Json(R::store(&state).update(id, &draft).await?))
}

/// DELETE /api/v1/{jobs,applications,resumes}/:id
pub async fn handle_delete<R: Cached>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    R::store(&state).remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_application_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Application>, AppError> {
    Ok(Json(
        state.applications.update_status(id, update.status).await?,
    ))
}
