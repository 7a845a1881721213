//! Axum route handlers for the wizard API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::wizard::actions::{self, Submitted, Suggestion};
use crate::wizard::controller::Advance;
use crate::wizard::form::FieldValue;
use crate::wizard::session::WizardView;
use crate::wizard::steps::WizardKind;
use crate::wizard::validation::{FormValidation, ValidationResult};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct WizardKindSummary {
    pub kind: WizardKind,
    pub steps: Vec<&'static str>,
    pub generation_targets: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct OpenWizardRequest {
    pub kind: WizardKind,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldsRequest {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub remove: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub record_id: Uuid,
    pub wizard: WizardView,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    #[serde(flatten)]
    pub outcome: Advance,
    pub wizard: WizardView,
}

#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    pub step: usize,
}

#[derive(Debug, Serialize)]
pub struct DraftSavedResponse {
    pub kind: WizardKind,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub current: ValidationResult,
    /// Where a "fix errors" link should send the user.
    pub first_invalid_step: Option<usize>,
    pub form: FormValidation,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/wizards
pub async fn handle_list_kinds() -> Json<Vec<WizardKindSummary>> {
    Json(
        WizardKind::ALL
            .iter()
            .map(|kind| {
                let definition = kind.definition();
                WizardKindSummary {
                    kind: *kind,
                    steps: definition.steps.iter().map(|s| s.label).collect(),
                    generation_targets: definition.generation.iter().map(|g| g.target).collect(),
                }
            })
            .collect(),
    )
}

/// POST /api/v1/wizards
///
/// Opens a wizard of the given kind, pre-filled from its saved draft if any.
pub async fn handle_open(
    State(state): State<AppState>,
    Json(request): Json<OpenWizardRequest>,
) -> (StatusCode, Json<WizardView>) {
    let session = state.sessions.open(request.kind).await;
    (StatusCode::CREATED, Json(session.view().await))
}

/// GET /api/v1/wizards/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, AppError> {
    let session = state.sessions.get(id).await?;
    Ok(Json(session.view().await))
}

/// DELETE /api/v1/wizards/:id
///
/// Abandons the wizard and its draft.
pub async fn handle_discard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.discard(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/wizards/:id/fields
///
/// Shallow-merges `fields` into the form and drops the keys in `remove`.
/// Never validates.
pub async fn handle_update_fields(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFieldsRequest>,
) -> Result<Json<WizardView>, AppError> {
    let session = state.sessions.get(id).await?;
    session
        .edit(|form| {
            form.merge(request.fields);
            for key in &request.remove {
                form.remove(key);
            }
        })
        .await?;
    Ok(Json(session.view().await))
}

/// POST /api/v1/wizards/:id/records/:field
pub async fn handle_append_record(
    State(state): State<AppState>,
    Path((id, field)): Path<(Uuid, String)>,
    Json(request): Json<RecordRequest>,
) -> Result<(StatusCode, Json<RecordResponse>), AppError> {
    let session = state.sessions.get(id).await?;
    let record_id = session
        .edit(|form| form.append_record(&field, request.fields))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RecordResponse {
            record_id,
            wizard: session.view().await,
        }),
    ))
}

/// PUT /api/v1/wizards/:id/records/:field/:record_id
pub async fn handle_update_record(
    State(state): State<AppState>,
    Path((id, field, record_id)): Path<(Uuid, String, Uuid)>,
    Json(request): Json<RecordRequest>,
) -> Result<Json<WizardView>, AppError> {
    let session = state.sessions.get(id).await?;
    let found = session
        .edit(|form| form.update_record(&field, record_id, request.fields))
        .await?;
    if !found {
        return Err(AppError::NotFound(format!("{field} entry {record_id}")));
    }
    Ok(Json(session.view().await))
}

/// DELETE /api/v1/wizards/:id/records/:field/:record_id
pub async fn handle_remove_record(
    State(state): State<AppState>,
    Path((id, field, record_id)): Path<(Uuid, String, Uuid)>,
) -> Result<Json<WizardView>, AppError> {
    let session = state.sessions.get(id).await?;
    let found = session
        .edit(|form| form.remove_record(&field, record_id))
        .await?;
    if !found {
        return Err(AppError::NotFound(format!("{field} entry {record_id}")));
    }
    Ok(Json(session.view().await))
}

/// POST /api/v1/wizards/:id/advance
///
/// A blocked advance is a normal outcome (200 with `"outcome": "blocked"`).
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let outcome = session.navigate(|w| w.advance()).await?;
    Ok(Json(AdvanceResponse {
        outcome,
        wizard: session.view().await,
    }))
}

/// POST /api/v1/wizards/:id/retreat
pub async fn handle_retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, AppError> {
    let session = state.sessions.get(id).await?;
    session.navigate(|w| w.retreat()).await?;
    Ok(Json(session.view().await))
}

/// POST /api/v1/wizards/:id/jump
pub async fn handle_jump(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<JumpRequest>,
) -> Result<Json<WizardView>, AppError> {
    let session = state.sessions.get(id).await?;
    if !session.navigate(|w| w.jump_to(request.step)).await? {
        return Err(AppError::Validation(format!(
            "Step {} has not been reached yet",
            request.step
        )));
    }
    Ok(Json(session.view().await))
}

/// GET /api/v1/wizards/:id/validation
///
/// Dry run of the current step and the whole form. Moves nothing.
pub async fn handle_validation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ValidationResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let (current, form) = session
        .read(|w| (w.validate_current(), w.validate_all()))
        .await;
    Ok(Json(ValidationResponse {
        current,
        first_invalid_step: form.first_invalid_step(),
        form,
    }))
}

/// POST /api/v1/wizards/:id/draft
pub async fn handle_save_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftSavedResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let envelope = session.save_draft(state.sessions.drafts()).await?;
    Ok(Json(DraftSavedResponse {
        kind: envelope.kind,
        saved_at: envelope.saved_at,
    }))
}

/// POST /api/v1/wizards/:id/close
///
/// Leaves the wizard. Unsaved edits go to the draft, which is kept for the next visit.
pub async fn handle_close(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.leave(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/wizards/:id/generate
///
/// Returns suggested text. Accepting it is a separate `PATCH .../fields`.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Suggestion>, AppError> {
    let session = state.sessions.get(id).await?;
    let suggestion =
        actions::generate(&session, state.generator.as_ref(), &request.target).await?;
    Ok(Json(suggestion))
}

/// POST /api/v1/wizards/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Submitted>), AppError> {
    let session = state.sessions.get(id).await?;
    let submitted = actions::submit(&state.sessions, &session, state.backend.as_ref()).await?;

    match &submitted {
        Submitted::Resume(resume) => state.resumes.upsert(resume.clone()).await,
        Submitted::Job(job) => state.jobs.upsert(job.clone()).await,
        Submitted::Application(application) => {
            state.applications.upsert(application.clone()).await
        }
    }
    Ok((StatusCode::CREATED, Json(submitted)))
}
