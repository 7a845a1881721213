//! The two async wizard actions: AI generation and final submission.
//!
//! Both hold the session's busy flag for their whole duration. A second request
//! for the same session while one is in flight gets `AppError::Busy`.

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::BackendClient;
use crate::errors::AppError;
use crate::generation::{ContentGenerator, GenerationPrompt};
use crate::models::application::Application;
use crate::models::job::Job;
use crate::models::resume::Resume;
use crate::wizard::flows::{into_submission, Submission};
use crate::wizard::session::{WizardSession, WizardSessions};

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub target: String,
    pub text: String,
    pub generator: &'static str,
}

/// The record the backend created from a submitted wizard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Submitted {
    Resume(Resume),
    Job(Job),
    Application(Application),
}

fn busy(session: &WizardSession) -> AppError {
    AppError::Busy(format!(
        "A request for this {} wizard is already in progress",
        session.kind
    ))
}

/// Produces suggested text for `target` from a snapshot of its source fields.
/// The form is never written; the caller decides whether to apply the text.
pub async fn generate(
    session: &WizardSession,
    generator: &dyn ContentGenerator,
    target: &str,
) -> Result<Suggestion, AppError> {
    let spec = session
        .kind
        .definition()
        .generation_spec(target)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "The {} wizard cannot generate '{target}'",
                session.kind
            ))
        })?;
    let _guard = session.busy().try_acquire().ok_or_else(|| busy(session))?;

    let context = session.read(|w| w.form().snapshot(spec.fields)).await;
    let prompt = GenerationPrompt::new(session.kind, spec, context);
    let text = generator.generate(&prompt).await?;

    Ok(Suggestion {
        target: spec.target.to_string(),
        text,
        generator: generator.backend_name(),
    })
}

/// Validates every step, maps the form to the backend payload, and creates the
/// record. On success the session and its draft are gone; on failure both are
/// kept so the user can retry without re-entering anything.
pub async fn submit(
    sessions: &WizardSessions,
    session: &WizardSession,
    backend: &dyn BackendClient,
) -> Result<Submitted, AppError> {
    let _guard = session.busy().try_acquire().ok_or_else(|| busy(session))?;

    let (validation, form) = session
        .read(|w| (w.validate_all(), w.form().clone()))
        .await;
    if !validation.valid {
        return Err(AppError::InvalidForm(validation.errors()));
    }

    let submitted = match into_submission(session.kind, &form)? {
        Submission::Resume(draft) => Submitted::Resume(backend.create_resume(&draft).await?),
        Submission::Job(draft) => Submitted::Job(backend.create_job(&draft).await?),
        Submission::Application(draft) => {
            Submitted::Application(backend.create_application(&draft).await?)
        }
    };
    info!("Submitted {} wizard {}", session.kind, session.id);

    sessions.close(session.id).await;
    if let Err(e) = sessions.drafts().delete(session.kind).await {
        warn!("Submitted {} but could not clear its draft: {e}", session.kind);
    }
    Ok(submitted)
}
