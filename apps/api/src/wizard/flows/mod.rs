//! The three concrete wizards and their conversion into backend request bodies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::ApplicationDraft;
use crate::models::job::JobDraft;
use crate::models::resume::ResumeDraft;
use crate::wizard::form::{FormState, Record};
use crate::wizard::steps::WizardKind;

pub mod job_application;
pub mod job_posting;
pub mod resume_builder;

/// A validated form in the shape the backend expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Submission {
    Resume(ResumeDraft),
    Job(JobDraft),
    Application(ApplicationDraft),
}

pub fn into_submission(kind: WizardKind, form: &FormState) -> Result<Submission, AppError> {
    Ok(match kind {
        WizardKind::ResumeBuilder => Submission::Resume(resume_builder::into_submission(form)?),
        WizardKind::JobPosting => Submission::Job(job_posting::into_submission(form)?),
        WizardKind::JobApplication => {
            Submission::Application(job_application::into_submission(form)?)
        }
    })
}

fn required_text(form: &FormState, key: &str) -> Result<String, AppError> {
    form.text(key)
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("{key} is required")))
}

fn optional_text(form: &FormState, key: &str) -> Option<String> {
    form.text(key).map(str::to_string)
}

/// Reads an enum-valued field via its serde name, e.g. `"full-time"`.
fn parse_choice<T: DeserializeOwned>(form: &FormState, key: &str) -> Result<T, AppError> {
    let raw = required_text(form, key)?;
    serde_json::from_value(serde_json::Value::String(raw.clone()))
        .map_err(|_| AppError::Validation(format!("'{raw}' is not a valid {key}")))
}

fn parse_id(form: &FormState, key: &str) -> Result<Uuid, AppError> {
    let raw = required_text(form, key)?;
    Uuid::parse_str(&raw).map_err(|_| AppError::Validation(format!("{key} is not a valid id")))
}

fn record_text(record: &Record, key: &str) -> Option<String> {
    record
        .text(key)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
