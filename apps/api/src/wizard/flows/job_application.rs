//! Student-side job application: Contact → Resume → Cover Letter → Questions → Review.

use crate::errors::AppError;
use crate::models::application::{ApplicantInfo, ApplicationDraft};
use crate::wizard::form::FormState;
use crate::wizard::steps::{GenerationSpec, WizardDefinition, WizardKind, WizardStep};
use crate::wizard::validation::{FieldRule, Rule};

use super::{optional_text, parse_choice, parse_id, required_text};

pub const AVAILABILITY: &[&str] = &["immediately", "two-weeks", "one-month", "negotiable"];

static STEPS: [WizardStep; 5] = [
    WizardStep {
        id: 0,
        label: "Contact",
        owned_fields: &[
            "job_id",
            "job_title",
            "company",
            "full_name",
            "email",
            "phone",
            "linkedin",
            "portfolio",
        ],
        rules: &[
            FieldRule::required("job_id", Rule::Uuid, "Select a job to apply for"),
            FieldRule::required("full_name", Rule::MinLength(2), "Full name is required"),
            FieldRule::required("email", Rule::Email, "Enter a valid email address"),
            FieldRule::required("phone", Rule::Phone, "Enter a valid phone number"),
        ],
    },
    WizardStep {
        id: 1,
        label: "Resume",
        owned_fields: &["resume_id"],
        rules: &[FieldRule::required("resume_id", Rule::Uuid, "Choose a resume to attach")],
    },
    WizardStep {
        id: 2,
        label: "Cover Letter",
        owned_fields: &["cover_letter"],
        rules: &[FieldRule::required(
            "cover_letter",
            Rule::MinLength(50),
            "Cover letter must be at least 50 characters",
        )],
    },
    WizardStep {
        id: 3,
        label: "Questions",
        owned_fields: &["availability", "years_experience", "expected_salary"],
        rules: &[
            FieldRule::required("availability", Rule::OneOf(AVAILABILITY), "Tell us when you can start"),
            FieldRule::required(
                "years_experience",
                Rule::NumberAtLeast(0.0),
                "Years of experience cannot be negative",
            ),
            FieldRule::optional(
                "expected_salary",
                Rule::NumberAtLeast(0.0),
                "Expected salary cannot be negative",
            ),
        ],
    },
    WizardStep {
        id: 4,
        label: "Review",
        owned_fields: &["agree_to_terms"],
        rules: &[FieldRule::required(
            "agree_to_terms",
            Rule::Accepted,
            "You must agree to the terms before applying",
        )],
    },
];

static GENERATION: [GenerationSpec; 1] = [GenerationSpec {
    target: "cover_letter",
    fields: &["full_name", "job_title", "company", "years_experience"],
    instruction: "Write a warm, specific cover letter of 120 to 200 words. \
        Do not invent employers or degrees.",
}];

pub static DEFINITION: WizardDefinition = WizardDefinition {
    kind: WizardKind::JobApplication,
    steps: &STEPS,
    generation: &GENERATION,
};

pub fn into_submission(form: &FormState) -> Result<ApplicationDraft, AppError> {
    Ok(ApplicationDraft {
        job_id: parse_id(form, "job_id")?,
        resume_id: parse_id(form, "resume_id")?,
        applicant: ApplicantInfo {
            full_name: required_text(form, "full_name")?,
            email: required_text(form, "email")?,
            phone: required_text(form, "phone")?,
            linkedin: optional_text(form, "linkedin"),
            portfolio: optional_text(form, "portfolio"),
        },
        cover_letter: required_text(form, "cover_letter")?,
        availability: parse_choice(form, "availability")?,
        years_experience: form.number("years_experience").unwrap_or_default(),
        expected_salary: form.number("expected_salary"),
    })
}
