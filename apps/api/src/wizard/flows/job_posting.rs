//! Company-side job posting: Basic Info → Description → Requirements → Compensation → Review.

use crate::errors::AppError;
use crate::models::job::JobDraft;
use crate::wizard::form::FormState;
use crate::wizard::steps::{GenerationSpec, WizardDefinition, WizardKind, WizardStep};
use crate::wizard::validation::{FieldRule, Rule};

use super::{optional_text, parse_choice, required_text};

pub const MIN_DESCRIPTION_LEN: usize = 100;

pub const JOB_TYPES: &[&str] = &["full-time", "part-time", "contract", "internship"];
pub const WORK_MODES: &[&str] = &["on-site", "remote", "hybrid"];
pub const EXPERIENCE_LEVELS: &[&str] = &["entry", "mid", "senior", "lead"];
pub const CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "INR"];
pub const PUBLISH_STATES: &[&str] = &["draft", "open"];

static STEPS: [WizardStep; 5] = [
    WizardStep {
        id: 0,
        label: "Basic Info",
        owned_fields: &["title", "company", "location", "job_type", "work_mode"],
        rules: &[
            FieldRule::required("title", Rule::MinLength(3), "Job title must be at least 3 characters"),
            FieldRule::required("company", Rule::MinLength(2), "Company name is required"),
            FieldRule::required("location", Rule::MinLength(2), "Location is required"),
            FieldRule::required("job_type", Rule::OneOf(JOB_TYPES), "Select a job type"),
            FieldRule::required("work_mode", Rule::OneOf(WORK_MODES), "Select a work mode"),
        ],
    },
    WizardStep {
        id: 1,
        label: "Description",
        owned_fields: &["description", "responsibilities"],
        rules: &[FieldRule::required(
            "description",
            Rule::MinLength(MIN_DESCRIPTION_LEN),
            "Description must be at least 100 characters",
        )],
    },
    WizardStep {
        id: 2,
        label: "Requirements",
        owned_fields: &["requirements", "skills", "experience_level"],
        rules: &[
            FieldRule::required("requirements", Rule::NonEmptyList, "Add at least one requirement"),
            FieldRule::required("skills", Rule::NonEmptyList, "Add at least one skill"),
            FieldRule::required(
                "experience_level",
                Rule::OneOf(EXPERIENCE_LEVELS),
                "Select an experience level",
            ),
        ],
    },
    WizardStep {
        id: 3,
        label: "Compensation",
        owned_fields: &["salary_min", "salary_max", "currency", "benefits"],
        rules: &[
            FieldRule::required("salary_min", Rule::NumberAtLeast(0.0), "Minimum salary cannot be negative"),
            FieldRule::required("salary_max", Rule::NumberAtLeast(0.0), "Maximum salary cannot be negative"),
            FieldRule::required(
                "salary_max",
                Rule::NotLessThan("salary_min"),
                "Maximum salary must not be below the minimum",
            ),
            FieldRule::optional("currency", Rule::OneOf(CURRENCIES), "Unsupported currency"),
        ],
    },
    WizardStep {
        id: 4,
        label: "Review",
        owned_fields: &["status"],
        rules: &[FieldRule::required(
            "status",
            Rule::OneOf(PUBLISH_STATES),
            "Choose whether to publish or save as draft",
        )],
    },
];

static GENERATION: [GenerationSpec; 2] = [
    GenerationSpec {
        target: "description",
        fields: &["title", "company", "location", "job_type", "work_mode", "skills"],
        instruction: "Write an engaging job description of 150 to 250 words covering the role, \
            the team and what success looks like.",
    },
    GenerationSpec {
        target: "requirements",
        fields: &["title", "experience_level", "skills"],
        instruction: "List 5 concise candidate requirements, one per line, without numbering.",
    },
];

pub static DEFINITION: WizardDefinition = WizardDefinition {
    kind: WizardKind::JobPosting,
    steps: &STEPS,
    generation: &GENERATION,
};

pub fn into_submission(form: &FormState) -> Result<JobDraft, AppError> {
    Ok(JobDraft {
        title: required_text(form, "title")?,
        company: required_text(form, "company")?,
        location: required_text(form, "location")?,
        job_type: parse_choice(form, "job_type")?,
        work_mode: parse_choice(form, "work_mode")?,
        description: required_text(form, "description")?,
        responsibilities: form.tags("responsibilities"),
        requirements: form.tags("requirements"),
        skills: form.tags("skills"),
        experience_level: parse_choice(form, "experience_level")?,
        salary_min: form.number("salary_min"),
        salary_max: form.number("salary_max"),
        currency: optional_text(form, "currency"),
        benefits: form.tags("benefits"),
        status: parse_choice(form, "status")?,
    })
}
