//! AI resume builder: Personal → Experience → Education → Skills → Review.

use crate::errors::AppError;
use crate::models::resume::{EducationItem, ExperienceItem, PersonalInfo, ResumeDraft};
use crate::wizard::form::{FieldValue, FormState};
use crate::wizard::steps::{GenerationSpec, WizardDefinition, WizardKind, WizardStep};
use crate::wizard::validation::{FieldRule, Rule};

use super::{optional_text, parse_choice, record_text, required_text};

pub const TEMPLATES: &[&str] = &["modern", "classic", "minimal", "creative"];

static EXPERIENCE_RULES: [FieldRule; 4] = [
    FieldRule::required("company", Rule::MinLength(1), "Company is required"),
    FieldRule::required("position", Rule::MinLength(1), "Position is required"),
    FieldRule::required("start_date", Rule::MinLength(1), "Start date is required"),
    FieldRule::optional(
        "description",
        Rule::MinLength(20),
        "Describe the role in at least 20 characters",
    ),
];

static EDUCATION_RULES: [FieldRule; 2] = [
    FieldRule::required("institution", Rule::MinLength(2), "Institution is required"),
    FieldRule::required("degree", Rule::MinLength(2), "Degree is required"),
];

static STEPS: [WizardStep; 5] = [
    WizardStep {
        id: 0,
        label: "Personal",
        owned_fields: &["full_name", "email", "phone", "title", "location", "linkedin"],
        rules: &[
            FieldRule::required("full_name", Rule::MinLength(2), "Full name is required"),
            FieldRule::required("email", Rule::Email, "Enter a valid email address"),
            FieldRule::required("phone", Rule::Phone, "Enter a valid phone number"),
            FieldRule::required("title", Rule::MinLength(2), "Professional title is required"),
        ],
    },
    WizardStep {
        id: 1,
        label: "Experience",
        owned_fields: &["experiences"],
        rules: &[
            FieldRule::required(
                "experiences",
                Rule::NonEmptyList,
                "Add at least one work experience",
            ),
            FieldRule::required("experiences", Rule::Each(&EXPERIENCE_RULES), ""),
        ],
    },
    WizardStep {
        id: 2,
        label: "Education",
        owned_fields: &["education"],
        rules: &[
            FieldRule::required("education", Rule::NonEmptyList, "Add at least one education entry"),
            FieldRule::required("education", Rule::Each(&EDUCATION_RULES), ""),
        ],
    },
    WizardStep {
        id: 3,
        label: "Skills",
        owned_fields: &["skills", "languages"],
        rules: &[FieldRule::required("skills", Rule::NonEmptyList, "Add at least one skill")],
    },
    WizardStep {
        id: 4,
        label: "Review",
        owned_fields: &["summary", "template"],
        rules: &[
            FieldRule::optional(
                "summary",
                Rule::MinLength(50),
                "Summary should be at least 50 characters",
            ),
            FieldRule::required("template", Rule::OneOf(TEMPLATES), "Choose a template"),
        ],
    },
];

static GENERATION: [GenerationSpec; 2] = [
    GenerationSpec {
        target: "summary",
        fields: &["title", "skills", "experiences"],
        instruction: "Write a professional resume summary of 3 to 4 sentences in the first person \
            without pronouns. Mention the strongest skills and experience.",
    },
    GenerationSpec {
        target: "skills",
        fields: &["title", "experiences"],
        instruction: "Suggest up to 10 relevant skills as a single comma-separated line.",
    },
];

pub static DEFINITION: WizardDefinition = WizardDefinition {
    kind: WizardKind::ResumeBuilder,
    steps: &STEPS,
    generation: &GENERATION,
};

pub fn into_submission(form: &FormState) -> Result<ResumeDraft, AppError> {
    let experiences = form
        .records("experiences")
        .iter()
        .map(|r| {
            Ok(ExperienceItem {
                company: record_text(r, "company")
                    .ok_or_else(|| AppError::Validation("company is required".to_string()))?,
                position: record_text(r, "position")
                    .ok_or_else(|| AppError::Validation("position is required".to_string()))?,
                start_date: record_text(r, "start_date")
                    .ok_or_else(|| AppError::Validation("start_date is required".to_string()))?,
                end_date: record_text(r, "end_date"),
                current: matches!(r.fields.get("current"), Some(FieldValue::Bool(true))),
                description: record_text(r, "description"),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let education = form
        .records("education")
        .iter()
        .map(|r| {
            Ok(EducationItem {
                institution: record_text(r, "institution")
                    .ok_or_else(|| AppError::Validation("institution is required".to_string()))?,
                degree: record_text(r, "degree")
                    .ok_or_else(|| AppError::Validation("degree is required".to_string()))?,
                field: record_text(r, "field"),
                start_date: record_text(r, "start_date"),
                end_date: record_text(r, "end_date"),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(ResumeDraft {
        title: required_text(form, "title")?,
        personal: PersonalInfo {
            full_name: required_text(form, "full_name")?,
            email: required_text(form, "email")?,
            phone: required_text(form, "phone")?,
            location: optional_text(form, "location"),
            linkedin: optional_text(form, "linkedin"),
        },
        summary: optional_text(form, "summary"),
        experiences,
        education,
        skills: form.tags("skills"),
        languages: form.tags("languages"),
        template: parse_choice(form, "template")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ResumeTemplate;
    use crate::wizard::flows::fixtures::complete_resume as complete_form;
    use crate::wizard::validation::{validate_form, validate_step};

    #[test]
    fn test_complete_form_is_valid() {
        let validation = validate_form(&DEFINITION, &complete_form());
        assert!(validation.valid, "{:?}", validation.errors());
    }

    #[test]
    fn test_short_phone_rejected() {
        let mut form = complete_form();
        form.set("phone", "12345");
        assert!(validate_step(&DEFINITION, 0, &form).errors.contains_key("phone"));
    }

    #[test]
    fn test_education_requires_an_entry() {
        let mut form = complete_form();
        form.remove("education");
        let result = validate_step(&DEFINITION, 2, &form);
        assert_eq!(
            result.errors.get("education").map(String::as_str),
            Some("Add at least one education entry")
        );
    }

    #[test]
    fn test_unknown_template_rejected() {
        let mut form = complete_form();
        form.set("template", "neon");
        assert!(validate_step(&DEFINITION, 4, &form).errors.contains_key("template"));
    }

    #[test]
    fn test_submission_shape() {
        let draft = into_submission(&complete_form()).unwrap();
        assert_eq!(draft.title, "Software Engineer");
        assert_eq!(draft.personal.full_name, "Ada Lovelace");
        assert_eq!(draft.experiences.len(), 1);
        assert_eq!(draft.experiences[0].company, "Analytical Engines Ltd");
        assert!(!draft.experiences[0].current);
        assert_eq!(draft.education[0].degree, "Mathematics");
        assert_eq!(draft.skills, vec!["Algorithms", "Notation"]);
        assert_eq!(draft.template, ResumeTemplate::Modern);
        assert_eq!(draft.summary, None);
    }
}
