//! Content generation: pluggable, trait-based producer of field suggestions.
//!
//! A generator reads a snapshot of form fields and returns text. It never touches
//! the form; the caller decides whether to accept the suggestion into a field.
//!
//! Default: `TemplateGenerator` (deterministic, offline).
//! `LlmGenerator` is selected at startup when `ENABLE_LLM_GENERATION` is set.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::generation::prompts::{GENERATION_PROMPT_TEMPLATE, GENERATION_SYSTEM};
use crate::llm_client::prompts::{FACTUALITY_INSTRUCTION, PLAIN_TEXT_SYSTEM};
use crate::llm_client::LlmClient;
use crate::wizard::steps::{GenerationSpec, WizardKind};

/// Everything a generator needs, detached from the live form.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationPrompt {
    pub kind: WizardKind,
    pub target: String,
    pub instruction: String,
    pub context: BTreeMap<String, String>,
}

impl GenerationPrompt {
    pub fn new(kind: WizardKind, spec: &GenerationSpec, context: BTreeMap<String, String>) -> Self {
        Self {
            kind,
            target: spec.target.to_string(),
            instruction: spec.instruction.to_string(),
            context,
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    pub fn render(&self) -> String {
        let context = if self.context.is_empty() {
            "(nothing entered yet)".to_string()
        } else {
            self.context
                .iter()
                .map(|(k, v)| format!("- {k}: {}", v.replace('\n', "\n  ")))
                .collect::<Vec<_>>()
                .join("\n")
        };
        GENERATION_PROMPT_TEMPLATE
            .replace("{wizard}", self.kind.as_str())
            .replace("{target}", &self.target)
            .replace("{instruction}", &self.instruction)
            .replace("{context}", &context)
            .replace("{factuality}", FACTUALITY_INSTRUCTION)
    }
}

/// Carried in `AppState` as `Arc<dyn ContentGenerator>`.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, AppError>;

    fn backend_name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmGenerator
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmGenerator(pub LlmClient);

#[async_trait]
impl ContentGenerator for LlmGenerator {
    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, AppError> {
        info!("Generating '{}' for {} via LLM", prompt.target, prompt.kind);
        let system = format!("{GENERATION_SYSTEM} {PLAIN_TEXT_SYSTEM}");
        self.0
            .complete(&prompt.render(), &system)
            .await
            .map_err(|e| AppError::Llm(format!("Generating {} failed: {e}", prompt.target)))
    }

    fn backend_name(&self) -> &'static str {
        "llm"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TemplateGenerator
// ────────────────────────────────────────────────────────────────────────────

/// Fills fixed templates from the snapshot. Same input, same output.
pub struct TemplateGenerator;

#[async_trait]
impl ContentGenerator for TemplateGenerator {
    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, AppError> {
        Ok(render_template(prompt))
    }

    fn backend_name(&self) -> &'static str {
        "template"
    }
}

fn render_template(prompt: &GenerationPrompt) -> String {
    let title = prompt.get("title").unwrap_or("professional");
    let skills = prompt.get("skills");

    match prompt.target.as_str() {
        "summary" => {
            let mut text = format!("Results-driven {title}");
            if let Some(skills) = skills {
                text.push_str(&format!(" with hands-on expertise in {skills}"));
            }
            text.push('.');
            if prompt.get("experiences").is_some() {
                text.push_str(
                    " Proven track record of delivering reliable work in collaborative teams",
                );
                text.push_str(" and taking ownership from design to delivery.");
            }
            text.push_str(" Eager to keep learning and to create measurable impact.");
            text
        }
        "skills" => suggested_skills(title).join(", "),
        "description" => {
            let company = prompt.get("company").unwrap_or("Our company");
            let location = prompt.get("location").unwrap_or("a location to be agreed");
            let mut text = format!(
                "{company} is looking for a {title} to join the team in {location}. \
                 You will work closely with engineering, product and design to plan, build \
                 and ship features that our users rely on every day."
            );
            if let Some(job_type) = prompt.get("job_type") {
                text.push_str(&format!(" This is a {job_type} role"));
                if let Some(mode) = prompt.get("work_mode") {
                    text.push_str(&format!(" with a {mode} setup"));
                }
                text.push('.');
            }
            if let Some(skills) = skills {
                text.push_str(&format!(" Experience with {skills} will help you succeed."));
            }
            text
        }
        "requirements" => {
            let level = prompt.get("experience_level").unwrap_or("relevant");
            let mut lines = vec![format!("{level} experience working as a {title}")];
            if let Some(skills) = skills {
                lines.push(format!("Practical knowledge of {skills}"));
            }
            lines.push("Clear written and verbal communication".to_string());
            lines.push("Comfort working in a collaborative, feedback-driven team".to_string());
            lines.push("Ownership of work from planning through delivery".to_string());
            lines.join("\n")
        }
        "cover_letter" => {
            let name = prompt.get("full_name").unwrap_or("the applicant");
            let role = prompt.get("job_title").unwrap_or("this role");
            let company = prompt.get("company").unwrap_or("your team");
            let mut text = format!(
                "Dear Hiring Manager,\n\nI am excited to apply for the {role} position at {company}."
            );
            if let Some(years) = prompt.get("years_experience") {
                text.push_str(&format!(
                    " With {years} years of experience, I am confident I can contribute from day one."
                ));
            }
            text.push_str(&format!(
                " I would welcome the chance to discuss how I can help {company} reach its goals.\n\n\
                 Sincerely,\n{name}"
            ));
            text
        }
        other => format!("Suggested {other} for a {title}."),
    }
}

fn suggested_skills(title: &str) -> Vec<&'static str> {
    let title = title.to_lowercase();
    if title.contains("data") {
        vec!["Python", "SQL", "Statistics", "Data Visualization", "Machine Learning"]
    } else if title.contains("design") {
        vec!["Figma", "User Research", "Prototyping", "Design Systems", "Accessibility"]
    } else if title.contains("engineer") || title.contains("developer") {
        vec!["Git", "REST APIs", "Testing", "CI/CD", "System Design"]
    } else {
        vec!["Communication", "Teamwork", "Problem Solving", "Time Management"]
    }
}
