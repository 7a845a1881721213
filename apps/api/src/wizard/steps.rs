//! Step Definition Tables: the static, ordered description of each wizard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::wizard::flows::{job_application, job_posting, resume_builder};
use crate::wizard::validation::FieldRule;

/// One page of a wizard. `rules` is the step's validation group.
#[derive(Debug)]
pub struct WizardStep {
    pub id: usize,
    pub label: &'static str,
    pub owned_fields: &'static [&'static str],
    pub rules: &'static [FieldRule],
}

/// An AI generation a step can trigger, and which fields feed its prompt.
#[derive(Debug)]
pub struct GenerationSpec {
    pub target: &'static str,
    pub fields: &'static [&'static str],
    pub instruction: &'static str,
}

#[derive(Debug)]
pub struct WizardDefinition {
    pub kind: WizardKind,
    pub steps: &'static [WizardStep],
    pub generation: &'static [GenerationSpec],
}

impl WizardDefinition {
    pub fn step(&self, id: usize) -> Option<&WizardStep> {
        self.steps.get(id)
    }

    pub fn last_step(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn generation_spec(&self, target: &str) -> Option<&GenerationSpec> {
        self.generation.iter().find(|g| g.target == target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardKind {
    ResumeBuilder,
    JobPosting,
    JobApplication,
}

impl WizardKind {
    pub const ALL: [WizardKind; 3] = [
        WizardKind::ResumeBuilder,
        WizardKind::JobPosting,
        WizardKind::JobApplication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardKind::ResumeBuilder => "resume-builder",
            WizardKind::JobPosting => "job-posting",
            WizardKind::JobApplication => "job-application",
        }
    }

    pub fn definition(&self) -> &'static WizardDefinition {
        match self {
            WizardKind::ResumeBuilder => &resume_builder::DEFINITION,
            WizardKind::JobPosting => &job_posting::DEFINITION,
            WizardKind::JobApplication => &job_application::DEFINITION,
        }
    }
}

impl fmt::Display for WizardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WizardKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown wizard kind '{s}'"))
    }
}
