//! Field Validation Groups: per-step predicates over the form.
//!
//! Validation is a pure function of (step, form). A failing step is a normal
//! outcome reported through [`ValidationResult`], never an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::wizard::form::{FieldValue, FormState};
use crate::wizard::steps::WizardDefinition;

/// A predicate over a single field.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Non-blank text of at least `n` characters, counted as entered.
    MinLength(usize),
    /// Text that parses as a UUID, i.e. an id picked from a backend listing.
    Uuid,
    Email,
    /// At least ten digits, ignoring separators.
    Phone,
    NumberAtLeast(f64),
    /// Numeric and not below the named sibling field (when that field is set).
    NotLessThan(&'static str),
    NonEmptyList,
    OneOf(&'static [&'static str]),
    /// A checkbox that must be ticked.
    Accepted,
    /// Rules applied to every record of a repeatable section.
    Each(&'static [FieldRule]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub rule: Rule,
    pub message: &'static str,
    pub optional: bool,
}

impl FieldRule {
    pub const fn required(field: &'static str, rule: Rule, message: &'static str) -> Self {
        Self {
            field,
            rule,
            message,
            optional: false,
        }
    }

    /// Checked only when the user has entered something.
    pub const fn optional(field: &'static str, rule: Rule, message: &'static str) -> Self {
        Self {
            field,
            rule,
            message,
            optional: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub step_id: usize,
    pub valid: bool,
    /// Field path (`title`, `experiences[0].company`) → message.
    pub errors: BTreeMap<String, String>,
}

/// Validity of the whole form: the AND of every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormValidation {
    pub valid: bool,
    pub steps: Vec<ValidationResult>,
}

impl FormValidation {
    pub fn first_invalid_step(&self) -> Option<usize> {
        self.steps.iter().find(|s| !s.valid).map(|s| s.step_id)
    }

    /// All field errors across steps.
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.steps
            .iter()
            .flat_map(|s| s.errors.clone())
            .collect()
    }
}

/// Runs the validation group of `step_id`. An unknown step has no rules and is valid.
pub fn validate_step(
    definition: &WizardDefinition,
    step_id: usize,
    form: &FormState,
) -> ValidationResult {
    let mut errors = BTreeMap::new();
    if let Some(step) = definition.step(step_id) {
        apply_rules(step.rules, form.values(), "", &mut errors);
    }
    ValidationResult {
        step_id,
        valid: errors.is_empty(),
        errors,
    }
}

pub fn validate_form(definition: &WizardDefinition, form: &FormState) -> FormValidation {
    let steps: Vec<_> = definition
        .steps
        .iter()
        .map(|s| validate_step(definition, s.id, form))
        .collect();
    FormValidation {
        valid: steps.iter().all(|s| s.valid),
        steps,
    }
}

fn apply_rules(
    rules: &[FieldRule],
    scope: &BTreeMap<String, FieldValue>,
    prefix: &str,
    errors: &mut BTreeMap<String, String>,
) {
    for field_rule in rules {
        let key = format!("{prefix}{}", field_rule.field);
        let value = scope.get(field_rule.field);

        if field_rule.optional && value.map_or(true, FieldValue::is_blank) {
            continue;
        }

        if let Rule::Each(inner) = field_rule.rule {
            if let Some(FieldValue::Records(records)) = value {
                for (i, record) in records.iter().enumerate() {
                    apply_rules(inner, &record.fields, &format!("{key}[{i}]."), errors);
                }
            }
            continue;
        }

        // First failing rule per field wins.
        if errors.contains_key(&key) {
            continue;
        }
        if !holds(field_rule.rule, value, scope) {
            errors.insert(key, field_rule.message.to_string());
        }
    }
}

fn holds(rule: Rule, value: Option<&FieldValue>, scope: &BTreeMap<String, FieldValue>) -> bool {
    match rule {
        Rule::MinLength(n) => match value {
            Some(FieldValue::Text(s)) => !s.trim().is_empty() && s.chars().count() >= n,
            _ => false,
        },
        Rule::Uuid => match value {
            Some(FieldValue::Text(s)) => uuid::Uuid::parse_str(s.trim()).is_ok(),
            _ => false,
        },
        Rule::Email => match value {
            Some(FieldValue::Text(s)) => is_email(s.trim()),
            _ => false,
        },
        Rule::Phone => match value {
            Some(FieldValue::Text(s)) => s.chars().filter(|c| c.is_ascii_digit()).count() >= 10,
            _ => false,
        },
        Rule::NumberAtLeast(min) => value
            .and_then(FieldValue::as_number)
            .is_some_and(|n| n >= min),
        Rule::NotLessThan(other) => {
            let Some(n) = value.and_then(FieldValue::as_number) else {
                return false;
            };
            match scope.get(other).and_then(FieldValue::as_number) {
                Some(floor) => n >= floor,
                None => true,
            }
        }
        Rule::NonEmptyList => match value {
            Some(v @ (FieldValue::Tags(_) | FieldValue::Records(_) | FieldValue::Text(_))) => {
                !v.is_blank()
            }
            _ => false,
        },
        Rule::OneOf(options) => match value {
            Some(FieldValue::Text(s)) => options.contains(&s.trim()),
            _ => false,
        },
        Rule::Accepted => matches!(value, Some(FieldValue::Bool(true))),
        Rule::Each(_) => true,
    }
}

fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
