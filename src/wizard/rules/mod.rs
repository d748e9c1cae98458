//! Declarative field rules and the single-step evaluator.
//!
//! Rule providers return a flat list of [`FieldRule`]s per step; conditional
//! requiredness is decided by the provider before the list is built, so the
//! evaluator itself stays a pure pass over the merged record. Cross-field
//! constraints that cannot be expressed on a single field run as an optional
//! post-pass hook once the declarative pass has finished.

pub mod lookup;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

use super::record::{self, MergedRecord};
use super::steps::StepContext;

/// Complete error map for one validation pass, keyed by full field path.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Result of validating one step: either clean, or the full field error map.
/// Callers use the boolean outcome for progression and the map for reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(FieldErrors),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid(errors) => Some(errors),
        }
    }

    pub(crate) fn from_errors(errors: FieldErrors) -> Self {
        if errors.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(errors)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Field-level constraint. Date bounds are concrete dates computed by the
/// provider from the step context, which keeps evaluation deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Text { min: usize, max: usize },
    Email,
    Phone,
    PostalCode,
    Numeric { min: Option<f64>, max: Option<f64> },
    Integer { min: Option<i64>, max: Option<i64> },
    Boolean,
    OneOf(&'static [&'static str]),
    Date,
    DateNotBefore(NaiveDate),
    DateNotAfter(NaiveDate),
    Attachment,
    MinEntries(usize),
    MaxEntries(usize),
}

/// One declarative rule. A `*` segment in the field path expands over the
/// group indices actually present in the record (`references.*.email`), so a
/// required wildcard rule means "required for every entry", not "the group
/// must exist". Entry-count bounds go on the bare group field instead.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: String,
    pub presence: Presence,
    pub checks: Vec<Check>,
}

impl FieldRule {
    pub fn required(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            presence: Presence::Required,
            checks: Vec::new(),
        }
    }

    pub fn optional(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            presence: Presence::Optional,
            checks: Vec::new(),
        }
    }

    /// Required when `condition` holds, otherwise optional. Backs the per-step
    /// decision tables.
    pub fn required_if(condition: bool, field: impl Into<String>) -> Self {
        if condition {
            Self::required(field)
        } else {
            Self::optional(field)
        }
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }
}

/// Post-pass hook for constraints spanning multiple fields.
pub type AfterHook = fn(&MergedRecord, &StepContext<'_>, &mut FieldErrors);

/// Rule set for one step: the declarative field pass plus an optional
/// cross-field hook that runs afterwards and may append errors.
#[derive(Clone)]
pub struct StepRules {
    pub rules: Vec<FieldRule>,
    pub after: Option<AfterHook>,
}

impl StepRules {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules, after: None }
    }

    pub fn with_after(rules: Vec<FieldRule>, after: AfterHook) -> Self {
        Self {
            rules,
            after: Some(after),
        }
    }
}

pub(crate) fn evaluate(
    step: &StepRules,
    record: &MergedRecord,
    ctx: &StepContext<'_>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for rule in &step.rules {
        if let Some((group, suffix)) = rule.field.split_once(".*") {
            for index in record.group_indices(group) {
                let concrete = format!("{group}.{index}{suffix}");
                apply_rule(&concrete, rule, record, &mut errors);
            }
        } else {
            apply_rule(&rule.field, rule, record, &mut errors);
        }
    }
    if let Some(hook) = step.after {
        hook(record, ctx, &mut errors);
    }
    errors
}

pub(crate) fn push_error(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

/// Human-facing field label: the `profile_` prefix is an input-mapping detail,
/// not part of the field's name.
fn label(field: &str) -> String {
    field.trim_start_matches("profile_").replace('_', " ")
}

fn apply_rule(field: &str, rule: &FieldRule, record: &MergedRecord, errors: &mut FieldErrors) {
    let counted = rule
        .checks
        .iter()
        .any(|check| matches!(check, Check::MinEntries(_) | Check::MaxEntries(_)));
    if counted {
        apply_entry_counts(field, rule, record, errors);
        return;
    }

    let value = record.get(field);
    let blank = value.map(record::is_blank).unwrap_or(true);
    if blank {
        if rule.presence == Presence::Required {
            push_error(errors, field, format!("{} is required", label(field)));
        }
        return;
    }
    let value = match value {
        Some(value) => value,
        None => return,
    };

    for check in &rule.checks {
        if let Some(message) = check_value(check, value) {
            push_error(errors, field, message);
        }
    }
}

fn apply_entry_counts(
    field: &str,
    rule: &FieldRule,
    record: &MergedRecord,
    errors: &mut FieldErrors,
) {
    let count = record.group_indices(field).len();
    for check in &rule.checks {
        match check {
            Check::MinEntries(min) if count < *min => push_error(
                errors,
                field,
                format!("{} must have at least {min} entry(ies)", label(field)),
            ),
            Check::MaxEntries(max) if count > *max => push_error(
                errors,
                field,
                format!("{} must have at most {max} entry(ies)", label(field)),
            ),
            _ => {}
        }
    }
}

fn check_value(check: &Check, value: &Value) -> Option<String> {
    match check {
        Check::Text { min, max } => {
            let text = match value.as_str() {
                Some(text) => text.trim(),
                None => return Some("must be text".to_string()),
            };
            let length = text.chars().count();
            if length < *min {
                Some(format!("must be at least {min} character(s)"))
            } else if length > *max {
                Some(format!("must be at most {max} character(s)"))
            } else {
                None
            }
        }
        Check::Email => match value.as_str() {
            Some(text) if lookup::EMAIL_PATTERN.is_match(text.trim()) => None,
            _ => Some("must be a valid email address".to_string()),
        },
        Check::Phone => match value.as_str() {
            Some(text) if lookup::PHONE_PATTERN.is_match(text.trim()) => None,
            _ => Some("must be a valid phone number".to_string()),
        },
        Check::PostalCode => match value.as_str() {
            Some(text) if lookup::POSTAL_CODE_PATTERN.is_match(text.trim()) => None,
            _ => Some("must be a valid postal code".to_string()),
        },
        Check::Numeric { min, max } => {
            let number = match record::number_of(value) {
                Some(number) => number,
                None => return Some("must be a number".to_string()),
            };
            match (min, max) {
                (Some(min), _) if number < *min => Some(format!("must be at least {min}")),
                (_, Some(max)) if number > *max => Some(format!("must be at most {max}")),
                _ => None,
            }
        }
        Check::Integer { min, max } => {
            let number = match record::number_of(value) {
                Some(number) if number.fract() == 0.0 => number as i64,
                _ => return Some("must be a whole number".to_string()),
            };
            match (min, max) {
                (Some(min), _) if number < *min => Some(format!("must be at least {min}")),
                (_, Some(max)) if number > *max => Some(format!("must be at most {max}")),
                _ => None,
            }
        }
        Check::Boolean => match record::bool_of(value) {
            Some(_) => None,
            None => Some("must be true or false".to_string()),
        },
        Check::OneOf(allowed) => match value.as_str() {
            Some(text) if allowed.contains(&text.trim()) => None,
            _ => Some(format!("must be one of: {}", allowed.join(", "))),
        },
        Check::Date => match parse_date(value) {
            Some(_) => None,
            None => Some("must be a date in YYYY-MM-DD format".to_string()),
        },
        Check::DateNotBefore(limit) => match parse_date(value) {
            Some(date) if date < *limit => Some(format!("must be a date on or after {limit}")),
            _ => None,
        },
        Check::DateNotAfter(limit) => match parse_date(value) {
            Some(date) if date > *limit => Some(format!("must be a date on or before {limit}")),
            _ => None,
        },
        Check::Attachment => match value.as_str() {
            Some(text) if !text.trim().is_empty() => None,
            _ => Some("must be an uploaded file".to_string()),
        },
        // Entry counts are handled on the group path before value checks run.
        Check::MinEntries(_) | Check::MaxEntries(_) => None,
    }
}

pub(crate) fn parse_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|text| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok())
}
