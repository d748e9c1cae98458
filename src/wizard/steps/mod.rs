//! Static step registries for the two wizard flows.
//!
//! A registry is an ordered, contiguous list of step definitions looked up by
//! index. Providers are plain function items, so the table is populated at
//! compile time rather than through any dynamic dispatch on request data.

mod application;
mod property;

use chrono::NaiveDate;

use super::domain::{TenantProfile, WizardEntity, WizardKind};
use super::record::MergedRecord;
use super::rules::StepRules;

pub use application::ENTITY_FIELD_ROOTS as APPLICATION_ENTITY_FIELD_ROOTS;
pub use application::SNAPSHOT_FIELDS;
pub use property::ENTITY_FIELD_ROOTS as PROPERTY_ENTITY_FIELD_ROOTS;

/// Read-only context handed to rule providers alongside the merged record.
/// `today` is supplied by the caller so date rules stay deterministic.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub today: NaiveDate,
    pub entity: &'a WizardEntity,
    pub profile: Option<&'a TenantProfile>,
}

/// Data-dependent rule builder for one step: reads already-merged answers to
/// decide which further fields are required.
pub type RuleProvider = fn(&MergedRecord, &StepContext<'_>) -> StepRules;

pub struct StepDefinition {
    pub index: u8,
    pub name: &'static str,
    pub provider: RuleProvider,
}

/// Ordered list of named steps for one wizard flow. Indices are contiguous
/// starting at 1; the synthetic review step sits one past the last real step
/// and carries no rules.
pub struct StepRegistry {
    steps: &'static [StepDefinition],
}

impl StepRegistry {
    pub fn application() -> Self {
        Self {
            steps: application::STEPS,
        }
    }

    pub fn property() -> Self {
        Self {
            steps: property::STEPS,
        }
    }

    pub fn for_kind(kind: WizardKind) -> Self {
        match kind {
            WizardKind::Application => Self::application(),
            WizardKind::Property => Self::property(),
        }
    }

    pub fn definition(&self, index: u8) -> Option<&StepDefinition> {
        if index == 0 {
            return None;
        }
        self.steps.get(index as usize - 1)
    }

    /// Index of the last real step.
    pub fn last_step(&self) -> u8 {
        self.steps.len() as u8
    }

    /// Index of the terminal review step.
    pub fn review_step(&self) -> u8 {
        self.last_step() + 1
    }
}
