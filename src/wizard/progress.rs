//! The core progression state machine.
//!
//! Positions are `0..=N+1`: `0` means no step has validated yet, `1..=N` are
//! the real steps, and `N+1` is the terminal review step, reachable once every
//! real step passes. All three operations are pure functions of the merged
//! record, the requested step, and the step context.

use super::record::MergedRecord;
use super::rules::{self, FieldErrors, ValidationOutcome};
use super::steps::{StepContext, StepRegistry};

/// Stateless engine replaying step-by-step validation against one registry.
pub struct ProgressionEngine<'a> {
    registry: &'a StepRegistry,
}

impl<'a> ProgressionEngine<'a> {
    pub fn new(registry: &'a StepRegistry) -> Self {
        Self { registry }
    }

    /// Outcome for one step. Indices past the last real step are the review
    /// step, which carries no fields and validates unconditionally. Position
    /// `0` is "nothing validated yet", never a submittable step.
    pub fn validate_step(
        &self,
        index: u8,
        record: &MergedRecord,
        ctx: &StepContext<'_>,
    ) -> ValidationOutcome {
        if index == 0 {
            return ValidationOutcome::Invalid(FieldErrors::new());
        }
        let definition = match self.registry.definition(index) {
            Some(definition) => definition,
            None => return ValidationOutcome::Valid,
        };
        let step_rules = (definition.provider)(record, ctx);
        ValidationOutcome::from_errors(rules::evaluate(&step_rules, record, ctx))
    }

    /// Longest prefix of sequentially valid steps, never exceeding the
    /// requested step. A later step's validity cannot rescue an earlier
    /// failure: the walk stops at the first invalid step.
    pub fn max_valid_step(
        &self,
        record: &MergedRecord,
        requested: u8,
        ctx: &StepContext<'_>,
    ) -> u8 {
        let capped = requested.min(self.registry.last_step());
        let mut validated = 0;
        for step in 1..=capped {
            if !self.validate_step(step, record, ctx).is_valid() {
                break;
            }
            validated = step;
        }
        validated
    }

    /// First failing real step, or `None` when every real step passes and the
    /// draft may sit at the review step.
    pub fn first_invalid_step(&self, record: &MergedRecord, ctx: &StepContext<'_>) -> Option<u8> {
        (1..=self.registry.last_step())
            .find(|step| !self.validate_step(*step, record, ctx).is_valid())
    }
}
