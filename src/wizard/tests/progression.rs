use std::collections::BTreeMap;

use serde_json::json;

use super::common::*;
use crate::wizard::merge::merge_application;
use crate::wizard::progress::ProgressionEngine;
use crate::wizard::record::MergedRecord;
use crate::wizard::steps::StepRegistry;

#[test]
fn full_payload_reaches_the_last_real_step() {
    let profile = complete_profile();
    let entity = application_draft();
    let record = merge_application(&profile, &application_payload("2025-07-01"));
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);

    let max = engine.max_valid_step(&record, 7, &ctx_for(&entity, Some(&profile)));

    assert_eq!(max, 7);
}

#[test]
fn later_valid_steps_never_rescue_an_earlier_failure() {
    let mut profile = complete_profile();
    // break step 3 while steps 4..7 stay independently valid
    profile.set_column("employer_name", json!(""));
    let entity = application_draft();
    let record = merge_application(&profile, &application_payload("2025-07-01"));
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);
    let ctx = ctx_for(&entity, Some(&profile));

    assert!(engine.validate_step(5, &record, &ctx).is_valid());
    assert_eq!(engine.max_valid_step(&record, 7, &ctx), 2);
}

#[test]
fn requested_step_is_clamped_to_the_last_real_step() {
    let profile = complete_profile();
    let entity = application_draft();
    let record = merge_application(&profile, &application_payload("2025-07-01"));
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);

    let max = engine.max_valid_step(&record, 99, &ctx_for(&entity, Some(&profile)));

    assert_eq!(max, 7);
}

#[test]
fn review_step_validates_unconditionally() {
    let profile = empty_profile();
    let entity = application_draft();
    let record = MergedRecord::new(BTreeMap::new());
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);

    let outcome = engine.validate_step(8, &record, &ctx_for(&entity, Some(&profile)));

    assert!(outcome.is_valid());
}

#[test]
fn position_zero_is_never_a_valid_step() {
    let profile = complete_profile();
    let entity = application_draft();
    let record = merge_application(&profile, &application_payload("2025-07-01"));
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);

    let outcome = engine.validate_step(0, &record, &ctx_for(&entity, Some(&profile)));

    assert!(!outcome.is_valid());
}

#[test]
fn empty_record_validates_no_steps() {
    let profile = empty_profile();
    let entity = application_draft();
    let record = merge_application(&profile, &BTreeMap::new());
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);
    let ctx = ctx_for(&entity, Some(&profile));

    assert_eq!(engine.max_valid_step(&record, 7, &ctx), 0);
    assert_eq!(engine.first_invalid_step(&record, &ctx), Some(1));
}

#[test]
fn validation_is_idempotent() {
    let mut profile = complete_profile();
    profile.set_column("employer_name", json!(""));
    let entity = application_draft();
    let record = merge_application(&profile, &application_payload("2025-07-01"));
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);
    let ctx = ctx_for(&entity, Some(&profile));

    let first = engine.validate_step(3, &record, &ctx);
    let second = engine.validate_step(3, &record, &ctx);

    assert_eq!(first, second);
    assert!(!first.is_valid());
}

#[test]
fn first_invalid_step_is_none_when_everything_passes() {
    let profile = complete_profile();
    let entity = application_draft();
    let record = merge_application(&profile, &application_payload("2025-07-01"));
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);

    let first = engine.first_invalid_step(&record, &ctx_for(&entity, Some(&profile)));

    assert_eq!(first, None);
}

#[test]
fn failing_step_reports_its_complete_error_map() {
    let mut profile = complete_profile();
    profile.set_column("employer_name", json!(""));
    profile.set_column("monthly_income", json!(null));
    let entity = application_draft();
    let record = merge_application(&profile, &BTreeMap::new());
    let registry = StepRegistry::application();
    let engine = ProgressionEngine::new(&registry);

    let outcome = engine.validate_step(3, &record, &ctx_for(&entity, Some(&profile)));

    let errors = outcome.errors().expect("step 3 fails");
    assert!(errors.contains_key("profile_employer_name"));
    assert!(errors.contains_key("profile_monthly_income"));
}
