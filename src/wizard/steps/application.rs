//! Rule providers for the seven-step tenant application wizard.

use chrono::Months;

use super::{StepContext, StepDefinition};
use crate::wizard::merge::PROFILE_DOCUMENT_SLOTS;
use crate::wizard::record::MergedRecord;
use crate::wizard::rules::lookup;
use crate::wizard::rules::{Check, FieldRule, StepRules};

pub(super) static STEPS: &[StepDefinition] = &[
    StepDefinition {
        index: 1,
        name: "personal_details",
        provider: personal_details,
    },
    StepDefinition {
        index: 2,
        name: "current_residence",
        provider: current_residence,
    },
    StepDefinition {
        index: 3,
        name: "employment",
        provider: employment,
    },
    StepDefinition {
        index: 4,
        name: "household",
        provider: household,
    },
    StepDefinition {
        index: 5,
        name: "references_and_guarantees",
        provider: references_and_guarantees,
    },
    StepDefinition {
        index: 6,
        name: "documents",
        provider: documents,
    },
    StepDefinition {
        index: 7,
        name: "motivation",
        provider: motivation,
    },
];

/// Root field names the application entity owns. Everything else in a payload
/// (profile-prefixed keys, transient UI keys) is filtered before persistence.
pub const ENTITY_FIELD_ROOTS: &[&str] = &[
    "move_in_date",
    "lease_term_months",
    "occupants",
    "has_pets",
    "pets",
    "references",
    "has_co_signer",
    "co_signer",
    "has_guarantor",
    "guarantor",
    "additional_documents",
    "message_to_manager",
];

/// Profile columns frozen onto the entity as `snapshot_*` at submission.
pub const SNAPSHOT_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "phone",
    "date_of_birth",
    "nationality",
    "employment_status",
    "employer_name",
    "job_title",
    "monthly_income",
];

fn personal_details(_record: &MergedRecord, ctx: &StepContext<'_>) -> StepRules {
    // Applicants must be of age; the cutoff is computed against the request's
    // reference date.
    let adult_cutoff = ctx
        .today
        .checked_sub_months(Months::new(12 * 18))
        .unwrap_or(ctx.today);
    StepRules::new(vec![
        FieldRule::required("profile_first_name").check(Check::Text { min: 1, max: 100 }),
        FieldRule::required("profile_last_name").check(Check::Text { min: 1, max: 100 }),
        FieldRule::required("profile_email").check(Check::Email),
        FieldRule::required("profile_phone").check(Check::Phone),
        FieldRule::required("profile_date_of_birth")
            .check(Check::Date)
            .check(Check::DateNotAfter(adult_cutoff)),
        FieldRule::required("profile_nationality").check(Check::Text { min: 2, max: 100 }),
    ])
}

fn current_residence(record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    let renting = record.text("profile_housing_status") == Some("renting");
    StepRules::new(vec![
        FieldRule::required("profile_current_street").check(Check::Text { min: 1, max: 200 }),
        FieldRule::required("profile_current_city").check(Check::Text { min: 1, max: 100 }),
        FieldRule::required("profile_current_postal_code").check(Check::PostalCode),
        FieldRule::required("profile_current_country").check(Check::Text { min: 2, max: 100 }),
        FieldRule::required("profile_housing_status")
            .check(Check::OneOf(lookup::HOUSING_STATUSES)),
        FieldRule::required_if(renting, "profile_current_landlord_name")
            .check(Check::Text { min: 1, max: 150 }),
        FieldRule::required_if(renting, "profile_current_landlord_phone").check(Check::Phone),
        FieldRule::required_if(renting, "profile_current_rent").check(Check::Numeric {
            min: Some(0.0),
            max: None,
        }),
    ])
}

fn employment(record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    let status = record.text("profile_employment_status").unwrap_or("");
    // Decision table: which follow-up fields each employment status demands.
    let (employer, income, study) = match status {
        "employed" | "self_employed" => (true, true, false),
        "student" => (false, false, true),
        "retired" => (false, true, false),
        _ => (false, false, false),
    };
    StepRules::new(vec![
        FieldRule::required("profile_employment_status")
            .check(Check::OneOf(lookup::EMPLOYMENT_STATUSES)),
        FieldRule::required_if(employer, "profile_employer_name")
            .check(Check::Text { min: 1, max: 150 }),
        FieldRule::required_if(employer, "profile_job_title")
            .check(Check::Text { min: 1, max: 150 }),
        FieldRule::required_if(income, "profile_monthly_income").check(Check::Numeric {
            min: Some(1.0),
            max: None,
        }),
        FieldRule::required_if(study, "profile_university_name")
            .check(Check::Text { min: 1, max: 150 }),
        FieldRule::required_if(study, "profile_program_of_study")
            .check(Check::Text { min: 1, max: 150 }),
    ])
}

fn household(record: &MergedRecord, ctx: &StepContext<'_>) -> StepRules {
    let mut rules = vec![
        FieldRule::required("move_in_date")
            .check(Check::Date)
            .check(Check::DateNotBefore(ctx.today)),
        FieldRule::optional("lease_term_months").check(Check::Integer {
            min: Some(1),
            max: Some(120),
        }),
        FieldRule::optional("occupants").check(Check::MaxEntries(10)),
        FieldRule::required("occupants.*.name").check(Check::Text { min: 1, max: 100 }),
        FieldRule::required("occupants.*.date_of_birth")
            .check(Check::Date)
            .check(Check::DateNotAfter(ctx.today)),
        FieldRule::required("has_pets").check(Check::Boolean),
    ];
    if record.flag("has_pets") {
        rules.push(
            FieldRule::optional("pets")
                .check(Check::MinEntries(1))
                .check(Check::MaxEntries(5)),
        );
        rules.push(FieldRule::required("pets.*.species").check(Check::OneOf(lookup::PET_SPECIES)));
        rules.push(FieldRule::required("pets.*.name").check(Check::Text { min: 1, max: 50 }));
    }
    StepRules::new(rules)
}

fn references_and_guarantees(record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    let mut rules = vec![
        FieldRule::optional("references").check(Check::MaxEntries(5)),
        FieldRule::required("references.*.name").check(Check::Text { min: 1, max: 150 }),
        FieldRule::required("references.*.relationship")
            .check(Check::OneOf(lookup::REFERENCE_RELATIONSHIPS)),
        FieldRule::required("references.*.email").check(Check::Email),
        FieldRule::optional("references.*.phone").check(Check::Phone),
        FieldRule::required("has_co_signer").check(Check::Boolean),
        FieldRule::required("has_guarantor").check(Check::Boolean),
    ];
    if record.flag("has_co_signer") {
        rules.push(FieldRule::required("co_signer.name").check(Check::Text { min: 1, max: 150 }));
        rules.push(FieldRule::required("co_signer.email").check(Check::Email));
        rules.push(FieldRule::required("co_signer.monthly_income").check(Check::Numeric {
            min: Some(1.0),
            max: None,
        }));
    }
    if record.flag("has_guarantor") {
        rules.push(FieldRule::required("guarantor.name").check(Check::Text { min: 1, max: 150 }));
        rules.push(FieldRule::required("guarantor.email").check(Check::Email));
        rules.push(
            FieldRule::required("guarantor.relationship").check(Check::Text { min: 1, max: 100 }),
        );
    }
    StepRules::new(rules)
}

fn documents(_record: &MergedRecord, ctx: &StepContext<'_>) -> StepRules {
    let mut rules = Vec::new();
    for slot in PROFILE_DOCUMENT_SLOTS {
        // Upload-once: a slot with a persisted path is never re-demanded.
        let on_file = ctx
            .profile
            .map(|profile| profile.document_path(slot).is_some())
            .unwrap_or(false);
        let field = format!("profile_{slot}");
        rules.push(FieldRule::required_if(!on_file, field).check(Check::Attachment));
    }
    rules.push(FieldRule::optional("additional_documents").check(Check::MaxEntries(10)));
    rules.push(FieldRule::required("additional_documents.*.file").check(Check::Attachment));
    rules.push(
        FieldRule::required("additional_documents.*.category")
            .check(Check::OneOf(lookup::DOCUMENT_CATEGORIES)),
    );
    StepRules::new(rules)
}

fn motivation(_record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    StepRules::new(vec![FieldRule::required("message_to_manager").check(
        Check::Text {
            min: 10,
            max: 2000,
        },
    )])
}
