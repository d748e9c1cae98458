//! Data merger: combines persisted profile state with in-flight form input
//! into the flat record every validation pass runs against.

use std::collections::BTreeMap;

use serde_json::Value;

use super::domain::TenantProfile;
use super::record::MergedRecord;

pub const PROFILE_PREFIX: &str = "profile_";

/// Fixed allow-list of profile columns emitted into the merged record as
/// `profile_<column>` keys. Identity, residence, employment, and document
/// slot groups; anything else on the profile is invisible to the wizard.
pub const PROFILE_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "phone",
    "date_of_birth",
    "nationality",
    "current_street",
    "current_city",
    "current_postal_code",
    "current_country",
    "housing_status",
    "current_landlord_name",
    "current_landlord_phone",
    "current_rent",
    "employment_status",
    "employer_name",
    "job_title",
    "monthly_income",
    "university_name",
    "program_of_study",
    "id_document_front_path",
    "id_document_front_original_name",
    "id_document_back_path",
    "id_document_back_original_name",
    "proof_of_income_path",
    "proof_of_income_original_name",
];

/// Document slots living on the profile. Their `_path`/`_original_name`
/// columns are written only by submission-time document resolution, never
/// synced from raw client input.
pub const PROFILE_DOCUMENT_SLOTS: &[&str] =
    &["id_document_front", "id_document_back", "proof_of_income"];

/// Profile columns writable from wizard input.
pub fn syncable_column(column: &str) -> bool {
    PROFILE_FIELDS.contains(&column)
        && !column.ends_with("_path")
        && !column.ends_with("_original_name")
}

/// Merge profile columns (prefixed) with the request payload. The payload
/// wins on key collision. Pure and deterministic.
pub fn merge_application(
    profile: &TenantProfile,
    payload: &BTreeMap<String, Value>,
) -> MergedRecord {
    let mut values = BTreeMap::new();
    for column in PROFILE_FIELDS {
        if let Some(value) = profile.column(column) {
            values.insert(format!("{PROFILE_PREFIX}{column}"), value.clone());
        }
    }
    for (key, value) in payload {
        values.insert(key.clone(), value.clone());
    }
    MergedRecord::new(values)
}

/// Merge a property draft's persisted attributes with the request payload.
/// Property drafts have no profile side-store; the stored draft plays the
/// role of the base record.
pub fn merge_property(
    attributes: &BTreeMap<String, Value>,
    payload: &BTreeMap<String, Value>,
) -> MergedRecord {
    MergedRecord::new(overlay(attributes, payload))
}

/// Overlay `incoming` on top of `base`, incoming wins.
pub fn overlay(
    base: &BTreeMap<String, Value>,
    incoming: &BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    let mut merged = base.clone();
    for (key, value) in incoming {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
