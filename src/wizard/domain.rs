use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier wrapper for the profile owning a wizard entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

/// Identifier wrapper for the listing an application targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Identifier wrapper for a wizard entity (application or property draft).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WizardEntityId(pub String);

/// The two wizard flows sharing the progression engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardKind {
    Application,
    Property,
}

impl WizardKind {
    pub const fn label(self) -> &'static str {
        match self {
            WizardKind::Application => "application",
            WizardKind::Property => "property",
        }
    }
}

/// Lifecycle of a wizard entity. The engine only ever performs the
/// `Draft -> Submitted` transition; later states belong to a separate
/// status-transition API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStatus {
    Draft,
    Submitted,
    Withdrawn,
    Approved,
    Rejected,
}

impl WizardStatus {
    pub const fn label(self) -> &'static str {
        match self {
            WizardStatus::Draft => "draft",
            WizardStatus::Submitted => "submitted",
            WizardStatus::Withdrawn => "withdrawn",
            WizardStatus::Approved => "approved",
            WizardStatus::Rejected => "rejected",
        }
    }
}

/// The persisted aggregate a wizard progresses: an application or property
/// draft. `attributes` holds entity-owned form fields as a flat map with
/// dotted keys, matching the wizard input contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardEntity {
    pub id: WizardEntityId,
    pub owner: ProfileId,
    pub target: Option<ListingId>,
    pub kind: WizardKind,
    pub status: WizardStatus,
    pub current_step: u8,
    pub attributes: BTreeMap<String, Value>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WizardEntity {
    pub fn new_draft(
        id: WizardEntityId,
        owner: ProfileId,
        target: Option<ListingId>,
        kind: WizardKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            target,
            kind,
            status: WizardStatus::Draft,
            current_step: 1,
            attributes: BTreeMap::new(),
            submitted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == WizardStatus::Draft
    }
}

/// Longer-lived applicant side-store shared by every wizard session of a
/// user. Columns are keyed by their unprefixed name; wizard input reaches
/// them through the `profile_` prefix mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantProfile {
    pub id: ProfileId,
    pub values: BTreeMap<String, Value>,
    pub verified_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TenantProfile {
    pub fn new(id: ProfileId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
            verified_at: None,
            updated_at: now,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set_column(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Whether a column holds non-blank text.
    pub fn has_text(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(Value::String(text)) if !text.trim().is_empty())
    }

    /// Persisted storage path for a document slot, if one is on file. Backs
    /// the upload-once semantics: a slot with a path is never re-demanded.
    pub fn document_path(&self, slot: &str) -> Option<&str> {
        match self.values.get(&format!("{slot}_path")) {
            Some(Value::String(path)) if !path.trim().is_empty() => Some(path.as_str()),
            _ => None,
        }
    }
}

/// In-memory upload handle passed alongside the submission payload, keyed by
/// the field path it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedDocument {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of a draft save. Step errors are intentionally absent at this
/// layer; callers re-query per-step outcomes when they need to display them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftReceipt {
    pub max_valid_step: u8,
    pub saved_at: DateTime<Utc>,
}
