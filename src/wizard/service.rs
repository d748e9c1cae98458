//! Draft/submit orchestrators composing the merger, progression engine, and
//! the repository/document-store collaborators.
//!
//! Validation failures never surface as errors here: a capped
//! `max_valid_step` in the [`DraftReceipt`] is the blocked-step signal, and
//! per-step error maps are re-queried through [`ApplicationService::step_outcome`]
//! when the caller needs to display them. Submission is the one exception:
//! `submit` runs a mandatory full-revalidation gate and refuses to record an
//! incomplete application.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::domain::{
    DraftReceipt, ListingId, ProfileId, StagedDocument, TenantProfile, WizardEntity,
    WizardEntityId, WizardKind, WizardStatus,
};
use super::merge;
use super::progress::ProgressionEngine;
use super::record::MergedRecord;
use super::repository::{
    DocumentStore, DocumentStoreError, LeadNotifier, LeadNotifyError, LeadStatusUpdate,
    RepositoryError, Visibility, WizardRepository,
};
use super::rules::{FieldErrors, ValidationOutcome};
use super::steps::{
    StepContext, StepRegistry, APPLICATION_ENTITY_FIELD_ROOTS, PROPERTY_ENTITY_FIELD_ROOTS,
    SNAPSHOT_FIELDS,
};

/// Error raised by the wizard services.
#[derive(Debug, thiserror::Error)]
pub enum WizardServiceError {
    #[error("draft is no longer editable (status {status})")]
    DraftClosed { status: &'static str },
    #[error("submission blocked by invalid step {step}")]
    SubmitBlocked { step: u8, errors: FieldErrors },
    #[error("tenant profile missing for draft owner")]
    MissingProfile,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Documents(#[from] DocumentStoreError),
    #[error(transparent)]
    Lead(#[from] LeadNotifyError),
}

/// Orchestrator for the tenant application wizard.
pub struct ApplicationService<R, D, L> {
    repository: Arc<R>,
    documents: Arc<D>,
    leads: Arc<L>,
    registry: StepRegistry,
}

impl<R, D, L> ApplicationService<R, D, L>
where
    R: WizardRepository + 'static,
    D: DocumentStore + 'static,
    L: LeadNotifier + 'static,
{
    pub fn new(repository: Arc<R>, documents: Arc<D>, leads: Arc<L>) -> Self {
        Self {
            repository,
            documents,
            leads,
            registry: StepRegistry::for_kind(WizardKind::Application),
        }
    }

    /// Find or create the single open draft for `(owner, target)`.
    pub fn open_draft(
        &self,
        owner: &ProfileId,
        target: &ListingId,
    ) -> Result<WizardEntity, WizardServiceError> {
        let entity =
            self.repository
                .find_or_create_draft(owner, Some(target), WizardKind::Application)?;
        Ok(entity)
    }

    /// Persist a draft save: profile fields sync eagerly, entity fields are
    /// filtered to the allow-list, and `current_step` is capped at the
    /// longest valid prefix of steps up to `requested_step`.
    pub fn save_draft(
        &self,
        id: &WizardEntityId,
        data: &BTreeMap<String, Value>,
        requested_step: u8,
    ) -> Result<DraftReceipt, WizardServiceError> {
        let mut entity = self.load_draft(id)?;
        let profile = self.sync_and_refresh_profile(&entity.owner, data)?;
        let payload = merge::overlay(&entity.attributes, data);
        let record = merge::merge_application(&profile, &payload);
        let now = Utc::now();
        let max_valid = {
            let ctx = StepContext {
                today: now.date_naive(),
                entity: &entity,
                profile: Some(&profile),
            };
            ProgressionEngine::new(&self.registry).max_valid_step(&record, requested_step, &ctx)
        };
        entity.attributes = filter_entity_fields(payload, APPLICATION_ENTITY_FIELD_ROOTS);
        entity.current_step = max_valid;
        entity.updated_at = now;
        self.repository.update(entity)?;
        debug!(
            entity = %id.0,
            requested_step,
            max_valid_step = max_valid,
            "application draft saved"
        );
        Ok(DraftReceipt {
            max_valid_step: max_valid,
            saved_at: now,
        })
    }

    /// Standalone per-step outcome, used for error display and "is this step
    /// submittable right now" checks.
    pub fn step_outcome(
        &self,
        id: &WizardEntityId,
        step: u8,
        data: &BTreeMap<String, Value>,
    ) -> Result<ValidationOutcome, WizardServiceError> {
        let entity = self.load_draft(id)?;
        let profile = self.owner_profile(&entity.owner)?;
        let payload = merge::overlay(&entity.attributes, data);
        let record = merge::merge_application(&profile, &payload);
        let ctx = StepContext {
            today: Utc::now().date_naive(),
            entity: &entity,
            profile: Some(&profile),
        };
        Ok(ProgressionEngine::new(&self.registry).validate_step(step, &record, &ctx))
    }

    /// Replay the stored draft against current profile data and reposition
    /// it: back to the first broken step, or forward to review when clean.
    /// The demotion is silent; no error is surfaced.
    pub fn revalidate_draft(
        &self,
        id: &WizardEntityId,
    ) -> Result<WizardEntity, WizardServiceError> {
        let mut entity = self.load_draft(id)?;
        let profile = self.owner_profile(&entity.owner)?;
        let record = merge::merge_application(&profile, &entity.attributes);
        let now = Utc::now();
        let position = {
            let ctx = StepContext {
                today: now.date_naive(),
                entity: &entity,
                profile: Some(&profile),
            };
            ProgressionEngine::new(&self.registry)
                .first_invalid_step(&record, &ctx)
                .unwrap_or_else(|| self.registry.review_step())
        };
        if position != entity.current_step {
            debug!(
                entity = %entity.id.0,
                from = entity.current_step,
                to = position,
                "draft repositioned after revalidation"
            );
        }
        entity.current_step = position;
        entity.updated_at = now;
        self.repository.update(entity.clone())?;
        Ok(entity)
    }

    /// Final submission: sync profile, gate on full revalidation, resolve
    /// staged documents, snapshot profile facts onto the entity, and record
    /// the one-time `Draft -> Submitted` transition. Lead status is *not*
    /// published here; see [`Self::publish_lead_applied`].
    pub fn submit(
        &self,
        id: &WizardEntityId,
        data: &BTreeMap<String, Value>,
        files: &BTreeMap<String, StagedDocument>,
    ) -> Result<WizardEntity, WizardServiceError> {
        let mut entity = self.load_draft(id)?;
        let mut profile = self.sync_and_refresh_profile(&entity.owner, data)?;
        let mut payload = merge::overlay(&entity.attributes, data);

        // A client-supplied string at a bare document slot key is not proof
        // of an upload. Only staged files or paths already on the profile may
        // satisfy the documents step at submission.
        for slot in merge::PROFILE_DOCUMENT_SLOTS {
            payload.remove(&format!("{}{slot}", merge::PROFILE_PREFIX));
        }

        // Staged uploads enter the validation record as filename markers so
        // attachment rules can see them.
        let mut staged = payload.clone();
        for (field, file) in files {
            staged.insert(field.clone(), json!(file.original_name));
        }
        let record = merge::merge_application(&profile, &staged);
        let now = Utc::now();
        self.gate_submission(&record, &entity, Some(&profile), now)?;

        let mut profile_changed = false;
        for (field, file) in files {
            let folder = format!("applications/{}", entity.id.0);
            let path = self.documents.store(file, &folder, Visibility::Private)?;
            payload.remove(field);
            let profile_slot = field
                .strip_prefix(merge::PROFILE_PREFIX)
                .filter(|slot| merge::PROFILE_DOCUMENT_SLOTS.contains(slot));
            if let Some(slot) = profile_slot {
                profile.set_column(&format!("{slot}_path"), json!(path));
                profile.set_column(&format!("{slot}_original_name"), json!(file.original_name));
                profile_changed = true;
            } else {
                payload.insert(format!("{field}_path"), json!(path));
                payload.insert(format!("{field}_original_name"), json!(file.original_name));
                if field.starts_with("additional_documents.") {
                    payload.insert(format!("{field}_content_type"), json!(file.content_type));
                }
            }
        }

        let mut attributes = filter_entity_fields(payload, APPLICATION_ENTITY_FIELD_ROOTS);
        // Freeze applicant-facing facts at the moment of submission; later
        // profile edits must not alter the submitted record.
        for column in SNAPSHOT_FIELDS {
            if let Some(value) = profile.column(column) {
                attributes.insert(format!("snapshot_{column}"), value.clone());
            }
        }
        entity.attributes = attributes;
        entity.status = WizardStatus::Submitted;
        entity.submitted_at = Some(now);
        entity.current_step = self.registry.review_step();
        entity.updated_at = now;
        self.repository.update(entity.clone())?;

        if promote_verification(&mut profile, now) {
            profile_changed = true;
            info!(profile = %profile.id.0, "tenant profile auto-verified");
        }
        if profile_changed {
            profile.updated_at = now;
            self.repository.update_profile(profile)?;
        }
        info!(entity = %entity.id.0, "application submitted");
        Ok(entity)
    }

    /// Explicit lead-status side effect, invoked by the boundary layer after
    /// a successful submission.
    pub fn publish_lead_applied(&self, entity: &WizardEntity) -> Result<(), WizardServiceError> {
        let Some(target) = entity.target.clone() else {
            return Ok(());
        };
        self.leads.lead_applied(LeadStatusUpdate {
            owner: entity.owner.clone(),
            target,
            status: "applied".to_string(),
        })?;
        Ok(())
    }

    fn gate_submission(
        &self,
        record: &MergedRecord,
        entity: &WizardEntity,
        profile: Option<&TenantProfile>,
        now: DateTime<Utc>,
    ) -> Result<(), WizardServiceError> {
        let ctx = StepContext {
            today: now.date_naive(),
            entity,
            profile,
        };
        let engine = ProgressionEngine::new(&self.registry);
        if let Some(step) = engine.first_invalid_step(record, &ctx) {
            let errors = engine
                .validate_step(step, record, &ctx)
                .errors()
                .cloned()
                .unwrap_or_default();
            return Err(WizardServiceError::SubmitBlocked { step, errors });
        }
        Ok(())
    }

    fn load_draft(&self, id: &WizardEntityId) -> Result<WizardEntity, WizardServiceError> {
        let entity = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        if !entity.is_draft() {
            return Err(WizardServiceError::DraftClosed {
                status: entity.status.label(),
            });
        }
        Ok(entity)
    }

    fn owner_profile(&self, owner: &ProfileId) -> Result<TenantProfile, WizardServiceError> {
        self.repository
            .profile(owner)?
            .ok_or(WizardServiceError::MissingProfile)
    }

    /// Profile fields sync eagerly on every save/submit, before validation,
    /// so later steps see data supplied in the same request. The profile is
    /// re-read afterwards to pick up anything derived during the write.
    fn sync_and_refresh_profile(
        &self,
        owner: &ProfileId,
        data: &BTreeMap<String, Value>,
    ) -> Result<TenantProfile, WizardServiceError> {
        let mut profile = self.owner_profile(owner)?;
        for (key, value) in data {
            if let Some(column) = key.strip_prefix(merge::PROFILE_PREFIX) {
                if merge::syncable_column(column) {
                    profile.set_column(column, value.clone());
                }
            }
        }
        profile.updated_at = Utc::now();
        self.repository.update_profile(profile)?;
        self.owner_profile(owner)
    }
}

/// Orchestrator for the property listing wizard. Same draft/submit cycle as
/// the application flow, without a profile side-store, snapshot, or lead
/// notification.
pub struct PropertyService<R, D> {
    repository: Arc<R>,
    documents: Arc<D>,
    registry: StepRegistry,
}

impl<R, D> PropertyService<R, D>
where
    R: WizardRepository + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(repository: Arc<R>, documents: Arc<D>) -> Self {
        Self {
            repository,
            documents,
            registry: StepRegistry::for_kind(WizardKind::Property),
        }
    }

    /// Find or create the manager's single open listing draft.
    pub fn open_draft(&self, owner: &ProfileId) -> Result<WizardEntity, WizardServiceError> {
        let entity = self
            .repository
            .find_or_create_draft(owner, None, WizardKind::Property)?;
        Ok(entity)
    }

    pub fn save_draft(
        &self,
        id: &WizardEntityId,
        data: &BTreeMap<String, Value>,
        requested_step: u8,
    ) -> Result<DraftReceipt, WizardServiceError> {
        let mut entity = self.load_draft(id)?;
        let payload = merge::overlay(&entity.attributes, data);
        let record = MergedRecord::new(payload.clone());
        let now = Utc::now();
        let max_valid = {
            let ctx = StepContext {
                today: now.date_naive(),
                entity: &entity,
                profile: None,
            };
            ProgressionEngine::new(&self.registry).max_valid_step(&record, requested_step, &ctx)
        };
        entity.attributes = filter_entity_fields(payload, PROPERTY_ENTITY_FIELD_ROOTS);
        entity.current_step = max_valid;
        entity.updated_at = now;
        self.repository.update(entity)?;
        debug!(
            entity = %id.0,
            requested_step,
            max_valid_step = max_valid,
            "property draft saved"
        );
        Ok(DraftReceipt {
            max_valid_step: max_valid,
            saved_at: now,
        })
    }

    pub fn step_outcome(
        &self,
        id: &WizardEntityId,
        step: u8,
        data: &BTreeMap<String, Value>,
    ) -> Result<ValidationOutcome, WizardServiceError> {
        let entity = self.load_draft(id)?;
        let record = merge::merge_property(&entity.attributes, data);
        let ctx = StepContext {
            today: Utc::now().date_naive(),
            entity: &entity,
            profile: None,
        };
        Ok(ProgressionEngine::new(&self.registry).validate_step(step, &record, &ctx))
    }

    pub fn revalidate_draft(
        &self,
        id: &WizardEntityId,
    ) -> Result<WizardEntity, WizardServiceError> {
        let mut entity = self.load_draft(id)?;
        let record = MergedRecord::new(entity.attributes.clone());
        let now = Utc::now();
        let position = {
            let ctx = StepContext {
                today: now.date_naive(),
                entity: &entity,
                profile: None,
            };
            ProgressionEngine::new(&self.registry)
                .first_invalid_step(&record, &ctx)
                .unwrap_or_else(|| self.registry.review_step())
        };
        if position != entity.current_step {
            debug!(
                entity = %entity.id.0,
                from = entity.current_step,
                to = position,
                "listing draft repositioned after revalidation"
            );
        }
        entity.current_step = position;
        entity.updated_at = now;
        self.repository.update(entity.clone())?;
        Ok(entity)
    }

    pub fn submit(
        &self,
        id: &WizardEntityId,
        data: &BTreeMap<String, Value>,
        files: &BTreeMap<String, StagedDocument>,
    ) -> Result<WizardEntity, WizardServiceError> {
        let mut entity = self.load_draft(id)?;
        let mut payload = merge::overlay(&entity.attributes, data);
        let mut staged = payload.clone();
        for (field, file) in files {
            staged.insert(field.clone(), json!(file.original_name));
        }
        let record = MergedRecord::new(staged);
        let now = Utc::now();
        {
            let ctx = StepContext {
                today: now.date_naive(),
                entity: &entity,
                profile: None,
            };
            let engine = ProgressionEngine::new(&self.registry);
            if let Some(step) = engine.first_invalid_step(&record, &ctx) {
                let errors = engine
                    .validate_step(step, &record, &ctx)
                    .errors()
                    .cloned()
                    .unwrap_or_default();
                return Err(WizardServiceError::SubmitBlocked { step, errors });
            }
        }

        for (field, file) in files {
            let folder = format!("properties/{}", entity.id.0);
            let path = self.documents.store(file, &folder, Visibility::Public)?;
            payload.remove(field);
            payload.insert(format!("{field}_path"), json!(path));
            payload.insert(format!("{field}_original_name"), json!(file.original_name));
        }

        entity.attributes = filter_entity_fields(payload, PROPERTY_ENTITY_FIELD_ROOTS);
        entity.status = WizardStatus::Submitted;
        entity.submitted_at = Some(now);
        entity.current_step = self.registry.review_step();
        entity.updated_at = now;
        self.repository.update(entity.clone())?;
        info!(entity = %entity.id.0, "property listing submitted");
        Ok(entity)
    }

    fn load_draft(&self, id: &WizardEntityId) -> Result<WizardEntity, WizardServiceError> {
        let entity = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        if !entity.is_draft() {
            return Err(WizardServiceError::DraftClosed {
                status: entity.status.label(),
            });
        }
        Ok(entity)
    }
}

/// One-way, idempotent verification promotion: a profile with complete
/// identity facts, both sides of an ID document, and an employment status is
/// stamped verified. Never un-verifies.
fn promote_verification(profile: &mut TenantProfile, now: DateTime<Utc>) -> bool {
    if profile.verified_at.is_some() {
        return false;
    }
    let complete = profile.has_text("date_of_birth")
        && profile.has_text("nationality")
        && profile.has_text("phone")
        && profile.document_path("id_document_front").is_some()
        && profile.document_path("id_document_back").is_some()
        && profile.has_text("employment_status");
    if complete {
        profile.verified_at = Some(now);
    }
    complete
}

/// Keep only entity-owned keys. A key qualifies when its root segment is on
/// the allow-list, directly or through a resolved-document suffix.
fn filter_entity_fields(
    payload: BTreeMap<String, Value>,
    roots: &[&str],
) -> BTreeMap<String, Value> {
    payload
        .into_iter()
        .filter(|(key, _)| entity_owned(key, roots))
        .collect()
}

fn entity_owned(key: &str, roots: &[&str]) -> bool {
    let root = key.split('.').next().unwrap_or(key);
    if roots.contains(&root) {
        return true;
    }
    ["_path", "_original_name", "_content_type"]
        .iter()
        .any(|suffix| {
            root.strip_suffix(suffix)
                .map(|stem| roots.contains(&stem))
                .unwrap_or(false)
        })
}
