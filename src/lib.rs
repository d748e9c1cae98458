//! Server-authoritative wizard progression engine for rental intake flows.
//!
//! Leads apply to listings through a seven-step application wizard and property
//! managers draft listings through a seven-step property wizard. This crate owns
//! the step-progression state machine: merging profile state with in-flight form
//! input, replaying per-step validation, and orchestrating draft saves and final
//! submission. Persistence, file storage, and the HTTP boundary are collaborator
//! traits implemented elsewhere.

pub mod wizard;

pub use wizard::{
    ApplicationService, Check, DocumentStore, DocumentStoreError, DraftReceipt, FieldErrors,
    FieldRule, LeadNotifier,
    LeadNotifyError, LeadStatusUpdate, ListingId, MergedRecord, Presence, ProfileId,
    ProgressionEngine, PropertyService, RepositoryError, StagedDocument, StepContext,
    StepDefinition, StepRegistry, StepRules, TenantProfile, ValidationOutcome, Visibility,
    WizardEntity, WizardEntityId, WizardKind, WizardRepository, WizardServiceError, WizardStatus,
};
