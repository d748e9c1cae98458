//! Multi-step intake wizard engine.
//!
//! The engine is split the same way the product is: a pure validation core
//! (`record`, `rules`, `steps`, `progress`) that decides how far a draft may
//! advance, and an orchestration layer (`service`) that applies the side effects
//! of saving drafts and submitting them through the repository and document
//! store collaborators.

pub mod domain;
pub mod merge;
pub mod progress;
pub mod record;
pub mod repository;
pub mod rules;
pub mod service;
pub mod steps;

#[cfg(test)]
mod tests;

pub use domain::{
    DraftReceipt, ListingId, ProfileId, StagedDocument, TenantProfile, WizardEntity,
    WizardEntityId, WizardKind, WizardStatus,
};
pub use merge::{merge_application, merge_property};
pub use progress::ProgressionEngine;
pub use record::MergedRecord;
pub use repository::{
    DocumentStore, DocumentStoreError, LeadNotifier, LeadNotifyError, LeadStatusUpdate,
    RepositoryError, Visibility, WizardRepository,
};
pub use rules::{Check, FieldErrors, FieldRule, Presence, StepRules, ValidationOutcome};
pub use service::{ApplicationService, PropertyService, WizardServiceError};
pub use steps::{RuleProvider, StepContext, StepDefinition, StepRegistry};
