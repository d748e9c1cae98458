use serde::{Deserialize, Serialize};

use super::domain::{
    ListingId, ProfileId, StagedDocument, TenantProfile, WizardEntity, WizardEntityId, WizardKind,
};

/// Persistence abstraction so the services can be exercised in isolation.
/// `find_or_create_draft` is keyed on `(owner, target, kind, status = draft)`,
/// which is what guarantees at most one open draft per pair.
pub trait WizardRepository: Send + Sync {
    fn find_or_create_draft(
        &self,
        owner: &ProfileId,
        target: Option<&ListingId>,
        kind: WizardKind,
    ) -> Result<WizardEntity, RepositoryError>;
    fn fetch(&self, id: &WizardEntityId) -> Result<Option<WizardEntity>, RepositoryError>;
    fn update(&self, entity: WizardEntity) -> Result<(), RepositoryError>;
    fn profile(&self, id: &ProfileId) -> Result<Option<TenantProfile>, RepositoryError>;
    fn update_profile(&self, profile: TenantProfile) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Visibility of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Private,
    Public,
}

/// Opaque file storage collaborator. Uploads resolve synchronously at
/// submission time; retries, if any, belong to the implementation.
pub trait DocumentStore: Send + Sync {
    fn store(
        &self,
        file: &StagedDocument,
        folder: &str,
        visibility: Visibility,
    ) -> Result<String, DocumentStoreError>;
    fn delete(&self, path: &str, visibility: Visibility) -> Result<bool, DocumentStoreError>;
    fn url(
        &self,
        path: &str,
        visibility: Visibility,
        ttl_seconds: u64,
    ) -> Result<Option<String>, DocumentStoreError>;
}

/// Document storage failure.
#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document rejected: {0}")]
    Rejected(String),
}

/// Lead status payload published by the boundary layer after a successful
/// submission. Never emitted implicitly by `submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadStatusUpdate {
    pub owner: ProfileId,
    pub target: ListingId,
    pub status: String,
}

/// Trait describing the outbound lead-status hook.
pub trait LeadNotifier: Send + Sync {
    fn lead_applied(&self, update: LeadStatusUpdate) -> Result<(), LeadNotifyError>;
}

/// Lead dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum LeadNotifyError {
    #[error("lead transport unavailable: {0}")]
    Transport(String),
}
