use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::wizard::domain::{
    ListingId, ProfileId, StagedDocument, TenantProfile, WizardEntity, WizardEntityId, WizardKind,
};
use crate::wizard::repository::{
    DocumentStore, DocumentStoreError, LeadNotifier, LeadNotifyError, LeadStatusUpdate,
    RepositoryError, Visibility, WizardRepository,
};
use crate::wizard::service::{ApplicationService, PropertyService};
use crate::wizard::steps::StepContext;

/// Fixed reference date for engine-level tests so date rules are stable.
pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
}

/// Date string N days past the real clock, for service-level tests that
/// validate against the current day.
pub(super) fn future_date(days: u64) -> String {
    (Utc::now().date_naive() + Days::new(days)).to_string()
}

pub(super) fn profile_id() -> ProfileId {
    ProfileId("profile-1".to_string())
}

pub(super) fn listing_id() -> ListingId {
    ListingId("listing-9".to_string())
}

pub(super) fn empty_profile() -> TenantProfile {
    TenantProfile::new(profile_id(), Utc::now())
}

/// Profile with valid answers for the first three application steps
/// (employed applicant, renting), no documents on file.
pub(super) fn complete_profile() -> TenantProfile {
    let mut profile = empty_profile();
    for (column, value) in [
        ("first_name", json!("Ava")),
        ("last_name", json!("Janssen")),
        ("email", json!("ava@example.com")),
        ("phone", json!("+31 6 1234 5678")),
        ("date_of_birth", json!("1992-03-14")),
        ("nationality", json!("Dutch")),
        ("current_street", json!("Keizersgracht 12")),
        ("current_city", json!("Amsterdam")),
        ("current_postal_code", json!("1015CX")),
        ("current_country", json!("Netherlands")),
        ("housing_status", json!("renting")),
        ("current_landlord_name", json!("B. de Vries")),
        ("current_landlord_phone", json!("+31 20 555 0101")),
        ("current_rent", json!(1250)),
        ("employment_status", json!("employed")),
        ("employer_name", json!("Acme Logistics")),
        ("job_title", json!("Dispatcher")),
        ("monthly_income", json!(4200)),
    ] {
        profile.set_column(column, value);
    }
    profile
}

pub(super) fn profile_with_documents() -> TenantProfile {
    let mut profile = complete_profile();
    for slot in ["id_document_front", "id_document_back", "proof_of_income"] {
        profile.set_column(&format!("{slot}_path"), json!(format!("docs/{slot}.pdf")));
        profile.set_column(&format!("{slot}_original_name"), json!(format!("{slot}.pdf")));
    }
    profile
}

pub(super) fn application_draft() -> WizardEntity {
    WizardEntity::new_draft(
        WizardEntityId("app-1".to_string()),
        profile_id(),
        Some(listing_id()),
        WizardKind::Application,
        Utc::now(),
    )
}

pub(super) fn property_draft() -> WizardEntity {
    WizardEntity::new_draft(
        WizardEntityId("prop-1".to_string()),
        profile_id(),
        None,
        WizardKind::Property,
        Utc::now(),
    )
}

pub(super) fn ctx_for<'a>(
    entity: &'a WizardEntity,
    profile: Option<&'a TenantProfile>,
) -> StepContext<'a> {
    StepContext {
        today: today(),
        entity,
        profile,
    }
}

/// Entity-owned payload covering application steps 4 through 7, with document
/// markers for step 6. `move_in` is injected because engine tests and service
/// tests validate against different reference dates.
pub(super) fn application_payload(move_in: &str) -> BTreeMap<String, Value> {
    let mut data = BTreeMap::new();
    data.insert("move_in_date".to_string(), json!(move_in));
    data.insert("has_pets".to_string(), json!(false));
    data.insert("has_co_signer".to_string(), json!(false));
    data.insert("has_guarantor".to_string(), json!(false));
    data.insert(
        "profile_id_document_front".to_string(),
        json!("id-front.pdf"),
    );
    data.insert("profile_id_document_back".to_string(), json!("id-back.pdf"));
    data.insert("profile_proof_of_income".to_string(), json!("payslips.pdf"));
    data.insert(
        "message_to_manager".to_string(),
        json!("We would love to rent this apartment; quiet household, stable income."),
    );
    data
}

/// Payload with valid answers for property steps 1 through 7.
pub(super) fn property_payload(available_from: &str) -> BTreeMap<String, Value> {
    let mut data = BTreeMap::new();
    for (key, value) in [
        ("title", json!("Bright canal-side apartment")),
        ("property_type", json!("apartment")),
        ("property_subtype", json!("loft")),
        (
            "description",
            json!("Spacious loft overlooking the canal, recently renovated with new kitchen."),
        ),
        ("street", json!("Herengracht")),
        ("house_number", json!("101-B")),
        ("city", json!("Amsterdam")),
        ("postal_code", json!("1017BN")),
        ("country", json!("Netherlands")),
        ("size_sqm", json!(82)),
        ("bedrooms", json!(2)),
        ("bathrooms", json!(1)),
        ("rent_amount", json!(1850)),
        ("deposit_amount", json!(3700)),
        ("available_from", json!(available_from)),
        ("furnished", json!("partly_furnished")),
        ("pets_allowed", json!(false)),
        ("smoking_allowed", json!(false)),
        ("utilities.0", json!("electricity")),
        ("utilities.1", json!("water")),
        ("images.0", json!("properties/prop-1/front.jpg")),
        ("images.1", json!("properties/prop-1/kitchen.jpg")),
        ("contact_email", json!("lettings@canalhomes.example")),
        ("contact_phone", json!("+31 20 555 0188")),
        ("listing_duration_weeks", json!(8)),
    ] {
        data.insert(key.to_string(), value);
    }
    data
}

pub(super) fn staged(name: &str) -> StagedDocument {
    StagedDocument {
        original_name: name.to_string(),
        content_type: "application/pdf".to_string(),
        bytes: vec![0x25, 0x50, 0x44, 0x46],
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    entities: Mutex<HashMap<String, WizardEntity>>,
    profiles: Mutex<HashMap<String, TenantProfile>>,
    sequence: AtomicU64,
}

impl MemoryRepository {
    pub(super) fn with_profile(profile: TenantProfile) -> Arc<Self> {
        let repository = Arc::new(Self::default());
        repository
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.id.0.clone(), profile);
        repository
    }

    pub(super) fn entity(&self, id: &WizardEntityId) -> WizardEntity {
        self.entities
            .lock()
            .expect("entity mutex poisoned")
            .get(&id.0)
            .cloned()
            .expect("entity present")
    }

    pub(super) fn profile_of(&self, id: &ProfileId) -> TenantProfile {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(&id.0)
            .cloned()
            .expect("profile present")
    }

    pub(super) fn put_profile(&self, profile: TenantProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.id.0.clone(), profile);
    }
}

impl WizardRepository for MemoryRepository {
    fn find_or_create_draft(
        &self,
        owner: &ProfileId,
        target: Option<&ListingId>,
        kind: WizardKind,
    ) -> Result<WizardEntity, RepositoryError> {
        let mut guard = self.entities.lock().expect("entity mutex poisoned");
        if let Some(existing) = guard.values().find(|entity| {
            entity.owner == *owner
                && entity.target.as_ref() == target
                && entity.kind == kind
                && entity.is_draft()
        }) {
            return Ok(existing.clone());
        }
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let entity = WizardEntity::new_draft(
            WizardEntityId(format!("wiz-{id:06}")),
            owner.clone(),
            target.cloned(),
            kind,
            Utc::now(),
        );
        guard.insert(entity.id.0.clone(), entity.clone());
        Ok(entity)
    }

    fn fetch(&self, id: &WizardEntityId) -> Result<Option<WizardEntity>, RepositoryError> {
        let guard = self.entities.lock().expect("entity mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn update(&self, entity: WizardEntity) -> Result<(), RepositoryError> {
        let mut guard = self.entities.lock().expect("entity mutex poisoned");
        guard.insert(entity.id.0.clone(), entity);
        Ok(())
    }

    fn profile(&self, id: &ProfileId) -> Result<Option<TenantProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn update_profile(&self, profile: TenantProfile) -> Result<(), RepositoryError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        guard.insert(profile.id.0.clone(), profile);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryDocuments {
    stored: Mutex<Vec<(String, String, Visibility)>>,
    sequence: AtomicU64,
}

impl MemoryDocuments {
    pub(super) fn stored(&self) -> Vec<(String, String, Visibility)> {
        self.stored.lock().expect("store mutex poisoned").clone()
    }
}

impl DocumentStore for MemoryDocuments {
    fn store(
        &self,
        file: &StagedDocument,
        folder: &str,
        visibility: Visibility,
    ) -> Result<String, DocumentStoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let path = format!("{folder}/{id}-{}", file.original_name);
        self.stored
            .lock()
            .expect("store mutex poisoned")
            .push((path.clone(), folder.to_string(), visibility));
        Ok(path)
    }

    fn delete(&self, _path: &str, _visibility: Visibility) -> Result<bool, DocumentStoreError> {
        Ok(true)
    }

    fn url(
        &self,
        path: &str,
        _visibility: Visibility,
        _ttl_seconds: u64,
    ) -> Result<Option<String>, DocumentStoreError> {
        Ok(Some(format!("https://files.test/{path}")))
    }
}

#[derive(Default)]
pub(super) struct MemoryLeads {
    events: Mutex<Vec<LeadStatusUpdate>>,
}

impl MemoryLeads {
    pub(super) fn events(&self) -> Vec<LeadStatusUpdate> {
        self.events.lock().expect("lead mutex poisoned").clone()
    }
}

impl LeadNotifier for MemoryLeads {
    fn lead_applied(&self, update: LeadStatusUpdate) -> Result<(), LeadNotifyError> {
        self.events
            .lock()
            .expect("lead mutex poisoned")
            .push(update);
        Ok(())
    }
}

pub(super) type TestApplicationService =
    ApplicationService<MemoryRepository, MemoryDocuments, MemoryLeads>;

pub(super) fn build_application_service(
    profile: TenantProfile,
) -> (
    TestApplicationService,
    Arc<MemoryRepository>,
    Arc<MemoryDocuments>,
    Arc<MemoryLeads>,
) {
    let repository = MemoryRepository::with_profile(profile);
    let documents = Arc::new(MemoryDocuments::default());
    let leads = Arc::new(MemoryLeads::default());
    let service = ApplicationService::new(repository.clone(), documents.clone(), leads.clone());
    (service, repository, documents, leads)
}

pub(super) fn build_property_service() -> (
    PropertyService<MemoryRepository, MemoryDocuments>,
    Arc<MemoryRepository>,
    Arc<MemoryDocuments>,
) {
    let repository = MemoryRepository::with_profile(empty_profile());
    let documents = Arc::new(MemoryDocuments::default());
    let service = PropertyService::new(repository.clone(), documents.clone());
    (service, repository, documents)
}
