use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;
use trinity_audit::config::{AuditConfig, SessionSeed};
use trinity_audit::workflows::audit::{
    AcademicYear, Audit, AuditId, AuditRepository, AuditService, AuditSettings, AuditStatus,
};
use trinity_audit::workflows::integrations::{
    DocumentStorage, EmailMessage, NotificationError, Notifier, RepositoryError, StorageError,
    StoredFile,
};
use trinity_audit::workflows::registration::{
    College, CollegeDirectory, CollegeId, RegistrationService, RegistrationStatus,
};
use trinity_audit::workflows::session::{Principal, SessionError, SessionVerifier};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Workflow services wired to the in-memory adapters below.
pub(crate) struct Services {
    pub(crate) audits: Arc<AuditService>,
    pub(crate) registrations: Arc<RegistrationService>,
    pub(crate) sessions: Arc<dyn SessionVerifier>,
    pub(crate) outbox: Arc<InMemoryOutbox>,
}

impl Services {
    pub(crate) fn in_memory(audit: &AuditConfig, sessions: &[SessionSeed]) -> Self {
        let colleges = Arc::new(InMemoryCollegeDirectory::default());
        let outbox = Arc::new(InMemoryOutbox::default());
        let audits = Arc::new(AuditService::new(
            Arc::new(InMemoryAuditRepository::default()),
            colleges.clone(),
            Arc::new(InMemoryDocumentStorage::default()),
            outbox.clone(),
            AuditSettings::from(audit),
        ));
        let registrations = Arc::new(RegistrationService::new(colleges, outbox.clone()));

        Self {
            audits,
            registrations,
            sessions: Arc::new(StaticSessionVerifier::from_seeds(sessions)),
            outbox,
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditRepository {
    records: Arc<Mutex<HashMap<AuditId, Audit>>>,
}

impl AuditRepository for InMemoryAuditRepository {
    fn insert(&self, audit: Audit) -> Result<Audit, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let year_taken = guard.values().any(|existing| {
            existing.college_id == audit.college_id
                && existing.academic_year == audit.academic_year
        });
        if year_taken || guard.contains_key(&audit.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(audit.id.clone(), audit.clone());
        Ok(audit)
    }

    fn update(&self, audit: Audit) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&audit.id) {
            guard.insert(audit.id.clone(), audit);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &AuditId) -> Result<Option<Audit>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_for_year(
        &self,
        college_id: &CollegeId,
        academic_year: &AcademicYear,
    ) -> Result<Option<Audit>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|audit| &audit.college_id == college_id && &audit.academic_year == academic_year)
            .cloned())
    }

    fn list_for_college(&self, college_id: &CollegeId) -> Result<Vec<Audit>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|audit| &audit.college_id == college_id)
            .cloned()
            .collect())
    }

    fn list_by_status(&self, status: Option<AuditStatus>) -> Result<Vec<Audit>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|audit| status.map_or(true, |status| audit.status == status))
            .cloned()
            .collect())
    }

    fn delete(&self, id: &AuditId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCollegeDirectory {
    records: Arc<Mutex<HashMap<CollegeId, College>>>,
}

impl CollegeDirectory for InMemoryCollegeDirectory {
    fn insert(&self, college: College) -> Result<College, RepositoryError> {
        let mut guard = self.records.lock().expect("directory mutex poisoned");
        if guard.contains_key(&college.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(college.id.clone(), college.clone());
        Ok(college)
    }

    fn update(&self, college: College) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("directory mutex poisoned");
        if guard.contains_key(&college.id) {
            guard.insert(college.id.clone(), college);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &CollegeId) -> Result<Option<College>, RepositoryError> {
        let guard = self.records.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<College>, RepositoryError> {
        let guard = self.records.lock().expect("directory mutex poisoned");
        Ok(guard
            .values()
            .find(|college| college.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn list_by_status(&self, status: RegistrationStatus) -> Result<Vec<College>, RepositoryError> {
        let guard = self.records.lock().expect("directory mutex poisoned");
        Ok(guard
            .values()
            .filter(|college| college.status == status)
            .cloned()
            .collect())
    }
}

/// Keeps uploaded bytes in process memory under `memory://` URLs.
#[derive(Default)]
pub(crate) struct InMemoryDocumentStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    sequence: AtomicU64,
}

impl DocumentStorage for InMemoryDocumentStorage {
    fn store(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let storage_id = format!("{folder}/{id:06}-{file_name}");
        self.blobs
            .lock()
            .map_err(|_| StorageError::Upload("storage mutex poisoned".to_string()))?
            .insert(storage_id.clone(), bytes.to_vec());

        Ok(StoredFile {
            url: format!("memory://{storage_id}"),
            storage_id,
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size_bytes: bytes.len(),
        })
    }

    fn delete(&self, storage_id: &str) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .map_err(|_| StorageError::Missing(storage_id.to_string()))?
            .remove(storage_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::Missing(storage_id.to_string()))
    }
}

/// Records outgoing mail and logs it instead of delivering.
#[derive(Default)]
pub(crate) struct InMemoryOutbox {
    sent: Mutex<Vec<EmailMessage>>,
}

impl InMemoryOutbox {
    pub(crate) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("outbox mutex poisoned").clone()
    }
}

impl Notifier for InMemoryOutbox {
    fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        info!(to = %message.to, subject = %message.subject, "mail queued");
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("outbox mutex poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

/// Development verifier backed by `APP_SESSION_TOKENS`.
pub(crate) struct StaticSessionVerifier {
    principals: HashMap<String, Principal>,
}

impl StaticSessionVerifier {
    pub(crate) fn from_seeds(seeds: &[SessionSeed]) -> Self {
        let principals = seeds
            .iter()
            .map(|seed| (seed.token.clone(), seed.principal.clone()))
            .collect();
        Self { principals }
    }
}

impl SessionVerifier for StaticSessionVerifier {
    fn verify(&self, token: &str) -> Result<Principal, SessionError> {
        self.principals
            .get(token)
            .cloned()
            .ok_or(SessionError::Invalid)
    }
}
