use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::audit::domain::{AcademicYear, Audit, AuditId, SaveIntent};
use crate::workflows::audit::repository::AuditRepository;
use crate::workflows::audit::sections::{
    AcademicPrograms, Accreditation, ProgramFaculty, ProgramOffering, SectionData,
    TeachersAvailability,
};
use crate::workflows::audit::service::{
    AuditService, AuditSettings, AuditTarget, SectionSave, SectionSaveOutcome,
};
use crate::workflows::audit::status::AuditStatus;
use crate::workflows::audit::uploads::FileUpload;
use crate::workflows::audit::{audit_router, AuditApiState, CompletenessPolicy};
use crate::workflows::integrations::{
    DocumentStorage, EmailMessage, NotificationError, Notifier, RepositoryError, StorageError,
    StoredFile,
};
use crate::workflows::registration::{College, CollegeDirectory, CollegeId, RegistrationStatus};
use crate::workflows::session::{Principal, Role, SessionError, SessionVerifier};

pub(super) const YEAR: &str = "2024-25";
pub(super) const COLLEGE_TOKEN: &str = "college-token";
pub(super) const OTHER_COLLEGE_TOKEN: &str = "other-token";
pub(super) const ADMIN_TOKEN: &str = "admin-token";

pub(super) fn college() -> Principal {
    Principal {
        id: "college-1".to_string(),
        role: Role::College,
        email: "office@trinity.example".to_string(),
    }
}

pub(super) fn other_college() -> Principal {
    Principal {
        id: "college-2".to_string(),
        role: Role::College,
        email: "office@other.example".to_string(),
    }
}

pub(super) fn admin() -> Principal {
    Principal {
        id: "admin-1".to_string(),
        role: Role::Admin,
        email: "audits@ipu.example".to_string(),
    }
}

pub(super) fn college_record(id: &str, status: RegistrationStatus) -> College {
    College {
        id: CollegeId(id.to_string()),
        name: format!("Trinity Institute {id}"),
        email: format!("{id}@trinity.example"),
        phone: Some("011-2345-6789".to_string()),
        address: Some("Dwarka, New Delhi".to_string()),
        principal_name: Some("Dr. A. Sharma".to_string()),
        programs_offered: vec!["BBA".to_string(), "BCA".to_string()],
        status,
        rejection_reason: None,
        registered_at: Utc::now(),
        reviewed_at: None,
        reviewed_by: None,
    }
}

pub(super) fn academic_programs() -> SectionData {
    SectionData::AcademicPrograms(AcademicPrograms {
        programs: vec![
            ProgramOffering {
                programme_name: "BBA".to_string(),
                first_shift_intake: 120,
                second_shift_intake: 60,
                ..ProgramOffering::default()
            },
            ProgramOffering {
                programme_name: "MBA".to_string(),
                first_shift_intake: 60,
                ..ProgramOffering::default()
            },
        ],
        ..AcademicPrograms::default()
    })
}

pub(super) fn accreditation() -> SectionData {
    SectionData::Accreditation(Accreditation {
        naac_accredited: true,
        naac_grade: Some("A".to_string()),
        naac_cgpa: Some(3.12),
        ..Accreditation::default()
    })
}

pub(super) fn teachers_availability() -> SectionData {
    SectionData::TeachersAvailability(TeachersAvailability {
        programs: vec![ProgramFaculty {
            programme_name: "BBA".to_string(),
            available_teachers: 25,
            ..ProgramFaculty::default()
        }],
        professors: 3,
        associate_professors: 5,
        assistant_professors: 24,
        ..TeachersAvailability::default()
    })
}

pub(super) fn pdf(file_name: &str) -> FileUpload {
    FileUpload {
        file_name: file_name.to_string(),
        bytes: b"%PDF-1.7 audit".to_vec(),
    }
}

pub(super) fn save_request(target: AuditTarget, data: SectionData) -> SectionSave {
    SectionSave {
        target,
        data,
        intent: SaveIntent::Save,
        base_revision: None,
    }
}

pub(super) fn save_for_year(
    service: &AuditService,
    principal: &Principal,
    data: SectionData,
) -> SectionSaveOutcome {
    service
        .save_section(
            principal,
            save_request(AuditTarget::Year(YEAR.to_string()), data),
        )
        .expect("section saves")
}

/// Saves the three core sections so the default gate passes.
pub(super) fn core_complete_audit(service: &AuditService, principal: &Principal) -> Audit {
    save_for_year(service, principal, academic_programs());
    save_for_year(service, principal, accreditation());
    save_for_year(service, principal, teachers_availability()).audit
}

pub(super) struct Harness {
    pub(super) service: AuditService,
    pub(super) audits: Arc<MemoryAudits>,
    pub(super) colleges: Arc<MemoryColleges>,
    pub(super) storage: Arc<MemoryStorage>,
    pub(super) mail: Arc<MemoryMail>,
}

pub(super) fn harness() -> Harness {
    harness_with(CompletenessPolicy::Core)
}

pub(super) fn harness_with(completeness: CompletenessPolicy) -> Harness {
    let audits = Arc::new(MemoryAudits::default());
    let colleges = Arc::new(MemoryColleges::default());
    colleges.seed(college_record("college-1", RegistrationStatus::Approved));
    colleges.seed(college_record("college-2", RegistrationStatus::Approved));
    colleges.seed(college_record("college-3", RegistrationStatus::Pending));
    let storage = Arc::new(MemoryStorage::default());
    let mail = Arc::new(MemoryMail::default());
    let settings = AuditSettings {
        completeness,
        ..AuditSettings::default()
    };
    let service = AuditService::new(
        audits.clone(),
        colleges.clone(),
        storage.clone(),
        mail.clone(),
        settings,
    );
    Harness {
        service,
        audits,
        colleges,
        storage,
        mail,
    }
}

pub(super) fn router_for(harness: Harness) -> axum::Router {
    audit_router(AuditApiState {
        service: Arc::new(harness.service),
        sessions: Arc::new(StaticSessions::standard()),
        expose_diagnostics: false,
    })
}

pub(super) fn stored(audits: &MemoryAudits, id: &AuditId) -> Audit {
    audits
        .fetch(id)
        .expect("fetch succeeds")
        .expect("audit present")
}

#[derive(Default)]
pub(super) struct MemoryAudits {
    records: Mutex<HashMap<AuditId, Audit>>,
}

impl AuditRepository for MemoryAudits {
    fn insert(&self, audit: Audit) -> Result<Audit, RepositoryError> {
        let mut guard = self.records.lock().expect("audit mutex poisoned");
        let taken = guard.values().any(|existing| {
            existing.college_id == audit.college_id
                && existing.academic_year == audit.academic_year
        });
        if taken || guard.contains_key(&audit.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(audit.id.clone(), audit.clone());
        Ok(audit)
    }

    fn update(&self, audit: Audit) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("audit mutex poisoned");
        if !guard.contains_key(&audit.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(audit.id.clone(), audit);
        Ok(())
    }

    fn fetch(&self, id: &AuditId) -> Result<Option<Audit>, RepositoryError> {
        let guard = self.records.lock().expect("audit mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_for_year(
        &self,
        college_id: &CollegeId,
        academic_year: &AcademicYear,
    ) -> Result<Option<Audit>, RepositoryError> {
        let guard = self.records.lock().expect("audit mutex poisoned");
        Ok(guard
            .values()
            .find(|audit| &audit.college_id == college_id && &audit.academic_year == academic_year)
            .cloned())
    }

    fn list_for_college(&self, college_id: &CollegeId) -> Result<Vec<Audit>, RepositoryError> {
        let guard = self.records.lock().expect("audit mutex poisoned");
        Ok(guard
            .values()
            .filter(|audit| &audit.college_id == college_id)
            .cloned()
            .collect())
    }

    fn list_by_status(&self, status: Option<AuditStatus>) -> Result<Vec<Audit>, RepositoryError> {
        let guard = self.records.lock().expect("audit mutex poisoned");
        Ok(guard
            .values()
            .filter(|audit| status.map_or(true, |status| audit.status == status))
            .cloned()
            .collect())
    }

    fn delete(&self, id: &AuditId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("audit mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

impl MemoryAudits {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("audit mutex poisoned").len()
    }
}

#[derive(Default)]
pub(super) struct MemoryColleges {
    records: Mutex<HashMap<CollegeId, College>>,
}

impl MemoryColleges {
    pub(super) fn seed(&self, college: College) {
        self.records
            .lock()
            .expect("college mutex poisoned")
            .insert(college.id.clone(), college);
    }
}

impl CollegeDirectory for MemoryColleges {
    fn insert(&self, college: College) -> Result<College, RepositoryError> {
        self.seed(college.clone());
        Ok(college)
    }

    fn update(&self, college: College) -> Result<(), RepositoryError> {
        self.seed(college);
        Ok(())
    }

    fn fetch(&self, id: &CollegeId) -> Result<Option<College>, RepositoryError> {
        let guard = self.records.lock().expect("college mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<College>, RepositoryError> {
        let guard = self.records.lock().expect("college mutex poisoned");
        Ok(guard.values().find(|college| college.email == email).cloned())
    }

    fn list_by_status(&self, status: RegistrationStatus) -> Result<Vec<College>, RepositoryError> {
        let guard = self.records.lock().expect("college mutex poisoned");
        Ok(guard
            .values()
            .filter(|college| college.status == status)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryStorage {
    files: Mutex<HashMap<String, StoredFile>>,
    released: Mutex<Vec<String>>,
    sequence: AtomicUsize,
}

impl MemoryStorage {
    pub(super) fn released(&self) -> Vec<String> {
        self.released.lock().expect("storage mutex poisoned").clone()
    }

    pub(super) fn file_count(&self) -> usize {
        self.files.lock().expect("storage mutex poisoned").len()
    }
}

impl DocumentStorage for MemoryStorage {
    fn store(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let storage_id = format!("{folder}/{n}-{file_name}");
        let file = StoredFile {
            url: format!("memory://{storage_id}"),
            storage_id: storage_id.clone(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size_bytes: bytes.len(),
        };
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .insert(storage_id, file.clone());
        Ok(file)
    }

    fn delete(&self, storage_id: &str) -> Result<(), StorageError> {
        self.released
            .lock()
            .expect("storage mutex poisoned")
            .push(storage_id.to_string());
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .remove(storage_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::Missing(storage_id.to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryMail {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemoryMail {
    pub(super) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mail mutex poisoned").clone()
    }
}

impl Notifier for MemoryMail {
    fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        self.sent.lock().expect("mail mutex poisoned").push(message);
        Ok(())
    }
}

pub(super) struct OfflineMail;

impl Notifier for OfflineMail {
    fn send(&self, _message: EmailMessage) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp down".to_string()))
    }
}

pub(super) struct StaticSessions {
    principals: HashMap<String, Principal>,
}

impl StaticSessions {
    pub(super) fn standard() -> Self {
        let principals = [
            (COLLEGE_TOKEN, college()),
            (OTHER_COLLEGE_TOKEN, other_college()),
            (ADMIN_TOKEN, admin()),
        ]
        .into_iter()
        .map(|(token, principal)| (token.to_string(), principal))
        .collect();
        Self { principals }
    }
}

impl SessionVerifier for StaticSessions {
    fn verify(&self, token: &str) -> Result<Principal, SessionError> {
        self.principals
            .get(token)
            .cloned()
            .ok_or(SessionError::Invalid)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
