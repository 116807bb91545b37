use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::calculator::{reconcile_rows, Derived};
use super::domain::{
    AcademicYear, Audit, AuditId, DirectPdfUpload, InvalidAcademicYear, SaveIntent, SectionFile,
    FINAL_STEP,
};
use super::gate::{
    completion_summary, missing_labels, missing_sections, CompletenessPolicy, CompletionSummary,
};
use super::register::render_register;
use super::repository::AuditRepository;
use super::sections::{AcademicPrograms, AuditSections, SectionData, SectionKey, ValidationIssue};
use super::status::{Actor, AuditStatus, InvalidTransition};
use super::uploads::{FileUpload, UploadPolicy, UploadRejection};
use crate::config::AuditConfig;
use crate::workflows::integrations::{
    notify_best_effort, release_best_effort, DocumentStorage, EmailMessage, Notifier,
    RepositoryError, StorageError, StoredFile,
};
use crate::workflows::registration::{CollegeDirectory, CollegeId, RegistrationStatus};
use crate::workflows::session::{Principal, Role, SessionError};

/// Runtime knobs for the audit service.
#[derive(Debug, Clone, Default)]
pub struct AuditSettings {
    pub completeness: CompletenessPolicy,
    pub uploads: UploadPolicy,
}

impl From<&AuditConfig> for AuditSettings {
    fn from(config: &AuditConfig) -> Self {
        Self {
            completeness: config.completeness,
            uploads: UploadPolicy::from(config),
        }
    }
}

static AUDIT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_audit_id() -> AuditId {
    let id = AUDIT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AuditId(format!("audit-{id:06}"))
}

/// Which audit a section save applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditTarget {
    Id(AuditId),
    /// Academic year as typed by the client; the audit is created on first save.
    Year(String),
}

#[derive(Debug, Clone)]
pub struct SectionSave {
    pub target: AuditTarget,
    pub data: SectionData,
    pub intent: SaveIntent,
    /// When present, the save is rejected unless the audit is still at this revision.
    pub base_revision: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSaveOutcome {
    pub audit: Audit,
    pub warnings: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDocumentOutcome {
    pub audit: Audit,
    pub file: StoredFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Comment,
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub comments: Option<String>,
}

/// The audit already holding a (college, year) slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingAudit {
    pub id: AuditId,
    pub status: AuditStatus,
}

impl From<&Audit> for ExistingAudit {
    fn from(audit: &Audit) -> Self {
        Self {
            id: audit.id.clone(),
            status: audit.status,
        }
    }
}

/// Section persistence, the submission gate, and admin review for audits.
pub struct AuditService {
    audits: Arc<dyn AuditRepository>,
    colleges: Arc<dyn CollegeDirectory>,
    storage: Arc<dyn DocumentStorage>,
    notifier: Arc<dyn Notifier>,
    settings: AuditSettings,
}

impl AuditService {
    pub fn new(
        audits: Arc<dyn AuditRepository>,
        colleges: Arc<dyn CollegeDirectory>,
        storage: Arc<dyn DocumentStorage>,
        notifier: Arc<dyn Notifier>,
        settings: AuditSettings,
    ) -> Self {
        Self {
            audits,
            colleges,
            storage,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Fetch the caller's audit for a year, creating a draft if none exists.
    pub fn open(&self, principal: &Principal, year: &str) -> Result<Audit, AuditServiceError> {
        let college_id = require_college(principal)?;
        let academic_year = AcademicYear::parse(year)?;
        if let Some(audit) = self.audits.find_for_year(&college_id, &academic_year)? {
            return Ok(audit);
        }
        let audit = self.new_audit(college_id, academic_year)?;
        self.persist(audit, true)
    }

    /// Create a draft, failing with `Conflict` if the year already has an audit.
    pub fn create(&self, principal: &Principal, year: &str) -> Result<Audit, AuditServiceError> {
        let college_id = require_college(principal)?;
        let academic_year = AcademicYear::parse(year)?;
        if let Some(existing) = self.audits.find_for_year(&college_id, &academic_year)? {
            return Err(duplicate_year(&existing));
        }
        let audit = self.new_audit(college_id, academic_year)?;
        self.persist(audit, true)
    }

    pub fn get(&self, principal: &Principal, audit_id: &AuditId) -> Result<Audit, AuditServiceError> {
        let audit = self.fetch(audit_id)?;
        if principal.is_admin() {
            return Ok(audit);
        }
        ensure_owner(principal, &audit)?;
        Ok(audit)
    }

    /// The caller's audits, newest academic year first.
    pub fn list_mine(&self, principal: &Principal) -> Result<Vec<Audit>, AuditServiceError> {
        let college_id = require_college(principal)?;
        let mut audits = self.audits.list_for_college(&college_id)?;
        audits.sort_by(|a, b| b.academic_year.cmp(&a.academic_year));
        Ok(audits)
    }

    pub fn completion(
        &self,
        principal: &Principal,
        audit_id: &AuditId,
    ) -> Result<CompletionSummary, AuditServiceError> {
        let audit = self.get(principal, audit_id)?;
        Ok(completion_summary(&audit, self.settings.completeness))
    }

    /// Replace one section wholesale and optionally advance the wizard.
    pub fn save_section(
        &self,
        principal: &Principal,
        request: SectionSave,
    ) -> Result<SectionSaveOutcome, AuditServiceError> {
        let college_id = require_college(principal)?;
        let (mut audit, is_new) = self.resolve(principal, college_id, &request.target)?;
        ensure_editable(&audit)?;

        if let Some(base) = request.base_revision {
            if base != audit.revision {
                return Err(AuditServiceError::Conflict {
                    message: format!(
                        "audit changed since it was loaded (revision {} now, {} expected)",
                        audit.revision, base
                    ),
                    existing: Some(ExistingAudit::from(&audit)),
                });
            }
        }

        let mut data = request.data;
        let key = data.key();
        data.recompute();
        if let Some(programs) = audit.sections.academic_programs() {
            align_with_programmes(programs, &mut data);
        }

        let (errors, warnings): (Vec<_>, Vec<_>) =
            data.validate().into_iter().partition(ValidationIssue::is_error);
        if !errors.is_empty() {
            return Err(AuditServiceError::Validation {
                message: format!("{} has {} invalid field(s)", key.label(), errors.len()),
                issues: errors,
            });
        }

        audit.status = audit.status.transition(AuditStatus::Draft, Actor::College)?;
        audit.sections.replace(data);
        if key == SectionKey::AcademicPrograms {
            resync_programme_rows(&mut audit.sections);
        }
        let orphaned = audit.detach_unlisted_files(key);
        if request.intent == SaveIntent::SaveAndContinue {
            audit.advance_step();
        }
        audit.touch(Utc::now());

        let audit = self.persist(audit, is_new)?;
        for storage_id in &orphaned {
            release_best_effort(self.storage.as_ref(), storage_id);
        }
        info!(
            audit_id = %audit.id,
            section = key.as_str(),
            step = audit.current_step,
            revision = audit.revision,
            "audit section saved"
        );

        Ok(SectionSaveOutcome { audit, warnings })
    }

    /// Draft/rejected -> submitted once the completeness gate passes.
    pub fn submit(&self, principal: &Principal, audit_id: &AuditId) -> Result<Audit, AuditServiceError> {
        require_college(principal)?;
        let mut audit = self.fetch(audit_id)?;
        ensure_owner(principal, &audit)?;

        match audit.status {
            AuditStatus::Submitted => return Err(AuditServiceError::AlreadySubmitted),
            AuditStatus::Approved => return Err(AuditServiceError::AlreadyApproved),
            AuditStatus::Draft | AuditStatus::Rejected => {}
        }

        let missing = missing_sections(&audit, self.settings.completeness);
        if !missing.is_empty() {
            return Err(AuditServiceError::IncompleteAudit {
                missing: missing_labels(&missing),
            });
        }

        audit.status = audit
            .status
            .transition(AuditStatus::Submitted, Actor::College)?;
        audit.submitted_at = Some(Utc::now());
        audit.submitted_by = Some(principal.id.clone());
        audit.current_step = FINAL_STEP;
        audit.touch(Utc::now());

        self.audits.update(audit.clone())?;
        info!(
            audit_id = %audit.id,
            college_id = %audit.college_id,
            via_pdf = audit.direct_pdf_upload.uploaded,
            "audit submitted"
        );

        Ok(audit)
    }

    /// Attach the consolidated PDF in place of the section forms.
    pub fn upload_direct_pdf(
        &self,
        principal: &Principal,
        year: &str,
        upload: FileUpload,
        submit_now: bool,
    ) -> Result<Audit, AuditServiceError> {
        let college_id = require_college(principal)?;
        let mime = self.settings.uploads.check_pdf(&upload)?;
        let (mut audit, is_new) =
            self.resolve(principal, college_id, &AuditTarget::Year(year.to_string()))?;
        ensure_editable(&audit)?;
        audit.status = audit.status.transition(AuditStatus::Draft, Actor::College)?;

        let folder = format!("audits/{}/{}", audit.college_id, audit.academic_year);
        let stored = self
            .storage
            .store(&folder, &upload.file_name, mime.essence_str(), &upload.bytes)?;
        let previous = audit.direct_pdf_upload.storage_id.take();
        let now = Utc::now();
        audit.direct_pdf_upload = DirectPdfUpload {
            uploaded: true,
            file_url: Some(stored.url.clone()),
            file_name: Some(upload.file_name),
            uploaded_at: Some(now),
            storage_id: Some(stored.storage_id.clone()),
        };
        audit.touch(now);

        let audit = match self.persist(audit, is_new) {
            Ok(audit) => audit,
            Err(err) => {
                release_best_effort(self.storage.as_ref(), &stored.storage_id);
                return Err(err);
            }
        };
        if let Some(previous) = previous {
            release_best_effort(self.storage.as_ref(), &previous);
        }
        info!(audit_id = %audit.id, file = %stored.file_name, "audit PDF uploaded");

        if submit_now {
            return self.submit(principal, &audit.id);
        }
        Ok(audit)
    }

    /// Store a supporting document and append its URL to the section.
    pub fn upload_section_document(
        &self,
        principal: &Principal,
        audit_id: &AuditId,
        key: SectionKey,
        upload: FileUpload,
    ) -> Result<SectionDocumentOutcome, AuditServiceError> {
        require_college(principal)?;
        let mut audit = self.fetch(audit_id)?;
        ensure_owner(principal, &audit)?;
        ensure_editable(&audit)?;
        let mime = self.settings.uploads.check_document(&upload)?;
        audit.status = audit.status.transition(AuditStatus::Draft, Actor::College)?;

        let folder = format!(
            "audits/{}/{}/{}",
            audit.college_id,
            audit.academic_year,
            key.as_str()
        );
        let file = self
            .storage
            .store(&folder, &upload.file_name, mime.essence_str(), &upload.bytes)?;
        audit
            .sections
            .get_or_insert_blank(key)
            .documents_mut()
            .push(file.url.clone());
        audit.section_files.push(SectionFile {
            section: key,
            url: file.url.clone(),
            storage_id: file.storage_id.clone(),
        });
        audit.touch(Utc::now());

        if let Err(err) = self.audits.update(audit.clone()) {
            release_best_effort(self.storage.as_ref(), &file.storage_id);
            return Err(err.into());
        }
        info!(audit_id = %audit.id, section = key.as_str(), "supporting document attached");

        Ok(SectionDocumentOutcome { audit, file })
    }

    /// Owners may discard drafts and rejected audits.
    pub fn delete(&self, principal: &Principal, audit_id: &AuditId) -> Result<(), AuditServiceError> {
        require_college(principal)?;
        let audit = self.fetch(audit_id)?;
        ensure_owner(principal, &audit)?;
        if !audit.status.is_editable() {
            return Err(AuditServiceError::Forbidden(format!(
                "{} audits cannot be deleted",
                audit.status.label()
            )));
        }

        self.audits.delete(audit_id)?;
        if let Some(storage_id) = audit.direct_pdf_upload.storage_id.as_deref() {
            release_best_effort(self.storage.as_ref(), storage_id);
        }
        for file in &audit.section_files {
            release_best_effort(self.storage.as_ref(), &file.storage_id);
        }
        info!(audit_id = %audit.id, "audit deleted");
        Ok(())
    }

    pub fn list_for_review(
        &self,
        principal: &Principal,
        status: Option<AuditStatus>,
    ) -> Result<Vec<Audit>, AuditServiceError> {
        require_admin(principal)?;
        let mut audits = self.audits.list_by_status(status)?;
        audits.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(audits)
    }

    /// Admin comment, approval, or rejection of a submitted audit.
    pub fn review(
        &self,
        principal: &Principal,
        audit_id: &AuditId,
        request: ReviewRequest,
    ) -> Result<Audit, AuditServiceError> {
        require_admin(principal)?;
        let mut audit = self.fetch(audit_id)?;

        let comments = request
            .comments
            .as_deref()
            .map(str::trim)
            .filter(|comments| !comments.is_empty())
            .map(str::to_string);
        if comments.is_none() && request.decision != ReviewDecision::Approve {
            return Err(AuditServiceError::Validation {
                message: "review comments are required".to_string(),
                issues: vec![ValidationIssue::error(
                    "reviewComments",
                    "explain what the college needs to change",
                )],
            });
        }

        let target = match request.decision {
            ReviewDecision::Comment => audit.status,
            ReviewDecision::Approve => AuditStatus::Approved,
            ReviewDecision::Reject => AuditStatus::Rejected,
        };
        let previous = audit.status;
        audit.status = audit.status.transition(target, Actor::Admin)?;
        audit.reviewed_at = Some(Utc::now());
        audit.reviewed_by = Some(principal.id.clone());
        if comments.is_some() {
            audit.review_comments = comments;
        }
        audit.touch(Utc::now());

        self.audits.update(audit.clone())?;
        info!(
            audit_id = %audit.id,
            from = previous.label(),
            to = audit.status.label(),
            reviewer = %principal.id,
            "audit reviewed"
        );

        if previous != audit.status {
            notify_best_effort(self.notifier.as_ref(), review_notice(&audit));
        }
        Ok(audit)
    }

    /// CSV register of every audit for the university office.
    pub fn export_register(&self, principal: &Principal) -> Result<String, AuditServiceError> {
        require_admin(principal)?;
        let mut audits = self.audits.list_by_status(None)?;
        audits.sort_by(|a, b| {
            a.academic_year
                .cmp(&b.academic_year)
                .then_with(|| a.college_id.cmp(&b.college_id))
        });
        Ok(render_register(&audits)?)
    }

    fn fetch(&self, audit_id: &AuditId) -> Result<Audit, AuditServiceError> {
        self.audits
            .fetch(audit_id)?
            .ok_or_else(|| AuditServiceError::NotFound(format!("audit {audit_id} not found")))
    }

    fn resolve(
        &self,
        principal: &Principal,
        college_id: CollegeId,
        target: &AuditTarget,
    ) -> Result<(Audit, bool), AuditServiceError> {
        match target {
            AuditTarget::Id(audit_id) => {
                let audit = self.fetch(audit_id)?;
                ensure_owner(principal, &audit)?;
                Ok((audit, false))
            }
            AuditTarget::Year(year) => {
                let academic_year = AcademicYear::parse(year)?;
                match self.audits.find_for_year(&college_id, &academic_year)? {
                    Some(audit) => Ok((audit, false)),
                    None => Ok((self.new_audit(college_id, academic_year)?, true)),
                }
            }
        }
    }

    /// Builds an unsaved draft seeded with the college's institute details.
    fn new_audit(
        &self,
        college_id: CollegeId,
        academic_year: AcademicYear,
    ) -> Result<Audit, AuditServiceError> {
        let college = self
            .colleges
            .fetch(&college_id)?
            .ok_or_else(|| AuditServiceError::NotFound(format!("college {college_id} not found")))?;
        if college.status != RegistrationStatus::Approved {
            return Err(AuditServiceError::Forbidden(format!(
                "college registration is {}",
                college.status.label()
            )));
        }

        Ok(Audit::new(
            next_audit_id(),
            college_id,
            academic_year,
            college.institute_info(),
            Utc::now(),
        ))
    }

    fn persist(&self, audit: Audit, is_new: bool) -> Result<Audit, AuditServiceError> {
        if !is_new {
            self.audits.update(audit.clone())?;
            return Ok(audit);
        }

        match self.audits.insert(audit) {
            Ok(stored) => {
                info!(
                    audit_id = %stored.id,
                    college_id = %stored.college_id,
                    academic_year = %stored.academic_year,
                    "audit created"
                );
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => {
                warn!("audit insert raced with another create");
                Err(AuditServiceError::Conflict {
                    message: "an audit for this academic year already exists".to_string(),
                    existing: None,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Re-aligns programme-wise rows in `data` with the academic programme list.
fn align_with_programmes(programs: &AcademicPrograms, data: &mut SectionData) {
    if programs.programs.is_empty() {
        return;
    }
    match data {
        SectionData::TeachersAvailability(section) => {
            section.programs = reconcile_rows(&programs.programs, &section.programs);
            section.recompute();
        }
        SectionData::Library(section) => {
            section.programs = reconcile_rows(&programs.programs, &section.programs);
            section.recompute();
        }
        _ => {}
    }
}

fn resync_programme_rows(sections: &mut AuditSections) {
    let Some(programs) = sections.academic_programs().cloned() else {
        return;
    };
    for key in [SectionKey::TeachersAvailability, SectionKey::Library] {
        if let Some(data) = sections.get_mut(key) {
            align_with_programmes(&programs, data);
        }
    }
}

fn review_notice(audit: &Audit) -> EmailMessage {
    let comments = audit
        .review_comments
        .as_deref()
        .map(|comments| format!("<p>Comments: {comments}</p>"))
        .unwrap_or_default();
    EmailMessage {
        to: audit.institute.email.clone(),
        subject: format!(
            "Academic audit {} {}",
            audit.academic_year,
            audit.status.label()
        ),
        html_body: format!(
            "<p>Dear {},</p><p>Your academic audit for {} is now {}.</p>{}",
            audit.institute.name,
            audit.academic_year,
            audit.status.label(),
            comments
        ),
    }
}

fn require_college(principal: &Principal) -> Result<CollegeId, AuditServiceError> {
    match principal.role {
        Role::College => Ok(CollegeId(principal.id.clone())),
        Role::Admin => Err(AuditServiceError::Forbidden(
            "only colleges can edit audits".to_string(),
        )),
    }
}

fn require_admin(principal: &Principal) -> Result<(), AuditServiceError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuditServiceError::Forbidden(
            "administrator access required".to_string(),
        ))
    }
}

fn ensure_owner(principal: &Principal, audit: &Audit) -> Result<(), AuditServiceError> {
    if audit.college_id.0 == principal.id {
        Ok(())
    } else {
        Err(AuditServiceError::Forbidden(
            "audit belongs to another college".to_string(),
        ))
    }
}

fn ensure_editable(audit: &Audit) -> Result<(), AuditServiceError> {
    if audit.status.is_editable() {
        Ok(())
    } else {
        Err(AuditServiceError::Forbidden(format!(
            "{} audits cannot be edited",
            audit.status.label()
        )))
    }
}

fn duplicate_year(existing: &Audit) -> AuditServiceError {
    AuditServiceError::Conflict {
        message: format!(
            "an audit for {} already exists ({})",
            existing.academic_year,
            existing.status.label()
        ),
        existing: Some(ExistingAudit::from(existing)),
    }
}

/// Error raised by the audit service.
#[derive(Debug, thiserror::Error)]
pub enum AuditServiceError {
    #[error("authentication required: {0}")]
    Unauthorized(#[from] SessionError),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Validation {
        message: String,
        issues: Vec<ValidationIssue>,
    },
    #[error("{message}")]
    Conflict {
        message: String,
        existing: Option<ExistingAudit>,
    },
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("audit has already been submitted")]
    AlreadySubmitted,
    #[error("approved audits cannot be changed")]
    AlreadyApproved,
    #[error("complete these sections before submitting: {}", .missing.join(", "))]
    IncompleteAudit { missing: Vec<&'static str> },
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("register export failed: {0}")]
    Export(#[from] csv::Error),
}

impl From<RepositoryError> for AuditServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound("audit not found".to_string()),
            RepositoryError::Conflict => Self::Conflict {
                message: "an audit for this academic year already exists".to_string(),
                existing: None,
            },
            other => Self::Repository(other),
        }
    }
}

impl From<InvalidAcademicYear> for AuditServiceError {
    fn from(value: InvalidAcademicYear) -> Self {
        Self::Validation {
            message: value.to_string(),
            issues: vec![ValidationIssue::error("academicYear", value.to_string())],
        }
    }
}

impl From<UploadRejection> for AuditServiceError {
    fn from(value: UploadRejection) -> Self {
        Self::Validation {
            message: value.to_string(),
            issues: vec![ValidationIssue::error("file", value.to_string())],
        }
    }
}
