//! Annual academic audit: the seventeen-step wizard, its derived values,
//! the draft lifecycle, the submission gate, and admin review.

pub mod calculator;
pub mod domain;
pub mod gate;
pub mod register;
pub mod repository;
pub mod router;
pub mod sections;
pub mod service;
pub mod status;
pub mod uploads;

#[cfg(test)]
mod tests;

pub use domain::{
    AcademicYear, Audit, AuditId, AuditSummaryView, DirectPdfUpload, InvalidAcademicYear,
    SaveIntent, SectionFile, FINAL_STEP,
};
pub use gate::{completion_summary, missing_sections, CompletenessPolicy, CompletionSummary};
pub use repository::AuditRepository;
pub use router::{audit_router, AuditApiState};
pub use sections::{AuditSections, SectionData, SectionKey, ValidationIssue};
pub use service::{
    AuditService, AuditServiceError, AuditSettings, AuditTarget, ExistingAudit, ReviewDecision,
    ReviewRequest, SectionDocumentOutcome, SectionSave, SectionSaveOutcome,
};
pub use status::{Actor, AuditStatus, InvalidTransition};
pub use uploads::{FileUpload, UploadPolicy, UploadRejection};
