use super::domain::{AcademicYear, Audit, AuditId};
use super::status::AuditStatus;
use crate::workflows::integrations::RepositoryError;
use crate::workflows::registration::CollegeId;

/// Document store for audits. Implementations enforce uniqueness of
/// (college, academic year) on insert and report it as `Conflict`.
pub trait AuditRepository: Send + Sync {
    fn insert(&self, audit: Audit) -> Result<Audit, RepositoryError>;
    fn update(&self, audit: Audit) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &AuditId) -> Result<Option<Audit>, RepositoryError>;
    fn find_for_year(
        &self,
        college_id: &CollegeId,
        academic_year: &AcademicYear,
    ) -> Result<Option<Audit>, RepositoryError>;
    fn list_for_college(&self, college_id: &CollegeId) -> Result<Vec<Audit>, RepositoryError>;
    /// `None` lists every audit.
    fn list_by_status(&self, status: Option<AuditStatus>) -> Result<Vec<Audit>, RepositoryError>;
    fn delete(&self, id: &AuditId) -> Result<(), RepositoryError>;
}
