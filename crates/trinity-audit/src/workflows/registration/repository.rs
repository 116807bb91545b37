use super::domain::{College, CollegeId, RegistrationStatus};
use crate::workflows::integrations::RepositoryError;

/// College records, owned by the registration workflow and read by audits.
pub trait CollegeDirectory: Send + Sync {
    fn insert(&self, college: College) -> Result<College, RepositoryError>;
    fn update(&self, college: College) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &CollegeId) -> Result<Option<College>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<College>, RepositoryError>;
    fn list_by_status(&self, status: RegistrationStatus) -> Result<Vec<College>, RepositoryError>;
}
