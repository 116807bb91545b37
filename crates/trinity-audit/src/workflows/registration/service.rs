use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    ApprovedCollegeFilter, College, CollegeId, CollegeRegistration, RegistrationStatus,
};
use super::repository::CollegeDirectory;
use crate::workflows::integrations::{
    notify_best_effort, EmailMessage, Notifier, RepositoryError,
};
use crate::workflows::session::Principal;

static COLLEGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_college_id() -> CollegeId {
    let id = COLLEGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CollegeId(format!("college-{id:06}"))
}

/// Registration intake plus the admin approve/reject queue.
pub struct RegistrationService {
    colleges: Arc<dyn CollegeDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl RegistrationService {
    pub fn new(colleges: Arc<dyn CollegeDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        Self { colleges, notifier }
    }

    /// Record a new college in the pending queue.
    pub fn register(
        &self,
        registration: CollegeRegistration,
    ) -> Result<College, RegistrationError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(RegistrationError::Validation(
                "college name is required".to_string(),
            ));
        }
        let email = registration.email.trim().to_ascii_lowercase();
        if !looks_like_email(&email) {
            return Err(RegistrationError::Validation(format!(
                "'{}' is not a valid e-mail address",
                registration.email
            )));
        }
        if self.colleges.find_by_email(&email)?.is_some() {
            return Err(RegistrationError::Repository(RepositoryError::Conflict));
        }

        let college = College {
            id: next_college_id(),
            name: name.to_string(),
            email,
            phone: registration.phone,
            address: registration.address,
            principal_name: registration.principal_name,
            programs_offered: registration
                .programs_offered
                .into_iter()
                .map(|program| program.trim().to_string())
                .filter(|program| !program.is_empty())
                .collect(),
            status: RegistrationStatus::Pending,
            rejection_reason: None,
            registered_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        };

        let stored = self.colleges.insert(college)?;
        info!(college_id = %stored.id, "college registration received");

        notify_best_effort(
            self.notifier.as_ref(),
            EmailMessage {
                to: stored.email.clone(),
                subject: "Registration received".to_string(),
                html_body: format!(
                    "<p>Dear {},</p><p>Your registration is pending review by the university.</p>",
                    stored.name
                ),
            },
        );

        Ok(stored)
    }

    pub fn pending(&self, principal: &Principal) -> Result<Vec<College>, RegistrationError> {
        require_admin(principal)?;
        let mut colleges = self.colleges.list_by_status(RegistrationStatus::Pending)?;
        colleges.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(colleges)
    }

    pub fn approved(
        &self,
        principal: &Principal,
        filter: &ApprovedCollegeFilter,
    ) -> Result<Vec<College>, RegistrationError> {
        require_admin(principal)?;
        let mut colleges: Vec<College> = self
            .colleges
            .list_by_status(RegistrationStatus::Approved)?
            .into_iter()
            .filter(|college| filter.matches(college))
            .collect();
        colleges.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(colleges)
    }

    pub fn approve(
        &self,
        principal: &Principal,
        college_id: &CollegeId,
    ) -> Result<College, RegistrationError> {
        require_admin(principal)?;
        let mut college = self.pending_college(college_id)?;

        college.status = RegistrationStatus::Approved;
        college.rejection_reason = None;
        college.reviewed_at = Some(Utc::now());
        college.reviewed_by = Some(principal.id.clone());
        self.colleges.update(college.clone())?;
        info!(college_id = %college.id, reviewer = %principal.id, "college registration approved");

        notify_best_effort(
            self.notifier.as_ref(),
            EmailMessage {
                to: college.email.clone(),
                subject: "Registration approved".to_string(),
                html_body: format!(
                    "<p>Dear {},</p><p>Your registration has been approved. You can now sign in and begin your academic audit.</p>",
                    college.name
                ),
            },
        );

        Ok(college)
    }

    pub fn reject(
        &self,
        principal: &Principal,
        college_id: &CollegeId,
        reason: &str,
    ) -> Result<College, RegistrationError> {
        require_admin(principal)?;
        if reason.trim().is_empty() {
            return Err(RegistrationError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }
        let mut college = self.pending_college(college_id)?;

        college.status = RegistrationStatus::Rejected;
        college.rejection_reason = Some(reason.to_string());
        college.reviewed_at = Some(Utc::now());
        college.reviewed_by = Some(principal.id.clone());
        self.colleges.update(college.clone())?;
        info!(college_id = %college.id, reviewer = %principal.id, "college registration rejected");

        notify_best_effort(
            self.notifier.as_ref(),
            EmailMessage {
                to: college.email.clone(),
                subject: "Registration rejected".to_string(),
                html_body: format!(
                    "<p>Dear {},</p><p>Your registration was not approved.</p><p>Reason: {}</p>",
                    college.name, reason
                ),
            },
        );

        Ok(college)
    }

    fn pending_college(&self, college_id: &CollegeId) -> Result<College, RegistrationError> {
        let college = self
            .colleges
            .fetch(college_id)?
            .ok_or(RegistrationError::NotFound)?;
        if college.status != RegistrationStatus::Pending {
            return Err(RegistrationError::NotPending {
                status: college.status,
            });
        }
        Ok(college)
    }
}

fn require_admin(principal: &Principal) -> Result<(), RegistrationError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(RegistrationError::Forbidden)
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("only administrators can review registrations")]
    Forbidden,
    #[error("college not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("registration is already {}", .status.label())]
    NotPending { status: RegistrationStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::integrations::NotificationError;
    use crate::workflows::session::Role;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryColleges {
        records: Mutex<HashMap<CollegeId, College>>,
    }

    impl CollegeDirectory for MemoryColleges {
        fn insert(&self, college: College) -> Result<College, RepositoryError> {
            let mut guard = self.records.lock().expect("college mutex poisoned");
            guard.insert(college.id.clone(), college.clone());
            Ok(college)
        }

        fn update(&self, college: College) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("college mutex poisoned");
            guard.insert(college.id.clone(), college);
            Ok(())
        }

        fn fetch(&self, id: &CollegeId) -> Result<Option<College>, RepositoryError> {
            Ok(self.records.lock().expect("college mutex poisoned").get(id).cloned())
        }

        fn find_by_email(&self, email: &str) -> Result<Option<College>, RepositoryError> {
            let guard = self.records.lock().expect("college mutex poisoned");
            Ok(guard.values().find(|college| college.email == email).cloned())
        }

        fn list_by_status(
            &self,
            status: RegistrationStatus,
        ) -> Result<Vec<College>, RepositoryError> {
            let guard = self.records.lock().expect("college mutex poisoned");
            Ok(guard
                .values()
                .filter(|college| college.status == status)
                .cloned()
                .collect())
        }
    }

    struct OfflineMail;

    impl Notifier for OfflineMail {
        fn send(&self, _message: EmailMessage) -> Result<(), NotificationError> {
            Err(NotificationError::Transport("smtp down".to_string()))
        }
    }

    fn admin() -> Principal {
        Principal {
            id: "admin-1".to_string(),
            role: Role::Admin,
            email: "registrar@ipu.ac.in".to_string(),
        }
    }

    fn registration(name: &str, email: &str, programs: &[&str]) -> CollegeRegistration {
        CollegeRegistration {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            address: Some("Sector 16C, Dwarka".to_string()),
            principal_name: None,
            programs_offered: programs.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn service() -> (RegistrationService, Arc<MemoryColleges>) {
        let colleges = Arc::new(MemoryColleges::default());
        let service = RegistrationService::new(colleges.clone(), Arc::new(OfflineMail));
        (service, colleges)
    }

    #[test]
    fn reject_requires_reason() {
        let (service, colleges) = service();
        let college = service
            .register(registration("Trinity Institute", "office@trinity.edu.in", &["BCA"]))
            .expect("registers");

        match service.reject(&admin(), &college.id, "   ") {
            Err(RegistrationError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
        let stored = colleges.fetch(&college.id).unwrap().unwrap();
        assert_eq!(stored.status, RegistrationStatus::Pending);
    }

    #[test]
    fn reject_stores_exact_reason_even_when_mail_fails() {
        let (service, colleges) = service();
        let college = service
            .register(registration("Trinity Institute", "office@trinity.edu.in", &["BCA"]))
            .expect("registers");

        let reason = "Affiliation letter missing (page 2)";
        let rejected = service
            .reject(&admin(), &college.id, reason)
            .expect("rejects");

        assert_eq!(rejected.status, RegistrationStatus::Rejected);
        let stored = colleges.fetch(&college.id).unwrap().unwrap();
        assert_eq!(stored.rejection_reason.as_deref(), Some(reason));
    }

    #[test]
    fn approve_only_from_pending() {
        let (service, _) = service();
        let college = service
            .register(registration("Trinity Institute", "office@trinity.edu.in", &["BCA"]))
            .expect("registers");

        service.approve(&admin(), &college.id).expect("approves");
        match service.approve(&admin(), &college.id) {
            Err(RegistrationError::NotPending {
                status: RegistrationStatus::Approved,
            }) => {}
            other => panic!("expected not pending, got {other:?}"),
        }
    }

    #[test]
    fn college_role_cannot_review() {
        let (service, _) = service();
        let college = service
            .register(registration("Trinity Institute", "office@trinity.edu.in", &["BCA"]))
            .expect("registers");
        let caller = Principal {
            id: college.id.0.clone(),
            role: Role::College,
            email: college.email.clone(),
        };

        assert!(matches!(
            service.approve(&caller, &college.id),
            Err(RegistrationError::Forbidden)
        ));
    }

    #[test]
    fn approved_listing_filters_by_name_and_program() {
        let (service, _) = service();
        let law = service
            .register(registration("Delhi Law Academy", "law@dla.in", &["BALLB", "LLM"]))
            .expect("registers");
        let tech = service
            .register(registration("Trinity Tech", "desk@trinitytech.in", &["BCA", "MCA"]))
            .expect("registers");
        service.approve(&admin(), &law.id).expect("approves");
        service.approve(&admin(), &tech.id).expect("approves");

        let filter = ApprovedCollegeFilter {
            name: None,
            program: Some("llm".to_string()),
        };
        let matches = service.approved(&admin(), &filter).expect("lists");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, law.id);

        let filter = ApprovedCollegeFilter {
            name: Some("trinity".to_string()),
            program: None,
        };
        let matches = service.approved(&admin(), &filter).expect("lists");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, tech.id);
    }

    #[test]
    fn duplicate_email_conflicts() {
        let (service, _) = service();
        service
            .register(registration("Trinity Institute", "office@trinity.edu.in", &[]))
            .expect("registers");

        assert!(matches!(
            service.register(registration("Trinity Again", "OFFICE@trinity.edu.in", &[])),
            Err(RegistrationError::Repository(RepositoryError::Conflict))
        ));
    }
}
