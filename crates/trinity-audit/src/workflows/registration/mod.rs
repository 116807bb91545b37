//! College registration intake and the admin review queue.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    ApprovedCollegeFilter, College, CollegeId, CollegeRegistration, InstituteInfo,
    RegistrationStatus,
};
pub use repository::CollegeDirectory;
pub use router::{registration_router, RegistrationApiState};
pub use service::{RegistrationError, RegistrationService};
