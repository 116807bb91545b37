use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered colleges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollegeId(pub String);

impl std::fmt::Display for CollegeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration lifecycle, independent of any audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

/// Payload a college submits when it first signs up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollegeRegistration {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub principal_name: Option<String>,
    #[serde(default)]
    pub programs_offered: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct College {
    pub id: CollegeId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub principal_name: Option<String>,
    pub programs_offered: Vec<String>,
    pub status: RegistrationStatus,
    pub rejection_reason: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
}

impl College {
    /// Snapshot copied into a new audit.
    pub fn institute_info(&self) -> InstituteInfo {
        InstituteInfo {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            principal_name: self.principal_name.clone(),
        }
    }

    fn offers_program(&self, needle: &str) -> bool {
        self.programs_offered
            .iter()
            .any(|program| program.to_ascii_lowercase().contains(needle))
    }
}

/// Institute details as they stood when the audit was opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstituteInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub principal_name: Option<String>,
}

/// Case-insensitive substring filters for the approved-college listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApprovedCollegeFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
}

impl ApprovedCollegeFilter {
    pub fn matches(&self, college: &College) -> bool {
        let name_ok = match normalized(&self.name) {
            Some(needle) => college.name.to_ascii_lowercase().contains(&needle),
            None => true,
        };
        let program_ok = match normalized(&self.program) {
            Some(needle) => college.offers_program(&needle),
            None => true,
        };
        name_ok && program_ok
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_ascii_lowercase)
}
