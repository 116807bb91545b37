use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sections::{AuditSections, SectionKey};
use super::status::AuditStatus;
use crate::workflows::registration::{CollegeId, InstituteInfo};

/// Last wizard step; the review-and-submit page after the sixteen sections.
pub const FINAL_STEP: u8 = 17;

/// Identifier wrapper for audits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuditId(pub String);

impl fmt::Display for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Academic session label in `YYYY-YY` form, e.g. `2024-25`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear(String);

impl AcademicYear {
    pub fn parse(raw: &str) -> Result<Self, InvalidAcademicYear> {
        let bytes = raw.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);

        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidAcademicYear(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = InvalidAcademicYear;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AcademicYear> for String {
    fn from(value: AcademicYear) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("academic year '{0}' must match YYYY-YY")]
pub struct InvalidAcademicYear(pub String);

/// Consolidated PDF that replaces the per-section forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectPdfUpload {
    pub uploaded: bool,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
}

/// Storage handle behind a URL in a section's `documents` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFile {
    pub section: SectionKey,
    pub url: String,
    pub storage_id: String,
}

/// "save" keeps the wizard where it is; "saveAndContinue" moves it one step on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveIntent {
    #[default]
    Save,
    SaveAndContinue,
}

/// One audit per (college, academic year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub id: AuditId,
    pub college_id: CollegeId,
    pub academic_year: AcademicYear,
    pub institute: InstituteInfo,
    pub status: AuditStatus,
    pub current_step: u8,
    pub sections: AuditSections,
    #[serde(rename = "directPDFUpload")]
    pub direct_pdf_upload: DirectPdfUpload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub section_files: Vec<SectionFile>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub review_comments: Option<String>,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Audit {
    pub fn new(
        id: AuditId,
        college_id: CollegeId,
        academic_year: AcademicYear,
        institute: InstituteInfo,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            college_id,
            academic_year,
            institute,
            status: AuditStatus::Draft,
            current_step: 1,
            sections: AuditSections::default(),
            direct_pdf_upload: DirectPdfUpload::default(),
            section_files: Vec::new(),
            submitted_at: None,
            submitted_by: None,
            reviewed_at: None,
            reviewed_by: None,
            review_comments: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the wizard pointer one step forward, never past the final step.
    pub fn advance_step(&mut self) {
        self.current_step = clamp_step(self.current_step.saturating_add(1));
    }

    /// Forgets stored files whose URL `key` no longer lists and hands back
    /// their storage ids.
    pub(crate) fn detach_unlisted_files(&mut self, key: SectionKey) -> Vec<String> {
        let listed = self
            .sections
            .get(key)
            .map(|data| data.documents().to_vec())
            .unwrap_or_default();
        let (kept, dropped): (Vec<SectionFile>, Vec<SectionFile>) =
            std::mem::take(&mut self.section_files)
                .into_iter()
                .partition(|file| file.section != key || listed.contains(&file.url));
        self.section_files = kept;
        dropped.into_iter().map(|file| file.storage_id).collect()
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    pub fn summary(&self) -> AuditSummaryView {
        AuditSummaryView {
            id: self.id.clone(),
            academic_year: self.academic_year.clone(),
            status: self.status.label(),
            current_step: self.current_step,
            submitted_at: self.submitted_at,
            pdf_uploaded: self.direct_pdf_upload.uploaded,
        }
    }
}

pub fn clamp_step(step: u8) -> u8 {
    step.clamp(1, FINAL_STEP)
}

/// Compact listing row for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummaryView {
    pub id: AuditId,
    pub academic_year: AcademicYear,
    pub status: &'static str,
    pub current_step: u8,
    pub submitted_at: Option<DateTime<Utc>>,
    pub pdf_uploaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn academic_year_requires_four_digits_dash_two_digits() {
        assert!(AcademicYear::parse("2024-25").is_ok());
        for raw in ["2024-2025", "24-25", "2024/25", "2024-2a", "", " 2024-25"] {
            assert!(AcademicYear::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn advance_step_clamps_at_final_step() {
        let mut audit = Audit::new(
            AuditId("audit-1".to_string()),
            CollegeId("college-1".to_string()),
            AcademicYear::parse("2024-25").unwrap(),
            InstituteInfo::default(),
            Utc::now(),
        );
        audit.current_step = 16;
        audit.advance_step();
        assert_eq!(audit.current_step, FINAL_STEP);
        audit.advance_step();
        assert_eq!(audit.current_step, FINAL_STEP);
    }

    #[test]
    fn clamp_step_lifts_zero_to_first_step() {
        assert_eq!(clamp_step(0), 1);
        assert_eq!(clamp_step(40), FINAL_STEP);
    }
}
