use serde::Serialize;

use super::domain::Audit;
use super::sections::SectionKey;

/// Sections that must be filled before the form path can be submitted.
pub const CORE_CRITICAL_SECTIONS: [SectionKey; 3] = [
    SectionKey::AcademicPrograms,
    SectionKey::Accreditation,
    SectionKey::TeachersAvailability,
];

/// The stricter list used by the review summary page.
pub const SUMMARY_CRITICAL_SECTIONS: [SectionKey; 9] = [
    SectionKey::AcademicPrograms,
    SectionKey::Accreditation,
    SectionKey::TeachersAvailability,
    SectionKey::QualityOfTeachers,
    SectionKey::GrievanceRedressal,
    SectionKey::Library,
    SectionKey::Laboratories,
    SectionKey::Placement,
    SectionKey::GeneralParameters,
];

/// Which critical-section list the submission gate enforces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessPolicy {
    #[default]
    Core,
    Strict,
}

impl CompletenessPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "core" => Some(Self::Core),
            "strict" | "summary" => Some(Self::Strict),
            _ => None,
        }
    }

    pub fn critical_sections(self) -> &'static [SectionKey] {
        match self {
            CompletenessPolicy::Core => &CORE_CRITICAL_SECTIONS,
            CompletenessPolicy::Strict => &SUMMARY_CRITICAL_SECTIONS,
        }
    }
}

/// Critical sections that are still blank. A direct PDF upload satisfies the
/// gate on its own.
pub fn missing_sections(audit: &Audit, policy: CompletenessPolicy) -> Vec<SectionKey> {
    if audit.direct_pdf_upload.uploaded {
        return Vec::new();
    }
    missing_from(audit, policy.critical_sections())
}

fn missing_from(audit: &Audit, required: &[SectionKey]) -> Vec<SectionKey> {
    required
        .iter()
        .copied()
        .filter(|key| !audit.sections.is_populated(*key))
        .collect()
}

pub fn missing_labels(missing: &[SectionKey]) -> Vec<&'static str> {
    missing.iter().map(|key| key.label()).collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProgress {
    pub key: SectionKey,
    pub label: &'static str,
    pub step: u8,
    pub completed: bool,
    pub documents: usize,
}

/// Overview for the wizard's review page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub status: &'static str,
    pub current_step: u8,
    pub pdf_uploaded: bool,
    pub completed_sections: usize,
    pub total_sections: usize,
    pub sections: Vec<SectionProgress>,
    pub missing_core: Vec<&'static str>,
    pub missing_summary: Vec<&'static str>,
    pub ready_to_submit: bool,
}

pub fn completion_summary(audit: &Audit, policy: CompletenessPolicy) -> CompletionSummary {
    let sections: Vec<SectionProgress> = SectionKey::ALL
        .iter()
        .map(|key| SectionProgress {
            key: *key,
            label: key.label(),
            step: key.step(),
            completed: audit.sections.is_populated(*key),
            documents: audit
                .sections
                .get(*key)
                .map(|data| data.documents().len())
                .unwrap_or(0),
        })
        .collect();

    let completed_sections = sections.iter().filter(|section| section.completed).count();
    let missing_core = missing_labels(&missing_from(audit, &CORE_CRITICAL_SECTIONS));
    let missing_summary = missing_labels(&missing_from(audit, &SUMMARY_CRITICAL_SECTIONS));

    CompletionSummary {
        status: audit.status.label(),
        current_step: audit.current_step,
        pdf_uploaded: audit.direct_pdf_upload.uploaded,
        completed_sections,
        total_sections: SectionKey::ALL.len(),
        sections,
        missing_core,
        missing_summary,
        ready_to_submit: audit.status.is_editable() && missing_sections(audit, policy).is_empty(),
    }
}
