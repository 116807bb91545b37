use std::collections::HashSet;

use serde::Serialize;

use super::super::calculator::{journal_ratios, INTERNATIONAL_JOURNAL_RATIO_CAP};
use super::{
    AcademicPrograms, Deficiencies, GrievanceRedressal, Laboratories, Library, Placement,
    QualityOfTeachers, SectionData, TeachersAvailability, UniversityExaminations,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Blocks the save.
    Error,
    /// Reported back with the saved section.
    Warning,
}

/// Field-scoped finding so the form can render it inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: IssueSeverity,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: IssueSeverity::Error,
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: IssueSeverity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl SectionData {
    /// Runs the section's rules. Expects derived fields to be current.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        match self {
            SectionData::AcademicPrograms(section) => academic_programs(section, &mut issues),
            SectionData::TeachersAvailability(section) => teachers(section, &mut issues),
            SectionData::QualityOfTeachers(section) => teacher_quality(section, &mut issues),
            SectionData::GrievanceRedressal(section) => grievances(section, &mut issues),
            SectionData::UniversityExaminations(section) => examinations(section, &mut issues),
            SectionData::Library(section) => library(section, &mut issues),
            SectionData::Laboratories(section) => laboratories(section, &mut issues),
            SectionData::Placement(section) => placement(section, &mut issues),
            SectionData::Deficiencies(section) => deficiencies(section, &mut issues),
            _ => {}
        }
        issues
    }
}

fn programme_names<'a>(
    field: &str,
    names: impl Iterator<Item = &'a str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut seen = HashSet::new();
    for (index, name) in names.enumerate() {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            issues.push(ValidationIssue::error(
                format!("{field}[{index}].programmeName"),
                "programme name is required",
            ));
        } else if !seen.insert(trimmed.to_ascii_uppercase()) {
            issues.push(ValidationIssue::error(
                format!("{field}[{index}].programmeName"),
                format!("programme '{trimmed}' is listed more than once"),
            ));
        }
    }
}

fn academic_programs(section: &AcademicPrograms, issues: &mut Vec<ValidationIssue>) {
    programme_names(
        "programs",
        section.programs.iter().map(|p| p.programme_name.as_str()),
        issues,
    );
    for (index, program) in section.programs.iter().enumerate() {
        if program.duration_years == Some(0) {
            issues.push(ValidationIssue::error(
                format!("programs[{index}].durationYears"),
                "duration must be at least one year",
            ));
        }
    }
}

fn teachers(section: &TeachersAvailability, issues: &mut Vec<ValidationIssue>) {
    programme_names(
        "programs",
        section.programs.iter().map(|p| p.programme_name.as_str()),
        issues,
    );
    for (index, row) in section.programs.iter().enumerate() {
        if row.available_teachers < row.required_teachers {
            issues.push(ValidationIssue::warning(
                format!("programs[{index}].availableTeachers"),
                format!(
                    "{} teachers available against {} required",
                    row.available_teachers, row.required_teachers
                ),
            ));
        }
    }
}

fn teacher_quality(section: &QualityOfTeachers, issues: &mut Vec<ValidationIssue>) {
    for (field, value) in [
        ("phdHolders", section.phd_holders),
        ("netSetQualified", section.net_set_qualified),
        (
            "facultyWithIndustryExperience",
            section.faculty_with_industry_experience,
        ),
    ] {
        if value > section.total_faculty {
            issues.push(ValidationIssue::error(
                field,
                format!("cannot exceed total faculty ({})", section.total_faculty),
            ));
        }
    }
    if section.average_experience_years < 0.0 {
        issues.push(ValidationIssue::error(
            "averageExperienceYears",
            "experience cannot be negative",
        ));
    }
}

fn grievances(section: &GrievanceRedressal, issues: &mut Vec<ValidationIssue>) {
    if section.grievances_resolved > section.grievances_received {
        issues.push(ValidationIssue::error(
            "grievancesResolved",
            "cannot resolve more grievances than were received",
        ));
    }
    if section.sgrc_constituted && section.sgrc_members == 0 {
        issues.push(ValidationIssue::error(
            "sgrcMembers",
            "an SGRC that has been constituted needs at least one member",
        ));
    }
}

fn examinations(section: &UniversityExaminations, issues: &mut Vec<ValidationIssue>) {
    programme_names(
        "results",
        section.results.iter().map(|r| r.programme_name.as_str()),
        issues,
    );
    for (index, result) in section.results.iter().enumerate() {
        if result.passed > result.appeared {
            issues.push(ValidationIssue::error(
                format!("results[{index}].passed"),
                "passed cannot exceed appeared",
            ));
        }
    }
}

fn library(section: &Library, issues: &mut Vec<ValidationIssue>) {
    programme_names(
        "programs",
        section.programs.iter().map(|p| p.programme_name.as_str()),
        issues,
    );
    for (index, holding) in section.programs.iter().enumerate() {
        if holding.volumes < holding.titles {
            issues.push(ValidationIssue::error(
                format!("programs[{index}].volumes"),
                "volumes cannot be fewer than titles",
            ));
        }
    }
    let ratios = journal_ratios(section.indian_journals, section.international_journals);
    if ratios.international > INTERNATIONAL_JOURNAL_RATIO_CAP {
        issues.push(ValidationIssue::warning(
            "internationalJournalRatio",
            format!(
                "ratio {:.2} exceeds the advisory cap of {INTERNATIONAL_JOURNAL_RATIO_CAP}",
                ratios.international
            ),
        ));
    }
}

fn laboratories(section: &Laboratories, issues: &mut Vec<ValidationIssue>) {
    for (index, lab) in section.labs.iter().enumerate() {
        if lab.name.trim().is_empty() {
            issues.push(ValidationIssue::error(
                format!("labs[{index}].name"),
                "laboratory name is required",
            ));
        }
        if lab.area_sq_m < 0.0 {
            issues.push(ValidationIssue::error(
                format!("labs[{index}].areaSqM"),
                "area cannot be negative",
            ));
        }
    }
}

fn placement(section: &Placement, issues: &mut Vec<ValidationIssue>) {
    if section.total_placed_and_higher > section.eligible_and_registered {
        issues.push(ValidationIssue::warning(
            "placementPercentage",
            format!(
                "placed plus higher education ({}) exceeds eligible students ({})",
                section.total_placed_and_higher, section.eligible_and_registered
            ),
        ));
    }
    if section.median_package_lpa > section.highest_package_lpa {
        issues.push(ValidationIssue::error(
            "medianPackageLpa",
            "median package cannot exceed the highest package",
        ));
    }
}

fn deficiencies(section: &Deficiencies, issues: &mut Vec<ValidationIssue>) {
    for (index, item) in section.items.iter().enumerate() {
        if item.description.trim().is_empty() {
            issues.push(ValidationIssue::error(
                format!("items[{index}].description"),
                "describe the deficiency",
            ));
        }
    }
    let listed = section.items.len();
    if section.deficiencies_identified as usize != listed {
        issues.push(ValidationIssue::warning(
            "deficienciesIdentified",
            format!(
                "{} deficiencies declared but {listed} listed",
                section.deficiencies_identified
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DeficiencyItem, DeficiencyStatus, ProgramOffering};
    use super::*;

    #[test]
    fn duplicate_and_blank_programme_names_are_errors() {
        let section = AcademicPrograms {
            programs: vec![
                ProgramOffering {
                    programme_name: "BCA".to_string(),
                    ..Default::default()
                },
                ProgramOffering {
                    programme_name: " bca ".to_string(),
                    ..Default::default()
                },
                ProgramOffering::default(),
            ],
            ..Default::default()
        };

        let issues = SectionData::AcademicPrograms(section).validate();
        let fields: Vec<_> = issues.iter().map(|issue| issue.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["programs[1].programmeName", "programs[2].programmeName"]
        );
        assert!(issues.iter().all(ValidationIssue::is_error));
    }

    #[test]
    fn deficiency_count_mismatch_is_only_a_warning() {
        let section = Deficiencies {
            deficiencies_identified: 3,
            items: vec![DeficiencyItem {
                description: "Ramp at block B".to_string(),
                action_taken: None,
                status: DeficiencyStatus::Completed,
            }],
            ..Default::default()
        };

        let issues = SectionData::Deficiencies(section).validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, IssueSeverity::Warning);
        assert_eq!(issues[0].field, "deficienciesIdentified");
    }

    #[test]
    fn resolved_grievances_cannot_exceed_received() {
        let section = GrievanceRedressal {
            sgrc_constituted: true,
            sgrc_members: 5,
            grievances_received: 2,
            grievances_resolved: 3,
            ..Default::default()
        };

        let issues = SectionData::GrievanceRedressal(section).validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "grievancesResolved");
        assert!(issues[0].is_error());
    }

    #[test]
    fn international_ratio_above_cap_warns_without_blocking() {
        let section = Library {
            international_journals: 45,
            ..Default::default()
        };

        let issues = SectionData::Library(section).validate();
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }
}
