//! Derived values. Everything here is a pure function of the section's entered
//! fields; stored derived values are never read back as inputs.

use serde::Serialize;

use super::sections::{
    AcademicPrograms, Accreditation, CoCurricularActivities, Deficiencies, DeficiencyItem,
    DeficiencyStatus, FacultyDevelopment, Feedback, GeneralParameters, GrievanceRedressal,
    Laboratories, Library, LibraryHolding, Placement, ProgramFaculty, ProgramOffering,
    Publications, QualityOfTeachers, StudentDevelopment, TeachersAvailability,
    UniversityExaminations,
};

/// Students per sanctioned teacher post.
pub const STUDENTS_PER_TEACHER: u64 = 20;
pub const DEFAULT_PROGRAMME_DURATION: u32 = 3;
pub const INDIAN_JOURNAL_DIVISOR: f64 = 12.0;
pub const INTERNATIONAL_JOURNAL_DIVISOR: f64 = 3.0;
/// Shown as the ceiling in the form; stored ratios are not clamped.
pub const INTERNATIONAL_JOURNAL_RATIO_CAP: f64 = 10.0;

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole x 100` to two decimals; 0 when `whole` is 0. Not clamped.
pub fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(f64::from(part) / f64::from(whole) * 100.0)
}

pub fn total_intake(first_shift: u32, second_shift: u32) -> u32 {
    first_shift.saturating_add(second_shift)
}

/// Guesses a programme's length in years from its name.
///
/// This is only a default: an explicit duration on the row always wins (see
/// [`programme_duration`]). Names that match nothing fall back to three years.
pub fn infer_programme_duration(programme_name: &str) -> u32 {
    let upper = programme_name.to_ascii_uppercase();
    let compact: String = upper.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.contains("BALLB") || upper.contains("B.A. LL.B") {
        5
    } else if programme_name.contains("M.") || compact.contains("LLM") {
        2
    } else if compact.contains("BCA") || compact.contains("MCA") {
        3
    } else {
        DEFAULT_PROGRAMME_DURATION
    }
}

pub fn programme_duration(programme_name: &str, explicit: Option<u32>) -> u32 {
    match explicit {
        Some(years) if years > 0 => years,
        _ => infer_programme_duration(programme_name),
    }
}

/// `ceil(intake x duration / 20)`.
pub fn required_teachers(intake: u32, duration_years: u32) -> u32 {
    let students = u64::from(intake) * u64::from(duration_years);
    let required = students.div_ceil(STUDENTS_PER_TEACHER);
    u32::try_from(required).unwrap_or(u32::MAX)
}

/// `round(intake x duration / faculty)`, or 0 with no faculty.
pub fn student_teacher_ratio(intake: u32, duration_years: u32, faculty: u32) -> u32 {
    if faculty == 0 {
        return 0;
    }
    let students = f64::from(intake) * f64::from(duration_years);
    (students / f64::from(faculty)).round() as u32
}

/// `1:N` assistants per professor/associate post, `0:0` with no senior posts.
pub fn cadre_ratio(assistant: u32, associate: u32, professors: u32) -> String {
    let senior = u64::from(associate) + u64::from(professors);
    if senior == 0 {
        return "0:0".to_string();
    }
    let juniors = (f64::from(assistant) / senior as f64).round() as u64;
    format!("1:{juniors}")
}

pub fn library_score(titles: u32, volumes: u32) -> u64 {
    u64::from(titles) * u64::from(volumes)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JournalRatios {
    pub indian: f64,
    pub international: f64,
}

impl JournalRatios {
    /// Value for display next to the form field, capped at 10.
    pub fn international_display(&self) -> f64 {
        self.international.min(INTERNATIONAL_JOURNAL_RATIO_CAP)
    }
}

pub fn journal_ratios(indian_journals: u32, international_journals: u32) -> JournalRatios {
    JournalRatios {
        indian: round2(f64::from(indian_journals) / INDIAN_JOURNAL_DIVISOR),
        international: round2(f64::from(international_journals) / INTERNATIONAL_JOURNAL_DIVISOR),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementSummary {
    pub total_placed_and_higher: u32,
    pub placement_percentage: f64,
}

pub fn placement_summary(placed: u32, higher_education: u32, eligible: u32) -> PlacementSummary {
    let total = placed.saturating_add(higher_education);
    PlacementSummary {
        total_placed_and_higher: total,
        placement_percentage: percentage(total, eligible),
    }
}

pub fn completed_deficiencies(items: &[DeficiencyItem]) -> u32 {
    let completed = items
        .iter()
        .filter(|item| item.status == DeficiencyStatus::Completed)
        .count();
    u32::try_from(completed).unwrap_or(u32::MAX)
}

pub fn completion_rate(completed: u32, identified: u32) -> f64 {
    percentage(completed, identified)
}

/// Recomputes a section's derived fields in place. Idempotent.
pub trait Derived {
    fn recompute(&mut self) {}
}

impl Derived for AcademicPrograms {
    fn recompute(&mut self) {
        for program in &mut self.programs {
            program.total_intake =
                total_intake(program.first_shift_intake, program.second_shift_intake);
        }
        self.total_intake = self
            .programs
            .iter()
            .fold(0u32, |sum, program| sum.saturating_add(program.total_intake));
    }
}

impl Derived for TeachersAvailability {
    fn recompute(&mut self) {
        let mut student_years: u64 = 0;
        let mut required_total: u32 = 0;
        for row in &mut self.programs {
            let duration = programme_duration(&row.programme_name, row.duration_years);
            row.required_teachers = required_teachers(row.sanctioned_intake, duration);
            row.student_teacher_ratio =
                student_teacher_ratio(row.sanctioned_intake, duration, row.available_teachers);
            student_years += u64::from(row.sanctioned_intake) * u64::from(duration);
            required_total = required_total.saturating_add(row.required_teachers);
        }

        self.total_faculty = self
            .professors
            .saturating_add(self.associate_professors)
            .saturating_add(self.assistant_professors);
        self.total_required_teachers = required_total;
        self.student_teacher_ratio = if self.total_faculty == 0 {
            0
        } else {
            (student_years as f64 / f64::from(self.total_faculty)).round() as u32
        };
        self.cadre_ratio = cadre_ratio(
            self.assistant_professors,
            self.associate_professors,
            self.professors,
        );
    }
}

impl Derived for QualityOfTeachers {
    fn recompute(&mut self) {
        self.phd_percentage = percentage(self.phd_holders, self.total_faculty);
    }
}

impl Derived for UniversityExaminations {
    fn recompute(&mut self) {
        for result in &mut self.results {
            result.pass_percentage = percentage(result.passed, result.appeared);
        }
    }
}

impl Derived for Library {
    fn recompute(&mut self) {
        for holding in &mut self.programs {
            holding.score = library_score(holding.titles, holding.volumes);
        }
        self.total_score = self
            .programs
            .iter()
            .fold(0u64, |sum, holding| sum.saturating_add(holding.score));
        let ratios = journal_ratios(self.indian_journals, self.international_journals);
        self.indian_journal_ratio = ratios.indian;
        self.international_journal_ratio = ratios.international;
    }
}

impl Derived for Laboratories {
    fn recompute(&mut self) {
        self.total_computers = self
            .labs
            .iter()
            .fold(0u32, |sum, lab| sum.saturating_add(lab.computers));
    }
}

impl Derived for CoCurricularActivities {
    fn recompute(&mut self) {
        self.total_participants = self
            .events
            .iter()
            .fold(0u32, |sum, event| sum.saturating_add(event.participants));
    }
}

impl Derived for Placement {
    fn recompute(&mut self) {
        let summary =
            placement_summary(self.placed, self.higher_education, self.eligible_and_registered);
        self.total_placed_and_higher = summary.total_placed_and_higher;
        self.placement_percentage = summary.placement_percentage;
    }
}

impl Derived for Deficiencies {
    fn recompute(&mut self) {
        self.deficiencies_completed = completed_deficiencies(&self.items);
        // The declared count is left as entered; the rate follows the list.
        let identified = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        self.completion_rate = completion_rate(self.deficiencies_completed, identified);
    }
}

impl Derived for Accreditation {}
impl Derived for FacultyDevelopment {}
impl Derived for GrievanceRedressal {}
impl Derived for Publications {}
impl Derived for StudentDevelopment {}
impl Derived for GeneralParameters {}
impl Derived for Feedback {}

/// A per-programme row that mirrors the academic programme list.
pub trait ProgramRow: Clone {
    fn programme_name(&self) -> &str;
    fn seeded(program: &ProgramOffering) -> Self;
    /// Pulls values owned by the programme list into an existing row.
    fn refresh(&mut self, _program: &ProgramOffering) {}
}

impl ProgramRow for ProgramFaculty {
    fn programme_name(&self) -> &str {
        &self.programme_name
    }

    fn seeded(program: &ProgramOffering) -> Self {
        Self {
            programme_name: program.programme_name.trim().to_string(),
            sanctioned_intake: program.total_intake,
            duration_years: program.duration_years,
            ..Default::default()
        }
    }

    fn refresh(&mut self, program: &ProgramOffering) {
        self.sanctioned_intake = program.total_intake;
        if self.duration_years.is_none() {
            self.duration_years = program.duration_years;
        }
    }
}

impl ProgramRow for LibraryHolding {
    fn programme_name(&self) -> &str {
        &self.programme_name
    }

    fn seeded(program: &ProgramOffering) -> Self {
        Self {
            programme_name: program.programme_name.trim().to_string(),
            ..Default::default()
        }
    }
}

/// Rebuilds `rows` in programme-list order: rows for removed programmes are
/// dropped, new programmes get a seeded row, and entered values are kept.
/// `programs` must already be recomputed.
pub fn reconcile_rows<T: ProgramRow>(programs: &[ProgramOffering], rows: &[T]) -> Vec<T> {
    programs
        .iter()
        .map(|program| {
            let name = program.programme_name.trim();
            match rows
                .iter()
                .find(|row| row.programme_name().trim().eq_ignore_ascii_case(name))
            {
                Some(existing) => {
                    let mut row = existing.clone();
                    row.refresh(program);
                    row
                }
                None => T::seeded(program),
            }
        })
        .collect()
}
