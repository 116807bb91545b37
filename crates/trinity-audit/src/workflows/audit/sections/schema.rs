//! Field layout of the sixteen audit sections. Fields marked "derived" are
//! recomputed by the calculator on every save and any client-sent value is
//! overwritten.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcademicPrograms {
    pub programs: Vec<ProgramOffering>,
    /// Derived: sum of programme intakes.
    pub total_intake: u32,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgramOffering {
    pub programme_name: String,
    pub first_shift_intake: u32,
    pub second_shift_intake: u32,
    /// Derived: first + second shift.
    pub total_intake: u32,
    /// Overrides the name-based duration heuristic once entered.
    pub duration_years: Option<u32>,
    pub year_of_start: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Accreditation {
    pub naac_accredited: bool,
    pub naac_grade: Option<String>,
    pub naac_cgpa: Option<f64>,
    pub naac_valid_until: Option<NaiveDate>,
    pub nirf_participated: bool,
    pub nirf_rank: Option<u32>,
    pub nba_accredited_programs: Vec<String>,
    pub iso_certified: bool,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeachersAvailability {
    pub programs: Vec<ProgramFaculty>,
    pub professors: u32,
    pub associate_professors: u32,
    pub assistant_professors: u32,
    /// Derived: professors + associates + assistants.
    pub total_faculty: u32,
    /// Derived: sum of per-programme requirements.
    pub total_required_teachers: u32,
    /// Derived: institution-wide student-teacher ratio.
    pub student_teacher_ratio: u32,
    /// Derived: `1:N` assistants per senior post.
    pub cadre_ratio: String,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgramFaculty {
    pub programme_name: String,
    /// Seeded from the programme's total intake.
    pub sanctioned_intake: u32,
    pub duration_years: Option<u32>,
    pub available_teachers: u32,
    /// Derived.
    pub required_teachers: u32,
    /// Derived.
    pub student_teacher_ratio: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityOfTeachers {
    pub total_faculty: u32,
    pub phd_holders: u32,
    pub net_set_qualified: u32,
    pub faculty_with_industry_experience: u32,
    pub average_experience_years: f64,
    /// Derived.
    pub phd_percentage: f64,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacultyDevelopment {
    pub programmes_organised: u32,
    pub programmes_attended: u32,
    pub faculty_participants: u32,
    pub workshops: u32,
    pub seminars: u32,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrievanceRedressal {
    pub sgrc_constituted: bool,
    pub sgrc_members: u32,
    pub ombudsperson_appointed: bool,
    pub anti_ragging_committee: bool,
    pub internal_complaints_committee: bool,
    pub grievances_received: u32,
    pub grievances_resolved: u32,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UniversityExaminations {
    pub results: Vec<ExaminationResult>,
    pub malpractice_cases: u32,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExaminationResult {
    pub programme_name: String,
    pub appeared: u32,
    pub passed: u32,
    /// Derived.
    pub pass_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Library {
    pub programs: Vec<LibraryHolding>,
    /// Derived: sum of programme scores.
    pub total_score: u64,
    pub indian_journals: u32,
    pub international_journals: u32,
    /// Derived: Indian journals / 12.
    pub indian_journal_ratio: f64,
    /// Derived: international journals / 3. The cap of 10 is advisory only.
    pub international_journal_ratio: f64,
    pub e_resources: u32,
    pub digital_library: bool,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryHolding {
    pub programme_name: String,
    pub titles: u32,
    pub volumes: u32,
    /// Derived: titles x volumes.
    pub score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Laboratories {
    pub labs: Vec<Laboratory>,
    /// Derived.
    pub total_computers: u32,
    pub internet_bandwidth_mbps: u32,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Laboratory {
    pub name: String,
    pub programme_name: Option<String>,
    pub computers: u32,
    pub area_sq_m: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoCurricularActivities {
    pub events: Vec<ActivityEvent>,
    /// Derived.
    pub total_participants: u32,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityEvent {
    pub title: String,
    pub category: Option<String>,
    pub held_on: Option<NaiveDate>,
    pub participants: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Publications {
    pub journal_papers: u32,
    pub conference_papers: u32,
    pub books_published: u32,
    pub book_chapters: u32,
    pub patents_filed: u32,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentDevelopment {
    pub scholarships_awarded: u32,
    pub skill_development_programmes: u32,
    pub mentoring_programme: bool,
    pub remedial_classes: bool,
    pub alumni_association: bool,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Placement {
    pub eligible_and_registered: u32,
    pub placed: u32,
    pub higher_education: u32,
    /// Derived: placed + higher education.
    pub total_placed_and_higher: u32,
    /// Derived: total / eligible x 100, two decimals, not clamped.
    pub placement_percentage: f64,
    pub recruiters_visited: u32,
    pub highest_package_lpa: f64,
    pub median_package_lpa: f64,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralParameters {
    pub campus_area_acres: f64,
    pub built_up_area_sq_m: f64,
    pub classrooms: u32,
    pub seminar_halls: u32,
    pub wifi_enabled: bool,
    pub barrier_free_access: bool,
    pub medical_facility: bool,
    pub canteen: bool,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feedback {
    pub students_collected: bool,
    pub teachers_collected: bool,
    pub employers_collected: bool,
    pub alumni_collected: bool,
    pub parents_collected: bool,
    pub analysis_published: bool,
    pub action_taken_report: bool,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deficiencies {
    /// Declared by the college and kept as entered. The completion rate uses
    /// the length of `items` as the identified count; a declared figure that
    /// differs only raises a validation warning.
    pub deficiencies_identified: u32,
    pub items: Vec<DeficiencyItem>,
    /// Derived: items marked Completed.
    pub deficiencies_completed: u32,
    /// Derived: completed items over listed items, as a percentage.
    pub completion_rate: f64,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeficiencyItem {
    pub description: String,
    pub action_taken: Option<String>,
    pub status: DeficiencyStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeficiencyStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}
