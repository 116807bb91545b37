//! The sixteen audit sections as one shared enumeration. The persistence
//! service, the submission gate, and the HTTP layer all key off [`SectionKey`].

mod schema;
mod validation;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

pub use schema::*;
pub use validation::{IssueSeverity, ValidationIssue};

use super::calculator::Derived;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    AcademicPrograms,
    Accreditation,
    TeachersAvailability,
    QualityOfTeachers,
    FacultyDevelopment,
    GrievanceRedressal,
    UniversityExaminations,
    Library,
    Laboratories,
    CoCurricularActivities,
    Publications,
    StudentDevelopment,
    Placement,
    GeneralParameters,
    Feedback,
    Deficiencies,
}

impl SectionKey {
    pub const ALL: [SectionKey; 16] = [
        SectionKey::AcademicPrograms,
        SectionKey::Accreditation,
        SectionKey::TeachersAvailability,
        SectionKey::QualityOfTeachers,
        SectionKey::FacultyDevelopment,
        SectionKey::GrievanceRedressal,
        SectionKey::UniversityExaminations,
        SectionKey::Library,
        SectionKey::Laboratories,
        SectionKey::CoCurricularActivities,
        SectionKey::Publications,
        SectionKey::StudentDevelopment,
        SectionKey::Placement,
        SectionKey::GeneralParameters,
        SectionKey::Feedback,
        SectionKey::Deficiencies,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SectionKey::AcademicPrograms => "academicPrograms",
            SectionKey::Accreditation => "accreditation",
            SectionKey::TeachersAvailability => "teachersAvailability",
            SectionKey::QualityOfTeachers => "qualityOfTeachers",
            SectionKey::FacultyDevelopment => "facultyDevelopment",
            SectionKey::GrievanceRedressal => "grievanceRedressal",
            SectionKey::UniversityExaminations => "universityExaminations",
            SectionKey::Library => "library",
            SectionKey::Laboratories => "laboratories",
            SectionKey::CoCurricularActivities => "coCurricularActivities",
            SectionKey::Publications => "publications",
            SectionKey::StudentDevelopment => "studentDevelopment",
            SectionKey::Placement => "placement",
            SectionKey::GeneralParameters => "generalParameters",
            SectionKey::Feedback => "feedback",
            SectionKey::Deficiencies => "deficiencies",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SectionKey::AcademicPrograms => "Academic Programs",
            SectionKey::Accreditation => "Accreditation",
            SectionKey::TeachersAvailability => "Teachers Availability",
            SectionKey::QualityOfTeachers => "Quality of Teachers",
            SectionKey::FacultyDevelopment => "Faculty Development",
            SectionKey::GrievanceRedressal => "Grievance Redressal (SGRC)",
            SectionKey::UniversityExaminations => "University Examinations",
            SectionKey::Library => "Library",
            SectionKey::Laboratories => "Laboratories",
            SectionKey::CoCurricularActivities => "Co-Curricular Activities",
            SectionKey::Publications => "Publications",
            SectionKey::StudentDevelopment => "Student Development",
            SectionKey::Placement => "Placement",
            SectionKey::GeneralParameters => "General Parameters",
            SectionKey::Feedback => "Feedback",
            SectionKey::Deficiencies => "Deficiencies",
        }
    }

    /// Wizard step that renders this section (1-16; step 17 is review).
    pub fn step(self) -> u8 {
        let index = SectionKey::ALL
            .iter()
            .position(|key| *key == self)
            .unwrap_or_default();
        index as u8 + 1
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = UnknownSection;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SectionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| UnknownSection(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audit section '{0}'")]
pub struct UnknownSection(pub String);

/// Behaviour every section body shares.
pub trait SectionForm: Derived + Default + PartialEq + Clone {
    fn documents(&self) -> &[String];
    fn documents_mut(&mut self) -> &mut Vec<String>;
}

macro_rules! section_forms {
    ($($ty:ident),* $(,)?) => {
        $(
            impl SectionForm for $ty {
                fn documents(&self) -> &[String] {
                    &self.documents
                }

                fn documents_mut(&mut self) -> &mut Vec<String> {
                    &mut self.documents
                }
            }
        )*
    };
}

section_forms!(
    AcademicPrograms,
    Accreditation,
    TeachersAvailability,
    QualityOfTeachers,
    FacultyDevelopment,
    GrievanceRedressal,
    UniversityExaminations,
    Library,
    Laboratories,
    CoCurricularActivities,
    Publications,
    StudentDevelopment,
    Placement,
    GeneralParameters,
    Feedback,
    Deficiencies,
);

/// Tagged union of section bodies; the tag is the [`SectionKey`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionData {
    AcademicPrograms(AcademicPrograms),
    Accreditation(Accreditation),
    TeachersAvailability(TeachersAvailability),
    QualityOfTeachers(QualityOfTeachers),
    FacultyDevelopment(FacultyDevelopment),
    GrievanceRedressal(GrievanceRedressal),
    UniversityExaminations(UniversityExaminations),
    Library(Library),
    Laboratories(Laboratories),
    CoCurricularActivities(CoCurricularActivities),
    Publications(Publications),
    StudentDevelopment(StudentDevelopment),
    Placement(Placement),
    GeneralParameters(GeneralParameters),
    Feedback(Feedback),
    Deficiencies(Deficiencies),
}

macro_rules! with_form {
    ($data:expr, $form:ident => $body:expr) => {
        match $data {
            SectionData::AcademicPrograms($form) => $body,
            SectionData::Accreditation($form) => $body,
            SectionData::TeachersAvailability($form) => $body,
            SectionData::QualityOfTeachers($form) => $body,
            SectionData::FacultyDevelopment($form) => $body,
            SectionData::GrievanceRedressal($form) => $body,
            SectionData::UniversityExaminations($form) => $body,
            SectionData::Library($form) => $body,
            SectionData::Laboratories($form) => $body,
            SectionData::CoCurricularActivities($form) => $body,
            SectionData::Publications($form) => $body,
            SectionData::StudentDevelopment($form) => $body,
            SectionData::Placement($form) => $body,
            SectionData::GeneralParameters($form) => $body,
            SectionData::Feedback($form) => $body,
            SectionData::Deficiencies($form) => $body,
        }
    };
}

impl SectionData {
    pub fn key(&self) -> SectionKey {
        match self {
            SectionData::AcademicPrograms(_) => SectionKey::AcademicPrograms,
            SectionData::Accreditation(_) => SectionKey::Accreditation,
            SectionData::TeachersAvailability(_) => SectionKey::TeachersAvailability,
            SectionData::QualityOfTeachers(_) => SectionKey::QualityOfTeachers,
            SectionData::FacultyDevelopment(_) => SectionKey::FacultyDevelopment,
            SectionData::GrievanceRedressal(_) => SectionKey::GrievanceRedressal,
            SectionData::UniversityExaminations(_) => SectionKey::UniversityExaminations,
            SectionData::Library(_) => SectionKey::Library,
            SectionData::Laboratories(_) => SectionKey::Laboratories,
            SectionData::CoCurricularActivities(_) => SectionKey::CoCurricularActivities,
            SectionData::Publications(_) => SectionKey::Publications,
            SectionData::StudentDevelopment(_) => SectionKey::StudentDevelopment,
            SectionData::Placement(_) => SectionKey::Placement,
            SectionData::GeneralParameters(_) => SectionKey::GeneralParameters,
            SectionData::Feedback(_) => SectionKey::Feedback,
            SectionData::Deficiencies(_) => SectionKey::Deficiencies,
        }
    }

    /// Decodes a raw JSON body as the section named by `key`.
    pub fn parse(key: SectionKey, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        use serde_json::from_value;

        Ok(match key {
            SectionKey::AcademicPrograms => SectionData::AcademicPrograms(from_value(value)?),
            SectionKey::Accreditation => SectionData::Accreditation(from_value(value)?),
            SectionKey::TeachersAvailability => {
                SectionData::TeachersAvailability(from_value(value)?)
            }
            SectionKey::QualityOfTeachers => SectionData::QualityOfTeachers(from_value(value)?),
            SectionKey::FacultyDevelopment => SectionData::FacultyDevelopment(from_value(value)?),
            SectionKey::GrievanceRedressal => SectionData::GrievanceRedressal(from_value(value)?),
            SectionKey::UniversityExaminations => {
                SectionData::UniversityExaminations(from_value(value)?)
            }
            SectionKey::Library => SectionData::Library(from_value(value)?),
            SectionKey::Laboratories => SectionData::Laboratories(from_value(value)?),
            SectionKey::CoCurricularActivities => {
                SectionData::CoCurricularActivities(from_value(value)?)
            }
            SectionKey::Publications => SectionData::Publications(from_value(value)?),
            SectionKey::StudentDevelopment => SectionData::StudentDevelopment(from_value(value)?),
            SectionKey::Placement => SectionData::Placement(from_value(value)?),
            SectionKey::GeneralParameters => SectionData::GeneralParameters(from_value(value)?),
            SectionKey::Feedback => SectionData::Feedback(from_value(value)?),
            SectionKey::Deficiencies => SectionData::Deficiencies(from_value(value)?),
        })
    }

    /// An untouched body for `key`, used when a document is attached first.
    pub fn blank(key: SectionKey) -> Self {
        match key {
            SectionKey::AcademicPrograms => SectionData::AcademicPrograms(Default::default()),
            SectionKey::Accreditation => SectionData::Accreditation(Default::default()),
            SectionKey::TeachersAvailability => {
                SectionData::TeachersAvailability(Default::default())
            }
            SectionKey::QualityOfTeachers => SectionData::QualityOfTeachers(Default::default()),
            SectionKey::FacultyDevelopment => SectionData::FacultyDevelopment(Default::default()),
            SectionKey::GrievanceRedressal => SectionData::GrievanceRedressal(Default::default()),
            SectionKey::UniversityExaminations => {
                SectionData::UniversityExaminations(Default::default())
            }
            SectionKey::Library => SectionData::Library(Default::default()),
            SectionKey::Laboratories => SectionData::Laboratories(Default::default()),
            SectionKey::CoCurricularActivities => {
                SectionData::CoCurricularActivities(Default::default())
            }
            SectionKey::Publications => SectionData::Publications(Default::default()),
            SectionKey::StudentDevelopment => SectionData::StudentDevelopment(Default::default()),
            SectionKey::Placement => SectionData::Placement(Default::default()),
            SectionKey::GeneralParameters => SectionData::GeneralParameters(Default::default()),
            SectionKey::Feedback => SectionData::Feedback(Default::default()),
            SectionKey::Deficiencies => SectionData::Deficiencies(Default::default()),
        }
    }

    pub fn documents(&self) -> &[String] {
        with_form!(self, form => form.documents())
    }

    pub fn documents_mut(&mut self) -> &mut Vec<String> {
        with_form!(self, form => form.documents_mut())
    }

    /// Re-runs every derivation for this section.
    pub fn recompute(&mut self) {
        with_form!(self, form => form.recompute())
    }
}

/// Section bodies keyed by section, serialized as a camelCase object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AuditSections(BTreeMap<SectionKey, SectionData>);

impl AuditSections {
    pub fn get(&self, key: SectionKey) -> Option<&SectionData> {
        self.0.get(&key)
    }

    pub fn get_mut(&mut self, key: SectionKey) -> Option<&mut SectionData> {
        self.0.get_mut(&key)
    }

    /// Existing body for `key`, inserting a blank one first if needed.
    pub fn get_or_insert_blank(&mut self, key: SectionKey) -> &mut SectionData {
        self.0.entry(key).or_insert_with(|| SectionData::blank(key))
    }

    /// Replaces the whole body for the section; no merging.
    pub fn replace(&mut self, data: SectionData) -> Option<SectionData> {
        self.0.insert(data.key(), data)
    }

    /// A section counts once it has been saved or has a document attached,
    /// even if every answer is a default.
    pub fn is_populated(&self, key: SectionKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn academic_programs(&self) -> Option<&AcademicPrograms> {
        match self.get(SectionKey::AcademicPrograms) {
            Some(SectionData::AcademicPrograms(programs)) => Some(programs),
            _ => None,
        }
    }

    pub fn placement(&self) -> Option<&Placement> {
        match self.get(SectionKey::Placement) {
            Some(SectionData::Placement(placement)) => Some(placement),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionData> {
        self.0.values()
    }
}

impl<'de> Deserialize<'de> for AuditSections {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<SectionKey, serde_json::Value>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| {
                SectionData::parse(key, value)
                    .map(|data| (key, data))
                    .map_err(serde::de::Error::custom)
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(AuditSections)
    }
}
