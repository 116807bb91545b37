//! CSV register of audits for the university office.

use serde::Serialize;

use super::domain::Audit;

#[derive(Debug, Serialize)]
struct RegisterRow<'a> {
    audit_id: &'a str,
    college_id: &'a str,
    institute: &'a str,
    academic_year: &'a str,
    status: &'static str,
    current_step: u8,
    pdf_uploaded: bool,
    submitted_at: String,
    total_intake: u32,
    placement_percentage: Option<f64>,
}

const HEADER: [&str; 10] = [
    "audit_id",
    "college_id",
    "institute",
    "academic_year",
    "status",
    "current_step",
    "pdf_uploaded",
    "submitted_at",
    "total_intake",
    "placement_percentage",
];

/// One row per audit; the header is written even when there are no audits.
pub fn write_register<W: std::io::Write>(writer: W, audits: &[Audit]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(HEADER)?;
    for audit in audits {
        writer.serialize(RegisterRow {
            audit_id: &audit.id.0,
            college_id: &audit.college_id.0,
            institute: &audit.institute.name,
            academic_year: audit.academic_year.as_str(),
            status: audit.status.label(),
            current_step: audit.current_step,
            pdf_uploaded: audit.direct_pdf_upload.uploaded,
            submitted_at: audit
                .submitted_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            total_intake: audit
                .sections
                .academic_programs()
                .map(|programs| programs.total_intake)
                .unwrap_or(0),
            placement_percentage: audit
                .sections
                .placement()
                .map(|placement| placement.placement_percentage),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn render_register(audits: &[Audit]) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_register(&mut buffer, audits)?;
    String::from_utf8(buffer).map_err(|err| csv::Error::from(std::io::Error::other(err)))
}
