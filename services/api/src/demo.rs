use crate::infra::Services;
use clap::Args;
use trinity_audit::config::AuditConfig;
use trinity_audit::error::AppError;
use trinity_audit::workflows::audit::sections::{
    AcademicPrograms, Accreditation, DeficiencyItem, DeficiencyStatus, Deficiencies, Library,
    LibraryHolding, Placement, ProgramFaculty, ProgramOffering, TeachersAvailability,
};
use trinity_audit::workflows::audit::{
    Audit, AuditTarget, FileUpload, ReviewDecision, ReviewRequest, SaveIntent, SectionData,
    SectionKey, SectionSave,
};
use trinity_audit::workflows::registration::CollegeRegistration;
use trinity_audit::workflows::session::{Principal, Role};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Academic year to audit (YYYY-YY)
    #[arg(long, default_value = "2024-25")]
    pub(crate) year: String,
    /// Submit a consolidated PDF instead of filling the section forms
    #[arg(long)]
    pub(crate) pdf: bool,
    /// Reject the audit with review comments instead of approving it
    #[arg(long)]
    pub(crate) reject: bool,
    /// Print the CSV audit register at the end
    #[arg(long)]
    pub(crate) register: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            year: "2024-25".to_string(),
            pdf: false,
            reject: false,
            register: false,
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let services = Services::in_memory(&AuditConfig::default(), &[]);
    let admin = Principal {
        id: "registrar".to_string(),
        role: Role::Admin,
        email: "audits@ipu.example".to_string(),
    };

    println!("Academic audit demo for {}", args.year);
    let college = services.registrations.register(CollegeRegistration {
        name: "Trinity Institute of Professional Studies".to_string(),
        email: "office@tips.example".to_string(),
        phone: Some("011-4567-8900".to_string()),
        address: Some("Sector 9, Dwarka, New Delhi".to_string()),
        principal_name: Some("Dr. R. K. Mehta".to_string()),
        programs_offered: vec!["BBA".to_string(), "BCA".to_string(), "B.Com (H)".to_string()],
    })?;
    println!(
        "- Registered {} as {} ({})",
        college.name,
        college.id,
        college.status.label()
    );
    let college = services.registrations.approve(&admin, &college.id)?;
    println!("- Registration {}", college.status.label());

    let principal = Principal {
        id: college.id.0.clone(),
        role: Role::College,
        email: college.email.clone(),
    };

    let audit = if args.pdf {
        println!("\nUploading consolidated PDF");
        services.audits.upload_direct_pdf(
            &principal,
            &args.year,
            FileUpload {
                file_name: format!("academic-audit-{}.pdf", args.year),
                bytes: b"%PDF-1.7 demo audit".to_vec(),
            },
            true,
        )?
    } else {
        println!("\nFilling the audit wizard");
        let mut last = None;
        for data in demo_sections() {
            let key = data.key();
            let outcome = services.audits.save_section(
                &principal,
                SectionSave {
                    target: AuditTarget::Year(args.year.clone()),
                    data,
                    intent: SaveIntent::SaveAndContinue,
                    base_revision: None,
                },
            )?;
            println!(
                "- Step {:>2} saved {} (now at step {})",
                key.step(),
                key.label(),
                outcome.audit.current_step
            );
            for warning in &outcome.warnings {
                println!("    warning: {} {}", warning.field, warning.message);
            }
            last = Some(outcome.audit);
        }
        let Some(audit) = last else {
            return Ok(());
        };

        let summary = services.audits.completion(&principal, &audit.id)?;
        println!(
            "- {}/{} sections complete | ready to submit: {}",
            summary.completed_sections, summary.total_sections, summary.ready_to_submit
        );
        if !summary.missing_summary.is_empty() {
            println!(
                "  Summary view still lists: {}",
                summary.missing_summary.join(", ")
            );
        }
        services.audits.submit(&principal, &audit.id)?
    };
    println!(
        "- Audit {} {} by {}",
        audit.id,
        audit.status.label(),
        audit.submitted_by.as_deref().unwrap_or("-")
    );

    let decision = if args.reject {
        ReviewRequest {
            decision: ReviewDecision::Reject,
            comments: Some("Attach the signed library stock register.".to_string()),
        }
    } else {
        ReviewRequest {
            decision: ReviewDecision::Approve,
            comments: None,
        }
    };
    let audit = services.audits.review(&admin, &audit.id, decision)?;
    println!("\nUniversity review");
    println!("- Status: {}", audit.status.label());
    if let Some(comments) = &audit.review_comments {
        println!("- Comments: {comments}");
    }

    render_derived_values(&audit);

    let mail = services.outbox.sent();
    println!("\nNotifications queued: {}", mail.len());
    for message in &mail {
        println!("- {} -> {}", message.subject, message.to);
    }

    if args.register {
        println!("\nAudit register");
        print!("{}", services.audits.export_register(&admin)?);
    }

    Ok(())
}

fn render_derived_values(audit: &Audit) {
    if audit.direct_pdf_upload.uploaded {
        println!(
            "- Submitted as PDF: {}",
            audit.direct_pdf_upload.file_name.as_deref().unwrap_or("-")
        );
        return;
    }

    println!("\nDerived values");
    if let Some(programs) = audit.sections.academic_programs() {
        println!("- Total sanctioned intake: {}", programs.total_intake);
    }
    if let Some(SectionData::TeachersAvailability(teachers)) =
        audit.sections.get(SectionKey::TeachersAvailability)
    {
        println!(
            "- Faculty {} against {} required | cadre {} | student-teacher 1:{}",
            teachers.total_faculty,
            teachers.total_required_teachers,
            teachers.cadre_ratio,
            teachers.student_teacher_ratio
        );
    }
    if let Some(SectionData::Library(library)) = audit.sections.get(SectionKey::Library) {
        println!(
            "- Library score {} | journal ratios {:.2} / {:.2}",
            library.total_score, library.indian_journal_ratio, library.international_journal_ratio
        );
    }
    if let Some(placement) = audit.sections.placement() {
        println!(
            "- Placement {}% ({} placed or in higher studies)",
            placement.placement_percentage, placement.total_placed_and_higher
        );
    }
    if let Some(SectionData::Deficiencies(deficiencies)) =
        audit.sections.get(SectionKey::Deficiencies)
    {
        println!(
            "- Deficiencies closed: {}/{} ({}%)",
            deficiencies.deficiencies_completed,
            deficiencies.items.len(),
            deficiencies.completion_rate
        );
    }
}

fn demo_sections() -> Vec<SectionData> {
    vec![
        SectionData::AcademicPrograms(AcademicPrograms {
            programs: vec![
                offering("BBA", 120, 60),
                offering("BCA", 120, 60),
                offering("B.Com (H)", 60, 0),
            ],
            ..AcademicPrograms::default()
        }),
        SectionData::Accreditation(Accreditation {
            naac_accredited: true,
            naac_grade: Some("A".to_string()),
            naac_cgpa: Some(3.21),
            nirf_participated: true,
            ..Accreditation::default()
        }),
        SectionData::TeachersAvailability(TeachersAvailability {
            programs: vec![
                ProgramFaculty {
                    programme_name: "BBA".to_string(),
                    available_teachers: 28,
                    ..ProgramFaculty::default()
                },
                ProgramFaculty {
                    programme_name: "BCA".to_string(),
                    available_teachers: 24,
                    ..ProgramFaculty::default()
                },
            ],
            professors: 4,
            associate_professors: 8,
            assistant_professors: 48,
            ..TeachersAvailability::default()
        }),
        SectionData::Library(Library {
            programs: vec![LibraryHolding {
                programme_name: "BBA".to_string(),
                titles: 1_200,
                volumes: 5_400,
                ..LibraryHolding::default()
            }],
            indian_journals: 36,
            international_journals: 9,
            digital_library: true,
            ..Library::default()
        }),
        SectionData::Placement(Placement {
            eligible_and_registered: 240,
            placed: 150,
            higher_education: 40,
            recruiters_visited: 32,
            highest_package_lpa: 12.5,
            median_package_lpa: 4.2,
            ..Placement::default()
        }),
        SectionData::Deficiencies(Deficiencies {
            deficiencies_identified: 3,
            items: vec![
                deficiency("Ramp at block B entrance", DeficiencyStatus::Completed),
                deficiency("Second server room UPS", DeficiencyStatus::InProgress),
                deficiency("Library reading hall seating", DeficiencyStatus::Completed),
            ],
            ..Deficiencies::default()
        }),
    ]
}

fn offering(name: &str, first_shift: u32, second_shift: u32) -> ProgramOffering {
    ProgramOffering {
        programme_name: name.to_string(),
        first_shift_intake: first_shift,
        second_shift_intake: second_shift,
        ..ProgramOffering::default()
    }
}

fn deficiency(description: &str, status: DeficiencyStatus) -> DeficiencyItem {
    DeficiencyItem {
        description: description.to_string(),
        action_taken: None,
        status,
    }
}
