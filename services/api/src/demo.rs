use crate::infra::{evidence_from_path, seed_store};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use clap::Args;
use fire_inspection::config::InspectionConfig;
use fire_inspection::error::AppError;
use fire_inspection::workflows::forecasting::{ForecastInput, ForecastSummary, HistoryImporter};
use fire_inspection::workflows::inspection::{
    ActorId, ChecklistItemId, ComplianceStatus, EstablishmentFilter, EstablishmentId,
    FindingsInput, InspectionError, InspectionService, InspectionSubmission, InspectionType,
    MemoryEvidenceStore, MemoryInspectionStore, ReportStatus, ResponseInput, ViolationFilter,
    ViolationInput, ViolationSeverity, ViolationStatus, ViolationStatusUpdate,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_INSPECTOR: ActorId = ActorId(101);
const DEMO_REVIEWER: ActorId = ActorId(1);
const DEMO_ESTABLISHMENT: EstablishmentId = EstablishmentId(1);

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Inspection date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Photo or PDF attached as rectification evidence for the first violation.
    #[arg(long)]
    pub(crate) evidence: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ForecastArgs {
    /// Incident history export with `category,month,count` rows
    #[arg(long)]
    pub(crate) incidents: PathBuf,
    /// Resource usage export with `resource_type,avg_usage` rows
    #[arg(long)]
    pub(crate) resources: Option<PathBuf>,
    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let ForecastArgs {
        incidents,
        resources,
        json,
    } = args;

    let input = ForecastInput {
        incidents: HistoryImporter::incidents_from_path(&incidents)?,
        resources: match resources {
            Some(path) => HistoryImporter::resources_from_path(path)?,
            None => Vec::new(),
        },
        incident_frequency: Vec::new(),
    };
    let summary = ForecastSummary::build(&input);

    if json {
        let rendered = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        render_forecast(&summary);
    }
    Ok(())
}

fn render_forecast(summary: &ForecastSummary) {
    println!("Incident forecast (next month)");
    if summary.incidents.is_empty() {
        println!("- not enough history (three months per category required)");
    }
    for prediction in &summary.incidents {
        println!(
            "- {}: {} expected ({:?}, {:+.1}/month, {}% confidence)",
            prediction.category,
            prediction.predicted_count,
            prediction.direction,
            prediction.trend,
            prediction.confidence
        );
    }

    if !summary.resources.is_empty() {
        println!("\nResource needs");
        for prediction in &summary.resources {
            println!(
                "- {}: {:.0} units (avg {:.1}, {}% confidence)",
                prediction.resource_type,
                prediction.predicted_need,
                prediction.avg_monthly_usage,
                prediction.confidence
            );
        }
    }

    println!("\nTraining priorities");
    for recommendation in &summary.training {
        println!(
            "- {} ({} incidents): {}",
            recommendation.category,
            recommendation.incident_count,
            recommendation.recommended_training
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { today, evidence } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let moment = |offset_days: i64| -> DateTime<Utc> {
        let day = today + Duration::days(offset_days);
        day.and_hms_opt(10, 0, 0).unwrap_or_default().and_utc()
    };

    let store = Arc::new(MemoryInspectionStore::new());
    seed_store(&store, today).map_err(InspectionError::from)?;
    let service = InspectionService::new(store.clone(), InspectionConfig::default());

    println!("Fire inspection demo ({today})");
    println!("\nEstablishments by schedule");
    for entry in service.establishments_due(&EstablishmentFilter::default(), today)? {
        let due = match entry.days_until_due {
            Some(days) => format!("{days:+} days"),
            None => "no inspection scheduled".to_string(),
        };
        println!(
            "- {} [{}] {} ({})",
            entry.establishment.name,
            entry.establishment.barangay,
            entry.schedule_status.label(),
            due
        );
    }

    let created = service.create_inspection(DEMO_INSPECTOR, demo_submission(today), moment(0))?;
    println!(
        "\nDrafted {}: compliance {}% | risk {}",
        created.report_number,
        created.overall_compliance_score,
        created.risk_assessment.label()
    );

    service.submit_report(created.report_id, DEMO_INSPECTOR, moment(0))?;
    store
        .record_review(
            created.report_id,
            ReportStatus::RevisionRequested,
            DEMO_REVIEWER,
            Some("Record the alarm test result".to_string()),
            moment(1),
        )
        .map_err(InspectionError::from)?;
    println!("- Reviewer requested a revision");

    let mut findings = demo_submission(today).findings;
    findings.checklist_responses.insert(
        ChecklistItemId(6),
        ResponseInput {
            status: ComplianceStatus::Compliant,
            score: 90,
            notes: Some("Alarm tested on site".to_string()),
        },
    );
    let revised = service.revise_report(created.report_id, DEMO_INSPECTOR, findings, moment(1))?;
    println!(
        "- Revised: compliance {}% | risk {}",
        revised.overall_compliance_score,
        revised.risk_assessment.label()
    );
    service.submit_report(created.report_id, DEMO_INSPECTOR, moment(1))?;
    store
        .record_review(
            created.report_id,
            ReportStatus::Approved,
            DEMO_REVIEWER,
            None,
            moment(2),
        )
        .map_err(InspectionError::from)?;
    println!("- Approved");

    let details = service.report_details(created.report_id)?;
    println!("\nChecklist");
    for detail in &details.responses {
        println!(
            "  - {} {}: {} ({})",
            detail.item.code,
            detail.item.description,
            detail.response.compliance_status.label(),
            detail.response.score
        );
    }

    let as_of = today + Duration::days(5);
    println!("\nViolations as of {as_of}");
    let listings = service.violations(&ViolationFilter::default(), as_of)?;
    for listing in &listings {
        let violation = &listing.violation;
        let deadline = match (listing.deadline_class, violation.compliance_deadline) {
            (Some(class), Some(deadline)) => class.display(deadline),
            _ => "no deadline".to_string(),
        };
        println!(
            "  - {} [{}] {} | {} | fine {:.2}",
            violation.code,
            violation.severity.label(),
            violation.description,
            deadline,
            violation.fine_amount.unwrap_or(0.0)
        );
    }

    if let Some(first) = listings.first() {
        let violation_id = first.violation.id;
        let evidence_ref = match evidence {
            Some(path) => {
                let upload = evidence_from_path(&path)?;
                let evidence_store = MemoryEvidenceStore::new();
                Some(service.store_evidence(&evidence_store, violation_id, upload)?)
            }
            None => None,
        };
        let rectified = service.update_violation_status(
            ViolationStatusUpdate {
                violation_id,
                status: ViolationStatus::Rectified,
                actor: DEMO_INSPECTOR,
                notes: Some("Verified on follow-up visit".to_string()),
                evidence: evidence_ref,
            },
            moment(5),
        )?;
        println!(
            "- {} rectified{}",
            rectified.code,
            rectified
                .evidence
                .as_ref()
                .map(|reference| format!(" with evidence {}", reference.0))
                .unwrap_or_default()
        );
    }

    let stats = service.violation_statistics(None, as_of)?;
    println!(
        "\nViolation statistics: {} total | {} pending | {} rectified | {} past deadline",
        stats.total, stats.pending, stats.rectified, stats.past_deadline
    );
    println!(
        "Fines: {:.2} assessed | {:.2} collected",
        stats.total_fines, stats.collected_fines
    );

    Ok(())
}

fn demo_submission(today: NaiveDate) -> InspectionSubmission {
    let scores = [
        (1, ComplianceStatus::Compliant, 100),
        (2, ComplianceStatus::Partial, 60),
        (3, ComplianceStatus::NonCompliant, 0),
        (4, ComplianceStatus::Compliant, 95),
        (5, ComplianceStatus::Compliant, 90),
        (7, ComplianceStatus::NonCompliant, 20),
        (8, ComplianceStatus::NotApplicable, 0),
    ];
    let checklist_responses: BTreeMap<ChecklistItemId, ResponseInput> = scores
        .into_iter()
        .map(|(id, status, score)| {
            (
                ChecklistItemId(id),
                ResponseInput {
                    status,
                    score,
                    notes: None,
                },
            )
        })
        .collect();

    InspectionSubmission {
        establishment_id: DEMO_ESTABLISHMENT,
        inspection_date: Some(today),
        inspection_type: Some(InspectionType::Routine),
        findings: FindingsInput {
            recommendations: Some("Replace padlock on rear exit with panic hardware".to_string()),
            corrective_actions: Some("Rewire oven circuit with a licensed electrician".to_string()),
            compliance_deadline: Some(today + Duration::days(30)),
            checklist_responses,
            violations: vec![
                ViolationInput {
                    code: "FC-10.2.5.2".to_string(),
                    description: "Rear exit padlocked during business hours".to_string(),
                    severity: Some(ViolationSeverity::Critical),
                    section: Some("Sec. 10.2.5.2".to_string()),
                    fine: Some(25_000.0),
                    deadline: Some(today + Duration::days(3)),
                },
                ViolationInput {
                    code: "FC-10.2.20".to_string(),
                    description: "Overloaded extension cords behind ovens".to_string(),
                    severity: Some(ViolationSeverity::Major),
                    section: Some("Sec. 10.2.20".to_string()),
                    fine: Some(12_500.0),
                    deadline: Some(today + Duration::days(7)),
                },
            ],
        },
    }
}
