use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::InspectionConfig;
use crate::workflows::inspection::domain::{
    ActorId, ChecklistItem, ChecklistItemId, ChecklistResponse, ComplianceStatus, Establishment,
    EstablishmentId, FindingsInput, InspectionFrequency, InspectionReport, InspectionSubmission,
    InspectionType, ReportId, ResponseInput, Violation, ViolationDraft, ViolationId,
    ViolationInput, ViolationSeverity,
};
use crate::workflows::inspection::memory::MemoryInspectionStore;
use crate::workflows::inspection::repository::{
    InspectionRepository, InspectionUnitOfWork, NewReport, RepositoryError,
};
use crate::workflows::inspection::service::InspectionService;

pub(super) const INSPECTOR: ActorId = ActorId(7);
pub(super) const OTHER_INSPECTOR: ActorId = ActorId(8);
pub(super) const REVIEWER: ActorId = ActorId(2);
pub(super) const BAKERY: EstablishmentId = EstablishmentId(1);
pub(super) const WAREHOUSE: EstablishmentId = EstablishmentId(2);

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn inspection_day() -> NaiveDate {
    date(2024, 5, 10)
}

pub(super) fn establishment(
    id: EstablishmentId,
    name: &str,
    frequency: InspectionFrequency,
) -> Establishment {
    Establishment {
        id,
        name: name.to_string(),
        category: "commercial".to_string(),
        address: format!("{} Rizal Avenue", id.0 * 10),
        barangay: "Poblacion".to_string(),
        owner_name: format!("Owner of {name}"),
        owner_contact: Some("0917-555-0100".to_string()),
        inspection_frequency: frequency,
        last_inspection_date: None,
        next_scheduled_inspection: None,
        compliance_rating: None,
        overall_risk_level: None,
        active: true,
    }
}

pub(super) fn checklist() -> Vec<ChecklistItem> {
    [
        (1, "FE-01", "Extinguishers charged and tagged", "extinguishers"),
        (2, "EX-01", "Exit paths unobstructed", "exits"),
        (3, "AL-01", "Smoke alarms functional", "alarms"),
        (4, "EX-02", "Exit signage illuminated", "exits"),
    ]
    .into_iter()
    .map(|(id, code, description, category)| ChecklistItem {
        id: ChecklistItemId(id),
        code: code.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        compliance_standard: Some("RA 9514".to_string()),
        active: true,
    })
    .collect()
}

pub(super) fn seeded_store() -> Arc<MemoryInspectionStore> {
    let store = Arc::new(MemoryInspectionStore::new());
    store
        .put_establishment(establishment(BAKERY, "Harbor Bakery", InspectionFrequency::Annual))
        .expect("seed bakery");
    store
        .put_establishment(establishment(
            WAREHOUSE,
            "Delta Warehouse",
            InspectionFrequency::Quarterly,
        ))
        .expect("seed warehouse");
    for item in checklist() {
        store.put_checklist_item(item).expect("seed checklist");
    }
    store
}

pub(super) fn build_service() -> (
    InspectionService<MemoryInspectionStore>,
    Arc<MemoryInspectionStore>,
) {
    let store = seeded_store();
    let service = InspectionService::new(store.clone(), InspectionConfig::default());
    (service, store)
}

pub(super) fn response(status: ComplianceStatus, score: i32) -> ResponseInput {
    ResponseInput {
        status,
        score,
        notes: None,
    }
}

pub(super) fn violation_row(code: &str, severity: ViolationSeverity) -> ViolationInput {
    ViolationInput {
        code: code.to_string(),
        description: format!("{code} breach"),
        severity: Some(severity),
        section: Some("Sec. 10".to_string()),
        fine: Some(1500.0),
        deadline: Some(date(2024, 5, 24)),
    }
}

/// Compliant/100 plus non-compliant/0, one critical violation and one blank form row.
pub(super) fn submission() -> InspectionSubmission {
    let mut checklist_responses = BTreeMap::new();
    checklist_responses.insert(
        ChecklistItemId(1),
        response(ComplianceStatus::Compliant, 100),
    );
    checklist_responses.insert(
        ChecklistItemId(2),
        response(ComplianceStatus::NonCompliant, 0),
    );

    InspectionSubmission {
        establishment_id: BAKERY,
        inspection_date: Some(inspection_day()),
        inspection_type: Some(InspectionType::Routine),
        findings: FindingsInput {
            recommendations: Some("Clear the rear exit corridor".to_string()),
            corrective_actions: Some("Remove stored flour sacks".to_string()),
            compliance_deadline: Some(date(2024, 6, 10)),
            checklist_responses,
            violations: vec![
                violation_row("FC-10.2", ViolationSeverity::Critical),
                ViolationInput::default(),
            ],
        },
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Failure injected into an otherwise working store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Fault {
    /// Fail after the report row is written, before its responses.
    ResponseWrite,
    /// Every report number is reported as taken.
    NumberCollision,
    /// Fail while recording violations, after the report and responses are written.
    ViolationWrite,
}

pub(super) struct FaultyRepository {
    pub(super) inner: Arc<MemoryInspectionStore>,
    pub(super) fault: Fault,
    pub(super) attempts: AtomicUsize,
}

impl FaultyRepository {
    pub(super) fn new(inner: Arc<MemoryInspectionStore>, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            attempts: AtomicUsize::new(0),
        }
    }

    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

struct FaultyUnitOfWork<'a> {
    inner: &'a mut dyn InspectionUnitOfWork,
    fault: Fault,
}

impl InspectionRepository for FaultyRepository {
    fn checklist_items(&self) -> Result<Vec<ChecklistItem>, RepositoryError> {
        self.inner.checklist_items()
    }

    fn establishment(&self, id: EstablishmentId) -> Result<Option<Establishment>, RepositoryError> {
        self.inner.establishment(id)
    }

    fn establishments(&self) -> Result<Vec<Establishment>, RepositoryError> {
        self.inner.establishments()
    }

    fn report(&self, id: ReportId) -> Result<Option<InspectionReport>, RepositoryError> {
        self.inner.report(id)
    }

    fn reports(&self) -> Result<Vec<InspectionReport>, RepositoryError> {
        self.inner.reports()
    }

    fn responses(&self, report_id: ReportId) -> Result<Vec<ChecklistResponse>, RepositoryError> {
        self.inner.responses(report_id)
    }

    fn violation(&self, id: ViolationId) -> Result<Option<Violation>, RepositoryError> {
        self.inner.violation(id)
    }

    fn violations(&self) -> Result<Vec<Violation>, RepositoryError> {
        self.inner.violations()
    }

    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn InspectionUnitOfWork) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let fault = self.fault;
        self.inner.transaction(|uow| {
            let mut faulty = FaultyUnitOfWork { inner: uow, fault };
            work(&mut faulty)
        })
    }
}

impl InspectionUnitOfWork for FaultyUnitOfWork<'_> {
    fn establishment(&self, id: EstablishmentId) -> Result<Option<Establishment>, RepositoryError> {
        self.inner.establishment(id)
    }

    fn report(&self, id: ReportId) -> Result<Option<InspectionReport>, RepositoryError> {
        self.inner.report(id)
    }

    fn responses(&self, report_id: ReportId) -> Result<Vec<ChecklistResponse>, RepositoryError> {
        self.inner.responses(report_id)
    }

    fn violation(&self, id: ViolationId) -> Result<Option<Violation>, RepositoryError> {
        self.inner.violation(id)
    }

    fn next_report_sequence(&self, date: NaiveDate) -> Result<u32, RepositoryError> {
        self.inner.next_report_sequence(date)
    }

    fn insert_report(&mut self, report: NewReport) -> Result<InspectionReport, RepositoryError> {
        if self.fault == Fault::NumberCollision {
            return Err(RepositoryError::Conflict(format!(
                "report number {} already issued",
                report.report_number
            )));
        }
        self.inner.insert_report(report)
    }

    fn update_report(&mut self, report: InspectionReport) -> Result<(), RepositoryError> {
        self.inner.update_report(report)
    }

    fn upsert_response(&mut self, response: ChecklistResponse) -> Result<(), RepositoryError> {
        if self.fault == Fault::ResponseWrite {
            return Err(RepositoryError::Transaction(
                "connection reset while writing responses".to_string(),
            ));
        }
        self.inner.upsert_response(response)
    }

    fn insert_violation(
        &mut self,
        report_id: ReportId,
        draft: &ViolationDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Violation, RepositoryError> {
        if self.fault == Fault::ViolationWrite {
            return Err(RepositoryError::Transaction(
                "connection reset while writing violations".to_string(),
            ));
        }
        self.inner.insert_violation(report_id, draft, created_at)
    }

    fn update_violation(&mut self, violation: Violation) -> Result<(), RepositoryError> {
        self.inner.update_violation(violation)
    }

    fn delete_violations(&mut self, report_id: ReportId) -> Result<usize, RepositoryError> {
        self.inner.delete_violations(report_id)
    }

    fn update_establishment(&mut self, establishment: Establishment) -> Result<(), RepositoryError> {
        self.inner.update_establishment(establishment)
    }
}

pub(super) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

impl InspectionRepository for UnavailableRepository {
    fn checklist_items(&self) -> Result<Vec<ChecklistItem>, RepositoryError> {
        Err(offline())
    }

    fn establishment(&self, _id: EstablishmentId) -> Result<Option<Establishment>, RepositoryError> {
        Err(offline())
    }

    fn establishments(&self) -> Result<Vec<Establishment>, RepositoryError> {
        Err(offline())
    }

    fn report(&self, _id: ReportId) -> Result<Option<InspectionReport>, RepositoryError> {
        Err(offline())
    }

    fn reports(&self) -> Result<Vec<InspectionReport>, RepositoryError> {
        Err(offline())
    }

    fn responses(&self, _report_id: ReportId) -> Result<Vec<ChecklistResponse>, RepositoryError> {
        Err(offline())
    }

    fn violation(&self, _id: ViolationId) -> Result<Option<Violation>, RepositoryError> {
        Err(offline())
    }

    fn violations(&self) -> Result<Vec<Violation>, RepositoryError> {
        Err(offline())
    }

    fn transaction<T, E, F>(&self, _work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn InspectionUnitOfWork) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        Err(offline().into())
    }
}
