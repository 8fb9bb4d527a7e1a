//! In-memory reference implementation of the inspection repository.
//!
//! Transactions stage a copy of every table, run the unit of work against the copy, and swap
//! it in only when the work succeeds. The store mutex serializes transactions.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    ActorId, ChecklistItem, ChecklistItemId, ChecklistResponse, Establishment, EstablishmentId,
    InspectionReport, ReportId, ReportStatus, Violation, ViolationDraft, ViolationId,
    ViolationStatus,
};
use super::repository::{InspectionRepository, InspectionUnitOfWork, NewReport, RepositoryError};

#[derive(Debug, Clone, Default)]
struct Tables {
    establishments: BTreeMap<EstablishmentId, Establishment>,
    checklist: BTreeMap<ChecklistItemId, ChecklistItem>,
    reports: BTreeMap<ReportId, InspectionReport>,
    responses: BTreeMap<(ReportId, ChecklistItemId), ChecklistResponse>,
    violations: BTreeMap<ViolationId, Violation>,
    last_report_id: u64,
    last_violation_id: u64,
}

/// Mutex-guarded tables; cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryInspectionStore {
    tables: Mutex<Tables>,
}

impl MemoryInspectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("inspection store lock poisoned".to_string()))
    }

    /// Registry-side upsert of an establishment record.
    pub fn put_establishment(&self, establishment: Establishment) -> Result<(), RepositoryError> {
        self.lock()?
            .establishments
            .insert(establishment.id, establishment);
        Ok(())
    }

    pub fn put_checklist_item(&self, item: ChecklistItem) -> Result<(), RepositoryError> {
        self.lock()?.checklist.insert(item.id, item);
        Ok(())
    }

    pub fn deactivate_establishment(&self, id: EstablishmentId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let establishment = tables
            .establishments
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("establishment {id}")))?;
        establishment.active = false;
        Ok(())
    }

    /// Adapter for the external review workflow: records an admin decision on a submitted
    /// report.
    pub fn record_review(
        &self,
        report_id: ReportId,
        decision: ReportStatus,
        reviewer: ActorId,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<InspectionReport, RepositoryError> {
        if !matches!(
            decision,
            ReportStatus::Approved | ReportStatus::Rejected | ReportStatus::RevisionRequested
        ) {
            return Err(RepositoryError::Conflict(format!(
                "'{}' is not a review decision",
                decision.label()
            )));
        }

        let mut tables = self.lock()?;
        let report = tables
            .reports
            .get_mut(&report_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("report {report_id}")))?;
        if report.status != ReportStatus::Submitted {
            return Err(RepositoryError::Conflict(format!(
                "report {report_id} is {} and cannot be reviewed",
                report.status.label()
            )));
        }

        report.status = decision;
        report.reviewer_notes = notes;
        report.reviewed_by = Some(reviewer);
        report.reviewed_at = Some(at);
        report.updated_at = at;
        Ok(report.clone())
    }
}

impl InspectionRepository for MemoryInspectionStore {
    fn checklist_items(&self) -> Result<Vec<ChecklistItem>, RepositoryError> {
        Ok(self.lock()?.checklist.values().cloned().collect())
    }

    fn establishment(&self, id: EstablishmentId) -> Result<Option<Establishment>, RepositoryError> {
        Ok(self.lock()?.establishments.get(&id).cloned())
    }

    fn establishments(&self) -> Result<Vec<Establishment>, RepositoryError> {
        Ok(self.lock()?.establishments.values().cloned().collect())
    }

    fn report(&self, id: ReportId) -> Result<Option<InspectionReport>, RepositoryError> {
        Ok(self.lock()?.reports.get(&id).cloned())
    }

    fn reports(&self) -> Result<Vec<InspectionReport>, RepositoryError> {
        Ok(self.lock()?.reports.values().cloned().collect())
    }

    fn responses(&self, report_id: ReportId) -> Result<Vec<ChecklistResponse>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.responses_for(report_id))
    }

    fn violation(&self, id: ViolationId) -> Result<Option<Violation>, RepositoryError> {
        Ok(self.lock()?.violations.get(&id).cloned())
    }

    fn violations(&self) -> Result<Vec<Violation>, RepositoryError> {
        Ok(self.lock()?.violations.values().cloned().collect())
    }

    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn InspectionUnitOfWork) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut committed = self.lock()?;
        let mut staged = committed.clone();
        let value = work(&mut staged)?;
        *committed = staged;
        Ok(value)
    }
}

impl Tables {
    fn responses_for(&self, report_id: ReportId) -> Vec<ChecklistResponse> {
        self.responses
            .range((report_id, ChecklistItemId(0))..=(report_id, ChecklistItemId(u64::MAX)))
            .map(|(_, response)| response.clone())
            .collect()
    }
}

impl InspectionUnitOfWork for Tables {
    fn establishment(&self, id: EstablishmentId) -> Result<Option<Establishment>, RepositoryError> {
        Ok(self.establishments.get(&id).cloned())
    }

    fn report(&self, id: ReportId) -> Result<Option<InspectionReport>, RepositoryError> {
        Ok(self.reports.get(&id).cloned())
    }

    fn responses(&self, report_id: ReportId) -> Result<Vec<ChecklistResponse>, RepositoryError> {
        Ok(self.responses_for(report_id))
    }

    fn violation(&self, id: ViolationId) -> Result<Option<Violation>, RepositoryError> {
        Ok(self.violations.get(&id).cloned())
    }

    fn next_report_sequence(&self, date: NaiveDate) -> Result<u32, RepositoryError> {
        let prefix = format!("INSP-{}-", date.format("%Y%m%d"));
        let highest = self
            .reports
            .values()
            .filter_map(|report| report.report_number.strip_prefix(&prefix))
            .filter_map(|sequence| sequence.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }

    fn insert_report(&mut self, report: NewReport) -> Result<InspectionReport, RepositoryError> {
        if self
            .reports
            .values()
            .any(|existing| existing.report_number == report.report_number)
        {
            return Err(RepositoryError::Conflict(format!(
                "report number {} already issued",
                report.report_number
            )));
        }

        self.last_report_id += 1;
        let record = InspectionReport {
            id: ReportId(self.last_report_id),
            report_number: report.report_number,
            establishment_id: report.establishment_id,
            inspection_date: report.inspection_date,
            inspected_by: report.inspected_by,
            inspection_type: report.inspection_type,
            status: ReportStatus::Draft,
            overall_compliance_score: report.score.overall_score,
            risk_assessment: report.score.risk_assessment,
            fire_hazard_level: report.score.fire_hazard_level,
            recommendations: report.recommendations,
            corrective_actions: report.corrective_actions,
            compliance_deadline: report.compliance_deadline,
            reviewer_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            submitted_at: None,
            created_at: report.created_at,
            updated_at: report.created_at,
        };
        self.reports.insert(record.id, record.clone());
        Ok(record)
    }

    fn update_report(&mut self, report: InspectionReport) -> Result<(), RepositoryError> {
        let slot = self
            .reports
            .get_mut(&report.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("report {}", report.id)))?;
        *slot = report;
        Ok(())
    }

    fn upsert_response(&mut self, response: ChecklistResponse) -> Result<(), RepositoryError> {
        if !self.reports.contains_key(&response.report_id) {
            return Err(RepositoryError::NotFound(format!(
                "report {}",
                response.report_id
            )));
        }
        if !self.checklist.contains_key(&response.checklist_item_id) {
            return Err(RepositoryError::NotFound(format!(
                "checklist item {}",
                response.checklist_item_id
            )));
        }
        self.responses.insert(
            (response.report_id, response.checklist_item_id),
            response,
        );
        Ok(())
    }

    fn insert_violation(
        &mut self,
        report_id: ReportId,
        draft: &ViolationDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Violation, RepositoryError> {
        if !self.reports.contains_key(&report_id) {
            return Err(RepositoryError::NotFound(format!("report {report_id}")));
        }

        self.last_violation_id += 1;
        let violation = Violation {
            id: ViolationId(self.last_violation_id),
            report_id,
            code: draft.code.clone(),
            description: draft.description.clone(),
            severity: draft.severity,
            section: draft.section.clone(),
            fine_amount: draft.fine_amount,
            compliance_deadline: draft.compliance_deadline,
            status: ViolationStatus::Pending,
            rectified_at: None,
            rectified_by: None,
            evidence: None,
            notes: Vec::new(),
            created_at,
            updated_at: created_at,
        };
        self.violations.insert(violation.id, violation.clone());
        Ok(violation)
    }

    fn update_violation(&mut self, violation: Violation) -> Result<(), RepositoryError> {
        let slot = self
            .violations
            .get_mut(&violation.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("violation {}", violation.id)))?;
        *slot = violation;
        Ok(())
    }

    fn delete_violations(&mut self, report_id: ReportId) -> Result<usize, RepositoryError> {
        let before = self.violations.len();
        self.violations
            .retain(|_, violation| violation.report_id != report_id);
        Ok(before - self.violations.len())
    }

    fn update_establishment(&mut self, establishment: Establishment) -> Result<(), RepositoryError> {
        let slot = self
            .establishments
            .get_mut(&establishment.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("establishment {}", establishment.id)))?;
        *slot = establishment;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::inspection::domain::{InspectionFrequency, InspectionType, RiskLevel};
    use crate::workflows::inspection::scoring::ScoreOutcome;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).single().expect("valid timestamp")
    }

    fn inspection_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).expect("valid date")
    }

    fn store() -> MemoryInspectionStore {
        let store = MemoryInspectionStore::new();
        store
            .put_establishment(Establishment {
                id: EstablishmentId(1),
                name: "Harbor Bakery".to_string(),
                category: "commercial".to_string(),
                address: "12 Pier Road".to_string(),
                barangay: "Poblacion".to_string(),
                owner_name: "L. Santos".to_string(),
                owner_contact: None,
                inspection_frequency: InspectionFrequency::Annual,
                last_inspection_date: None,
                next_scheduled_inspection: None,
                compliance_rating: None,
                overall_risk_level: None,
                active: true,
            })
            .expect("seed establishment");
        store
    }

    fn new_report(number: &str) -> NewReport {
        NewReport {
            report_number: number.to_string(),
            establishment_id: EstablishmentId(1),
            inspection_date: inspection_date(),
            inspected_by: ActorId(7),
            inspection_type: InspectionType::Routine,
            score: ScoreOutcome {
                overall_score: 90,
                risk_assessment: RiskLevel::Low,
                fire_hazard_level: RiskLevel::Low,
            },
            recommendations: None,
            corrective_actions: None,
            compliance_deadline: None,
            created_at: at(),
        }
    }

    #[test]
    fn failed_transaction_discards_staged_writes() {
        let store = store();
        let result: Result<(), RepositoryError> = store.transaction(|uow| {
            uow.insert_report(new_report("INSP-20240510-0001"))?;
            Err(RepositoryError::Transaction("boom".to_string()))
        });

        assert!(result.is_err());
        assert!(store.reports().expect("reports readable").is_empty());
    }

    #[test]
    fn sequence_counts_reports_for_the_same_day() {
        let store = store();
        let sequence = store
            .transaction(|uow| {
                uow.insert_report(new_report("INSP-20240510-0001"))?;
                uow.insert_report(new_report("INSP-20240510-0002"))?;
                uow.insert_report(new_report("INSP-20240509-0007"))?;
                uow.next_report_sequence(inspection_date())
            })
            .expect("transaction commits");
        assert_eq!(sequence, 3);
    }

    #[test]
    fn duplicate_report_number_conflicts() {
        let store = store();
        let result = store.transaction(|uow| {
            uow.insert_report(new_report("INSP-20240510-0001"))?;
            uow.insert_report(new_report("INSP-20240510-0001"))
        });
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[test]
    fn review_requires_submitted_report() {
        let store = store();
        let report = store
            .transaction(|uow| uow.insert_report(new_report("INSP-20240510-0001")))
            .expect("insert");

        let result = store.record_review(
            report.id,
            ReportStatus::Approved,
            ActorId(2),
            None,
            at(),
        );
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }
}
