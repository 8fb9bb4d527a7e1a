use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::InspectionConfig;

use super::catalog::{ChecklistCatalog, ChecklistSection};
use super::domain::{
    ActorId, ChecklistItem, ChecklistItemId, ChecklistResponse, Establishment, EstablishmentId,
    EvidenceRef, FindingsInput, InspectionReport, InspectionSubmission, ReportId, ReportStatus,
    RiskLevel, ValidatedFindings, Violation, ViolationId, ViolationStatus,
};
use super::evidence::{EvidenceError, EvidenceStore, EvidenceUpload, EvidenceValidator};
use super::query::{
    establishments_due, reports_matching, violations_matching, EstablishmentDue,
    EstablishmentFilter, ReportFilter, ReportSummary, ViolationFilter, ViolationListing,
};
use super::repository::{InspectionRepository, InspectionUnitOfWork, NewReport, RepositoryError};
use super::scheduling::next_due_date;
use super::scoring::{ScoreOutcome, ScoringEngine};
use super::statistics::{ReportStatistics, ViolationStatistics};
use super::validation::{InspectionGuard, InspectionHeader, ValidationError};
use super::violations::{apply_status_update, ViolationStatusUpdate};

/// Category shown for responses whose checklist item is no longer catalogued.
pub const UNCATALOGUED_CATEGORY: &str = "uncatalogued";

/// Attempts made to issue a unique report number before giving up.
pub const REPORT_NUMBER_ATTEMPTS: u32 = 3;

/// `INSP-YYYYMMDD-NNNN`.
pub fn report_number(date: NaiveDate, sequence: u32) -> String {
    format!("INSP-{}-{:04}", date.format("%Y%m%d"), sequence)
}

/// Illegal transitions and ownership failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateConflict {
    #[error("report {report_id} belongs to another inspector (actor {actor})")]
    NotOwned { report_id: ReportId, actor: ActorId },
    #[error("report {report_id} is not modifiable in current state ({})", .status.label())]
    NotModifiable {
        report_id: ReportId,
        status: ReportStatus,
    },
    #[error("violation {violation_id} is already closed ({})", .status.label())]
    ViolationClosed {
        violation_id: ViolationId,
        status: ViolationStatus,
    },
    #[error("could not issue a unique report number after {attempts} attempts")]
    ReportNumberExhausted { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("report {0} not found")]
    Report(ReportId),
    #[error("violation {0} not found")]
    Violation(ViolationId),
    #[error("establishment {0} not found")]
    Establishment(EstablishmentId),
}

/// Error raised by the inspection service.
#[derive(Debug, thiserror::Error)]
pub enum InspectionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] StateConflict),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl InspectionError {
    /// Only infrastructure failures are worth retrying; they always leave the store untouched.
    pub fn is_retryable(&self) -> bool {
        match self {
            InspectionError::Repository(error) => error.is_retryable(),
            InspectionError::Evidence(EvidenceError::Store(_)) => true,
            _ => false,
        }
    }
}

/// Identity of a freshly created report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedReport {
    pub report_id: ReportId,
    pub report_number: String,
    pub overall_compliance_score: u8,
    pub risk_assessment: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDetail {
    pub response: ChecklistResponse,
    pub item: ChecklistItem,
}

/// Everything shown on the report view, reviewer notes included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDetails {
    pub report: InspectionReport,
    pub establishment: Establishment,
    pub responses: Vec<ResponseDetail>,
    pub violations: Vec<Violation>,
}

/// Report lifecycle facade: validation, scoring, scheduling, and atomic persistence.
pub struct InspectionService<R> {
    repository: Arc<R>,
    guard: InspectionGuard,
    engine: ScoringEngine,
    config: InspectionConfig,
}

impl<R> InspectionService<R>
where
    R: InspectionRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: InspectionConfig) -> Self {
        Self {
            repository,
            guard: InspectionGuard,
            engine: ScoringEngine,
            config,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    fn catalog(&self) -> Result<ChecklistCatalog, RepositoryError> {
        Ok(ChecklistCatalog::new(self.repository.checklist_items()?))
    }

    pub fn checklist(&self, category: Option<&str>) -> Result<Vec<ChecklistSection>, InspectionError> {
        Ok(self.catalog()?.list_active_items(category))
    }

    /// Create a draft report with its responses and violations, and stamp the establishment's
    /// schedule and rating, as one transaction.
    pub fn create_inspection(
        &self,
        inspector: ActorId,
        submission: InspectionSubmission,
        at: DateTime<Utc>,
    ) -> Result<CreatedReport, InspectionError> {
        let header = self.guard.header(&submission)?;
        let establishment_id = submission.establishment_id;
        let establishment = self
            .repository
            .establishment(establishment_id)?
            .ok_or(NotFound::Establishment(establishment_id))?;
        self.guard.establishment(&establishment)?;

        let catalog = self.catalog()?;
        let findings = self
            .guard
            .findings(submission.findings, header.inspection_date, &catalog)?;
        let score = self.engine.compute_score(
            findings
                .responses
                .iter()
                .map(|response| (response.compliance_status, response.score)),
        );

        for attempt in 1..=REPORT_NUMBER_ATTEMPTS {
            let outcome = self.repository.transaction(|uow| {
                persist_new_report(uow, inspector, establishment_id, header, &findings, score, at)
            });

            match outcome {
                Ok(created) => {
                    info!(
                        report_id = %created.report_id,
                        report_number = %created.report_number,
                        establishment_id = %establishment_id,
                        inspector = %inspector,
                        score = created.overall_compliance_score,
                        "inspection report created"
                    );
                    return Ok(created);
                }
                Err(InspectionError::Repository(RepositoryError::Conflict(reason))) => {
                    warn!(attempt, reason = %reason, "report number collided; retrying");
                }
                Err(error) => {
                    warn!(error = %error, "inspection creation rolled back");
                    return Err(error);
                }
            }
        }

        Err(StateConflict::ReportNumberExhausted {
            attempts: REPORT_NUMBER_ATTEMPTS,
        }
        .into())
    }

    /// Hand a draft (or a report sent back for revision) to the reviewer.
    pub fn submit_report(
        &self,
        report_id: ReportId,
        actor: ActorId,
        at: DateTime<Utc>,
    ) -> Result<InspectionReport, InspectionError> {
        let report = self.repository.transaction(|uow| {
            let mut report = editable_report(uow, report_id, actor)?;
            report.status = ReportStatus::Submitted;
            report.submitted_at = Some(at);
            report.reviewer_notes = None;
            report.reviewed_by = None;
            report.reviewed_at = None;
            report.updated_at = at;
            uow.update_report(report.clone())?;
            Ok::<_, InspectionError>(report)
        })?;

        info!(report_id = %report_id, actor = %actor, "inspection report submitted");
        Ok(report)
    }

    /// Save revised findings: responses are upserted per item, the score is recomputed over
    /// the resulting response set, violations are replaced wholesale, and the report returns
    /// to draft.
    pub fn revise_report(
        &self,
        report_id: ReportId,
        actor: ActorId,
        findings: FindingsInput,
        at: DateTime<Utc>,
    ) -> Result<InspectionReport, InspectionError> {
        let catalog = self.catalog()?;
        let guard = self.guard;
        let engine = self.engine;

        let result = self.repository.transaction(|uow| {
            let mut report = editable_report(uow, report_id, actor)?;
            let findings = guard.findings(findings, report.inspection_date, &catalog)?;

            for draft in &findings.responses {
                uow.upsert_response(draft.attach(report_id))?;
            }
            let responses = uow.responses(report_id)?;
            let score = engine.compute_score(
                responses
                    .iter()
                    .map(|response| (response.compliance_status, response.score)),
            );

            report.overall_compliance_score = score.overall_score;
            report.risk_assessment = score.risk_assessment;
            report.fire_hazard_level = score.fire_hazard_level;
            report.recommendations = findings.recommendations.clone();
            report.corrective_actions = findings.corrective_actions.clone();
            report.compliance_deadline = findings.compliance_deadline;
            report.status = ReportStatus::Draft;
            report.updated_at = at;
            uow.update_report(report.clone())?;

            let removed = uow.delete_violations(report_id)?;
            for draft in &findings.violations {
                uow.insert_violation(report_id, draft, at)?;
            }
            debug!(
                report_id = %report_id,
                removed,
                recorded = findings.violations.len(),
                "violations replaced"
            );

            let mut establishment = uow
                .establishment(report.establishment_id)?
                .ok_or(NotFound::Establishment(report.establishment_id))?;
            establishment.compliance_rating = Some(score.overall_score);
            establishment.overall_risk_level = Some(score.risk_assessment);
            uow.update_establishment(establishment)?;

            Ok::<_, InspectionError>(report)
        });

        match result {
            Ok(report) => {
                info!(
                    report_id = %report_id,
                    actor = %actor,
                    score = report.overall_compliance_score,
                    "inspection report revised"
                );
                Ok(report)
            }
            Err(error) => {
                warn!(report_id = %report_id, error = %error, "inspection revision rolled back");
                Err(error)
            }
        }
    }

    /// Manually move a violation along its lifecycle. The parent report is untouched.
    pub fn update_violation_status(
        &self,
        update: ViolationStatusUpdate,
        at: DateTime<Utc>,
    ) -> Result<Violation, InspectionError> {
        let violation_id = update.violation_id;
        let violation = self.repository.transaction(|uow| {
            let mut violation = uow
                .violation(violation_id)?
                .ok_or(NotFound::Violation(violation_id))?;
            apply_status_update(&mut violation, &update, at).map_err(|closed| {
                StateConflict::ViolationClosed {
                    violation_id,
                    status: closed.status,
                }
            })?;
            uow.update_violation(violation.clone())?;
            Ok::<_, InspectionError>(violation)
        })?;

        info!(
            violation_id = %violation_id,
            actor = %update.actor,
            status = violation.status.label(),
            "violation status updated"
        );
        Ok(violation)
    }

    /// Validate an upload and persist it, returning the reference to pass to
    /// [`Self::update_violation_status`].
    pub fn store_evidence<S>(
        &self,
        store: &S,
        violation_id: ViolationId,
        upload: EvidenceUpload,
    ) -> Result<EvidenceRef, InspectionError>
    where
        S: EvidenceStore + ?Sized,
    {
        if self.repository.violation(violation_id)?.is_none() {
            return Err(NotFound::Violation(violation_id).into());
        }
        let evidence = EvidenceValidator::new(self.config.evidence_max_bytes).validate(upload)?;
        let reference = store.store(violation_id, evidence)?;
        debug!(violation_id = %violation_id, evidence = %reference.0, "evidence stored");
        Ok(reference)
    }

    pub fn report_details(&self, report_id: ReportId) -> Result<ReportDetails, InspectionError> {
        let report = self
            .repository
            .report(report_id)?
            .ok_or(NotFound::Report(report_id))?;
        let establishment = self
            .repository
            .establishment(report.establishment_id)?
            .ok_or(NotFound::Establishment(report.establishment_id))?;

        let catalog = self.catalog()?;
        let mut responses: Vec<ResponseDetail> = self
            .repository
            .responses(report_id)?
            .into_iter()
            .map(|response| {
                let item = match catalog.get(response.checklist_item_id) {
                    Some(item) => item.clone(),
                    None => {
                        warn!(
                            report_id = %report_id,
                            checklist_item_id = %response.checklist_item_id,
                            "scored response references an item missing from the catalog"
                        );
                        uncatalogued_item(response.checklist_item_id)
                    }
                };
                ResponseDetail { response, item }
            })
            .collect();
        responses.sort_by(|a, b| {
            a.item
                .category
                .cmp(&b.item.category)
                .then_with(|| a.item.code.cmp(&b.item.code))
        });

        let mut violations: Vec<Violation> = self
            .repository
            .violations()?
            .into_iter()
            .filter(|violation| violation.report_id == report_id)
            .collect();
        violations.sort_by(|a, b| match b.severity.cmp(&a.severity) {
            Ordering::Equal => a.code.cmp(&b.code),
            other => other,
        });

        Ok(ReportDetails {
            report,
            establishment,
            responses,
            violations,
        })
    }

    pub fn establishments_due(
        &self,
        filter: &EstablishmentFilter,
        today: NaiveDate,
    ) -> Result<Vec<EstablishmentDue>, InspectionError> {
        Ok(establishments_due(
            self.repository.establishments()?,
            filter,
            today,
            self.config.upcoming_days,
        ))
    }

    pub fn reports(&self, filter: &ReportFilter) -> Result<Vec<ReportSummary>, InspectionError> {
        let establishments = self.establishment_index()?;
        Ok(reports_matching(
            self.repository.reports()?,
            &establishments,
            filter,
        ))
    }

    pub fn violations(
        &self,
        filter: &ViolationFilter,
        as_of: NaiveDate,
    ) -> Result<Vec<ViolationListing>, InspectionError> {
        let establishments = self.establishment_index()?;
        let reports = self.report_index()?;
        Ok(violations_matching(
            self.repository.violations()?,
            &reports,
            &establishments,
            filter,
            as_of,
            self.config.due_soon_days,
        ))
    }

    pub fn violation_statistics(
        &self,
        inspector: Option<ActorId>,
        as_of: NaiveDate,
    ) -> Result<ViolationStatistics, InspectionError> {
        let reports = self.report_index()?;
        let violations = self.repository.violations()?;
        let scoped = violations.iter().filter(|violation| match inspector {
            Some(actor) => reports
                .get(&violation.report_id)
                .is_some_and(|report| report.inspected_by == actor),
            None => true,
        });
        Ok(ViolationStatistics::tally(scoped, as_of))
    }

    pub fn report_statistics(
        &self,
        inspector: Option<ActorId>,
    ) -> Result<ReportStatistics, InspectionError> {
        let reports = self.repository.reports()?;
        let scoped = reports
            .iter()
            .filter(|report| inspector.map_or(true, |actor| report.inspected_by == actor));
        Ok(ReportStatistics::tally(scoped))
    }

    fn establishment_index(
        &self,
    ) -> Result<BTreeMap<EstablishmentId, Establishment>, RepositoryError> {
        Ok(self
            .repository
            .establishments()?
            .into_iter()
            .map(|establishment| (establishment.id, establishment))
            .collect())
    }

    fn report_index(&self) -> Result<BTreeMap<ReportId, InspectionReport>, RepositoryError> {
        Ok(self
            .repository
            .reports()?
            .into_iter()
            .map(|report| (report.id, report))
            .collect())
    }
}

fn persist_new_report(
    uow: &mut dyn InspectionUnitOfWork,
    inspector: ActorId,
    establishment_id: EstablishmentId,
    header: InspectionHeader,
    findings: &ValidatedFindings,
    score: ScoreOutcome,
    at: DateTime<Utc>,
) -> Result<CreatedReport, InspectionError> {
    let mut establishment = uow
        .establishment(establishment_id)?
        .ok_or(NotFound::Establishment(establishment_id))?;

    let issued_on = at.date_naive();
    let sequence = uow.next_report_sequence(issued_on)?;
    let report = uow.insert_report(NewReport {
        report_number: report_number(issued_on, sequence),
        establishment_id,
        inspection_date: header.inspection_date,
        inspected_by: inspector,
        inspection_type: header.inspection_type,
        score,
        recommendations: findings.recommendations.clone(),
        corrective_actions: findings.corrective_actions.clone(),
        compliance_deadline: findings.compliance_deadline,
        created_at: at,
    })?;

    for draft in &findings.responses {
        uow.upsert_response(draft.attach(report.id))?;
    }
    for draft in &findings.violations {
        uow.insert_violation(report.id, draft, at)?;
    }

    establishment.last_inspection_date = Some(header.inspection_date);
    establishment.next_scheduled_inspection = Some(next_due_date(
        establishment.inspection_frequency,
        header.inspection_date,
    ));
    establishment.compliance_rating = Some(score.overall_score);
    establishment.overall_risk_level = Some(score.risk_assessment);
    uow.update_establishment(establishment)?;

    Ok(CreatedReport {
        report_id: report.id,
        report_number: report.report_number,
        overall_compliance_score: score.overall_score,
        risk_assessment: score.risk_assessment,
    })
}

/// Stand-in for a response whose checklist item has since left the catalog, so the report
/// still shows every scored response.
fn uncatalogued_item(id: ChecklistItemId) -> ChecklistItem {
    ChecklistItem {
        id,
        code: format!("#{id}"),
        description: "Item no longer in the checklist catalog".to_string(),
        category: UNCATALOGUED_CATEGORY.to_string(),
        compliance_standard: None,
        active: false,
    }
}

/// Load a report the actor may still edit.
fn editable_report(
    uow: &mut dyn InspectionUnitOfWork,
    report_id: ReportId,
    actor: ActorId,
) -> Result<InspectionReport, InspectionError> {
    let report = uow.report(report_id)?.ok_or(NotFound::Report(report_id))?;
    if report.inspected_by != actor {
        return Err(StateConflict::NotOwned { report_id, actor }.into());
    }
    if !report.status.is_editable() {
        return Err(StateConflict::NotModifiable {
            report_id,
            status: report.status,
        }
        .into());
    }
    Ok(report)
}
