use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    ActorId, ChecklistItem, ChecklistResponse, Establishment, EstablishmentId, InspectionReport,
    InspectionType, ReportId, Violation, ViolationDraft, ViolationId,
};
use super::scoring::ScoreOutcome;

/// Fields of a report row before the store assigns its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub report_number: String,
    pub establishment_id: EstablishmentId,
    pub inspection_date: NaiveDate,
    pub inspected_by: ActorId,
    pub inspection_type: InspectionType,
    pub score: ScoreOutcome,
    pub recommendations: Option<String>,
    pub corrective_actions: Option<String>,
    pub compliance_deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Read access plus transactional writes for the inspection tables.
///
/// Reads outside a transaction see committed state only.
pub trait InspectionRepository: Send + Sync {
    fn checklist_items(&self) -> Result<Vec<ChecklistItem>, RepositoryError>;
    fn establishment(&self, id: EstablishmentId) -> Result<Option<Establishment>, RepositoryError>;
    fn establishments(&self) -> Result<Vec<Establishment>, RepositoryError>;
    fn report(&self, id: ReportId) -> Result<Option<InspectionReport>, RepositoryError>;
    fn reports(&self) -> Result<Vec<InspectionReport>, RepositoryError>;
    fn responses(&self, report_id: ReportId) -> Result<Vec<ChecklistResponse>, RepositoryError>;
    fn violation(&self, id: ViolationId) -> Result<Option<Violation>, RepositoryError>;
    fn violations(&self) -> Result<Vec<Violation>, RepositoryError>;

    /// Run `work` as one all-or-nothing unit. Any `Err` returned by `work` discards every write
    /// it made.
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn InspectionUnitOfWork) -> Result<T, E>,
        E: From<RepositoryError>;
}

/// Operations available inside a transaction.
pub trait InspectionUnitOfWork {
    fn establishment(&self, id: EstablishmentId) -> Result<Option<Establishment>, RepositoryError>;
    fn report(&self, id: ReportId) -> Result<Option<InspectionReport>, RepositoryError>;
    fn responses(&self, report_id: ReportId) -> Result<Vec<ChecklistResponse>, RepositoryError>;
    fn violation(&self, id: ViolationId) -> Result<Option<Violation>, RepositoryError>;

    /// Next free per-day sequence number for report numbers issued on `date`.
    fn next_report_sequence(&self, date: NaiveDate) -> Result<u32, RepositoryError>;

    /// Fails with `Conflict` when the report number is already taken.
    fn insert_report(&mut self, report: NewReport) -> Result<InspectionReport, RepositoryError>;
    fn update_report(&mut self, report: InspectionReport) -> Result<(), RepositoryError>;
    fn upsert_response(&mut self, response: ChecklistResponse) -> Result<(), RepositoryError>;
    fn insert_violation(
        &mut self,
        report_id: ReportId,
        draft: &ViolationDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Violation, RepositoryError>;
    fn update_violation(&mut self, violation: Violation) -> Result<(), RepositoryError>;
    /// Returns the number of violations removed.
    fn delete_violations(&mut self, report_id: ReportId) -> Result<usize, RepositoryError>;
    fn update_establishment(&mut self, establishment: Establishment) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("transaction failed: {0}")]
    Transaction(String),
}

impl RepositoryError {
    /// Infrastructure failures roll back cleanly and may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Transaction(_))
    }
}
