//! Inspection lifecycle: checklist scoring, re-inspection scheduling, the report state
//! machine, and violation tracking.
//!
//! `InspectionService` is the entry point. It validates form input through the boundary
//! guard, scores responses, and persists each report together with its responses, violations,
//! and establishment update in a single repository transaction.

pub mod catalog;
pub mod domain;
pub mod evidence;
pub mod memory;
pub mod query;
pub mod repository;
pub mod router;
pub mod scheduling;
pub mod scoring;
pub mod service;
pub mod statistics;
pub(crate) mod validation;
pub mod violations;

#[cfg(test)]
mod tests;

pub use catalog::{ChecklistCatalog, ChecklistSection};
pub use domain::{
    ActorId, ChecklistItem, ChecklistItemId, ChecklistResponse, ComplianceStatus, Establishment,
    EstablishmentId, EvidenceRef, FindingsInput, InspectionFrequency, InspectionReport,
    InspectionSubmission, InspectionType, NoteEntry, ReportId, ReportStatus, ResponseInput,
    RiskLevel, Violation, ViolationId, ViolationInput, ViolationSeverity, ViolationStatus,
};
pub use evidence::{
    EvidenceError, EvidenceStore, EvidenceUpload, EvidenceValidator, MemoryEvidenceStore,
};
pub use memory::MemoryInspectionStore;
pub use query::{
    EstablishmentDue, EstablishmentFilter, ReportFilter, ReportSummary, ViolationFilter,
    ViolationListing,
};
pub use repository::{InspectionRepository, InspectionUnitOfWork, NewReport, RepositoryError};
pub use router::inspection_router;
pub use scheduling::{next_due_date, schedule_status, ScheduleStatus};
pub use scoring::{classify_score, ScoreOutcome, ScoringEngine};
pub use service::{
    CreatedReport, InspectionError, InspectionService, NotFound, ReportDetails, ResponseDetail,
    StateConflict,
};
pub use statistics::{ReportStatistics, ViolationStatistics};
pub use validation::ValidationError;
pub use violations::{classify_deadline, DeadlineClass, ViolationStatusUpdate};
