use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for inspected establishments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EstablishmentId(pub u64);

/// Identifier wrapper for checklist catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChecklistItemId(pub u64);

/// Identifier wrapper for inspection reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportId(pub u64);

/// Identifier wrapper for recorded violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ViolationId(pub u64);

/// The pre-authorized user performing an operation (inspector or reviewer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

macro_rules! display_id {
    ($($id:ty),*) => {
        $(impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        })*
    };
}

display_id!(EstablishmentId, ChecklistItemId, ReportId, ViolationId, ActorId);

/// How often an establishment must be re-inspected.
///
/// Values outside the known table are kept as `Unrecognized` rather than rejected so that
/// registry data written by other systems still schedules (on the annual default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionFrequency {
    Monthly,
    Quarterly,
    #[serde(rename = "semi-annual")]
    SemiAnnual,
    Annual,
    Biannual,
    #[serde(other)]
    Unrecognized,
}

impl InspectionFrequency {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" => Self::Monthly,
            "quarterly" => Self::Quarterly,
            "semi-annual" | "semi_annual" => Self::SemiAnnual,
            "annual" => Self::Annual,
            "biannual" => Self::Biannual,
            _ => Self::Unrecognized,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SemiAnnual => "semi-annual",
            Self::Annual => "annual",
            Self::Biannual => "biannual",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Coarse risk classification shared by risk assessment and fire hazard level.
///
/// Scoring never yields `Critical`; the variant exists because establishment records carry
/// it from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment {
    pub id: EstablishmentId,
    pub name: String,
    pub category: String,
    pub address: String,
    pub barangay: String,
    pub owner_name: String,
    pub owner_contact: Option<String>,
    pub inspection_frequency: InspectionFrequency,
    pub last_inspection_date: Option<NaiveDate>,
    pub next_scheduled_inspection: Option<NaiveDate>,
    pub compliance_rating: Option<u8>,
    pub overall_risk_level: Option<RiskLevel>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub code: String,
    pub description: String,
    pub category: String,
    pub compliance_standard: Option<String>,
    pub active: bool,
}

/// Observed compliance for a single checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Partial,
    NotApplicable,
}

impl ComplianceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::NonCompliant => "non_compliant",
            Self::Partial => "partial",
            Self::NotApplicable => "not_applicable",
        }
    }

    pub const fn is_scored(self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistResponse {
    pub report_id: ReportId,
    pub checklist_item_id: ChecklistItemId,
    pub compliance_status: ComplianceStatus,
    pub score: u8,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionType {
    Routine,
    FollowUp,
    Complaint,
    Random,
    #[serde(rename = "pre-license")]
    PreLicense,
    Renewal,
}

impl InspectionType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::FollowUp => "follow_up",
            Self::Complaint => "complaint",
            Self::Random => "random",
            Self::PreLicense => "pre-license",
            Self::Renewal => "renewal",
        }
    }
}

/// Report lifecycle states. `Approved`, `Rejected`, and `RevisionRequested` are written by the
/// external reviewer; the engine only reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Draft,
    RevisionRequested,
    Submitted,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "revision_requested" => Some(Self::RevisionRequested),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::RevisionRequested => "revision_requested",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Inspector-side edits (submit, revise) are only legal from these states.
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::RevisionRequested)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub id: ReportId,
    pub report_number: String,
    pub establishment_id: EstablishmentId,
    pub inspection_date: NaiveDate,
    pub inspected_by: ActorId,
    pub inspection_type: InspectionType,
    pub status: ReportStatus,
    pub overall_compliance_score: u8,
    pub risk_assessment: RiskLevel,
    pub fire_hazard_level: RiskLevel,
    pub recommendations: Option<String>,
    pub corrective_actions: Option<String>,
    pub compliance_deadline: Option<NaiveDate>,
    pub reviewer_notes: Option<String>,
    pub reviewed_by: Option<ActorId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Minor,
    Major,
    Critical,
}

impl ViolationSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationStatus {
    Pending,
    Rectified,
    Overdue,
    Escalated,
    Waived,
}

impl ViolationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Rectified => "rectified",
            Self::Overdue => "overdue",
            Self::Escalated => "escalated",
            Self::Waived => "waived",
        }
    }

    /// Rectified and waived violations are closed.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rectified | Self::Waived)
    }
}

/// Reference to evidence persisted by the evidence store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceRef(pub String);

/// One entry in a violation's append-only note log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub recorded_at: DateTime<Utc>,
    pub author: ActorId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: ViolationId,
    pub report_id: ReportId,
    pub code: String,
    pub description: String,
    pub severity: ViolationSeverity,
    pub section: Option<String>,
    pub fine_amount: Option<f64>,
    pub compliance_deadline: Option<NaiveDate>,
    pub status: ViolationStatus,
    pub rectified_at: Option<DateTime<Utc>>,
    pub rectified_by: Option<ActorId>,
    pub evidence: Option<EvidenceRef>,
    pub notes: Vec<NoteEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inspector-entered observation for one checklist item, prior to validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInput {
    pub status: ComplianceStatus,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Inspector-entered violation row, prior to validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViolationInput {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Option<ViolationSeverity>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub fine: Option<f64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

/// Findings captured on the inspection form. Shared by creation and revision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FindingsInput {
    #[serde(default)]
    pub recommendations: Option<String>,
    #[serde(default)]
    pub corrective_actions: Option<String>,
    #[serde(default)]
    pub compliance_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub checklist_responses: BTreeMap<ChecklistItemId, ResponseInput>,
    #[serde(default)]
    pub violations: Vec<ViolationInput>,
}

/// Payload for creating a new inspection report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionSubmission {
    pub establishment_id: EstablishmentId,
    #[serde(default)]
    pub inspection_date: Option<NaiveDate>,
    #[serde(default)]
    pub inspection_type: Option<InspectionType>,
    #[serde(default)]
    pub findings: FindingsInput,
}

/// A checklist response that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDraft {
    pub checklist_item_id: ChecklistItemId,
    pub compliance_status: ComplianceStatus,
    pub score: u8,
    pub notes: Option<String>,
}

impl ResponseDraft {
    pub fn attach(&self, report_id: ReportId) -> ChecklistResponse {
        ChecklistResponse {
            report_id,
            checklist_item_id: self.checklist_item_id,
            compliance_status: self.compliance_status,
            score: self.score,
            notes: self.notes.clone(),
        }
    }
}

/// A violation row that passed boundary validation; always recorded as `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationDraft {
    pub code: String,
    pub description: String,
    pub severity: ViolationSeverity,
    pub section: Option<String>,
    pub fine_amount: Option<f64>,
    pub compliance_deadline: Option<NaiveDate>,
}

/// Validated findings ready for persistence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedFindings {
    pub recommendations: Option<String>,
    pub corrective_actions: Option<String>,
    pub compliance_deadline: Option<NaiveDate>,
    pub responses: Vec<ResponseDraft>,
    pub violations: Vec<ViolationDraft>,
}
