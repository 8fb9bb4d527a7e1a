use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ActorId, EvidenceRef, NoteEntry, Violation, ViolationId, ViolationStatus};

/// Days ahead of a deadline that count as "due soon".
pub const DUE_SOON_WINDOW_DAYS: i64 = 7;

/// Derived urgency of a violation deadline. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "days", rename_all = "snake_case")]
pub enum DeadlineClass {
    Overdue,
    DueToday,
    DueSoon(i64),
    Scheduled,
}

impl DeadlineClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::DueToday => "due_today",
            Self::DueSoon(_) => "due_soon",
            Self::Scheduled => "scheduled",
        }
    }

    /// Short human form used on listings ("Overdue", "Today", "3 days", or the date).
    pub fn display(self, deadline: NaiveDate) -> String {
        match self {
            Self::Overdue => "Overdue".to_string(),
            Self::DueToday => "Today".to_string(),
            Self::DueSoon(1) => "1 day".to_string(),
            Self::DueSoon(days) => format!("{days} days"),
            Self::Scheduled => deadline.format("%b %d, %Y").to_string(),
        }
    }
}

pub fn classify_deadline(deadline: Option<NaiveDate>, as_of: NaiveDate) -> Option<DeadlineClass> {
    classify_deadline_within(deadline, as_of, DUE_SOON_WINDOW_DAYS)
}

pub fn classify_deadline_within(
    deadline: Option<NaiveDate>,
    as_of: NaiveDate,
    due_soon_days: i64,
) -> Option<DeadlineClass> {
    let remaining = (deadline? - as_of).num_days();
    Some(match remaining {
        days if days < 0 => DeadlineClass::Overdue,
        0 => DeadlineClass::DueToday,
        days if days <= due_soon_days => DeadlineClass::DueSoon(days),
        _ => DeadlineClass::Scheduled,
    })
}

impl Violation {
    pub fn deadline_class(&self, as_of: NaiveDate) -> Option<DeadlineClass> {
        classify_deadline(self.compliance_deadline, as_of)
    }
}

/// Manual status change requested by an inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationStatusUpdate {
    pub violation_id: ViolationId,
    pub status: ViolationStatus,
    pub actor: ActorId,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub evidence: Option<EvidenceRef>,
}

/// Raised when a closed violation is asked to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedViolation {
    pub status: ViolationStatus,
}

/// Apply an update in place. Rectification stamps time and actor; non-blank notes append.
pub fn apply_status_update(
    violation: &mut Violation,
    update: &ViolationStatusUpdate,
    at: DateTime<Utc>,
) -> Result<(), ClosedViolation> {
    if violation.status.is_terminal() {
        return Err(ClosedViolation {
            status: violation.status,
        });
    }

    violation.status = update.status;
    if update.status == ViolationStatus::Rectified {
        violation.rectified_at = Some(at);
        violation.rectified_by = Some(update.actor);
    }
    if let Some(text) = update
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        violation.notes.push(NoteEntry {
            recorded_at: at,
            author: update.actor,
            text: text.to_string(),
        });
    }
    if let Some(evidence) = &update.evidence {
        violation.evidence = Some(evidence.clone());
    }
    violation.updated_at = at;
    Ok(())
}
