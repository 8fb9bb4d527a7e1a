use chrono::NaiveDate;

use super::catalog::ChecklistCatalog;
use super::domain::{
    ChecklistItemId, Establishment, EstablishmentId, FindingsInput, InspectionSubmission,
    InspectionType, ResponseDraft, ValidatedFindings, ViolationDraft, ViolationInput,
    ViolationSeverity,
};

/// Validation errors raised at the boundary, before anything is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("inspection date is required")]
    MissingInspectionDate,
    #[error("inspection type is required")]
    MissingInspectionType,
    #[error("establishment {0} is inactive")]
    InactiveEstablishment(EstablishmentId),
    #[error("checklist item {0} does not exist")]
    UnknownChecklistItem(ChecklistItemId),
    #[error("checklist item {0} is no longer active")]
    InactiveChecklistItem(ChecklistItemId),
    #[error("score for checklist item {item} must be between 0 and 100 (found {score})")]
    ScoreOutOfRange { item: ChecklistItemId, score: i32 },
    #[error("violation row {row} is missing its {field}")]
    IncompleteViolation { row: usize, field: &'static str },
    #[error("violation row {row} has an invalid fine amount")]
    InvalidFine { row: usize },
    #[error("compliance deadline {deadline} precedes inspection date {inspection_date}")]
    DeadlineBeforeInspection {
        deadline: NaiveDate,
        inspection_date: NaiveDate,
    },
}

/// Header fields of a new inspection once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectionHeader {
    pub inspection_date: NaiveDate,
    pub inspection_type: InspectionType,
}

/// Guard turning raw form input into validated findings.
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectionGuard;

impl InspectionGuard {
    pub fn header(
        &self,
        submission: &InspectionSubmission,
    ) -> Result<InspectionHeader, ValidationError> {
        let inspection_date = submission
            .inspection_date
            .ok_or(ValidationError::MissingInspectionDate)?;
        let inspection_type = submission
            .inspection_type
            .ok_or(ValidationError::MissingInspectionType)?;
        Ok(InspectionHeader {
            inspection_date,
            inspection_type,
        })
    }

    pub fn establishment(&self, establishment: &Establishment) -> Result<(), ValidationError> {
        if establishment.active {
            Ok(())
        } else {
            Err(ValidationError::InactiveEstablishment(establishment.id))
        }
    }

    /// Validate checklist responses and violation rows against the catalog.
    ///
    /// Violation rows with both code and description blank are dropped as empty form rows.
    pub fn findings(
        &self,
        findings: FindingsInput,
        inspection_date: NaiveDate,
        catalog: &ChecklistCatalog,
    ) -> Result<ValidatedFindings, ValidationError> {
        if let Some(deadline) = findings.compliance_deadline {
            check_deadline(deadline, inspection_date)?;
        }

        let mut responses = Vec::with_capacity(findings.checklist_responses.len());
        for (item_id, input) in findings.checklist_responses {
            let item = catalog
                .get(item_id)
                .ok_or(ValidationError::UnknownChecklistItem(item_id))?;
            if !item.active {
                return Err(ValidationError::InactiveChecklistItem(item_id));
            }
            let score = u8::try_from(input.score)
                .ok()
                .filter(|score| *score <= 100)
                .ok_or(ValidationError::ScoreOutOfRange {
                    item: item_id,
                    score: input.score,
                })?;
            responses.push(ResponseDraft {
                checklist_item_id: item_id,
                compliance_status: input.status,
                score,
                notes: non_blank(input.notes),
            });
        }

        let mut violations = Vec::new();
        for (row, input) in findings.violations.into_iter().enumerate() {
            if let Some(draft) = violation_row(row, input, inspection_date)? {
                violations.push(draft);
            }
        }

        Ok(ValidatedFindings {
            recommendations: non_blank(findings.recommendations),
            corrective_actions: non_blank(findings.corrective_actions),
            compliance_deadline: findings.compliance_deadline,
            responses,
            violations,
        })
    }
}

fn violation_row(
    row: usize,
    input: ViolationInput,
    inspection_date: NaiveDate,
) -> Result<Option<ViolationDraft>, ValidationError> {
    let code = input.code.trim();
    let description = input.description.trim();
    match (code.is_empty(), description.is_empty()) {
        (true, true) => return Ok(None),
        (true, false) => return Err(ValidationError::IncompleteViolation { row, field: "code" }),
        (false, true) => {
            return Err(ValidationError::IncompleteViolation {
                row,
                field: "description",
            })
        }
        (false, false) => {}
    }

    if let Some(fine) = input.fine {
        if !fine.is_finite() || fine < 0.0 {
            return Err(ValidationError::InvalidFine { row });
        }
    }
    if let Some(deadline) = input.deadline {
        check_deadline(deadline, inspection_date)?;
    }

    Ok(Some(ViolationDraft {
        code: code.to_string(),
        description: description.to_string(),
        severity: input.severity.unwrap_or(ViolationSeverity::Minor),
        section: non_blank(input.section),
        fine_amount: input.fine,
        compliance_deadline: input.deadline,
    }))
}

fn check_deadline(deadline: NaiveDate, inspection_date: NaiveDate) -> Result<(), ValidationError> {
    if deadline < inspection_date {
        return Err(ValidationError::DeadlineBeforeInspection {
            deadline,
            inspection_date,
        });
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
