use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    ActorId, Establishment, EstablishmentId, InspectionReport, ReportId, ReportStatus, Violation,
    ViolationSeverity, ViolationStatus,
};
use super::scheduling::{schedule_status, ScheduleStatus};
use super::violations::{classify_deadline_within, DeadlineClass};

/// Filter for establishments needing inspection. Only active establishments are listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstablishmentFilter {
    /// Matched against name, owner, and address.
    pub search: Option<String>,
    pub barangay: Option<String>,
    pub category: Option<String>,
    pub status: Option<ScheduleStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstablishmentDue {
    pub establishment: Establishment,
    pub schedule_status: ScheduleStatus,
    /// Negative when the inspection is overdue.
    pub days_until_due: Option<i64>,
}

pub fn establishments_due(
    establishments: Vec<Establishment>,
    filter: &EstablishmentFilter,
    today: NaiveDate,
    upcoming_window_days: i64,
) -> Vec<EstablishmentDue> {
    let search = needle(&filter.search);
    let mut listed: Vec<EstablishmentDue> = establishments
        .into_iter()
        .filter(|establishment| establishment.active)
        .filter(|establishment| {
            search.as_deref().map_or(true, |needle| {
                contains(&establishment.name, needle)
                    || contains(&establishment.owner_name, needle)
                    || contains(&establishment.address, needle)
            })
        })
        .filter(|establishment| matches_exact(&filter.barangay, &establishment.barangay))
        .filter(|establishment| matches_exact(&filter.category, &establishment.category))
        .map(|establishment| {
            let next = establishment.next_scheduled_inspection;
            EstablishmentDue {
                schedule_status: schedule_status(next, today, upcoming_window_days),
                days_until_due: next.map(|date| (date - today).num_days()),
                establishment,
            }
        })
        .filter(|due| filter.status.map_or(true, |status| due.schedule_status == status))
        .collect();

    listed.sort_by(|a, b| {
        let by_date = match (
            a.establishment.next_scheduled_inspection,
            b.establishment.next_scheduled_inspection,
        ) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| a.establishment.name.cmp(&b.establishment.name))
    });
    listed
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub inspector: Option<ActorId>,
    /// Empty means any status.
    pub statuses: Vec<ReportStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Matched against establishment name, report number, and owner.
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub report: InspectionReport,
    pub establishment_name: String,
    pub owner_name: String,
}

/// Reports matching `filter`, newest inspection first.
pub fn reports_matching(
    reports: Vec<InspectionReport>,
    establishments: &BTreeMap<EstablishmentId, Establishment>,
    filter: &ReportFilter,
) -> Vec<ReportSummary> {
    let search = needle(&filter.search);
    let mut listed: Vec<ReportSummary> = reports
        .into_iter()
        .filter(|report| filter.inspector.map_or(true, |id| report.inspected_by == id))
        .filter(|report| filter.statuses.is_empty() || filter.statuses.contains(&report.status))
        .filter(|report| filter.from.map_or(true, |from| report.inspection_date >= from))
        .filter(|report| filter.to.map_or(true, |to| report.inspection_date <= to))
        .map(|report| {
            let (establishment_name, owner_name) = establishments
                .get(&report.establishment_id)
                .map(|e| (e.name.clone(), e.owner_name.clone()))
                .unwrap_or_default();
            ReportSummary {
                report,
                establishment_name,
                owner_name,
            }
        })
        .filter(|summary| {
            search.as_deref().map_or(true, |needle| {
                contains(&summary.establishment_name, needle)
                    || contains(&summary.report.report_number, needle)
                    || contains(&summary.owner_name, needle)
            })
        })
        .collect();

    listed.sort_by(|a, b| {
        b.report
            .inspection_date
            .cmp(&a.report.inspection_date)
            .then_with(|| b.report.created_at.cmp(&a.report.created_at))
    });
    listed
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationFilter {
    pub status: Option<ViolationStatus>,
    pub severity: Option<ViolationSeverity>,
    /// Bounds on the creation date, inclusive.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Matched against establishment name, report number, code, and description.
    pub search: Option<String>,
    pub inspector: Option<ActorId>,
}

/// A violation joined with its report and establishment for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationListing {
    pub violation: Violation,
    pub report_number: String,
    pub inspected_by: ActorId,
    pub establishment_id: EstablishmentId,
    pub establishment_name: String,
    pub deadline_class: Option<DeadlineClass>,
}

pub fn violations_matching(
    violations: Vec<Violation>,
    reports: &BTreeMap<ReportId, InspectionReport>,
    establishments: &BTreeMap<EstablishmentId, Establishment>,
    filter: &ViolationFilter,
    as_of: NaiveDate,
    due_soon_days: i64,
) -> Vec<ViolationListing> {
    let search = needle(&filter.search);
    let mut listed: Vec<ViolationListing> = violations
        .into_iter()
        .filter(|violation| filter.status.map_or(true, |status| violation.status == status))
        .filter(|violation| filter.severity.map_or(true, |level| violation.severity == level))
        .filter(|violation| {
            let created = violation.created_at.date_naive();
            filter.from.map_or(true, |from| created >= from)
                && filter.to.map_or(true, |to| created <= to)
        })
        .filter_map(|violation| {
            let report = reports.get(&violation.report_id)?;
            let establishment_name = establishments
                .get(&report.establishment_id)
                .map(|e| e.name.clone())
                .unwrap_or_default();
            Some(ViolationListing {
                deadline_class: classify_deadline_within(
                    violation.compliance_deadline,
                    as_of,
                    due_soon_days,
                ),
                report_number: report.report_number.clone(),
                inspected_by: report.inspected_by,
                establishment_id: report.establishment_id,
                establishment_name,
                violation,
            })
        })
        .filter(|listing| filter.inspector.map_or(true, |id| listing.inspected_by == id))
        .filter(|listing| {
            search.as_deref().map_or(true, |needle| {
                contains(&listing.establishment_name, needle)
                    || contains(&listing.report_number, needle)
                    || contains(&listing.violation.code, needle)
                    || contains(&listing.violation.description, needle)
            })
        })
        .collect();

    listed.sort_by(|a, b| violation_order(&a.violation, &b.violation));
    listed
}

/// Severity critical first, then pending, overdue, rectified, others; earliest deadline
/// first with undated last; newest first.
pub fn violation_order(a: &Violation, b: &Violation) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| status_rank(a.status).cmp(&status_rank(b.status)))
        .then_with(|| match (a.compliance_deadline, b.compliance_deadline) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

fn status_rank(status: ViolationStatus) -> u8 {
    match status {
        ViolationStatus::Pending => 0,
        ViolationStatus::Overdue => 1,
        ViolationStatus::Rectified => 2,
        ViolationStatus::Escalated | ViolationStatus::Waived => 3,
    }
}

fn needle(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_exact(wanted: &Option<String>, value: &str) -> bool {
    match wanted.as_deref().map(str::trim) {
        Some(wanted) if !wanted.is_empty() => value.eq_ignore_ascii_case(wanted),
        _ => true,
    }
}
