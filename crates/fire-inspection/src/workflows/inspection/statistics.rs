use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    InspectionReport, ReportStatus, RiskLevel, Violation, ViolationSeverity, ViolationStatus,
};

/// Violation counters shown on the tracking dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViolationStatistics {
    pub total: usize,
    pub pending: usize,
    pub rectified: usize,
    pub overdue: usize,
    pub escalated: usize,
    pub waived: usize,
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
    pub total_fines: f64,
    /// Fines attached to rectified violations.
    pub collected_fines: f64,
    /// Open violations whose deadline has already passed, whatever their stored status.
    pub past_deadline: usize,
}

impl ViolationStatistics {
    pub fn tally<'a, I>(violations: I, as_of: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Violation>,
    {
        let mut stats = Self::default();
        for violation in violations {
            stats.total += 1;
            match violation.status {
                ViolationStatus::Pending => stats.pending += 1,
                ViolationStatus::Rectified => stats.rectified += 1,
                ViolationStatus::Overdue => stats.overdue += 1,
                ViolationStatus::Escalated => stats.escalated += 1,
                ViolationStatus::Waived => stats.waived += 1,
            }
            match violation.severity {
                ViolationSeverity::Critical => stats.critical += 1,
                ViolationSeverity::Major => stats.major += 1,
                ViolationSeverity::Minor => stats.minor += 1,
            }

            let fine = violation.fine_amount.unwrap_or(0.0);
            stats.total_fines += fine;
            if violation.status == ViolationStatus::Rectified {
                stats.collected_fines += fine;
            }

            let lapsed = violation
                .compliance_deadline
                .is_some_and(|deadline| deadline < as_of);
            if lapsed && !violation.status.is_terminal() {
                stats.past_deadline += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStatistics {
    pub total: usize,
    pub draft: usize,
    pub revision_requested: usize,
    pub submitted: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Mean compliance score rounded to one decimal; absent when there are no reports.
    pub average_compliance: Option<f64>,
    pub high_risk: usize,
}

impl ReportStatistics {
    pub fn tally<'a, I>(reports: I) -> Self
    where
        I: IntoIterator<Item = &'a InspectionReport>,
    {
        let mut stats = Self::default();
        let mut score_sum = 0u64;
        for report in reports {
            stats.total += 1;
            match report.status {
                ReportStatus::Draft => stats.draft += 1,
                ReportStatus::RevisionRequested => stats.revision_requested += 1,
                ReportStatus::Submitted => stats.submitted += 1,
                ReportStatus::Approved => stats.approved += 1,
                ReportStatus::Rejected => stats.rejected += 1,
            }
            score_sum += u64::from(report.overall_compliance_score);
            if report.risk_assessment >= RiskLevel::High {
                stats.high_risk += 1;
            }
        }

        if stats.total > 0 {
            let mean = score_sum as f64 / stats.total as f64;
            stats.average_compliance = Some((mean * 10.0).round() / 10.0);
        }
        stats
    }
}
