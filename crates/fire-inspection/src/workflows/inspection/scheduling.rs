use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::InspectionFrequency;

impl InspectionFrequency {
    /// Months between inspections; unrecognized values fall back to a year.
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::SemiAnnual => 6,
            Self::Annual => 12,
            Self::Biannual => 24,
            Self::Unrecognized => 12,
        }
    }
}

/// Next inspection due date. Month arithmetic clamps to the end of the target month.
pub fn next_due_date(frequency: InspectionFrequency, from: NaiveDate) -> NaiveDate {
    from.checked_add_months(Months::new(frequency.months()))
        .unwrap_or_else(|| clamp_to_year_end(from))
}

fn clamp_to_year_end(from: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(from.year(), 12, 31).unwrap_or(from)
}

/// Derived scheduling state of an establishment relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Overdue,
    Upcoming,
    Scheduled,
    Unscheduled,
}

impl ScheduleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Upcoming => "upcoming",
            Self::Scheduled => "scheduled",
            Self::Unscheduled => "unscheduled",
        }
    }
}

pub fn schedule_status(
    next_scheduled: Option<NaiveDate>,
    today: NaiveDate,
    upcoming_window_days: i64,
) -> ScheduleStatus {
    match next_scheduled {
        None => ScheduleStatus::Unscheduled,
        Some(date) if date < today => ScheduleStatus::Overdue,
        Some(date) if (date - today).num_days() <= upcoming_window_days.max(0) => {
            ScheduleStatus::Upcoming
        }
        Some(_) => ScheduleStatus::Scheduled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn frequency_table_drives_due_date() {
        let from = date(2024, 3, 15);
        assert_eq!(next_due_date(InspectionFrequency::Monthly, from), date(2024, 4, 15));
        assert_eq!(next_due_date(InspectionFrequency::Quarterly, from), date(2024, 6, 15));
        assert_eq!(next_due_date(InspectionFrequency::SemiAnnual, from), date(2024, 9, 15));
        assert_eq!(next_due_date(InspectionFrequency::Annual, from), date(2025, 3, 15));
        assert_eq!(next_due_date(InspectionFrequency::Biannual, from), date(2026, 3, 15));
        assert_eq!(next_due_date(InspectionFrequency::Unrecognized, from), date(2025, 3, 15));
    }

    #[test]
    fn month_end_clamps() {
        assert_eq!(
            next_due_date(InspectionFrequency::Monthly, date(2024, 1, 31)),
            date(2024, 2, 29)
        );
        assert_eq!(
            next_due_date(InspectionFrequency::Quarterly, date(2023, 11, 30)),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn schedule_status_windows() {
        let today = date(2024, 5, 10);
        assert_eq!(schedule_status(None, today, 7), ScheduleStatus::Unscheduled);
        assert_eq!(
            schedule_status(Some(date(2024, 5, 9)), today, 7),
            ScheduleStatus::Overdue
        );
        assert_eq!(schedule_status(Some(today), today, 7), ScheduleStatus::Upcoming);
        assert_eq!(
            schedule_status(Some(date(2024, 5, 17)), today, 7),
            ScheduleStatus::Upcoming
        );
        assert_eq!(
            schedule_status(Some(date(2024, 5, 18)), today, 7),
            ScheduleStatus::Scheduled
        );
    }

    #[test]
    fn oversized_windows_do_not_overflow() {
        let today = date(2024, 5, 10);
        assert_eq!(
            schedule_status(Some(date(2030, 1, 1)), today, i64::MAX),
            ScheduleStatus::Upcoming
        );
        assert_eq!(
            schedule_status(Some(date(2024, 5, 11)), today, i64::MIN),
            ScheduleStatus::Scheduled
        );
    }
}
