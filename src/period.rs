use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison window granularity for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    Weekly,
    Monthly,
}

/// A closed date range a metric is evaluated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Column headers for the rendered report, derived from the analysis kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodLabels {
    pub current_value: String,
    pub previous_value: String,
    pub current_products: String,
    pub previous_products: String,
}

impl AnalysisKind {
    pub fn labels(&self, current: &ReportPeriod, previous: &ReportPeriod) -> PeriodLabels {
        match self {
            AnalysisKind::Weekly => PeriodLabels {
                current_value: "本周数值".to_string(),
                previous_value: "上周数值".to_string(),
                current_products: "本周套餐".to_string(),
                previous_products: "上周套餐".to_string(),
            },
            AnalysisKind::Monthly => PeriodLabels {
                current_value: format!("{}月数值", current.start.month()),
                previous_value: format!("{}月数值", previous.start.month()),
                current_products: format!("{}月套餐", current.start.month()),
                previous_products: format!("{}月套餐", previous.start.month()),
            },
        }
    }
}

/// The Monday-to-Sunday week containing `date`.
pub fn natural_week(date: NaiveDate) -> ReportPeriod {
    let weekday = date.weekday().num_days_from_monday() as u64;
    let monday = date - Days::new(weekday);
    ReportPeriod {
        start: monday,
        end: monday + Days::new(6),
    }
}

pub fn preceding_week(week: &ReportPeriod) -> ReportPeriod {
    ReportPeriod {
        start: week.start - Days::new(7),
        end: week.end - Days::new(7),
    }
}

/// Current/previous natural-week pair for a selected date: the week
/// containing it and the week before.
pub fn natural_week_windows(selected: NaiveDate) -> (ReportPeriod, ReportPeriod) {
    let current = natural_week(selected);
    let previous = preceding_week(&current);
    (current, previous)
}

pub fn month_window(year: i32, month: u32) -> ReportPeriod {
    let start = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
    ReportPeriod {
        start,
        end: last_day_of_month(year, month),
    }
}

pub fn preceding_month(period: &ReportPeriod) -> ReportPeriod {
    let (year, month) = if period.start.month() == 1 {
        (period.start.year() - 1, 12)
    } else {
        (period.start.year(), period.start.month() - 1)
    };
    month_window(year, month)
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid month start")
        .checked_sub_days(Days::new(1))
        .expect("previous day exists")
}

/// Current/previous comparison windows relative to a reference date: the last
/// COMPLETE week or month before it, plus the one before that.
pub fn comparison_windows(kind: AnalysisKind, reference: NaiveDate) -> (ReportPeriod, ReportPeriod) {
    match kind {
        AnalysisKind::Weekly => {
            let current = preceding_week(&natural_week(reference));
            let previous = preceding_week(&current);
            (current, previous)
        }
        AnalysisKind::Monthly => {
            let current = preceding_month(&month_window(reference.year(), reference.month()));
            let previous = preceding_month(&current);
            (current, previous)
        }
    }
}
