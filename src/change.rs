use crate::value::FieldValue;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Period-over-period change. `Missing` means no data on at least one side;
/// `NotApplicable` means data was present but not numeric. The two are kept
/// distinct so reports can tell "no data" from "not comparable".
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Missing,
    NotApplicable,
    /// Positive growth against a zero baseline.
    Unbounded,
    Delta { percent: f64, direction: Direction },
}

impl Change {
    pub fn is_missing(&self) -> bool {
        matches!(self, Change::Missing)
    }

    pub fn is_decline(&self) -> bool {
        matches!(
            self,
            Change::Delta {
                direction: Direction::Down,
                ..
            }
        )
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Missing => Ok(()),
            Change::NotApplicable => write!(f, "N/A"),
            Change::Unbounded => write!(f, "∞"),
            Change::Delta { percent, direction } => {
                let arrow = match direction {
                    Direction::Up => "↑",
                    Direction::Down => "↓",
                };
                write!(f, "{} {:.2}%", arrow, percent.abs())
            }
        }
    }
}

/// Computes the percentage change between two normalized values.
///
/// Values that arrived as text are parsed leniently (a trailing `%` is
/// stripped), so "45.2%" compares against "40%" numerically. A zero baseline
/// yields `Unbounded` for growth and `NotApplicable` otherwise.
/// Zero change renders with the down arrow.
pub fn percent_change(current: &FieldValue, previous: &FieldValue) -> Change {
    if is_blank(current) || is_blank(previous) {
        return Change::Missing;
    }

    let (Some(current), Some(previous)) = (lenient_f64(current), lenient_f64(previous)) else {
        return Change::NotApplicable;
    };

    if previous == 0.0 {
        return if current > 0.0 {
            Change::Unbounded
        } else {
            Change::NotApplicable
        };
    }

    let percent = (current - previous) / previous.abs() * 100.0;
    let direction = if percent > 0.0 {
        Direction::Up
    } else {
        Direction::Down
    };

    Change::Delta { percent, direction }
}

fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Missing => true,
        FieldValue::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn lenient_f64(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Int(v) => Some(*v as f64),
        FieldValue::Float(v) => Some(*v),
        FieldValue::Text(text) => text.replace('%', "").trim().parse::<f64>().ok(),
        FieldValue::Missing => None,
    }
}
