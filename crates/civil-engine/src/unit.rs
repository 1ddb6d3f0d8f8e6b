//! The closed set of addressable calendar units and their cascade
//! sequences.
//!
//! Each entry unit maps to the ordered list of units that successive cascade
//! arguments address. The standard chain runs Century → Decade → Year →
//! Month → Day → … → Nanosecond; `Quarter`, `Week` and `YearWeek` are
//! alternate entry points that splice into it rather than sitting in one
//! strict total order.

use serde::{Deserialize, Serialize};

/// An addressable calendar granularity, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Century,
    Decade,
    Year,
    Quarter,
    Month,
    Week,
    YearWeek,
    Weekday,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

const STD_SEQ: [Unit; 11] = [
    Unit::Century,
    Unit::Decade,
    Unit::Year,
    Unit::Month,
    Unit::Day,
    Unit::Hour,
    Unit::Minute,
    Unit::Second,
    Unit::Millisecond,
    Unit::Microsecond,
    Unit::Nanosecond,
];

const QUARTER_SEQ: [Unit; 9] = [
    Unit::Quarter,
    Unit::Month,
    Unit::Day,
    Unit::Hour,
    Unit::Minute,
    Unit::Second,
    Unit::Millisecond,
    Unit::Microsecond,
    Unit::Nanosecond,
];

const WEEK_SEQ: [Unit; 8] = [
    Unit::Week,
    Unit::Weekday,
    Unit::Hour,
    Unit::Minute,
    Unit::Second,
    Unit::Millisecond,
    Unit::Microsecond,
    Unit::Nanosecond,
];

const YEAR_WEEK_SEQ: [Unit; 8] = [
    Unit::YearWeek,
    Unit::Weekday,
    Unit::Hour,
    Unit::Minute,
    Unit::Second,
    Unit::Millisecond,
    Unit::Microsecond,
    Unit::Nanosecond,
];

impl Unit {
    /// The ordered units consumed by successive cascade arguments when this
    /// unit is the entry point.
    pub fn sequence(self) -> &'static [Unit] {
        match self {
            Unit::Century => &STD_SEQ,
            Unit::Decade => &STD_SEQ[1..],
            Unit::Year => &STD_SEQ[2..],
            Unit::Month => &STD_SEQ[3..],
            Unit::Day => &STD_SEQ[4..],
            Unit::Hour => &STD_SEQ[5..],
            Unit::Minute => &STD_SEQ[6..],
            Unit::Second => &STD_SEQ[7..],
            Unit::Millisecond => &STD_SEQ[8..],
            Unit::Microsecond => &STD_SEQ[9..],
            Unit::Nanosecond => &STD_SEQ[10..],
            Unit::Quarter => &QUARTER_SEQ,
            Unit::Week => &WEEK_SEQ,
            Unit::YearWeek => &YEAR_WEEK_SEQ,
            Unit::Weekday => &WEEK_SEQ[1..],
        }
    }

    /// Nanoseconds per unit for the sub-second granularities, 0 otherwise.
    pub(crate) fn subsecond_factor(self) -> i64 {
        match self {
            Unit::Millisecond => 1_000_000,
            Unit::Microsecond => 1_000,
            Unit::Nanosecond => 1,
            _ => 0,
        }
    }

    /// Units whose positioning can change the year or month and therefore
    /// get day-overflow protection after every step.
    pub(crate) fn is_day_protected(self) -> bool {
        matches!(
            self,
            Unit::Century | Unit::Decade | Unit::Year | Unit::Quarter | Unit::Month
        )
    }
}
