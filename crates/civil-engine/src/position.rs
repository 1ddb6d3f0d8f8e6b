//! Per-unit positioners: the rule-dense core of the cascade engine.
//!
//! Three positioning disciplines share one field tuple:
//!
//! - [`position_abs`] — "the n-th instance within the enclosing container"
//!   (the `start`/`end` families). n > 0 counts forward from the container
//!   start, n < 0 counts back from its end (−1 = last), n = 0 keeps the
//!   current instance while still cascading and aligning children.
//! - [`position_rel`] — re-anchor to the unit's current boundary, then shift
//!   by n instances (the `start_by`/`end_by` families).
//! - [`position_offset`] — pure translation, no re-anchoring (the `add`
//!   family).
//!
//! Every positioner is a pure `Cursor -> Cursor` function; the cascade
//! driver composes them and the boundary aligner finishes the walk. Fields
//! may hold transiently out-of-range values between steps (day 0, hour 25);
//! [`Fields::normalize`] resolves them through natural carry before a
//! `CivilTime` is rebuilt.

use chrono::Weekday;

use crate::calendar::{
    add_months, civil_from_days, days_from_civil, days_in_month, week_offset,
};
use crate::cascade::CascadeOptions;
use crate::unit::Unit;

pub(crate) const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// The mutable-free working tuple the positioners pass along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fields {
    pub y: i64,
    pub m: i64,
    pub d: i64,
    pub h: i64,
    pub min: i64,
    pub s: i64,
    pub ns: i64,
}

impl Fields {
    /// Days since the most recent week-start occurrence for the current
    /// date, 0..=6. Tolerates out-of-range days.
    fn week_off(&self, ws: Weekday) -> i64 {
        week_offset(self.y, self.m, self.d, ws)
    }

    /// Resolve transient overflow by natural carry: nanoseconds up through
    /// hours, then the day through the epoch-day round trip. This is where
    /// hour 25 becomes 01:00 of the next day and April 31 becomes May 1.
    pub(crate) fn normalize(mut self) -> Fields {
        self.s += self.ns.div_euclid(NANOS_PER_SECOND);
        self.ns = self.ns.rem_euclid(NANOS_PER_SECOND);
        self.min += self.s.div_euclid(60);
        self.s = self.s.rem_euclid(60);
        self.h += self.min.div_euclid(60);
        self.min = self.min.rem_euclid(60);
        self.d += self.h.div_euclid(24);
        self.h = self.h.rem_euclid(24);

        let (y, m) = add_months(self.y, self.m, 0);
        self.y = y;
        self.m = m;
        if self.d < 1 || self.d > days_in_month(self.y, self.m) {
            let days = days_from_civil(self.y, self.m, 1) + self.d - 1;
            let (y, m, d) = civil_from_days(days);
            self.y = y;
            self.m = m;
            self.d = d;
        }
        self
    }
}

/// Which week-numbering convention a `Week` argument addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WeekNumbering {
    /// Week-start-aligned blocks; week 1 contains the 1st of the month.
    Calendar,
    /// ISO 8601 year weeks: Jan 4 / Dec 28 anchors, Monday start.
    Iso,
    /// Plain 7-day blocks counted from the 1st of the month.
    Ordinal,
    /// Week-start-aligned blocks; week 1 starts at the month's first
    /// week-start occurrence.
    Full,
    /// Plain 7-day blocks counted from the quarter's first day.
    Quarter,
}

/// Addressing context for one cascade call, resolved once up front.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Flags {
    pub week: WeekNumbering,
    pub overflow: bool,
    pub abs_year: bool,
    pub fill: bool,
    pub jump: bool,
}

impl Flags {
    pub(crate) fn new(opts: &CascadeOptions, fill: bool, jump: bool) -> Self {
        let week = if opts.iso_week {
            WeekNumbering::Iso
        } else if opts.quarter_week {
            WeekNumbering::Quarter
        } else if opts.full_week {
            WeekNumbering::Full
        } else if opts.ordinal_week {
            WeekNumbering::Ordinal
        } else {
            WeekNumbering::Calendar
        };
        Flags {
            week,
            overflow: opts.allow_overflow,
            abs_year: opts.absolute_year,
            fill,
            jump,
        }
    }

    /// ISO mode pins the week start to Monday; everything else honors the
    /// receiver's configured week start.
    fn week_start(&self, configured: Weekday) -> Weekday {
        if self.week == WeekNumbering::Iso {
            Weekday::Mon
        } else {
            configured
        }
    }
}

/// Search direction an ordinal-style Week step hands to the Weekday step
/// that follows it: a positive block anchors at its first day and weekdays
/// are found walking forward, a negative block anchors at its last day and
/// weekdays are found walking backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockDir {
    None,
    Forward,
    Backward,
}

/// Field tuple plus the block direction threaded between cascade steps.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor {
    pub f: Fields,
    pub dir: BlockDir,
}

// ── Absolute positioning ────────────────────────────────────────────────────

pub(crate) fn position_abs(
    fl: &Flags,
    configured_ws: Weekday,
    unit: Unit,
    prev: Unit,
    n: i64,
    cur: Cursor,
) -> Cursor {
    let ws = fl.week_start(configured_ws);
    let mut f = cur.f;
    let mut dir = BlockDir::None;

    match unit {
        Unit::Century => {
            if fl.abs_year {
                f.y = n * 100;
            } else {
                let rem = f.y.rem_euclid(100);
                // Positive ordinals count centuries from the current century
                // floor; negative ordinals address the enclosing millennium.
                let (base, ord) = if n >= 0 {
                    (f.y - rem, n)
                } else {
                    (f.y - f.y.rem_euclid(1000), 10 + n)
                };
                f.y = base + ord * 100;
                if fl.jump {
                    f.y += rem;
                }
            }
        }
        Unit::Decade => {
            if fl.abs_year {
                f.y = n * 10;
            } else {
                let rem = f.y.rem_euclid(10);
                let century = f.y - f.y.rem_euclid(100);
                if fl.jump {
                    let ord = if n >= 0 { n } else { 10 + n };
                    f.y = century + ord * 10 + rem;
                } else if n > 0 {
                    f.y = century + n * 10;
                } else if n < 0 {
                    f.y = century + (10 + n) * 10;
                } else {
                    f.y -= rem;
                }
            }
        }
        Unit::Year => {
            if fl.abs_year {
                f.y = n;
            } else if fl.jump || n != 0 {
                let decade = f.y - f.y.rem_euclid(10);
                f.y = decade + if n >= 0 { n } else { 10 + n };
            }
        }
        Unit::Quarter => {
            if n > 0 {
                f.m = (n - 1) * 3 + 1;
            } else if n < 0 {
                f.m = (4 + n) * 3 + 1;
            } else {
                f.m -= (f.m - 1).rem_euclid(3);
            }
        }
        Unit::Month => {
            if prev == Unit::Quarter {
                // Quarter-relative month 1..=3, anchored to the quarter's
                // first calendar month.
                let q = (f.m - 1).div_euclid(3) * 3 + 1;
                if n > 0 {
                    f.m = q + n - 1;
                } else if n < 0 {
                    f.m = q + 3 + n;
                }
            } else if n > 0 {
                f.m = n;
            } else if n < 0 {
                f.m = 13 + n;
            }
        }
        Unit::Week => {
            let (wf, wd) = position_week_abs(fl, ws, n, f);
            f = wf;
            dir = wd;
        }
        Unit::YearWeek => f = position_year_week_abs(fl, ws, n, f),
        Unit::Weekday => f = position_weekday_abs(ws, n, f, cur.dir),
        Unit::Day => {
            if n > 0 {
                f.d = n;
            } else if n < 0 {
                f.d = days_in_month(f.y, f.m) + n + 1;
            }
        }
        Unit::Hour => {
            if n > 0 {
                f.h = n;
            } else if n < 0 {
                f.h = 24 + n;
            }
        }
        Unit::Minute => {
            if n > 0 {
                f.min = n;
            } else if n < 0 {
                f.min = 60 + n;
            }
        }
        Unit::Second => {
            if n > 0 {
                f.s = n;
            } else if n < 0 {
                f.s = 60 + n;
            }
        }
        Unit::Millisecond | Unit::Microsecond | Unit::Nanosecond => {
            let fac = unit.subsecond_factor();
            let per = fac * 1000;
            if n > 0 {
                f.ns = f.ns.div_euclid(per) * per + n * fac;
            } else if n < 0 {
                f.ns = f.ns.div_euclid(per) * per + per + n * fac;
            }
        }
    }

    if matches!(unit, Unit::Quarter | Unit::Month) {
        let (y, m) = add_months(f.y, f.m, 0);
        f.y = y;
        f.m = m;
    }

    Cursor {
        f: finish(fl, unit, f),
        dir,
    }
}

/// Absolute week positioning for the month- and quarter-scoped numbering
/// conventions. ISO delegates to the year-week rule.
fn position_week_abs(fl: &Flags, ws: Weekday, n: i64, mut f: Fields) -> (Fields, BlockDir) {
    match fl.week {
        WeekNumbering::Iso => (position_year_week_abs(fl, ws, n, f), BlockDir::None),
        WeekNumbering::Calendar | WeekNumbering::Full => {
            let off_cur = f.week_off(ws);
            let start = if n > 0 {
                let first = if fl.week == WeekNumbering::Full {
                    // First week-start occurrence inside the month.
                    1 + (7 - week_offset(f.y, f.m, 1, ws)).rem_euclid(7)
                } else {
                    // Aligned block containing the 1st; may begin in the
                    // previous month.
                    1 - week_offset(f.y, f.m, 1, ws)
                };
                first + (n - 1) * 7
            } else if n < 0 {
                let last = days_in_month(f.y, f.m);
                last - week_offset(f.y, f.m, last, ws) + (n + 1) * 7
            } else {
                f.d - off_cur
            };
            // Jump preserves the weekday within the target week; alignment
            // lands on the block's first or last day.
            f.d = if fl.jump {
                start + off_cur
            } else if fl.fill {
                start + 6
            } else {
                start
            };
            (f, BlockDir::None)
        }
        WeekNumbering::Ordinal | WeekNumbering::Quarter => {
            if fl.week == WeekNumbering::Quarter {
                // Rebase the day to an offset from the quarter's first day.
                let qm = f.m - (f.m - 1).rem_euclid(3);
                let doff = days_from_civil(f.y, f.m, f.d) - days_from_civil(f.y, qm, 1) + 1;
                f.m = qm;
                f.d = doff;
            }
            let last = if fl.week == WeekNumbering::Quarter {
                days_in_month(f.y, f.m)
                    + days_in_month(f.y, f.m + 1)
                    + days_in_month(f.y, f.m + 2)
            } else {
                days_in_month(f.y, f.m)
            };
            let (lo, hi, anchor, dir) = if n > 0 {
                let lo = (n - 1) * 7 + 1;
                (lo, (lo + 6).min(last), lo, BlockDir::Forward)
            } else if n < 0 {
                let hi = last + (n + 1) * 7;
                ((hi - 6).max(1), hi, hi, BlockDir::Backward)
            } else {
                let lo = (f.d - 1).div_euclid(7) * 7 + 1;
                (lo, (lo + 6).min(last), f.d, BlockDir::None)
            };
            f.d = if fl.jump {
                anchor
            } else if fl.fill {
                hi
            } else {
                lo
            };
            (f, dir)
        }
    }
}

/// Absolute year-week positioning.
///
/// Sovereign rule: week 1 starts at the year's first week-start occurrence
/// (walk forward from Jan 1); the last week is found walking back from
/// Dec 31. ISO rule: Jan 4 is always in week 1 and Dec 28 in the last week;
/// walk back from the anchor to the nearest Monday.
fn position_year_week_abs(fl: &Flags, ws: Weekday, n: i64, mut f: Fields) -> Fields {
    if n == 0 {
        if !fl.jump {
            f.d -= f.week_off(ws);
            if fl.fill {
                f.d += 6;
            }
        }
        return f;
    }

    let iso = fl.week == WeekNumbering::Iso;
    if n > 0 {
        f.m = 1;
        let first = if iso {
            4 - week_offset(f.y, 1, 4, ws)
        } else {
            1 + (7 - week_offset(f.y, 1, 1, ws)).rem_euclid(7)
        };
        f.d = first + (n - 1) * 7;
    } else {
        f.m = 12;
        let anchor = if iso { 28 } else { 31 };
        f.d = anchor - week_offset(f.y, 12, anchor, ws) + (n + 1) * 7;
    }
    // Jump lands on the week's first day; End placement maximizes inside
    // the week.
    if !fl.jump && fl.fill {
        f.d += 6;
    }
    f
}

/// Absolute weekday positioning within the current week or ordinal block.
fn position_weekday_abs(ws: Weekday, n: i64, mut f: Fields, dir: BlockDir) -> Fields {
    if n == 0 {
        return f;
    }
    // Target offset from the week start: 1..=7 forward, −1..=−7 from the
    // week's end.
    let t = if n > 0 { n - 1 } else { n + 7 };
    let off = f.week_off(ws);
    match dir {
        BlockDir::Forward => f.d += (t - off).rem_euclid(7),
        BlockDir::Backward => f.d -= (off - t).rem_euclid(7),
        BlockDir::None => f.d += t - off,
    }
    f
}

// ── Relative positioning ────────────────────────────────────────────────────

pub(crate) fn position_rel(
    fl: &Flags,
    configured_ws: Weekday,
    unit: Unit,
    n: i64,
    cur: Cursor,
) -> Cursor {
    let ws = fl.week_start(configured_ws);
    let mut f = cur.f;

    match unit {
        Unit::Century => {
            f.y -= f.y.rem_euclid(100);
            f.y += n * 100;
        }
        Unit::Decade => {
            f.y -= f.y.rem_euclid(10);
            f.y += n * 10;
        }
        Unit::Year => f.y += n,
        Unit::Quarter => {
            f.m -= (f.m - 1).rem_euclid(3);
            let (y, m) = add_months(f.y, f.m, n * 3);
            f.y = y;
            f.m = m;
        }
        Unit::Month => {
            let (y, m) = add_months(f.y, f.m, n);
            f.y = y;
            f.m = m;
        }
        Unit::Week | Unit::YearWeek => {
            f.d -= f.week_off(ws);
            f.d += n * 7;
            if fl.fill {
                f.d += 6;
            }
        }
        Unit::Weekday => {
            if n != 0 {
                f.d -= f.week_off(ws);
                f.d += n;
            }
        }
        Unit::Day => f.d += n,
        Unit::Hour => f.h += n,
        Unit::Minute => f.min += n,
        Unit::Second => f.s += n,
        Unit::Millisecond | Unit::Microsecond | Unit::Nanosecond => {
            f.ns += n * unit.subsecond_factor();
        }
    }

    Cursor {
        f: finish(fl, unit, f),
        dir: BlockDir::None,
    }
}

// ── Pure offset ─────────────────────────────────────────────────────────────

pub(crate) fn position_offset(fl: &Flags, unit: Unit, n: i64, cur: Cursor) -> Cursor {
    let mut f = cur.f;

    match unit {
        Unit::Century => f.y += n * 100,
        Unit::Decade => f.y += n * 10,
        Unit::Year => f.y += n,
        Unit::Quarter => {
            let (y, m) = add_months(f.y, f.m, n * 3);
            f.y = y;
            f.m = m;
        }
        Unit::Month => {
            let (y, m) = add_months(f.y, f.m, n);
            f.y = y;
            f.m = m;
        }
        // In pure translation every week-shaped unit is n * 7 days.
        Unit::Week | Unit::YearWeek => f.d += n * 7,
        Unit::Day | Unit::Weekday => f.d += n,
        Unit::Hour => f.h += n,
        Unit::Minute => f.min += n,
        Unit::Second => f.s += n,
        Unit::Millisecond | Unit::Microsecond | Unit::Nanosecond => {
            f.ns += n * unit.subsecond_factor();
        }
    }

    Cursor {
        f: finish(fl, unit, f),
        dir: BlockDir::None,
    }
}

// ── Step epilogue and boundary alignment ────────────────────────────────────

/// Runs after every positioner step: day-overflow protection for the units
/// that can change year or month, and period extension for End cascades on
/// the multi-year/multi-month units.
fn finish(fl: &Flags, unit: Unit, mut f: Fields) -> Fields {
    if !fl.overflow && unit.is_day_protected() {
        let max = days_in_month(f.y, f.m);
        if f.d > max {
            f.d = max;
        }
    }

    if fl.fill {
        match unit {
            Unit::Century => f.y += 99,
            Unit::Decade => f.y += 9,
            Unit::Quarter => f.m += 2,
            _ => {}
        }
    }

    f
}

/// Zero (start) or maximize (end) every field strictly below the last
/// cascaded unit. Week-shaped units already placed the day; only the time
/// of day remains to align for them.
pub(crate) fn align(fl: &Flags, last: Unit, mut f: Fields) -> Fields {
    if !fl.fill {
        match last {
            Unit::Century | Unit::Decade | Unit::Year => {
                (f.m, f.d, f.h, f.min, f.s, f.ns) = (1, 1, 0, 0, 0, 0);
            }
            Unit::Quarter | Unit::Month => {
                (f.d, f.h, f.min, f.s, f.ns) = (1, 0, 0, 0, 0);
            }
            Unit::Week | Unit::YearWeek | Unit::Weekday | Unit::Day => {
                (f.h, f.min, f.s, f.ns) = (0, 0, 0, 0);
            }
            Unit::Hour => (f.min, f.s, f.ns) = (0, 0, 0),
            Unit::Minute => (f.s, f.ns) = (0, 0),
            Unit::Second => f.ns = 0,
            Unit::Millisecond | Unit::Microsecond | Unit::Nanosecond => {
                let fac = last.subsecond_factor();
                f.ns = f.ns.div_euclid(fac) * fac;
            }
        }
    } else {
        match last {
            Unit::Century | Unit::Decade | Unit::Year => {
                (f.m, f.d, f.h, f.min, f.s, f.ns) = (12, 31, 23, 59, 59, NANOS_PER_SECOND - 1);
            }
            Unit::Quarter | Unit::Month => {
                (f.d, f.h, f.min, f.s, f.ns) =
                    (days_in_month(f.y, f.m), 23, 59, 59, NANOS_PER_SECOND - 1);
            }
            Unit::Week | Unit::YearWeek | Unit::Weekday | Unit::Day => {
                (f.h, f.min, f.s, f.ns) = (23, 59, 59, NANOS_PER_SECOND - 1);
            }
            Unit::Hour => (f.min, f.s, f.ns) = (59, 59, NANOS_PER_SECOND - 1),
            Unit::Minute => (f.s, f.ns) = (59, NANOS_PER_SECOND - 1),
            Unit::Second => f.ns = NANOS_PER_SECOND - 1,
            Unit::Millisecond | Unit::Microsecond | Unit::Nanosecond => {
                let fac = last.subsecond_factor();
                f.ns = f.ns.div_euclid(fac) * fac + fac - 1;
            }
        }
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(y: i64, m: i64, d: i64, h: i64, min: i64, s: i64, ns: i64) -> Fields {
        Fields { y, m, d, h, min, s, ns }
    }

    #[test]
    fn test_normalize_carries_time_into_days() {
        let f = fields(2024, 4, 32, 25, 61, 61, 1_500_000_000).normalize();
        // 61.5s -> +1min 2.5s; 62min -> +1h 2min; 26h -> +1d 2h; day 33 -> May 3.
        assert_eq!((f.y, f.m, f.d), (2024, 5, 3));
        assert_eq!((f.h, f.min, f.s, f.ns), (2, 2, 2, 500_000_000));
    }

    #[test]
    fn test_normalize_negative_fields_borrow() {
        let f = fields(2024, 1, 1, 0, 0, 0, -1).normalize();
        assert_eq!((f.y, f.m, f.d), (2023, 12, 31));
        assert_eq!((f.h, f.min, f.s, f.ns), (23, 59, 59, 999_999_999));

        let f = fields(2024, 1, -30, 12, 0, 0, 0).normalize();
        assert_eq!((f.y, f.m, f.d), (2023, 12, 1));
    }

    #[test]
    fn test_normalize_is_identity_for_valid_fields() {
        let f = fields(2024, 2, 29, 23, 59, 59, 999_999_999);
        assert_eq!(f.normalize(), f);
    }

    #[test]
    fn test_align_zero_and_fill() {
        let fl = Flags {
            week: WeekNumbering::Calendar,
            overflow: false,
            abs_year: false,
            fill: false,
            jump: false,
        };
        let f = align(&fl, Unit::Month, fields(2024, 4, 15, 14, 30, 45, 123));
        assert_eq!((f.d, f.h, f.min, f.s, f.ns), (1, 0, 0, 0, 0));

        let fl_fill = Flags { fill: true, ..fl };
        let f = align(&fl_fill, Unit::Month, fields(2024, 2, 15, 0, 0, 0, 0));
        assert_eq!((f.d, f.h, f.min, f.s, f.ns), (29, 23, 59, 59, 999_999_999));
    }

    #[test]
    fn test_align_subsecond_touches_only_finer_digits() {
        let fl = Flags {
            week: WeekNumbering::Calendar,
            overflow: false,
            abs_year: false,
            fill: false,
            jump: false,
        };
        let f = align(&fl, Unit::Millisecond, fields(2024, 1, 1, 0, 0, 0, 123_456_789));
        assert_eq!(f.ns, 123_000_000);

        let fl_fill = Flags { fill: true, ..fl };
        let f = align(&fl_fill, Unit::Microsecond, fields(2024, 1, 1, 0, 0, 0, 123_456_789));
        assert_eq!(f.ns, 123_456_999);
    }
}
