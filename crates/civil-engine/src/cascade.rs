//! The cascade driver and the public positioning operations.
//!
//! One call walks an argument list down a unit sequence: the entry unit
//! consumes the first argument, each following argument addresses the next
//! finer unit, and boundary alignment finishes the walk. Four dispatch
//! disciplines combine absolute and relative positioning:
//!
//! | family | dispatch |
//! |---|---|
//! | `start` / `end` | absolute at every step |
//! | `start_by` / `end_by` | relative at every step |
//! | `start_at` / `end_at` | absolute first, then relative |
//! | `start_in` / `end_in` | relative first, then absolute |
//! | `add` | pure offset, never aligned |
//! | `jump`, `jump_by`, `jump_at`, `jump_in` | as the aligned families, but sub-unit precision survives |
//!
//! `start` aligns every field below the last addressed unit to its minimum,
//! `end` to its maximum. Argument lists longer than the unit sequence are
//! truncated; an empty list means `[0]` (`[1]` for `add`).

use serde::{Deserialize, Serialize};

use crate::civil::CivilTime;
use crate::position::{align, position_abs, position_offset, position_rel, BlockDir, Cursor, Flags};
use crate::unit::Unit;

/// Addressing options for one cascade call.
///
/// The default is calendar-week numbering, day-overflow protection on, and
/// container-relative year addressing. Options compose by struct update:
///
/// ```
/// use civil_engine::CascadeOptions;
///
/// let opts = CascadeOptions { allow_overflow: true, ..CascadeOptions::iso() };
/// assert!(opts.iso_week && opts.allow_overflow);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeOptions {
    /// ISO 8601 week numbering: year-scoped weeks anchored at Jan 4 /
    /// Dec 28, Monday start regardless of the configured week start.
    pub iso_week: bool,
    /// Ordinal week numbering: plain 7-day blocks counted from the 1st of
    /// the month (1-7, 8-14, …).
    pub ordinal_week: bool,
    /// Full-week numbering: week 1 starts at the month's first week-start
    /// occurrence.
    pub full_week: bool,
    /// Quarter week numbering: 7-day blocks counted from the quarter's
    /// first day.
    pub quarter_week: bool,
    /// Let day-of-month overflow carry into the next month instead of
    /// clamping to the month's last day.
    pub allow_overflow: bool,
    /// Address Century/Decade/Year arguments as absolute values
    /// (`2024` means the year 2024) instead of container ordinals.
    pub absolute_year: bool,
}

impl CascadeOptions {
    /// ISO 8601 week numbering.
    pub fn iso() -> Self {
        CascadeOptions { iso_week: true, ..Default::default() }
    }

    /// Ordinal (7-day-block) week numbering.
    pub fn ordinal() -> Self {
        CascadeOptions { ordinal_week: true, ..Default::default() }
    }

    /// Full-week numbering.
    pub fn full() -> Self {
        CascadeOptions { full_week: true, ..Default::default() }
    }

    /// Quarter-scoped week numbering.
    pub fn quarter_weeks() -> Self {
        CascadeOptions { quarter_week: true, ..Default::default() }
    }

    /// Day overflow carries instead of clamping.
    pub fn overflowing() -> Self {
        CascadeOptions { allow_overflow: true, ..Default::default() }
    }

    /// Century/Decade/Year arguments are absolute values.
    pub fn absolute() -> Self {
        CascadeOptions { absolute_year: true, ..Default::default() }
    }
}

/// Dispatch discipline for one cascade walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Abs,
    Rel,
    At,
    In,
    Offset,
}

impl CivilTime {
    fn cascade(
        &self,
        mode: Mode,
        fill: bool,
        jump: bool,
        entry: Unit,
        args: &[i64],
        opts: &CascadeOptions,
    ) -> CivilTime {
        let fl = Flags::new(opts, fill, jump);
        let seq = entry.sequence();
        let defaults: &[i64] = if mode == Mode::Offset { &[1] } else { &[0] };
        let args = if args.is_empty() { defaults } else { args };

        let mut cur = Cursor { f: self.fields(), dir: BlockDir::None };
        let mut prev = entry;
        let mut last = entry;

        for (i, &n) in args.iter().take(seq.len()).enumerate() {
            let unit = seq[i];
            let absolute = match mode {
                Mode::Abs => true,
                Mode::Rel | Mode::Offset => false,
                Mode::At => i == 0,
                Mode::In => i != 0,
            };
            cur = if mode == Mode::Offset {
                position_offset(&fl, unit, n, cur)
            } else if absolute {
                position_abs(&fl, self.week_start(), unit, prev, n, cur)
            } else {
                position_rel(&fl, self.week_start(), unit, n, cur)
            };
            prev = unit;
            last = unit;
        }

        let mut f = cur.f;
        if !jump && mode != Mode::Offset {
            f = align(&fl, last, f);
        }
        CivilTime::from_fields(f.normalize(), self.timezone(), self.week_start())
    }

    // ── Absolute positioning (start / end) ──────────────────────────────

    /// Position at the n-th instance of `unit` within its container and
    /// align everything below it to the period start.
    ///
    /// The first argument addresses `unit` itself; each further argument
    /// cascades into the next finer unit of the entry's sequence. Positive
    /// indices count from the container start, negative from its end
    /// (−1 = last), and 0 keeps the current instance.
    ///
    /// ```
    /// use civil_engine::{CivilTime, Unit};
    ///
    /// let t = CivilTime::new(2024, 4, 15, 14, 30, 45).unwrap();
    /// assert_eq!(t.start(Unit::Month, &[0]).to_string(), "2024-04-01 00:00:00");
    /// assert_eq!(t.start(Unit::Day, &[-1]).to_string(), "2024-04-30 00:00:00");
    /// ```
    pub fn start(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Abs, false, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::start`] with explicit addressing options.
    pub fn start_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::Abs, false, false, unit, args, opts)
    }

    /// Position at the n-th instance of `unit` and align everything below
    /// it to the period end (last day, 23:59:59.999999999).
    ///
    /// ```
    /// use civil_engine::{CivilTime, Unit};
    ///
    /// let t = CivilTime::new(2024, 5, 10, 9, 0, 0).unwrap();
    /// assert_eq!(
    ///     t.end(Unit::Quarter, &[0]).to_string(),
    ///     "2024-06-30 23:59:59.999999999"
    /// );
    /// ```
    pub fn end(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Abs, true, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::end`] with explicit addressing options.
    pub fn end_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::Abs, true, false, unit, args, opts)
    }

    // ── Relative positioning (start_by / end_by) ────────────────────────

    /// Shift by n instances of `unit` (re-anchoring to the unit's current
    /// boundary first) and align to the period start. Further arguments
    /// shift the finer units the same way.
    pub fn start_by(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Rel, false, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::start_by`] with explicit addressing options.
    pub fn start_by_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::Rel, false, false, unit, args, opts)
    }

    /// Shift by n instances of `unit` and align to the period end.
    pub fn end_by(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Rel, true, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::end_by`] with explicit addressing options.
    pub fn end_by_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::Rel, true, false, unit, args, opts)
    }

    // ── Anchor then offset (start_at / end_at) ──────────────────────────

    /// Position `unit` absolutely, then treat the remaining arguments as
    /// relative shifts of the finer units; align to the period start.
    pub fn start_at(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::At, false, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::start_at`] with explicit addressing options.
    pub fn start_at_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::At, false, false, unit, args, opts)
    }

    /// As [`CivilTime::start_at`], aligned to the period end.
    pub fn end_at(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::At, true, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::end_at`] with explicit addressing options.
    pub fn end_at_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::At, true, false, unit, args, opts)
    }

    // ── Offset then anchor (start_in / end_in) ──────────────────────────

    /// Shift `unit` relatively, then position the finer units absolutely;
    /// align to the period start.
    pub fn start_in(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::In, false, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::start_in`] with explicit addressing options.
    pub fn start_in_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::In, false, false, unit, args, opts)
    }

    /// As [`CivilTime::start_in`], aligned to the period end.
    pub fn end_in(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::In, true, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::end_in`] with explicit addressing options.
    pub fn end_in_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::In, true, false, unit, args, opts)
    }

    // ── Pure translation (add) ──────────────────────────────────────────

    /// Translate by n instances of `unit` without re-anchoring or aligning;
    /// further arguments translate the finer units. An empty list means
    /// `[1]`, so `add(Unit::Month, &[])` is "one month later".
    ///
    /// Day-of-month overflow is clamped (Jan 31 + 1 month = Feb 29 in
    /// 2024) unless [`CascadeOptions::allow_overflow`] lets it carry.
    pub fn add(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Offset, false, false, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::add`] with explicit addressing options.
    pub fn add_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::Offset, false, false, unit, args, opts)
    }

    // ── Precision-preserving positioning (jump family) ──────────────────

    /// As [`CivilTime::start`], but sub-unit precision survives: nothing is
    /// zeroed below the last addressed unit, and the coarse year units keep
    /// their position inside the target period (`jump(Century, &[1])` from
    /// 2021-02-02 13:14:15 is 2121-02-02 13:14:15).
    pub fn jump(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Abs, false, true, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::jump`] with explicit addressing options.
    pub fn jump_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::Abs, false, true, unit, args, opts)
    }

    /// As [`CivilTime::start_by`], with sub-unit precision preserved.
    pub fn jump_by(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Rel, false, true, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::jump_by`] with explicit addressing options.
    pub fn jump_by_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::Rel, false, true, unit, args, opts)
    }

    /// As [`CivilTime::start_at`], with sub-unit precision preserved.
    pub fn jump_at(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::At, false, true, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::jump_at`] with explicit addressing options.
    pub fn jump_at_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::At, false, true, unit, args, opts)
    }

    /// As [`CivilTime::start_in`], with sub-unit precision preserved.
    pub fn jump_in(&self, unit: Unit, args: &[i64]) -> CivilTime {
        self.cascade(Mode::In, false, true, unit, args, &CascadeOptions::default())
    }

    /// [`CivilTime::jump_in`] with explicit addressing options.
    pub fn jump_in_with(&self, unit: Unit, args: &[i64], opts: &CascadeOptions) -> CivilTime {
        self.cascade(Mode::In, false, true, unit, args, opts)
    }

    // ── Absolute-year conveniences ──────────────────────────────────────

    /// Start of an absolutely addressed date: `start_on(&[2024, 5, 20])`
    /// is 2024-05-20 00:00:00 regardless of the receiver's position.
    /// Arguments cascade as year, month, day, hour, ….
    pub fn start_on(&self, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Abs, false, false, Unit::Year, args, &CascadeOptions::absolute())
    }

    /// End of an absolutely addressed date: `end_on(&[2024, 5])` is
    /// 2024-05-31 23:59:59.999999999.
    pub fn end_on(&self, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Abs, true, false, Unit::Year, args, &CascadeOptions::absolute())
    }

    /// Move to an absolutely addressed date, keeping every field the
    /// arguments do not reach: `on(&[2025])` changes only the year.
    pub fn on(&self, args: &[i64]) -> CivilTime {
        self.cascade(Mode::Abs, false, true, Unit::Year, args, &CascadeOptions::absolute())
    }

    /// Anchor at an absolute year, then shift the finer units relatively,
    /// keeping precision: `at(&[2025, 1])` is "one month after this moment
    /// in 2025".
    pub fn at(&self, args: &[i64]) -> CivilTime {
        self.cascade(Mode::At, false, true, Unit::Year, args, &CascadeOptions::absolute())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    const ALL_UNITS: [Unit; 15] = [
        Unit::Century,
        Unit::Decade,
        Unit::Year,
        Unit::Quarter,
        Unit::Month,
        Unit::Week,
        Unit::YearWeek,
        Unit::Weekday,
        Unit::Day,
        Unit::Hour,
        Unit::Minute,
        Unit::Second,
        Unit::Millisecond,
        Unit::Microsecond,
        Unit::Nanosecond,
    ];

    fn arb_civil() -> impl Strategy<Value = CivilTime> {
        (1800i64..2200, 1u32..=12, 1u32..=31, 0u32..24, 0u32..60, 0u32..60, 0u32..1_000_000_000)
            .prop_map(|(y, m, d, h, min, s, ns)| {
                let d = d.min(crate::calendar::days_in_month(y, m as i64) as u32);
                CivilTime::new(y, m, d, h, min, s).unwrap().with_nanosecond(ns).unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_start_zero_is_idempotent(t in arb_civil(), idx in 0usize..15) {
            let unit = ALL_UNITS[idx];
            let once = t.start(unit, &[0]);
            prop_assert_eq!(once.start(unit, &[0]), once);
        }

        #[test]
        fn prop_end_zero_is_idempotent(t in arb_civil(), idx in 0usize..15) {
            let unit = ALL_UNITS[idx];
            let once = t.end(unit, &[0]);
            prop_assert_eq!(once.end(unit, &[0]), once);
        }

        #[test]
        fn prop_current_period_brackets_instant(t in arb_civil(), idx in 0usize..15) {
            let unit = ALL_UNITS[idx];
            let start = t.start(unit, &[0]);
            let end = t.end(unit, &[0]);
            prop_assert!(!start.is_after(&t), "{:?}: {} > {}", unit, start, t);
            prop_assert!(!end.is_before(&t), "{:?}: {} < {}", unit, end, t);
        }

        #[test]
        fn prop_jump_to_containing_index_is_identity(t in arb_civil()) {
            prop_assert_eq!(t.jump(Unit::Month, &[t.month() as i64]), t);
            prop_assert_eq!(t.jump(Unit::Day, &[t.day() as i64]), t);
            prop_assert_eq!(t.jump(Unit::Hour, &[t.hour() as i64]), t);
            prop_assert_eq!(t.jump(Unit::Year, &[t.year().rem_euclid(10)]), t);
        }

        #[test]
        fn prop_day_tiling_has_no_gaps(t in arb_civil(), n in 1i64..60) {
            let end = t.end(Unit::Day, &[n]).add(Unit::Nanosecond, &[1]);
            prop_assert_eq!(end, t.start(Unit::Day, &[n + 1]));
        }

        #[test]
        fn prop_month_positioning_clamps_day(t in arb_civil(), m in 1i64..=12) {
            let jumped = t.jump(Unit::Month, &[m]);
            prop_assert!(jumped.day() <= jumped.days_in_month());
            prop_assert_eq!(jumped.month() as i64, m);
        }

        #[test]
        fn prop_add_day_round_trips(t in arb_civil(), n in -1000i64..1000) {
            prop_assert_eq!(t.add(Unit::Day, &[n]).add(Unit::Day, &[-n]), t);
        }
    }
}
