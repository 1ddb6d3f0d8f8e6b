//! The civil-time record: calendar and clock fields bound to a timezone
//! handle and a week-start convention.
//!
//! `CivilTime` is a plain immutable value. Arithmetic on it is wall-clock
//! arithmetic — the cascade engine never inspects UTC offsets or DST rules,
//! which is why adding a day across a DST transition preserves the clock
//! time. Absolute-instant bookkeeping is delegated to chrono at the
//! conversion edges ([`CivilTime::to_zoned`], [`CivilTime::in_timezone`]);
//! the timezone is otherwise carried as an opaque handle.
//!
//! There is no process-wide default configuration: week start and timezone
//! are per-value state, threaded through every operation.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, days_from_civil};
use crate::error::{CivilError, Result};
use crate::position::Fields;
use crate::unit::Unit;

/// Boundary inclusion for [`CivilTime::between`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bounds {
    /// Both endpoints included.
    #[default]
    Closed,
    /// Both endpoints excluded.
    Open,
    /// Start included, end excluded.
    ClosedOpen,
    /// Start excluded, end included.
    OpenClosed,
}

/// A point in civil time: date, clock, timezone handle, week-start
/// convention.
///
/// Immutable and `Copy`; every operation returns a new value sharing the
/// receiver's timezone and week start unless explicitly overridden.
///
/// The year is an unchecked `i64`. Cascade arithmetic never bounds-checks
/// it; conversion to an absolute instant fails with
/// [`CivilError::OutOfRange`] outside chrono's representable span, and
/// behavior beyond `i64` field arithmetic itself is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CivilTime {
    year: i64,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanosecond: u32,
    tz: Tz,
    week_start: Weekday,
}

impl CivilTime {
    /// Timezone used by constructors that do not take one.
    pub const DEFAULT_TZ: Tz = Tz::UTC;
    /// Week start used by constructors that do not take one.
    pub const DEFAULT_WEEK_START: Weekday = Weekday::Mon;

    // ── Construction ────────────────────────────────────────────────────

    /// Create a civil time from validated components, in UTC with a Monday
    /// week start.
    ///
    /// # Errors
    ///
    /// Returns the matching `Invalid*` error when a component is out of
    /// range for its field (day is checked against the month's true
    /// length).
    pub fn new(year: i64, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(CivilError::InvalidMonth(month));
        }
        let max_day = calendar::days_in_month(year, month as i64) as u32;
        if day < 1 || day > max_day {
            return Err(CivilError::InvalidDay { year, month, day });
        }
        if hour > 23 {
            return Err(CivilError::InvalidHour(hour));
        }
        if minute > 59 {
            return Err(CivilError::InvalidMinute(minute));
        }
        if second > 59 {
            return Err(CivilError::InvalidSecond(second));
        }
        Ok(CivilTime {
            year,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
            nanosecond: 0,
            tz: Self::DEFAULT_TZ,
            week_start: Self::DEFAULT_WEEK_START,
        })
    }

    /// Create a civil date at midnight.
    ///
    /// # Errors
    ///
    /// Same validation as [`CivilTime::new`].
    pub fn from_ymd(year: i64, month: u32, day: u32) -> Result<Self> {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// The current wall-clock time in `tz`.
    ///
    /// This is the only clock read in the crate; everything downstream of a
    /// constructed value is deterministic.
    pub fn now(tz: Tz) -> Self {
        Utc::now().with_timezone(&tz).into()
    }

    /// Replace the sub-second component.
    ///
    /// # Errors
    ///
    /// Returns [`CivilError::InvalidNanosecond`] for values ≥ 10⁹.
    pub fn with_nanosecond(self, nanosecond: u32) -> Result<Self> {
        if nanosecond >= 1_000_000_000 {
            return Err(CivilError::InvalidNanosecond(nanosecond));
        }
        Ok(CivilTime { nanosecond, ..self })
    }

    /// Relabel the timezone handle, keeping the civil fields unchanged.
    /// Use [`CivilTime::in_timezone`] to convert through the instant
    /// instead.
    pub fn with_timezone(self, tz: Tz) -> Self {
        CivilTime { tz, ..self }
    }

    /// Replace the week-start convention used by week and weekday
    /// positioning.
    pub fn with_week_start(self, week_start: Weekday) -> Self {
        CivilTime { week_start, ..self }
    }

    /// Convert to the same instant expressed in another timezone.
    ///
    /// # Errors
    ///
    /// Fails like [`CivilTime::to_zoned`] when the receiver cannot be
    /// resolved to an instant.
    pub fn in_timezone(self, tz: Tz) -> Result<Self> {
        let converted: CivilTime = self.to_zoned()?.with_timezone(&tz).into();
        Ok(converted.with_week_start(self.week_start))
    }

    // ── Instant conversion (the chrono edge) ────────────────────────────

    /// Resolve the civil fields in the carried timezone.
    ///
    /// # Errors
    ///
    /// Returns [`CivilError::OutOfRange`] when the year exceeds chrono's
    /// representable span, and [`CivilError::AmbiguousLocalTime`] when the
    /// wall-clock time does not map to exactly one instant (DST gap or
    /// fold).
    pub fn to_zoned(&self) -> Result<DateTime<Tz>> {
        let year = i32::try_from(self.year)
            .map_err(|_| CivilError::OutOfRange(format!("year {}", self.year)))?;
        let naive = NaiveDate::from_ymd_opt(year, self.month as u32, self.day as u32)
            .and_then(|d| {
                d.and_hms_nano_opt(
                    self.hour as u32,
                    self.minute as u32,
                    self.second as u32,
                    self.nanosecond,
                )
            })
            .ok_or_else(|| CivilError::OutOfRange(format!("{self}")))?;
        self.tz
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| CivilError::AmbiguousLocalTime(format!("{self} in {}", self.tz)))
    }

    /// Resolve to an instant and express it in UTC.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`CivilTime::to_zoned`].
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        Ok(self.to_zoned()?.with_timezone(&Utc))
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month as u32
    }

    pub fn day(&self) -> u32 {
        self.day as u32
    }

    pub fn hour(&self) -> u32 {
        self.hour as u32
    }

    pub fn minute(&self) -> u32 {
        self.minute as u32
    }

    pub fn second(&self) -> u32 {
        self.second as u32
    }

    /// Milliseconds within the second (0-999).
    pub fn millisecond(&self) -> u32 {
        self.nanosecond / 1_000_000
    }

    /// Microseconds within the second (0-999,999).
    pub fn microsecond(&self) -> u32 {
        self.nanosecond / 1_000
    }

    /// Nanoseconds within the second (0-999,999,999).
    pub fn nanosecond(&self) -> u32 {
        self.nanosecond
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// Day of the week, derived from the date.
    pub fn weekday(&self) -> Weekday {
        calendar::weekday_of(self.year, self.month as i64, self.day as i64)
    }

    /// The ISO 8601 week-year and week number (1-53).
    pub fn iso_week(&self) -> (i64, u32) {
        let days = days_from_civil(self.year, self.month as i64, self.day as i64);
        // The Thursday of this Monday-started week pins the ISO week-year.
        let thursday = days + 3 - (days + 3).rem_euclid(7);
        let (iso_year, _, _) = calendar::civil_from_days(thursday);
        let week = (thursday - days_from_civil(iso_year, 1, 1)).div_euclid(7) + 1;
        (iso_year, week as u32)
    }

    /// Ordinal day within the year, 1-365 or 1-366.
    pub fn day_of_year(&self) -> u32 {
        let days = days_from_civil(self.year, self.month as i64, self.day as i64);
        (days - days_from_civil(self.year, 1, 1) + 1) as u32
    }

    /// Number of days in the current month.
    pub fn days_in_month(&self) -> u32 {
        calendar::days_in_month(self.year, self.month as i64) as u32
    }

    /// Number of days in the current year.
    pub fn days_in_year(&self) -> u32 {
        calendar::days_in_year(self.year) as u32
    }

    // ── Predicates ──────────────────────────────────────────────────────

    pub fn is_leap_year(&self) -> bool {
        calendar::is_leap_year(self.year)
    }

    /// Whether the current year has 53 ISO weeks.
    pub fn is_long_year(&self) -> bool {
        calendar::is_long_year(self.year)
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_am(&self) -> bool {
        self.hour < 12
    }

    // ── Civil comparison ────────────────────────────────────────────────
    //
    // Comparisons order the civil fields and ignore the timezone: 14:00 in
    // Tokyo compares after 13:00 in New York. Compare instants via
    // `to_zoned` when absolute order matters.

    fn civil_key(&self) -> (i64, u8, u8, u8, u8, u8, u32) {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.nanosecond,
        )
    }

    /// Whether `self` is strictly before `other` in civil field order.
    pub fn is_before(&self, other: &CivilTime) -> bool {
        self.civil_key() < other.civil_key()
    }

    /// Whether `self` is strictly after `other` in civil field order.
    pub fn is_after(&self, other: &CivilTime) -> bool {
        self.civil_key() > other.civil_key()
    }

    /// Whether `self` lies between `start` and `end` under the given
    /// boundary rule.
    pub fn between(&self, start: &CivilTime, end: &CivilTime, bounds: Bounds) -> bool {
        let k = self.civil_key();
        let (lo, hi) = (start.civil_key(), end.civil_key());
        match bounds {
            Bounds::Closed => lo <= k && k <= hi,
            Bounds::Open => lo < k && k < hi,
            Bounds::ClosedOpen => lo <= k && k < hi,
            Bounds::OpenClosed => lo < k && k <= hi,
        }
    }

    /// Whether `self` and `other` fall in the same instance of `unit`
    /// (including agreement of every coarser field).
    ///
    /// Coarse units compare fields directly; week-shaped and finer units
    /// compare the aligned starts of the containing instance, so the
    /// receiver's week-start convention participates.
    pub fn is_same(&self, unit: Unit, other: &CivilTime) -> bool {
        match unit {
            Unit::Century => self.year.div_euclid(100) == other.year.div_euclid(100),
            Unit::Decade => self.year.div_euclid(10) == other.year.div_euclid(10),
            Unit::Year => self.year == other.year,
            Unit::Quarter => {
                self.year == other.year
                    && (self.month - 1) / 3 == (other.month - 1) / 3
            }
            Unit::Month => self.year == other.year && self.month == other.month,
            Unit::Day => {
                self.year == other.year && self.month == other.month && self.day == other.day
            }
            _ => {
                let a = self.start(unit, &[0]);
                let b = other.start(unit, &[0]);
                a.civil_key() == b.civil_key()
            }
        }
    }

    // ── Cascade plumbing ────────────────────────────────────────────────

    pub(crate) fn fields(&self) -> Fields {
        Fields {
            y: self.year,
            m: self.month as i64,
            d: self.day as i64,
            h: self.hour as i64,
            min: self.minute as i64,
            s: self.second as i64,
            ns: self.nanosecond as i64,
        }
    }

    /// Rebuild from normalized fields, carrying over timezone and week
    /// start. Callers must pass the output of [`Fields::normalize`].
    pub(crate) fn from_fields(f: Fields, tz: Tz, week_start: Weekday) -> Self {
        CivilTime {
            year: f.y,
            month: f.m as u8,
            day: f.d as u8,
            hour: f.h as u8,
            minute: f.min as u8,
            second: f.s as u8,
            nanosecond: f.ns as u32,
            tz,
            week_start,
        }
    }
}

impl From<DateTime<Tz>> for CivilTime {
    fn from(dt: DateTime<Tz>) -> Self {
        CivilTime {
            year: dt.year() as i64,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            nanosecond: dt.nanosecond().min(999_999_999),
            tz: dt.timezone(),
            week_start: Self::DEFAULT_WEEK_START,
        }
    }
}

impl From<DateTime<Utc>> for CivilTime {
    fn from(dt: DateTime<Utc>) -> Self {
        dt.with_timezone(&Tz::UTC).into()
    }
}

impl fmt::Display for CivilTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.nanosecond != 0 {
            let frac = format!("{:09}", self.nanosecond);
            write!(f, ".{}", frac.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn civil(y: i64, m: u32, d: u32, h: u32, min: u32, s: u32) -> CivilTime {
        CivilTime::new(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_new_validates_components() {
        assert!(CivilTime::new(2024, 2, 29, 0, 0, 0).is_ok());
        assert_eq!(
            CivilTime::new(2023, 2, 29, 0, 0, 0),
            Err(CivilError::InvalidDay { year: 2023, month: 2, day: 29 })
        );
        assert_eq!(CivilTime::new(2024, 13, 1, 0, 0, 0), Err(CivilError::InvalidMonth(13)));
        assert_eq!(CivilTime::new(2024, 1, 1, 24, 0, 0), Err(CivilError::InvalidHour(24)));
        assert_eq!(CivilTime::new(2024, 1, 1, 0, 60, 0), Err(CivilError::InvalidMinute(60)));
        assert_eq!(CivilTime::new(2024, 1, 1, 0, 0, 60), Err(CivilError::InvalidSecond(60)));
        assert_eq!(
            civil(2024, 1, 1, 0, 0, 0).with_nanosecond(1_000_000_000),
            Err(CivilError::InvalidNanosecond(1_000_000_000))
        );
    }

    #[test]
    fn test_display_trims_trailing_zeros() {
        assert_eq!(civil(2024, 4, 15, 14, 30, 45).to_string(), "2024-04-15 14:30:45");
        assert_eq!(
            civil(2024, 1, 1, 12, 0, 0).with_nanosecond(500_000_000).unwrap().to_string(),
            "2024-01-01 12:00:00.5"
        );
        assert_eq!(
            civil(2024, 1, 1, 0, 0, 0).with_nanosecond(999_999_999).unwrap().to_string(),
            "2024-01-01 00:00:00.999999999"
        );
    }

    #[test]
    fn test_accessors_and_predicates() {
        let t = civil(2024, 4, 15, 14, 30, 45).with_nanosecond(123_456_789).unwrap();
        assert_eq!(t.year(), 2024);
        assert_eq!(t.month(), 4);
        assert_eq!(t.day(), 15);
        assert_eq!((t.hour(), t.minute(), t.second()), (14, 30, 45));
        assert_eq!(t.millisecond(), 123);
        assert_eq!(t.microsecond(), 123_456);
        assert_eq!(t.nanosecond(), 123_456_789);
        assert_eq!(t.weekday(), Weekday::Mon);
        assert_eq!(t.day_of_year(), 106);
        assert_eq!(t.days_in_month(), 30);
        assert_eq!(t.days_in_year(), 366);
        assert!(t.is_leap_year());
        assert!(!t.is_weekend());
        assert!(!t.is_am());
        assert!(civil(2024, 4, 13, 9, 0, 0).is_weekend());
    }

    #[test]
    fn test_iso_week() {
        // 2022-01-01 is a Saturday in ISO 2021-W52.
        assert_eq!(civil(2022, 1, 1, 0, 0, 0).iso_week(), (2021, 52));
        // 2021-01-01 is a Friday in ISO 2020-W53.
        assert_eq!(civil(2021, 1, 1, 0, 0, 0).iso_week(), (2020, 53));
        assert_eq!(civil(2022, 1, 3, 0, 0, 0).iso_week(), (2022, 1));
        assert_eq!(civil(2024, 4, 15, 0, 0, 0).iso_week(), (2024, 16));
        assert_eq!(civil(2026, 1, 21, 0, 0, 0).iso_week(), (2026, 4));
        // 2009 is a long year: Dec 31 sits in W53.
        assert_eq!(civil(2009, 12, 31, 0, 0, 0).iso_week(), (2009, 53));
    }

    #[test]
    fn test_civil_comparison_ignores_timezone() {
        let ny = civil(2024, 4, 15, 13, 0, 0).with_timezone(Tz::America__New_York);
        let tokyo = civil(2024, 4, 15, 14, 0, 0).with_timezone(Tz::Asia__Tokyo);
        assert!(ny.is_before(&tokyo));
        assert!(tokyo.is_after(&ny));

        let lo = civil(2024, 4, 15, 0, 0, 0);
        let hi = civil(2024, 4, 16, 0, 0, 0);
        assert!(lo.between(&lo, &hi, Bounds::Closed));
        assert!(!lo.between(&lo, &hi, Bounds::Open));
        assert!(lo.between(&lo, &hi, Bounds::ClosedOpen));
        assert!(!hi.between(&lo, &hi, Bounds::ClosedOpen));
        assert!(hi.between(&lo, &hi, Bounds::OpenClosed));
    }

    #[test]
    fn test_is_same() {
        let a = civil(2024, 4, 15, 14, 30, 45);
        assert!(a.is_same(Unit::Century, &civil(2099, 1, 1, 0, 0, 0)));
        assert!(!a.is_same(Unit::Century, &civil(2100, 1, 1, 0, 0, 0)));
        assert!(a.is_same(Unit::Decade, &civil(2029, 12, 31, 0, 0, 0)));
        assert!(a.is_same(Unit::Quarter, &civil(2024, 6, 30, 0, 0, 0)));
        assert!(!a.is_same(Unit::Quarter, &civil(2024, 7, 1, 0, 0, 0)));
        assert!(a.is_same(Unit::Day, &civil(2024, 4, 15, 23, 59, 59)));
        assert!(a.is_same(Unit::Hour, &civil(2024, 4, 15, 14, 5, 0)));
        assert!(!a.is_same(Unit::Hour, &civil(2024, 4, 15, 15, 30, 45)));
        // Week identity honors the week start: Sunday 2024-04-14 and Monday
        // 2024-04-15 share a Sunday-started week but not a Monday-started
        // one.
        let sun = civil(2024, 4, 14, 12, 0, 0);
        assert!(!a.is_same(Unit::Week, &sun));
        let a_sun = a.with_week_start(Weekday::Sun);
        let sun_sun = sun.with_week_start(Weekday::Sun);
        assert!(a_sun.is_same(Unit::Week, &sun_sun));
    }

    #[test]
    fn test_zoned_round_trip() {
        let t = civil(2026, 3, 15, 10, 0, 0).with_timezone(Tz::America__New_York);
        let zoned = t.to_zoned().unwrap();
        assert_eq!(zoned.to_rfc3339(), "2026-03-15T10:00:00-04:00");
        let back: CivilTime = zoned.into();
        assert_eq!(back.with_week_start(t.week_start()), t);

        let utc = t.to_utc().unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-03-15T14:00:00+00:00");
    }

    #[test]
    fn test_zoned_rejects_nonexistent_local_time() {
        // 2026-03-08 02:30 does not exist in New York (spring forward).
        let t = civil(2026, 3, 8, 2, 30, 0).with_timezone(Tz::America__New_York);
        assert!(matches!(t.to_zoned(), Err(CivilError::AmbiguousLocalTime(_))));
    }

    #[test]
    fn test_zoned_rejects_out_of_range_year() {
        let t = civil(1, 1, 1, 0, 0, 0).add(Unit::Year, &[9_000_000_000]);
        assert!(matches!(t.to_zoned(), Err(CivilError::OutOfRange(_))));
    }

    #[test]
    fn test_in_timezone_converts_through_instant() {
        let ny = civil(2026, 1, 15, 14, 0, 0)
            .with_timezone(Tz::America__New_York)
            .with_week_start(Weekday::Sun);
        let tokyo = ny.in_timezone(Tz::Asia__Tokyo).unwrap();
        // 14:00 EST = 19:00 UTC = 04:00 next day in Tokyo.
        assert_eq!(tokyo.to_string(), "2026-01-16 04:00:00");
        assert_eq!(tokyo.timezone(), Tz::Asia__Tokyo);
        assert_eq!(tokyo.week_start(), Weekday::Sun);
    }

    #[test]
    fn test_serde_round_trip() {
        let t = civil(2024, 4, 15, 14, 30, 45)
            .with_timezone(Tz::Europe__Paris)
            .with_week_start(Weekday::Sun);
        let json = serde_json::to_string(&t).unwrap();
        let back: CivilTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
