use std::sync::OnceLock;

use chrono::{Days, NaiveDate, NaiveTime, Timelike};
use regex::Regex;
use serde::Deserialize;

use crate::model::Cell;

/// Smallest serial accepted as a calendar date (1899-12-31).
const MIN_DATE_SERIAL: f64 = 1.0;
/// Largest serial accepted as a calendar date (9999-12-31).
const MAX_DATE_SERIAL: f64 = 2_958_465.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,4})[/.\-](\d{1,2})[/.\-](\d{1,4})(?:[\sT].*)?$").unwrap()
    })
}

fn date_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,4}[/.\-]\d{1,2}[/.\-]\d{1,4}").unwrap())
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[:hH](\d{2})(?::(\d{2})(?:[.,]\d+)?)?(?:\s*([aApP])\.?[mM]\.?)?$").unwrap()
    })
}

fn time_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}[:hH]\d{2}").unwrap())
}

fn meridiem_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[aApP]\.?[mM]\.?$").unwrap())
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a calendar date from a day-first text cell or a date serial.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => parse_date_text(s),
        Cell::Number(n) | Cell::DateSerial(n) => serial_to_date(*n),
    }
}

/// Day-first text (`15/03/2024`, `15-03-24`, `15.03.2024 00:00:00`) or ISO
/// (`2024-03-15`). Two-digit years land in 2000..=2099.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let caps = date_re().captures(s.trim())?;
    let a = &caps[1];
    let b: u32 = caps[2].parse().ok()?;
    let c = &caps[3];

    if a.len() == 4 {
        // ISO: year first
        if c.len() > 2 {
            return None;
        }
        let year: i32 = a.parse().ok()?;
        let day: u32 = c.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, b, day);
    }

    if a.len() > 2 {
        return None;
    }
    let day: u32 = a.parse().ok()?;
    let year: i32 = match c.len() {
        2 => 2000 + c.parse::<i32>().ok()?,
        4 => c.parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, b, day)
}

/// Convert a spreadsheet serial (epoch 1899-12-30) to a date, ignoring the
/// time-of-day fraction.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(MIN_DATE_SERIAL..=MAX_DATE_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

/// Whether a cell is shaped like a date, regardless of whether it is a valid one.
pub fn looks_like_date(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => false,
        Cell::Text(s) => date_like_re().is_match(s.trim()),
        Cell::DateSerial(n) => *n >= MIN_DATE_SERIAL,
        Cell::Number(n) => n.is_finite() && *n >= MIN_DATE_SERIAL && *n <= MAX_DATE_SERIAL,
    }
}

// ---------------------------------------------------------------------------
// Times
// ---------------------------------------------------------------------------

/// Parse a time of day from `HH:MM` / `HH:MM:SS` text or a fractional-day numeric.
///
/// Plain numbers must lie in `[0, 1)`. A date serial carries its time in the
/// fraction, so only whole-day serials (pure dates) are rejected.
pub fn parse_time(cell: &Cell) -> Option<NaiveTime> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => parse_time_text(s),
        Cell::Number(n) => fraction_to_time(*n),
        Cell::DateSerial(n) => {
            if !n.is_finite() || *n < 0.0 {
                return None;
            }
            if *n >= 1.0 && n.fract() == 0.0 {
                return None;
            }
            fraction_to_time(n.fract())
        }
    }
}

/// `HH:MM[:SS]` or `HHhMM`, optionally followed by `AM`/`PM` (12-hour clock,
/// hour 1..=12).
pub fn parse_time_text(s: &str) -> Option<NaiveTime> {
    let caps = time_re().captures(s.trim())?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if let Some(meridiem) = caps.get(4) {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Whether a text token starts like a time (`14:30`, `7h05`), valid or not.
pub fn looks_like_time_text(token: &str) -> bool {
    time_like_re().is_match(token.trim())
}

/// A standalone `AM`/`PM` marker (`pm`, `P.M.`).
pub fn is_meridiem(token: &str) -> bool {
    meridiem_re().is_match(token.trim())
}

/// `value × 86400` seconds past midnight, rounded to the nearest second.
/// The last half-second of the day stays on 23:59:59.
pub fn fraction_to_time(value: f64) -> Option<NaiveTime> {
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return None;
    }
    let secs = ((value * SECONDS_PER_DAY).round() as u32).min(SECONDS_PER_DAY as u32 - 1);
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
}

/// Whether a cell holds something shaped like a time (text token or day fraction).
pub fn looks_like_time(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => false,
        Cell::Text(s) => s.split_whitespace().any(looks_like_time_text),
        Cell::Number(n) => (0.0..1.0).contains(n),
        Cell::DateSerial(n) => (0.0..1.0).contains(n) || n.fract() != 0.0,
    }
}

// ---------------------------------------------------------------------------
// Granularity
// ---------------------------------------------------------------------------

/// Precision at which airing times are compared against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGranularity {
    Second,
    #[default]
    Minute,
    Hour,
}

impl TimeGranularity {
    pub fn truncate(self, t: NaiveTime) -> NaiveTime {
        let (h, m, s) = match self {
            Self::Second => (t.hour(), t.minute(), t.second()),
            Self::Minute => (t.hour(), t.minute(), 0),
            Self::Hour => (t.hour(), 0, 0),
        };
        // h/m/s come from a valid NaiveTime, so this cannot fail
        NaiveTime::from_hms_opt(h, m, s).unwrap_or(t)
    }
}

impl std::fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Second => write!(f, "second"),
            Self::Minute => write!(f, "minute"),
            Self::Hour => write!(f, "hour"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn day_first_text_dates() {
        assert_eq!(parse_date_text("15/03/2024"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date_text("5-3-2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date_text("15.03.24"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date_text(" 15/03/2024 00:00:00 "), Some(d(2024, 3, 15)));
    }

    #[test]
    fn iso_text_dates() {
        assert_eq!(parse_date_text("2024-03-15"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date_text("2024-03-15T10:00:00"), Some(d(2024, 3, 15)));
    }

    #[test]
    fn invalid_dates_fail_closed() {
        assert_eq!(parse_date_text("32/13/2024"), None);
        assert_eq!(parse_date_text("31/02/2024"), None);
        assert_eq!(parse_date_text("15/03/202"), None);
        assert_eq!(parse_date_text("Comercial: X"), None);
        assert_eq!(parse_date(&Cell::Empty), None);
    }

    #[test]
    fn date_serials() {
        // 45366 = 2024-03-15
        assert_eq!(parse_date(&Cell::DateSerial(45366.0)), Some(d(2024, 3, 15)));
        assert_eq!(parse_date(&Cell::DateSerial(45366.75)), Some(d(2024, 3, 15)));
        assert_eq!(parse_date(&Cell::Number(45366.0)), Some(d(2024, 3, 15)));
        assert_eq!(parse_date(&Cell::Number(0.5)), None);
        assert_eq!(parse_date(&Cell::Number(-3.0)), None);
    }

    #[test]
    fn looks_like_date_but_invalid() {
        let cell = Cell::text("32/13/2024");
        assert!(looks_like_date(&cell));
        assert_eq!(parse_date(&cell), None);
        assert!(!looks_like_date(&Cell::text("Veículo: Radio Mix FM")));
    }

    #[test]
    fn text_times() {
        assert_eq!(parse_time_text("14:30"), Some(t(14, 30, 0)));
        assert_eq!(parse_time_text("14:30:15"), Some(t(14, 30, 15)));
        assert_eq!(parse_time_text("7:05"), Some(t(7, 5, 0)));
        assert_eq!(parse_time_text("14h30"), Some(t(14, 30, 0)));
        assert_eq!(parse_time_text("14:30:15.250"), Some(t(14, 30, 15)));
    }

    #[test]
    fn twelve_hour_times() {
        assert_eq!(parse_time_text("2:30 PM"), Some(t(14, 30, 0)));
        assert_eq!(parse_time_text("2:30:00 pm"), Some(t(14, 30, 0)));
        assert_eq!(parse_time_text("9:15AM"), Some(t(9, 15, 0)));
        assert_eq!(parse_time_text("12:05 a.m."), Some(t(0, 5, 0)));
        assert_eq!(parse_time_text("12:05 PM"), Some(t(12, 5, 0)));
        assert_eq!(parse_time_text("14:30 PM"), None);
        assert_eq!(parse_time_text("0:30 AM"), None);
        assert!(is_meridiem("PM"));
        assert!(is_meridiem("a.m."));
        assert!(!is_meridiem("Promo"));
    }

    #[test]
    fn invalid_times_fail_closed() {
        assert_eq!(parse_time_text("25:00"), None);
        assert_eq!(parse_time_text("12:61"), None);
        assert_eq!(parse_time_text("noon"), None);
        assert_eq!(parse_time(&Cell::Empty), None);
    }

    #[test]
    fn fractional_day_times() {
        // 0.5 day = 12:00:00
        assert_eq!(parse_time(&Cell::Number(0.5)), Some(t(12, 0, 0)));
        // 14:30 = 52200 s = 0.6041666…
        assert_eq!(parse_time(&Cell::Number(52200.0 / 86400.0)), Some(t(14, 30, 0)));
        assert_eq!(parse_time(&Cell::Number(1.0)), None);
        assert_eq!(parse_time(&Cell::Number(-0.1)), None);
    }

    #[test]
    fn last_half_second_of_day_stays_in_range() {
        assert_eq!(parse_time(&Cell::Number(86399.0 / 86400.0)), Some(t(23, 59, 59)));
        assert_eq!(parse_time(&Cell::Number(86399.6 / 86400.0)), Some(t(23, 59, 59)));
        assert_eq!(parse_time(&Cell::DateSerial(45366.0 + 86399.8 / 86400.0)), Some(t(23, 59, 59)));
    }

    #[test]
    fn date_serial_times() {
        assert_eq!(parse_time(&Cell::DateSerial(45366.5)), Some(t(12, 0, 0)));
        assert_eq!(parse_time(&Cell::DateSerial(0.25)), Some(t(6, 0, 0)));
        // Whole-day serial is a date, not a time
        assert_eq!(parse_time(&Cell::DateSerial(45366.0)), None);
    }

    #[test]
    fn time_shape_detection() {
        assert!(looks_like_time(&Cell::text("14:30:00")));
        assert!(looks_like_time(&Cell::text("14:30 15:45")));
        assert!(looks_like_time(&Cell::Number(0.25)));
        assert!(!looks_like_time(&Cell::Number(3.0)));
        assert!(!looks_like_time(&Cell::text("Summer Promo")));
    }

    #[test]
    fn granularity_truncation() {
        let time = t(14, 30, 59);
        assert_eq!(TimeGranularity::Second.truncate(time), t(14, 30, 59));
        assert_eq!(TimeGranularity::Minute.truncate(time), t(14, 30, 0));
        assert_eq!(TimeGranularity::Hour.truncate(time), t(14, 0, 0));
        assert_eq!(TimeGranularity::default(), TimeGranularity::Minute);
    }
}
