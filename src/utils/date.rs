//! UTC timestamps for manifest build times and feed dates.
//!
//! A timestamp is stored as whole days since the Unix epoch plus seconds into
//! that day, so ordering and weekday lookup need no calendar math. Calendar
//! fields are only derived when formatting.

use std::time::{SystemTime, UNIX_EPOCH};

const SECS_PER_DAY: i64 = 86_400;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Indexed by `days_since_epoch mod 7`; the epoch was a Thursday.
const DAY_NAMES: [&str; 7] = ["Thu", "Fri", "Sat", "Sun", "Mon", "Tue", "Wed"];

/// A second-precision UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcTime {
    days: i64,
    secs: u32,
}

impl UtcTime {
    pub fn from_unix_secs(secs: i64) -> Self {
        Self {
            days: secs.div_euclid(SECS_PER_DAY),
            secs: secs.rem_euclid(SECS_PER_DAY) as u32,
        }
    }

    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64);
        Self::from_unix_secs(secs)
    }

    /// Build from calendar fields, rejecting impossible dates and times.
    pub fn from_parts(year: i64, month: u32, day: u32, h: u32, m: u32, s: u32) -> Option<Self> {
        if h > 23 || m > 59 || s > 59 {
            return None;
        }
        let days = days_from_civil(year, month, day)?;
        Some(Self {
            days,
            secs: h * 3600 + m * 60 + s,
        })
    }

    /// Accepts `YYYY-MM-DD` and `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn parse(text: &str) -> Option<Self> {
        let (date, time) = match text.split_once('T') {
            Some((date, time)) => (date, Some(time.strip_suffix('Z')?)),
            None => (text, None),
        };

        let [year, month, day] = fields(date, '-', [4, 2, 2])?;
        let [h, m, s] = match time {
            Some(time) => fields(time, ':', [2, 2, 2])?,
            None => [0, 0, 0],
        };
        Self::from_parts(i64::from(year), month, day, h, m, s)
    }

    #[cfg(test)]
    pub fn unix_secs(self) -> i64 {
        self.days * SECS_PER_DAY + i64::from(self.secs)
    }

    /// `2024-06-15T14:30:45Z`
    pub fn to_rfc3339(self) -> String {
        let (year, month, day) = civil_from_days(self.days);
        let (h, m, s) = self.clock();
        format!("{year:04}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}Z")
    }

    /// `Sat, 15 Jun 2024 14:30:45 GMT`
    pub fn to_rfc2822(self) -> String {
        let (year, month, day) = civil_from_days(self.days);
        let (h, m, s) = self.clock();
        let weekday = DAY_NAMES[self.days.rem_euclid(7) as usize];
        let month = MONTH_NAMES[month as usize - 1];
        format!("{weekday}, {day:02} {month} {year:04} {h:02}:{m:02}:{s:02} GMT")
    }

    fn clock(self) -> (u32, u32, u32) {
        (self.secs / 3600, self.secs / 60 % 60, self.secs % 60)
    }
}

/// Split `text` on `sep` into exactly three all-digit fields of the given widths.
fn fields(text: &str, sep: char, widths: [usize; 3]) -> Option<[u32; 3]> {
    let mut parts = text.split(sep);
    let mut out = [0; 3];
    for (slot, width) in out.iter_mut().zip(widths) {
        let part = parts.next()?;
        if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    parts.next().is_none().then_some(out)
}

/// Days since 1970-01-01 for a proleptic Gregorian date, `None` if the date
/// does not exist.
fn days_from_civil(year: i64, month: u32, day: u32) -> Option<i64> {
    if !(1..=12).contains(&month) || day == 0 {
        return None;
    }
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let mp = i64::from((month + 9) % 12);
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days = era * 146_097 + doe - 719_468;

    // Day 31 of a 30-day month lands on the 1st of the next one
    (civil_from_days(days) == (year, month, day)).then_some(days)
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        let t = UtcTime::from_unix_secs(0);
        assert_eq!(t.to_rfc3339(), "1970-01-01T00:00:00Z");
        assert_eq!(t.to_rfc2822(), "Thu, 01 Jan 1970 00:00:00 GMT");
    }

    #[test]
    fn test_leap_day_from_secs() {
        let t = UtcTime::from_unix_secs(1_709_210_096);
        assert_eq!(t.to_rfc3339(), "2024-02-29T12:34:56Z");
        assert_eq!(t.unix_secs(), 1_709_210_096);
    }

    #[test]
    fn test_parse_formats() {
        let date = UtcTime::parse("2024-06-15").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-06-15T00:00:00Z");

        let full = UtcTime::parse("2024-06-15T14:30:45Z").unwrap();
        assert_eq!(full.to_rfc2822(), "Sat, 15 Jun 2024 14:30:45 GMT");
        assert!(date < full);
    }

    #[test]
    fn test_parse_rejects() {
        for bad in [
            "2024-13-01",
            "2023-02-29",
            "2024-04-31",
            "2024-6-15",
            "June 15",
            "2024-06-15T25:00:00Z",
            "2024-06-15T12:00:00",
            "2024-06-15T12:00:00+02:00",
            "2024-06-15-01",
        ] {
            assert!(UtcTime::parse(bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn test_ordering_across_years() {
        let a = UtcTime::parse("2023-12-31T23:59:59Z").unwrap();
        let b = UtcTime::parse("2024-01-01").unwrap();
        assert!(a < b);
        assert_eq!(b.unix_secs() - a.unix_secs(), 1);
    }
}
