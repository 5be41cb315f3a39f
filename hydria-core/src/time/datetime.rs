//! Calendar timestamp exchanged with the clock source
//!
//! Mirrors what a battery-backed RTC stores: a broken-down civil date and
//! time plus a day-of-week register. Conversions to and from Unix seconds
//! use the days-from-civil algorithm, so no tables are needed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Earliest year an RTC timestamp may carry
pub const MIN_YEAR: u16 = 2000;

/// Latest year an RTC timestamp may carry
pub const MAX_YEAR: u16 = 2099;

const SECS_PER_DAY: u64 = 86_400;

/// Days between 0000-03-01 and 1970-01-01 in the proleptic Gregorian calendar
const DAYS_TO_UNIX_EPOCH: u64 = 719_468;

/// Days in a 400-year Gregorian era
const DAYS_PER_ERA: u64 = 146_097;

/// Broken-down wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DateTime {
    /// Full year (2000-2099)
    pub year: u16,
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31, depending on month)
    pub day: u8,
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
    /// Day of week, 1 = Monday ... 7 = Sunday
    pub weekday: u8,
}

impl DateTime {
    /// Create a timestamp, deriving the weekday from the date
    ///
    /// The result is not validated; call [`DateTime::is_valid`] before
    /// handing it to a clock.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let weekday = if (1..=12).contains(&month) && day >= 1 {
            weekday_from_days(days_from_civil(year, month, day))
        } else {
            0
        };
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday,
        }
    }

    /// Check every field against calendar bounds
    pub fn is_valid(&self) -> bool {
        if self.year < MIN_YEAR || self.year > MAX_YEAR {
            return false;
        }
        if self.month < 1 || self.month > 12 {
            return false;
        }
        if self.day < 1 || self.day > days_in_month(self.year, self.month) {
            return false;
        }
        if self.hour > 23 || self.minute > 59 || self.second > 59 {
            return false;
        }
        (1..=7).contains(&self.weekday)
    }

    /// Seconds since 1970-01-01T00:00:00
    ///
    /// Returns `None` for timestamps that fail [`DateTime::is_valid`].
    pub fn to_unix(&self) -> Option<u64> {
        if !self.is_valid() {
            return None;
        }
        let days = days_from_civil(self.year, self.month, self.day);
        let secs_of_day =
            self.hour as u64 * 3600 + self.minute as u64 * 60 + self.second as u64;
        Some(days * SECS_PER_DAY + secs_of_day)
    }

    /// Build a timestamp from seconds since 1970-01-01T00:00:00
    ///
    /// Years beyond `u16` saturate; such values fail validation.
    pub fn from_unix(secs: u64) -> Self {
        let days = secs / SECS_PER_DAY;
        let secs_of_day = secs % SECS_PER_DAY;
        let (year, month, day) = civil_from_days(days);

        Self {
            year,
            month,
            day,
            hour: (secs_of_day / 3600) as u8,
            minute: ((secs_of_day % 3600) / 60) as u8,
            second: (secs_of_day % 60) as u8,
            weekday: weekday_from_days(days),
        }
    }
}

/// Gregorian leap year rule
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since the Unix epoch for a date on or after 1970-01-01
fn days_from_civil(year: u16, month: u8, day: u8) -> u64 {
    // Shift the year so it starts in March; leap days fall at the end
    let y = if month <= 2 {
        (year as u64).saturating_sub(1)
    } else {
        year as u64
    };
    let era = y / 400;
    let yoe = y - era * 400;
    let mp = (month as u64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day as u64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    (era * DAYS_PER_ERA + doe).saturating_sub(DAYS_TO_UNIX_EPOCH)
}

/// Inverse of [`days_from_civil`]
fn civil_from_days(days: u64) -> (u16, u8, u8) {
    let z = days + DAYS_TO_UNIX_EPOCH;
    let era = z / DAYS_PER_ERA;
    let doe = z - era * DAYS_PER_ERA;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + u64::from(month <= 2);
    (u16::try_from(year).unwrap_or(u16::MAX), month, day)
}

/// ISO weekday for a day count since the epoch (1970-01-01 was a Thursday)
fn weekday_from_days(days: u64) -> u8 {
    ((days + 3) % 7) as u8 + 1
}
