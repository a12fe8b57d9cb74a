//! MS-DOS timestamp handling.
//!
//! ZIP headers store modification times as a packed pair of 16-bit MS-DOS
//! values: a time word (2-second resolution) and a date word (years counted
//! from 1980). This module provides the [`DosDateTime`] value type and its
//! conversions to and from [`SystemTime`].
//!
//! # Precision and range
//!
//! - Seconds are stored divided by two; the low bit is lost.
//! - Representable years are 1980 through 2107. Conversions clamp to that
//!   range rather than failing, matching how ZIP tooling behaves.
//!
//! # Example
//!
//! ```rust
//! use zipedit::timestamp::DosDateTime;
//! use std::time::SystemTime;
//!
//! let now = DosDateTime::from_system_time(SystemTime::now());
//! let (date, time) = (now.date_word(), now.time_word());
//! let back = DosDateTime::new(date, time);
//! assert_eq!(now, back);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the Unix epoch and 1980-01-01T00:00:00Z, the DOS epoch.
const DOS_EPOCH_UNIX_SECS: i64 = 315_532_800;

/// Latest representable moment: 2107-12-31T23:59:58Z.
const DOS_MAX_UNIX_SECS: i64 = 4_354_819_198;

const SECS_PER_DAY: i64 = 86_400;

/// A modification time in the packed MS-DOS format used by ZIP headers.
///
/// Stores the raw date and time words; calendar fields are unpacked on
/// demand. Equality is on the packed representation, so two timestamps
/// within the same 2-second bucket compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DosDateTime {
    date: u16,
    time: u16,
}

impl Default for DosDateTime {
    /// The DOS epoch, 1980-01-01 00:00:00.
    fn default() -> Self {
        Self {
            date: 0x0021, // year 0 (1980), month 1, day 1
            time: 0,
        }
    }
}

impl DosDateTime {
    /// Creates a timestamp from raw packed date and time words.
    #[inline]
    pub const fn new(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    /// The packed date word (bits: 15..9 year-1980, 8..5 month, 4..0 day).
    #[inline]
    pub const fn date_word(&self) -> u16 {
        self.date
    }

    /// The packed time word (bits: 15..11 hour, 10..5 minute, 4..0 second/2).
    #[inline]
    pub const fn time_word(&self) -> u16 {
        self.time
    }

    /// Year (1980..=2107).
    pub const fn year(&self) -> u32 {
        1980 + ((self.date >> 9) & 0x7F) as u32
    }

    /// Month (1..=12 for well-formed words).
    pub const fn month(&self) -> u32 {
        ((self.date >> 5) & 0x0F) as u32
    }

    /// Day of month (1..=31 for well-formed words).
    pub const fn day(&self) -> u32 {
        (self.date & 0x1F) as u32
    }

    /// Hour (0..=23 for well-formed words).
    pub const fn hour(&self) -> u32 {
        ((self.time >> 11) & 0x1F) as u32
    }

    /// Minute (0..=59 for well-formed words).
    pub const fn minute(&self) -> u32 {
        ((self.time >> 5) & 0x3F) as u32
    }

    /// Second (0..=58, always even).
    pub const fn second(&self) -> u32 {
        ((self.time & 0x1F) as u32) * 2
    }

    /// Converts a [`SystemTime`] to a DOS timestamp, clamping to the
    /// representable 1980–2107 range.
    pub fn from_system_time(t: SystemTime) -> Self {
        let unix_secs = match t.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            // Pre-1970 clamps to the DOS epoch below.
            Err(_) => 0,
        };
        Self::from_unix_secs(unix_secs)
    }

    /// Converts Unix seconds (UTC) to a DOS timestamp, clamping to range.
    pub fn from_unix_secs(unix_secs: i64) -> Self {
        let secs = unix_secs.clamp(DOS_EPOCH_UNIX_SECS, DOS_MAX_UNIX_SECS);

        let days = secs.div_euclid(SECS_PER_DAY);
        let rem = secs.rem_euclid(SECS_PER_DAY) as u32;
        let (year, month, day) = civil_from_days(days);

        let hour = rem / 3600;
        let minute = (rem % 3600) / 60;
        let second = rem % 60;

        let date = (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16;
        let time = ((hour as u16) << 11) | ((minute as u16) << 5) | ((second / 2) as u16);
        Self { date, time }
    }

    /// Converts this timestamp to Unix seconds (UTC).
    ///
    /// Malformed words (month 0, day 0) are clamped to the nearest valid
    /// field value rather than wrapping.
    pub fn as_unix_secs(&self) -> i64 {
        let month = self.month().clamp(1, 12);
        let day = self.day().clamp(1, 31);
        let days = days_from_civil(self.year() as i64, month, day);
        days * SECS_PER_DAY
            + (self.hour().min(23) as i64) * 3600
            + (self.minute().min(59) as i64) * 60
            + self.second().min(59) as i64
    }

    /// Converts this timestamp to a [`SystemTime`].
    pub fn as_system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.as_unix_secs().max(0) as u64)
    }

    /// The current moment as a DOS timestamp.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }
}

/// Days since the Unix epoch for a civil date (proleptic Gregorian).
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400); // [0, 399]
    let mp = (month as i64 + 9) % 12; // March = 0
    let doy = (153 * mp + 2) / 5 + day as i64 - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146_097 + doe - 719_468
}

/// Civil date (year, month, day) for days since the Unix epoch.
fn civil_from_days(days: i64) -> (u32, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097); // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32; // [1, 31]
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32; // [1, 12]
    let year = if month <= 2 { y + 1 } else { y };
    (year as u32, month, day)
}
