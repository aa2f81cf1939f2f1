//! Time-of-day handling for the results board and the search form.
//!
//! The board shows departures as "HH:MM" inside cells that may also carry
//! the station name. The search form only offers 2-hour start buckets.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Any two-digit, colon, two-digit run. Digit adjacency is checked separately.
static HHMM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]{2}:[0-9]{2}").expect("static pattern"));

/// A valid time of day in "HH:MM" form.
///
/// Stored as the five ASCII bytes of its canonical text so that exact-time
/// policies compare the rendered string, not a number.
///
/// # Examples
///
/// ```
/// use srt_booker::domain::ClockTime;
///
/// let t = ClockTime::parse("07:25").unwrap();
/// assert_eq!(t.as_str(), "07:25");
/// assert_eq!(t.value(), 725);
///
/// // Compact config forms are accepted too
/// assert_eq!(ClockTime::parse("0800").unwrap().as_str(), "08:00");
/// assert_eq!(ClockTime::parse("190000").unwrap().as_str(), "19:00");
///
/// assert!(ClockTime::parse("24:00").is_err());
/// assert!(ClockTime::parse("7:25").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime([u8; 5]);

impl ClockTime {
    /// Build from numeric components.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        let (h, m) = (hour as u8, minute as u8);
        Ok(Self([b'0' + h / 10, b'0' + h % 10, b':', b'0' + m / 10, b'0' + m % 10]))
    }

    /// Parse "HH:MM", "HHMM" or "HHMMSS".
    ///
    /// Seconds in the six-digit form must be valid but are dropped; the
    /// board never shows them.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        match bytes.len() {
            5 => {
                if bytes[2] != b':' {
                    return Err(TimeError::new("expected colon at position 2"));
                }
                Self::from_digit_pairs(&bytes[0..2], &bytes[3..5])
            }
            4 => Self::from_digit_pairs(&bytes[0..2], &bytes[2..4]),
            6 => {
                let seconds = parse_two_digits(&bytes[4..6])
                    .ok_or_else(|| TimeError::new("invalid second digits"))?;
                if seconds > 59 {
                    return Err(TimeError::new("second must be 0-59"));
                }
                Self::from_digit_pairs(&bytes[0..2], &bytes[2..4])
            }
            _ => Err(TimeError::new("expected HH:MM, HHMM or HHMMSS")),
        }
    }

    fn from_digit_pairs(hour: &[u8], minute: &[u8]) -> Result<Self, TimeError> {
        let hour = parse_two_digits(hour).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute =
            parse_two_digits(minute).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        Self::from_hm(hour, minute)
    }

    /// Locate the first standalone "HH:MM" inside free cell text.
    ///
    /// A candidate touching another digit on either side (e.g. "123:45") is
    /// not a time and is skipped, as is one outside 00:00-23:59.
    ///
    /// ```
    /// use srt_booker::domain::ClockTime;
    ///
    /// let t = ClockTime::extract("수서\n07:25").unwrap();
    /// assert_eq!(t.as_str(), "07:25");
    /// assert!(ClockTime::extract("매진").is_none());
    /// ```
    pub fn extract(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        HHMM_PATTERN.find_iter(text).find_map(|m| {
            let digit_before = m.start() > 0 && bytes[m.start() - 1].is_ascii_digit();
            let digit_after = bytes.get(m.end()).is_some_and(u8::is_ascii_digit);
            if digit_before || digit_after {
                return None;
            }
            Self::parse(m.as_str()).ok()
        })
    }

    /// Returns the canonical "HH:MM" text.
    pub fn as_str(&self) -> &str {
        // Only ASCII digits and ':' are ever stored
        std::str::from_utf8(&self.0).unwrap_or("00:00")
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        u32::from(self.0[0] - b'0') * 10 + u32::from(self.0[1] - b'0')
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        u32::from(self.0[3] - b'0') * 10 + u32::from(self.0[4] - b'0')
    }

    /// Returns `hour * 100 + minute`, e.g. 725 for 07:25.
    ///
    /// Monotonic in time of day, so range checks compare these directly.
    pub fn value(&self) -> u16 {
        (self.hour() * 100 + self.minute()) as u16
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({})", self.as_str())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width of one start-time bucket offered by the search form.
pub const BUCKET_HOURS: u32 = 2;

/// A discrete start-time bucket of the search form (00:00, 02:00, ... 22:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeBucket(u8);

impl TimeBucket {
    /// The latest bucket that starts at or before `time`.
    ///
    /// Rounding is always down so the searched window never starts later
    /// than requested.
    pub fn containing(time: ClockTime) -> Self {
        let hour = time.hour();
        Self((hour - hour % BUCKET_HOURS) as u8)
    }

    /// Returns the bucket's starting hour.
    pub fn hour(&self) -> u32 {
        u32::from(self.0)
    }

    /// Returns the bucket start as a clock time.
    pub fn start(&self) -> ClockTime {
        // Bucket hours are always 0-22
        ClockTime::from_hm(self.hour(), 0).unwrap_or(ClockTime(*b"00:00"))
    }

    /// Returns the value the form's time control expects, e.g. "080000".
    pub fn form_value(&self) -> String {
        format!("{:02}0000", self.0)
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
