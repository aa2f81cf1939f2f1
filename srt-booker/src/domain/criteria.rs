//! Search criteria and the departure selection policy.

use std::fmt;
use std::num::NonZeroU8;

use chrono::NaiveDate;

use super::station::StationName;
use super::time::{ClockTime, TimeBucket};

/// Largest party the passenger control offers.
pub const MAX_PASSENGERS: u8 = 9;

/// Error returned for a passenger count the form cannot take.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("passenger count must be 1-9, got {0}")]
pub struct InvalidPassengerCount(pub u32);

/// Error returned when a selection policy is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// A range whose end does not come after its start can never match.
    #[error("time range {start}-{end} is empty")]
    EmptyRange { start: ClockTime, end: ClockTime },
}

/// Number of adult passengers, 1 to [`MAX_PASSENGERS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassengerCount(NonZeroU8);

impl PassengerCount {
    /// A single passenger.
    pub const ONE: Self = Self(NonZeroU8::MIN);

    /// Validate a passenger count.
    pub fn new(count: u32) -> Result<Self, InvalidPassengerCount> {
        u8::try_from(count)
            .ok()
            .filter(|&c| c <= MAX_PASSENGERS)
            .and_then(NonZeroU8::new)
            .map(Self)
            .ok_or(InvalidPassengerCount(count))
    }

    /// Returns the count.
    pub fn get(&self) -> u8 {
        self.0.get()
    }

    /// Returns the value the passenger control expects.
    pub fn form_value(&self) -> String {
        self.0.to_string()
    }
}

impl Default for PassengerCount {
    fn default() -> Self {
        Self::ONE
    }
}

/// Which departure times are acceptable.
///
/// Exactly one variant is ever active. [`SelectionPolicy::from_bounds`]
/// encodes the precedence exact > range > from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Only a departure whose "HH:MM" text equals the target.
    ExactTime(ClockTime),
    /// Departures in the half-open interval `[start, end)`.
    RangeTime(ClockTime, ClockTime),
    /// Any departure at or after `start`.
    FromTime(ClockTime),
}

impl SelectionPolicy {
    /// Build the policy from optional bounds.
    ///
    /// An exact target wins over an end bound, which wins over the bare
    /// start time. The bounds are never combined.
    ///
    /// ```
    /// use srt_booker::domain::{ClockTime, SelectionPolicy};
    ///
    /// let start = ClockTime::parse("08:00").unwrap();
    /// let end = ClockTime::parse("19:00").unwrap();
    /// let exact = ClockTime::parse("08:30").unwrap();
    ///
    /// assert_eq!(
    ///     SelectionPolicy::from_bounds(start, Some(end), Some(exact)).unwrap(),
    ///     SelectionPolicy::ExactTime(exact),
    /// );
    /// assert_eq!(
    ///     SelectionPolicy::from_bounds(start, Some(end), None).unwrap(),
    ///     SelectionPolicy::RangeTime(start, end),
    /// );
    /// assert_eq!(
    ///     SelectionPolicy::from_bounds(start, None, None).unwrap(),
    ///     SelectionPolicy::FromTime(start),
    /// );
    /// ```
    pub fn from_bounds(
        start: ClockTime,
        end: Option<ClockTime>,
        exact: Option<ClockTime>,
    ) -> Result<Self, PolicyError> {
        match (exact, end) {
            (Some(target), _) => Ok(Self::ExactTime(target)),
            (None, Some(end)) if end <= start => Err(PolicyError::EmptyRange { start, end }),
            (None, Some(end)) => Ok(Self::RangeTime(start, end)),
            (None, None) => Ok(Self::FromTime(start)),
        }
    }

    /// Decide whether a departure satisfies this policy.
    pub fn accepts(&self, departure: ClockTime) -> bool {
        match *self {
            Self::ExactTime(target) => departure.as_str() == target.as_str(),
            Self::RangeTime(start, end) => {
                let value = departure.value();
                value >= start.value() && value < end.value()
            }
            Self::FromTime(start) => departure.value() >= start.value(),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactTime(target) => write!(f, "exactly {target}"),
            Self::RangeTime(start, end) => write!(f, "{start}-{end}"),
            Self::FromTime(start) => write!(f, "from {start}"),
        }
    }
}

/// Everything needed to set up one search and judge its results.
///
/// A polling run only ever borrows this immutably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Departure station.
    pub origin: StationName,

    /// Arrival station.
    pub destination: StationName,

    /// Day of travel.
    pub date: NaiveDate,

    /// Earliest departure of interest; also drives the form's time bucket.
    pub start_time: ClockTime,

    /// Number of adult passengers.
    pub passengers: PassengerCount,

    /// Which departures may be claimed.
    pub policy: SelectionPolicy,
}

impl SearchCriteria {
    /// Create new search criteria.
    pub fn new(
        origin: StationName,
        destination: StationName,
        date: NaiveDate,
        start_time: ClockTime,
        passengers: PassengerCount,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            origin,
            destination,
            date,
            start_time,
            passengers,
            policy,
        }
    }

    /// Returns the value the form's date control expects, e.g. "20260217".
    pub fn date_value(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// Returns the form's start bucket for `start_time`.
    pub fn time_bucket(&self) -> TimeBucket {
        TimeBucket::containing(self.start_time)
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} on {}, {} passenger(s), {}",
            self.origin,
            self.destination,
            self.date,
            self.passengers.get(),
            self.policy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn criteria(policy: SelectionPolicy) -> SearchCriteria {
        SearchCriteria::new(
            StationName::parse("수서").unwrap(),
            StationName::parse("동대구").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 17).unwrap(),
            t("09:30"),
            PassengerCount::new(2).unwrap(),
            policy,
        )
    }

    #[test]
    fn range_is_half_open() {
        let policy = SelectionPolicy::RangeTime(t("08:00"), t("19:00"));

        assert!(policy.accepts(t("08:00")));
        assert!(policy.accepts(t("18:59")));
        assert!(!policy.accepts(t("19:00")));
        assert!(!policy.accepts(t("07:59")));
    }

    #[test]
    fn exact_requires_identical_time() {
        let policy = SelectionPolicy::ExactTime(t("08:00"));

        assert!(policy.accepts(t("08:00")));
        assert!(!policy.accepts(t("08:01")));
        assert!(!policy.accepts(t("07:59")));
    }

    #[test]
    fn from_time_has_no_upper_bound() {
        let policy = SelectionPolicy::FromTime(t("17:00"));

        assert!(policy.accepts(t("17:00")));
        assert!(policy.accepts(t("23:59")));
        assert!(!policy.accepts(t("16:59")));
    }

    #[test]
    fn exact_overrides_range() {
        let policy =
            SelectionPolicy::from_bounds(t("08:00"), Some(t("19:00")), Some(t("20:00"))).unwrap();

        // Outside the range but equal to the target
        assert!(policy.accepts(t("20:00")));
        // Inside the range but not the target
        assert!(!policy.accepts(t("10:00")));
    }

    #[test]
    fn empty_range_rejected() {
        let err = SelectionPolicy::from_bounds(t("19:00"), Some(t("08:00")), None).unwrap_err();
        assert_eq!(err.to_string(), "time range 19:00-08:00 is empty");
        assert!(SelectionPolicy::from_bounds(t("08:00"), Some(t("08:00")), None).is_err());
    }

    #[test]
    fn passenger_bounds() {
        assert!(PassengerCount::new(0).is_err());
        assert_eq!(PassengerCount::new(1).unwrap(), PassengerCount::ONE);
        assert_eq!(PassengerCount::new(9).unwrap().get(), 9);
        assert!(PassengerCount::new(10).is_err());
        assert!(PassengerCount::new(300).is_err());
        assert_eq!(
            InvalidPassengerCount(0).to_string(),
            "passenger count must be 1-9, got 0"
        );
    }

    #[test]
    fn form_values() {
        let c = criteria(SelectionPolicy::FromTime(t("09:30")));

        assert_eq!(c.date_value(), "20260217");
        assert_eq!(c.time_bucket().form_value(), "080000");
        assert_eq!(c.passengers.form_value(), "2");
    }

    #[test]
    fn display() {
        let c = criteria(SelectionPolicy::RangeTime(t("09:30"), t("12:00")));
        assert_eq!(
            c.to_string(),
            "수서 → 동대구 on 2026-02-17, 2 passenger(s), 09:30-12:00"
        );
    }
}
