//! Station names as typed into the search form.

use std::fmt;

/// Error returned when a station name cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station name: {reason}")]
pub struct InvalidStation {
    reason: &'static str,
}

/// A station name as the operator's site displays it (e.g. "수서").
///
/// The form resolves names through its own autosuggest, so there is no code
/// lookup here. The only guarantee is a trimmed, non-empty, single-line name.
///
/// # Examples
///
/// ```
/// use srt_booker::domain::StationName;
///
/// let suseo = StationName::parse(" 수서 ").unwrap();
/// assert_eq!(suseo.as_str(), "수서");
///
/// assert!(StationName::parse("   ").is_err());
/// assert!(StationName::parse("수\n서").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StationName(String);

impl StationName {
    /// Parse a station name, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidStation> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidStation {
                reason: "must not be empty",
            });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(InvalidStation {
                reason: "must not contain control characters",
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationName({})", self.0)
    }
}

impl fmt::Display for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_names() {
        assert_eq!(StationName::parse("수서").unwrap().as_str(), "수서");
        assert_eq!(StationName::parse("동대구").unwrap().as_str(), "동대구");
        assert_eq!(StationName::parse("\t부산 ").unwrap().as_str(), "부산");
    }

    #[test]
    fn reject_blank() {
        assert!(StationName::parse("").is_err());
        assert!(StationName::parse(" \t ").is_err());
    }

    #[test]
    fn reject_control_characters() {
        assert!(StationName::parse("수\n서").is_err());
        assert!(StationName::parse("수\u{7}서").is_err());
    }

    #[test]
    fn display_and_debug() {
        let name = StationName::parse("수서").unwrap();
        assert_eq!(name.to_string(), "수서");
        assert_eq!(format!("{name:?}"), "StationName(수서)");
    }
}
