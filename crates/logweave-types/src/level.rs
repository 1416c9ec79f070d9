//! The fixed severity table.
//!
//! Levels are ordered low to high and carry the numeric ranks used by the
//! PSR-3 / RFC 5424 family of loggers, so configuration written for those
//! loggers keeps its meaning here.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use crate::errors::{LogweaveError, Result};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum Level {
    /// Detailed debug information
    Debug = 100,
    /// Interesting events
    Info = 200,
    /// Normal but significant events
    Notice = 250,
    /// Exceptional occurrences that are not errors
    Warning = 300,
    /// Runtime errors that do not require immediate action
    Error = 400,
    /// Critical conditions
    Critical = 500,
    /// Action must be taken immediately
    Alert = 550,
    /// System is unusable
    Emergency = 600,
}

impl Level {
    /// Every level, lowest first.
    pub const ALL: [Level; 8] = [
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Alert,
        Level::Emergency,
    ];

    /// Numeric rank of a level name (case-insensitive).
    pub fn rank_of(name: &str) -> Result<u16> {
        name.parse::<Level>().map(Level::rank)
    }

    /// Level name for a numeric rank, if the rank is one of the fixed ones.
    pub fn name_of(rank: u16) -> Option<&'static str> {
        Self::from_rank(rank).map(|level| level.name())
    }

    /// Level for a numeric rank.
    pub fn from_rank(rank: u16) -> Option<Level> {
        Self::ALL.iter().copied().find(|level| level.rank() == rank)
    }

    /// Numeric rank of this level.
    pub fn rank(self) -> u16 {
        self as u16
    }

    /// Lowercase name of this level.
    pub fn name(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Notice => "notice",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Alert => "alert",
            Level::Emergency => "emergency",
        }
    }

    /// Level from a configuration value: either a name or a numeric rank.
    pub fn from_value(value: &Value) -> Result<Level> {
        match value {
            Value::String(name) => name.parse(),
            Value::Number(n) => n
                .as_u64()
                .and_then(|rank| u16::try_from(rank).ok())
                .and_then(Level::from_rank)
                .ok_or_else(|| LogweaveError::UnknownLevel(n.to_string())),
            other => Err(LogweaveError::UnknownLevel(other.to_string())),
        }
    }
}

impl FromStr for Level {
    type Err = LogweaveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "notice" => Ok(Level::Notice),
            "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" => Ok(Level::Critical),
            "alert" => Ok(Level::Alert),
            "emergency" => Ok(Level::Emergency),
            _ => Err(LogweaveError::UnknownLevel(s.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_ascii_uppercase())
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Info
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Level::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ranks_are_ordered() {
        let ranks: Vec<u16> = Level::ALL.iter().map(|l| l.rank()).collect();
        assert_eq!(ranks, vec![100, 200, 250, 300, 400, 500, 550, 600]);
        assert!(Level::Warning > Level::Info);
    }

    #[test]
    fn test_rank_of_is_case_insensitive() {
        assert_eq!(Level::rank_of("WARNING").unwrap(), Level::rank_of("warning").unwrap());
        assert_eq!(Level::rank_of("Critical").unwrap(), 500);
    }

    #[test]
    fn test_unknown_level() {
        let err = Level::rank_of("bogus").unwrap_err();
        assert!(matches!(err, LogweaveError::UnknownLevel(ref name) if name == "bogus"));
    }

    #[test]
    fn test_name_of_inverts_rank() {
        assert_eq!(Level::name_of(300), Some("warning"));
        assert_eq!(Level::name_of(301), None);
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Level::from_value(&serde_json::json!("error")).unwrap(), Level::Error);
        assert_eq!(Level::from_value(&serde_json::json!(250)).unwrap(), Level::Notice);
        assert!(Level::from_value(&serde_json::json!(7)).is_err());
        assert!(Level::from_value(&serde_json::json!(true)).is_err());
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let level: Level = serde_yaml::from_str("NOTICE").unwrap();
        assert_eq!(level, Level::Notice);
    }

    proptest! {
        #[test]
        fn prop_any_casing_resolves(idx in 0usize..8, mask in proptest::collection::vec(any::<bool>(), 9)) {
            let level = Level::ALL[idx];
            let mixed: String = level
                .name()
                .chars()
                .zip(mask.iter().cycle())
                .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
                .collect();
            prop_assert_eq!(Level::rank_of(&mixed).unwrap(), level.rank());
        }
    }
}
