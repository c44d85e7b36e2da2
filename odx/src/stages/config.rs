//! Stage construction configuration.

use chrono::NaiveTime;

/// Error returned when parsing an invalid day cutoff.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid day cutoff {0:?}: expected HH:MM or HH:MM:SS")]
pub struct InvalidCutoff(String);

/// Configuration parameters for stage construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageConfig {
    /// Time of day at which a new service day starts.
    /// Taps before this time belong to the previous day.
    pub day_cutoff: NaiveTime,
}

impl StageConfig {
    /// Hour at which the service day rolls over by default.
    pub const DEFAULT_CUTOFF_HOUR: u32 = 4;

    /// Create a new configuration with the given cutoff.
    pub fn new(day_cutoff: NaiveTime) -> Self {
        Self { day_cutoff }
    }

    /// Parse a cutoff time from `HH:MM` or `HH:MM:SS`.
    ///
    /// # Examples
    ///
    /// ```
    /// use odx::stages::StageConfig;
    /// use chrono::NaiveTime;
    ///
    /// let cutoff = StageConfig::parse_cutoff("03:30").unwrap();
    /// assert_eq!(cutoff, NaiveTime::from_hms_opt(3, 30, 0).unwrap());
    ///
    /// assert!(StageConfig::parse_cutoff("25:00").is_err());
    /// ```
    pub fn parse_cutoff(s: &str) -> Result<NaiveTime, InvalidCutoff> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map_err(|_| InvalidCutoff(s.to_string()))
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            day_cutoff: NaiveTime::from_hms_opt(Self::DEFAULT_CUTOFF_HOUR, 0, 0)
                .unwrap_or(NaiveTime::MIN),
        }
    }
}
