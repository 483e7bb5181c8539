use crate::models::Theme;
use serde::{Deserialize, Serialize};
use std::{env, fmt, path::PathBuf, str::FromStr};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/state.json";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SLEEP_GOAL_HOURS: f64 = 8.0;
pub const DEFAULT_WINDOW: usize = 7;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid clock time `{0}`, expected HH:MM")]
    InvalidClockTime(String),

    #[error("sleep goal must be between 1 and 24 hours, got {0}")]
    InvalidSleepGoal(f64),
}

/// Wall-clock time of day with minute precision, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn from_minutes(minutes: i64) -> Self {
        let wrapped = minutes.rem_euclid(24 * 60);
        Self {
            hour: (wrapped / 60) as u8,
            minute: (wrapped % 60) as u8,
        }
    }

    pub fn minutes_since_midnight(self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }
}

impl Default for ClockTime {
    fn default() -> Self {
        Self { hour: 7, minute: 0 }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidClockTime(value.to_string());
        let (hour, minute) = value.trim().split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse::<u8>().map_err(|_| invalid())?;
        let minute = minute.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

fn default_goal_hours() -> f64 {
    DEFAULT_SLEEP_GOAL_HOURS
}

/// User preferences persisted alongside the collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_goal_hours")]
    pub sleep_goal_hours: f64,
    #[serde(default)]
    pub target_wake_time: ClockTime,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            sleep_goal_hours: DEFAULT_SLEEP_GOAL_HOURS,
            target_wake_time: ClockTime::default(),
        }
    }
}

impl Preferences {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let goal = self.sleep_goal_hours;
        if !goal.is_finite() || !(1.0..=24.0).contains(&goal) {
            return Err(ConfigError::InvalidSleepGoal(goal));
        }
        Ok(())
    }
}

/// Everything the metrics engine needs besides the records themselves.
///
/// Start times are read as wall-clock times in whatever zone the caller
/// passes alongside this config, each instant with its own offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsConfig {
    pub goal_hours: f64,
    pub wake_time: ClockTime,
    pub window: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            goal_hours: DEFAULT_SLEEP_GOAL_HOURS,
            wake_time: ClockTime::default(),
            window: DEFAULT_WINDOW,
        }
    }
}

impl MetricsConfig {
    pub fn from_preferences(preferences: &Preferences) -> Self {
        Self {
            goal_hours: preferences.sleep_goal_hours,
            wake_time: preferences.target_wake_time,
            window: DEFAULT_WINDOW,
        }
    }

    pub fn goal_minutes(&self) -> f64 {
        self.goal_hours * 60.0
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub gemini: GeminiConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = env::var("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH));

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        Self {
            port,
            data_path,
            gemini: GeminiConfig {
                api_key,
                model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: env::var("GEMINI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_parses_and_formats() {
        let wake: ClockTime = "06:30".parse().unwrap();
        assert_eq!(wake.minutes_since_midnight(), 390);
        assert_eq!(wake.to_string(), "06:30");
        assert_eq!(" 7:05".parse::<ClockTime>().unwrap().to_string(), "07:05");
    }

    #[test]
    fn clock_time_rejects_garbage() {
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("07:60".parse::<ClockTime>().is_err());
        assert!("0700".parse::<ClockTime>().is_err());
        assert!("aa:bb".parse::<ClockTime>().is_err());
    }

    #[test]
    fn clock_time_from_minutes_wraps() {
        assert_eq!(ClockTime::from_minutes(-60).to_string(), "23:00");
        assert_eq!(ClockTime::from_minutes(24 * 60 + 15).to_string(), "00:15");
    }

    #[test]
    fn preferences_fill_missing_fields() {
        let prefs: Preferences = serde_json::from_str(r#"{"theme":"light"}"#).unwrap();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.sleep_goal_hours, 8.0);
        assert_eq!(prefs.target_wake_time.to_string(), "07:00");
    }

    #[test]
    fn preferences_reject_out_of_range_goal() {
        let mut prefs = Preferences::default();
        prefs.sleep_goal_hours = 0.0;
        assert_eq!(prefs.validate(), Err(ConfigError::InvalidSleepGoal(0.0)));
        prefs.sleep_goal_hours = 9.0;
        assert!(prefs.validate().is_ok());
    }
}
