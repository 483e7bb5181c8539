use crate::models::{ActiveSession, DEFAULT_QUALITY, SleepSession};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("a sleep session is already running")]
    AlreadyRunning,

    #[error("no sleep session is running")]
    NotRunning,
}

pub fn begin(now: DateTime<Utc>) -> ActiveSession {
    ActiveSession {
        id: Uuid::new_v4().to_string(),
        start_time: now,
    }
}

/// Closes the running period into a history record with default name and quality.
pub fn finish<Tz>(marker: &ActiveSession, now: DateTime<Utc>, zone: &Tz) -> SleepSession
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    SleepSession {
        id: marker.id.clone(),
        start_time: marker.start_time,
        end_time: Some(now),
        duration_minutes: duration_minutes(marker.start_time, now),
        quality: DEFAULT_QUALITY,
        name: default_night_name(marker.start_time, zone),
        notes: String::new(),
    }
}

/// Whole minutes between two instants, rounded to nearest. Never negative.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u32::try_from((millis + 30_000) / 60_000).unwrap_or(u32::MAX)
}

pub fn elapsed_seconds(marker: &ActiveSession, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - marker.start_time).num_seconds()).unwrap_or(0)
}

pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Names the night after the local date the period started on in `zone`.
pub fn default_night_name<Tz>(start: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("Night {}", start.with_timezone(zone).format("%d %b"))
}
