use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_QUALITY: u8 = 3;

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

/// One finished (or, in the marker form, running) sleep period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VeryLow,
    Low,
    Neutral,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intake {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    None,
    Light,
    Moderate,
    Intense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

/// Self-reported context for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyJournalEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub stress_level: Option<u8>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub caffeine_intake: Option<Intake>,
    #[serde(default)]
    pub exercise: Option<Exercise>,
    #[serde(default)]
    pub screen_time_late: Option<Level>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DreamEmotion {
    Fear,
    Anxiety,
    Joy,
    Sadness,
    Surprise,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lucidity {
    #[default]
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionSource {
    Voice,
    #[default]
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamSymbol {
    pub name: String,
    #[serde(default)]
    pub importance: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub transcription_source: TranscriptionSource,
    #[serde(default)]
    pub emotions: Vec<DreamEmotion>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub symbols: Vec<DreamSymbol>,
    #[serde(default)]
    pub lucidity_level: Lucidity,
    #[serde(default)]
    pub nightmare: bool,
    #[serde(default)]
    pub sleep_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted marker for a sleep period that has started but not ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Ritual item name to done flag, for one day.
pub type RitualChecklist = BTreeMap<String, bool>;

#[derive(Debug, Clone, Default)]
pub struct AppData {
    pub sessions: Vec<SleepSession>,
    pub dreams: Vec<DreamEntry>,
    pub journal: Vec<DailyJournalEntry>,
    pub preferences: crate::config::Preferences,
    pub rituals: BTreeMap<NaiveDate, RitualChecklist>,
    pub active_session: Option<ActiveSession>,
}

#[derive(Debug, Deserialize)]
pub struct SessionEdit {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub quality: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub transcription_source: TranscriptionSource,
    #[serde(default)]
    pub emotions: Vec<DreamEmotion>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub symbols: Vec<DreamSymbol>,
    #[serde(default)]
    pub lucidity_level: Lucidity,
    #[serde(default)]
    pub nightmare: bool,
    #[serde(default)]
    pub sleep_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDraft {
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub stress_level: Option<u8>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub caffeine_intake: Option<Intake>,
    #[serde(default)]
    pub exercise: Option<Exercise>,
    #[serde(default)]
    pub screen_time_late: Option<Level>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionResponse {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub elapsed: String,
}
