use crate::config::Preferences;
use crate::errors::AppError;
use crate::models::{ActiveSession, AppData, DailyJournalEntry, DreamEntry, RitualChecklist, SleepSession};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, path::Path};
use tokio::fs;
use tracing::{error, warn};

#[derive(Serialize)]
struct StateFile<'a> {
    sessions: &'a [SleepSession],
    dreams: &'a [DreamEntry],
    journal: &'a [DailyJournalEntry],
    preferences: &'a Preferences,
    rituals: &'a BTreeMap<NaiveDate, RitualChecklist>,
    active_session: &'a Option<ActiveSession>,
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => decode_state(&bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

/// Decodes the state document. Each key is read on its own, so one damaged
/// collection comes back empty without taking the others with it.
pub fn decode_state(bytes: &[u8]) -> AppData {
    let mut root = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            error!("data file is not a JSON object, starting empty");
            return AppData::default();
        }
        Err(err) => {
            error!("failed to parse data file: {err}");
            return AppData::default();
        }
    };

    AppData {
        sessions: take_field(&mut root, "sessions"),
        dreams: take_field(&mut root, "dreams"),
        journal: take_field(&mut root, "journal"),
        preferences: take_preferences(&mut root),
        rituals: take_field(&mut root, "rituals"),
        active_session: take_field(&mut root, "active_session"),
    }
}

fn take_field<T: DeserializeOwned + Default>(root: &mut Map<String, Value>, key: &str) -> T {
    match root.remove(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(collection = key, "discarding malformed collection: {err}");
            T::default()
        }),
    }
}

fn take_preferences(root: &mut Map<String, Value>) -> Preferences {
    let preferences: Preferences = take_field(root, "preferences");
    match preferences.validate() {
        Ok(()) => preferences,
        Err(err) => {
            warn!("discarding stored preferences: {err}");
            Preferences::default()
        }
    }
}

pub fn encode_state(data: &AppData) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(&StateFile {
        sessions: &data.sessions,
        dreams: &data.dreams,
        journal: &data.journal,
        preferences: &data.preferences,
        rituals: &data.rituals,
        active_session: &data.active_session,
    })
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = encode_state(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lucidity, Theme};
    use chrono::{TimeZone, Utc};

    #[test]
    fn garbage_decodes_to_empty_state() {
        let data = decode_state(b"not json at all");
        assert!(data.sessions.is_empty());
        assert_eq!(data.preferences, Preferences::default());

        let data = decode_state(b"[1, 2, 3]");
        assert!(data.dreams.is_empty());
    }

    #[test]
    fn missing_optional_fields_are_filled() {
        let raw = br#"{
            "sessions": [
                {"id": "a", "startTime": "2026-01-04T23:00:00Z", "endTime": "2026-01-05T07:00:00Z", "durationMinutes": 480}
            ],
            "dreams": [
                {"id": "d", "date": "2026-01-05T07:10:00Z", "rawText": "a hallway",
                 "createdAt": "2026-01-05T07:10:00Z", "updatedAt": "2026-01-05T07:10:00Z"}
            ]
        }"#;
        let data = decode_state(raw);
        let session = &data.sessions[0];
        assert_eq!(session.quality, 3);
        assert_eq!(session.name, "");
        assert_eq!(session.notes, "");

        let dream = &data.dreams[0];
        assert!(dream.emotions.is_empty());
        assert_eq!(dream.lucidity_level, Lucidity::None);
        assert!(!dream.nightmare);
    }

    #[test]
    fn damaged_collection_does_not_poison_the_rest() {
        let raw = br#"{
            "sessions": "oops",
            "journal": [{"id": "j", "date": "2026-01-05", "stressLevel": 4}],
            "preferences": {"theme": "light", "sleepGoalHours": 7}
        }"#;
        let data = decode_state(raw);
        assert!(data.sessions.is_empty());
        assert_eq!(data.journal.len(), 1);
        assert_eq!(data.journal[0].stress_level, Some(4));
        assert_eq!(data.preferences.theme, Theme::Light);
        assert_eq!(data.preferences.sleep_goal_hours, 7.0);
    }

    #[test]
    fn out_of_range_preferences_fall_back_to_defaults() {
        let data = decode_state(br#"{"preferences":{"theme":"light","sleepGoalHours":-1e20}}"#);
        assert_eq!(data.preferences, Preferences::default());

        let data = decode_state(br#"{"preferences":{"sleepGoalHours":1e300,"targetWakeTime":"06:30"}}"#);
        assert_eq!(data.preferences.sleep_goal_hours, 8.0);
    }

    #[test]
    fn state_survives_encode_and_decode() {
        let mut data = AppData::default();
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 23, 0, 0).unwrap();
        data.start_sleep(start).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        data.set_ritual(day, RitualChecklist::from([("tea".to_string(), true)]));

        let bytes = encode_state(&data).unwrap();
        let decoded = decode_state(&bytes);
        assert_eq!(decoded.active_session, data.active_session);
        assert_eq!(decoded.ritual(day), data.ritual(day));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let mut path = std::env::temp_dir();
        path.push(format!("somnium_missing_{}.json", std::process::id()));
        let data = load_data(&path).await;
        assert!(data.sessions.is_empty());
        assert!(data.active_session.is_none());
    }
}
