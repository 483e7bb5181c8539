//! In-memory collections with the create/read/update/delete rules every
//! caller relies on. Newest records sit first; creation prepends.

use crate::models::{
    ActiveSession, AppData, DailyJournalEntry, DreamDraft, DreamEntry, JournalDraft,
    RitualChecklist, SessionEdit, SleepSession,
};
use crate::timer::{self, TimerError};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::fmt::Display;
use uuid::Uuid;

impl AppData {
    pub fn create_session(&mut self, session: SleepSession) {
        self.sessions.insert(0, session);
    }

    pub fn session(&self, id: &str) -> Option<&SleepSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Replaces the stored record with the same id. Returns false when absent.
    pub fn update_session(&mut self, session: SleepSession) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(slot) => {
                *slot = session;
                true
            }
            None => false,
        }
    }

    pub fn edit_session(&mut self, id: &str, edit: SessionEdit) -> Option<SleepSession> {
        let session = self.sessions.iter_mut().find(|s| s.id == id)?;
        if let Some(name) = edit.name {
            session.name = name.trim().to_string();
        }
        if let Some(notes) = edit.notes {
            session.notes = notes.trim().to_string();
        }
        if let Some(quality) = edit.quality {
            session.quality = quality;
        }
        Some(session.clone())
    }

    pub fn delete_session(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        self.sessions.len() != before
    }

    pub fn start_sleep(&mut self, now: DateTime<Utc>) -> Result<ActiveSession, TimerError> {
        if self.active_session.is_some() {
            return Err(TimerError::AlreadyRunning);
        }
        let marker = timer::begin(now);
        self.active_session = Some(marker.clone());
        Ok(marker)
    }

    /// Ends the running period, moving it into history.
    pub fn finish_sleep<Tz>(&mut self, now: DateTime<Utc>, zone: &Tz) -> Result<SleepSession, TimerError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let marker = self.active_session.take().ok_or(TimerError::NotRunning)?;
        let session = timer::finish(&marker, now, zone);
        self.create_session(session.clone());
        Ok(session)
    }

    pub fn create_dream(&mut self, draft: DreamDraft, now: DateTime<Utc>) -> DreamEntry {
        let entry = DreamEntry {
            id: Uuid::new_v4().to_string(),
            date: now,
            raw_text: draft.raw_text.trim().to_string(),
            title: draft.title.trim().to_string(),
            transcription_source: draft.transcription_source,
            emotions: dedup_emotions(draft.emotions),
            themes: draft.themes,
            symbols: draft.symbols,
            lucidity_level: draft.lucidity_level,
            nightmare: draft.nightmare,
            sleep_session_id: draft.sleep_session_id,
            created_at: now,
            updated_at: now,
        };
        self.dreams.insert(0, entry.clone());
        entry
    }

    /// Rewrites a dream's content; id, date and creation time are kept.
    pub fn update_dream(
        &mut self,
        id: &str,
        draft: DreamDraft,
        now: DateTime<Utc>,
    ) -> Option<DreamEntry> {
        let entry = self.dreams.iter_mut().find(|d| d.id == id)?;
        entry.raw_text = draft.raw_text.trim().to_string();
        entry.title = draft.title.trim().to_string();
        entry.transcription_source = draft.transcription_source;
        entry.emotions = dedup_emotions(draft.emotions);
        entry.themes = draft.themes;
        entry.symbols = draft.symbols;
        entry.lucidity_level = draft.lucidity_level;
        entry.nightmare = draft.nightmare;
        entry.sleep_session_id = draft.sleep_session_id;
        entry.updated_at = now;
        Some(entry.clone())
    }

    pub fn delete_dream(&mut self, id: &str) -> bool {
        let before = self.dreams.len();
        self.dreams.retain(|d| d.id != id);
        self.dreams.len() != before
    }

    /// First entry recorded for the day. Duplicates are tolerated but never read.
    pub fn journal_entry(&self, date: NaiveDate) -> Option<&DailyJournalEntry> {
        self.journal.iter().find(|entry| entry.date == date)
    }

    pub fn journal_entry_or_create(&mut self, date: NaiveDate) -> &mut DailyJournalEntry {
        let index = match self.journal.iter().position(|entry| entry.date == date) {
            Some(index) => index,
            None => {
                self.journal.insert(0, empty_journal_entry(date));
                0
            }
        };
        &mut self.journal[index]
    }

    pub fn upsert_journal(&mut self, date: NaiveDate, draft: JournalDraft) -> DailyJournalEntry {
        let entry = self.journal_entry_or_create(date);
        entry.mood = draft.mood;
        entry.stress_level = draft.stress_level;
        entry.notes = draft.notes.trim().to_string();
        entry.caffeine_intake = draft.caffeine_intake;
        entry.exercise = draft.exercise;
        entry.screen_time_late = draft.screen_time_late;
        entry.tags = draft.tags;
        entry.clone()
    }

    pub fn ritual(&self, date: NaiveDate) -> RitualChecklist {
        self.rituals.get(&date).cloned().unwrap_or_default()
    }

    pub fn set_ritual(&mut self, date: NaiveDate, checklist: RitualChecklist) {
        self.rituals.insert(date, checklist);
    }
}

fn empty_journal_entry(date: NaiveDate) -> DailyJournalEntry {
    DailyJournalEntry {
        id: Uuid::new_v4().to_string(),
        date,
        mood: None,
        stress_level: None,
        notes: String::new(),
        caffeine_intake: None,
        exercise: None,
        screen_time_late: None,
        tags: Vec::new(),
    }
}

fn dedup_emotions<T: PartialEq>(emotions: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(emotions.len());
    for emotion in emotions {
        if !unique.contains(&emotion) {
            unique.push(emotion);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DreamEmotion, Lucidity, Mood, TranscriptionSource};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0).unwrap()
    }

    fn session(id: &str) -> SleepSession {
        SleepSession {
            id: id.to_string(),
            start_time: now() - Duration::hours(8),
            end_time: Some(now()),
            duration_minutes: 480,
            quality: 3,
            name: "Night 04 Jan".to_string(),
            notes: "slept well".to_string(),
        }
    }

    fn draft(title: &str) -> DreamDraft {
        DreamDraft {
            title: title.to_string(),
            raw_text: "  flying over the sea ".to_string(),
            transcription_source: TranscriptionSource::Text,
            emotions: vec![DreamEmotion::Joy, DreamEmotion::Joy, DreamEmotion::Surprise],
            themes: Vec::new(),
            symbols: Vec::new(),
            lucidity_level: Lucidity::Low,
            nightmare: false,
            sleep_session_id: None,
        }
    }

    #[test]
    fn create_prepends_newest_first() {
        let mut data = AppData::default();
        data.create_session(session("a"));
        data.create_session(session("b"));
        let ids: Vec<&str> = data.sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn quality_edit_round_trips() {
        let mut data = AppData::default();
        data.create_session(session("a"));
        let original = data.session("a").cloned().unwrap();

        let edited = data
            .edit_session(
                "a",
                SessionEdit {
                    name: None,
                    notes: None,
                    quality: Some(5),
                },
            )
            .unwrap();

        let stored = data.session("a").unwrap();
        assert_eq!(stored, &edited);
        assert_eq!(stored.quality, 5);
        assert_eq!(
            SleepSession {
                quality: original.quality,
                ..stored.clone()
            },
            original
        );
    }

    #[test]
    fn update_and_delete_unknown_ids_report_absence() {
        let mut data = AppData::default();
        data.create_session(session("a"));
        assert!(!data.update_session(session("missing")));
        assert!(!data.delete_session("missing"));
        assert!(data.update_session(SleepSession {
            notes: "changed".to_string(),
            ..session("a")
        }));
        assert_eq!(data.session("a").unwrap().notes, "changed");
        assert!(data.delete_session("a"));
        assert!(data.sessions.is_empty());
    }

    #[test]
    fn sleep_timer_lifecycle() {
        let mut data = AppData::default();
        let bedtime = now() - Duration::hours(7);
        let marker = data.start_sleep(bedtime).unwrap();
        assert_eq!(data.start_sleep(bedtime), Err(TimerError::AlreadyRunning));

        let session = data.finish_sleep(now(), &Utc).unwrap();
        assert_eq!(session.id, marker.id);
        assert_eq!(session.duration_minutes, 420);
        assert!(data.active_session.is_none());
        assert_eq!(data.sessions.first(), Some(&session));
        assert_eq!(data.finish_sleep(now(), &Utc), Err(TimerError::NotRunning));
    }

    #[test]
    fn dream_create_trims_and_dedups() {
        let mut data = AppData::default();
        let dream = data.create_dream(draft(" Sea "), now());
        assert_eq!(dream.title, "Sea");
        assert_eq!(dream.raw_text, "flying over the sea");
        assert_eq!(dream.emotions, vec![DreamEmotion::Joy, DreamEmotion::Surprise]);
        assert_eq!(dream.created_at, dream.updated_at);
    }

    #[test]
    fn dream_update_keeps_identity() {
        let mut data = AppData::default();
        let dream = data.create_dream(draft("Sea"), now());
        let later = now() + Duration::hours(2);
        let updated = data
            .update_dream(
                &dream.id,
                DreamDraft {
                    nightmare: true,
                    ..draft("Storm")
                },
                later,
            )
            .unwrap();
        assert_eq!(updated.id, dream.id);
        assert_eq!(updated.created_at, dream.created_at);
        assert_eq!(updated.date, dream.date);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.title, "Storm");
        assert!(updated.nightmare);
        assert!(data.update_dream("missing", draft("x"), later).is_none());
        assert!(data.delete_dream(&dream.id));
    }

    #[test]
    fn journal_find_or_create_is_idempotent() {
        let mut data = AppData::default();
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert!(data.journal_entry(day).is_none());

        let first_id = data.journal_entry_or_create(day).id.clone();
        let second_id = data.journal_entry_or_create(day).id.clone();
        assert_eq!(first_id, second_id);
        assert_eq!(data.journal.len(), 1);

        let entry = data.upsert_journal(
            day,
            JournalDraft {
                mood: Some(Mood::High),
                stress_level: Some(4),
                notes: " long day ".to_string(),
                caffeine_intake: None,
                exercise: None,
                screen_time_late: None,
                tags: vec!["work".to_string()],
            },
        );
        assert_eq!(entry.id, first_id);
        assert_eq!(entry.notes, "long day");
        assert_eq!(data.journal_entry(day).unwrap().stress_level, Some(4));
    }

    #[test]
    fn ritual_snapshot_defaults_to_empty() {
        let mut data = AppData::default();
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert!(data.ritual(day).is_empty());

        let mut checklist = RitualChecklist::new();
        checklist.insert("no_screens".to_string(), true);
        data.set_ritual(day, checklist.clone());
        assert_eq!(data.ritual(day), checklist);
    }
}
