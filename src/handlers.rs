use crate::analysis::{analyze_or_fallback, AnalysisMode, AnalysisRequest, AnalysisResult};
use crate::config::{MetricsConfig, Preferences};
use crate::errors::AppError;
use crate::metrics::{build_chart_series, build_metrics, ChartSeries, SleepMetrics};
use crate::models::{
    ActiveSession, ActiveSessionResponse, AppData, DailyJournalEntry, DreamDraft, DreamEntry, JournalDraft,
    RitualChecklist, SessionEdit, SleepSession,
};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::timer::{elapsed_seconds, format_elapsed};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

const MIN_SESSIONS_FOR_ANALYSIS: usize = 2;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub mode: AnalysisMode,
}

pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SleepSession>> {
    let data = state.data.lock().await;
    Json(data.sessions.clone())
}

pub async fn edit_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<SessionEdit>,
) -> Result<Json<SleepSession>, AppError> {
    if let Some(quality) = edit.quality {
        check_range("quality", quality, 1, 5)?;
    }

    let session = commit(&state, |data| {
        data.edit_session(&id, edit)
            .ok_or_else(|| AppError::not_found(format!("no sleep session with id {id}")))
    })
    .await?;

    Ok(Json(session))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    commit(&state, |data| {
        if data.delete_session(&id) {
            Ok(())
        } else {
            Err(AppError::not_found(format!("no sleep session with id {id}")))
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_active(State(state): State<AppState>) -> Json<Option<ActiveSessionResponse>> {
    let data = state.data.lock().await;
    Json(data.active_session.as_ref().map(|marker| to_active_response(marker, Utc::now())))
}

pub async fn start_sleep(
    State(state): State<AppState>,
) -> Result<Json<ActiveSessionResponse>, AppError> {
    let now = Utc::now();
    let marker = commit(&state, |data| Ok(data.start_sleep(now)?)).await?;

    info!(id = %marker.id, "sleep started");
    Ok(Json(to_active_response(&marker, now)))
}

pub async fn stop_sleep(State(state): State<AppState>) -> Result<Json<SleepSession>, AppError> {
    let now = Utc::now();
    let session = commit(&state, |data| Ok(data.finish_sleep(now, &Local)?)).await?;

    info!(id = %session.id, minutes = session.duration_minutes, "sleep finished");
    Ok(Json(session))
}

pub async fn get_metrics(State(state): State<AppState>) -> Json<SleepMetrics> {
    let data = state.data.lock().await;
    let config = MetricsConfig::from_preferences(&data.preferences);
    let journal = data.journal_entry(today());
    Json(build_metrics(&data.sessions, &config, &Local, journal))
}

pub async fn get_charts(State(state): State<AppState>) -> Json<ChartSeries> {
    let data = state.data.lock().await;
    Json(build_chart_series(&data.sessions, &Local))
}

pub async fn list_dreams(State(state): State<AppState>) -> Json<Vec<DreamEntry>> {
    let data = state.data.lock().await;
    Json(data.dreams.clone())
}

pub async fn create_dream(
    State(state): State<AppState>,
    Json(draft): Json<DreamDraft>,
) -> Result<(StatusCode, Json<DreamEntry>), AppError> {
    check_dream(&draft)?;

    let now = Utc::now();
    let entry = commit(&state, |data| Ok(data.create_dream(draft, now))).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_dream(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<DreamDraft>,
) -> Result<Json<DreamEntry>, AppError> {
    check_dream(&draft)?;

    let now = Utc::now();
    let entry = commit(&state, |data| {
        data.update_dream(&id, draft, now)
            .ok_or_else(|| AppError::not_found(format!("no dream with id {id}")))
    })
    .await?;

    Ok(Json(entry))
}

pub async fn delete_dream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    commit(&state, |data| {
        if data.delete_dream(&id) {
            Ok(())
        } else {
            Err(AppError::not_found(format!("no dream with id {id}")))
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_journal(State(state): State<AppState>) -> Json<Vec<DailyJournalEntry>> {
    let data = state.data.lock().await;
    Json(data.journal.clone())
}

pub async fn get_journal(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DailyJournalEntry>, AppError> {
    let date = parse_date(&date)?;
    let data = state.data.lock().await;
    data.journal_entry(date)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no journal entry for {date}")))
}

pub async fn put_journal(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(draft): Json<JournalDraft>,
) -> Result<Json<DailyJournalEntry>, AppError> {
    let date = parse_date(&date)?;
    if let Some(stress) = draft.stress_level {
        check_range("stressLevel", stress, 1, 5)?;
    }

    let entry = commit(&state, |data| Ok(data.upsert_journal(date, draft))).await?;

    Ok(Json(entry))
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    let data = state.data.lock().await;
    Json(data.preferences.clone())
}

pub async fn put_preferences(
    State(state): State<AppState>,
    Json(preferences): Json<Preferences>,
) -> Result<Json<Preferences>, AppError> {
    preferences.validate()?;

    commit(&state, |data| {
        data.preferences = preferences.clone();
        Ok(())
    })
    .await?;

    Ok(Json(preferences))
}

pub async fn get_ritual(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<RitualChecklist>, AppError> {
    let date = parse_date(&date)?;
    let data = state.data.lock().await;
    Ok(Json(data.ritual(date)))
}

pub async fn put_ritual(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(checklist): Json<RitualChecklist>,
) -> Result<Json<RitualChecklist>, AppError> {
    let date = parse_date(&date)?;

    commit(&state, |data| {
        data.set_ritual(date, checklist.clone());
        Ok(())
    })
    .await?;

    Ok(Json(checklist))
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<AnalysisResult>, AppError> {
    let mode = body.mode;

    let request = {
        let data = state.data.lock().await;
        if data.sessions.len() < MIN_SESSIONS_FOR_ANALYSIS {
            return Err(AppError::bad_request(format!(
                "at least {MIN_SESSIONS_FOR_ANALYSIS} sleep sessions are needed for an analysis"
            )));
        }
        AnalysisRequest::from_data(&data, mode)
    };

    Ok(Json(analyze_or_fallback(state.analyzer.as_ref(), &request).await))
}

/// Applies `change` to a copy of the state and writes it out. The shared
/// state only moves to the new copy once the write has succeeded.
async fn commit<T>(
    state: &AppState,
    change: impl FnOnce(&mut AppData) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let output = change(&mut next)?;
    persist_data(&state.data_path, &next).await?;
    *data = next;
    Ok(output)
}

fn to_active_response(marker: &ActiveSession, now: DateTime<Utc>) -> ActiveSessionResponse {
    let elapsed = elapsed_seconds(marker, now);
    ActiveSessionResponse {
        id: marker.id.clone(),
        start_time: marker.start_time,
        elapsed_seconds: elapsed,
        elapsed: format_elapsed(elapsed),
    }
}

fn check_range(field: &str, value: u8, min: u8, max: u8) -> Result<(), AppError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!("{field} must be between {min} and {max}")))
    }
}

fn check_dream(draft: &DreamDraft) -> Result<(), AppError> {
    if draft.raw_text.trim().is_empty() {
        return Err(AppError::bad_request("rawText must not be empty"));
    }
    Ok(())
}

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid date `{value}`, expected YYYY-MM-DD")))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
