use crate::config::{ClockTime, MetricsConfig};
use crate::models::{DailyJournalEntry, DEFAULT_QUALITY, SleepSession};
use chrono::{TimeZone, Timelike};
use std::fmt::Display;
use serde::Serialize;

const CONSISTENCY_SENSITIVITY: f64 = 18.0;
const READINESS_RATIO_CAP: f64 = 1.2;
const READINESS_DURATION_WEIGHT: f64 = 70.0;
const READINESS_QUALITY_WEIGHT: f64 = 30.0;
const STRESS_BASELINE: u8 = 3;
const STRESS_PENALTY: f64 = 6.0;
const HIGH_DEBT_MINUTES: u32 = 120;
const LOW_AVERAGE_MARGIN_HOURS: f64 = 0.5;
const IRREGULAR_BELOW: u8 = 60;
const CHART_POINTS: usize = 7;
const PREVIEW_TARGET_MINUTES: f64 = 480.0;
const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    HighDebt,
    LowAverage,
    IrregularSchedule,
    Stable,
}

impl Recommendation {
    pub fn message(self) -> &'static str {
        match self {
            Self::HighDebt => {
                "Your sleep debt is building up. Plan an earlier night and protect a full sleep window."
            }
            Self::LowAverage => {
                "Your recent average is below your goal. Try moving bedtime 30 minutes earlier."
            }
            Self::IrregularSchedule => {
                "Your bedtime varies a lot. Going to bed at the same time each night will help."
            }
            Self::Stable => "Your sleep is stable. Keep the current routine.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepMetrics {
    pub sessions_counted: usize,
    pub average_hours: f64,
    pub average_quality: f64,
    pub sleep_debt_minutes: u32,
    pub consistency_score: u8,
    pub readiness_score: u8,
    pub streak: usize,
    pub recommended_bedtime: ClockTime,
    pub recommendation: Recommendation,
    pub recommendation_text: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub hours: f64,
    pub quality: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NightPreview {
    pub hours: f64,
    pub goal_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
    pub average_hours: f64,
    pub latest: Option<NightPreview>,
}

/// Computes the dashboard metrics from a newest-first history, reading start
/// times as wall-clock times in `zone`.
pub fn build_metrics<Tz: TimeZone>(
    sessions: &[SleepSession],
    config: &MetricsConfig,
    zone: &Tz,
    today: Option<&DailyJournalEntry>,
) -> SleepMetrics {
    let window = recent_window(sessions, config.window);
    let goal_minutes = config.goal_minutes();

    let average_hours = average_hours(window);
    let average_quality = average_quality(window);
    let sleep_debt_minutes = sleep_debt_minutes(window, goal_minutes);
    let consistency_score = consistency_score(window, zone);
    let stress = today.and_then(|entry| entry.stress_level);
    let readiness_score = readiness_score(average_hours, average_quality, config.goal_hours, stress);
    let recommendation = recommend(
        sleep_debt_minutes,
        average_hours,
        config.goal_hours,
        consistency_score,
    );

    SleepMetrics {
        sessions_counted: window.len(),
        average_hours,
        average_quality,
        sleep_debt_minutes,
        consistency_score,
        readiness_score,
        streak: streak_count(sessions, goal_minutes),
        recommended_bedtime: recommended_bedtime(config.wake_time, config.goal_hours),
        recommendation,
        recommendation_text: recommendation.message(),
    }
}

pub fn recent_window(sessions: &[SleepSession], size: usize) -> &[SleepSession] {
    &sessions[..size.min(sessions.len())]
}

pub fn average_hours(window: &[SleepSession]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let total: f64 = window.iter().map(|s| f64::from(s.duration_minutes)).sum();
    total / 60.0 / window.len() as f64
}

pub fn average_quality(window: &[SleepSession]) -> f64 {
    if window.is_empty() {
        return f64::from(DEFAULT_QUALITY);
    }
    let total: f64 = window.iter().map(|s| f64::from(s.quality)).sum();
    total / window.len() as f64
}

/// Shortfall against the goal, summed per night. Nights over the goal count as zero.
pub fn sleep_debt_minutes(window: &[SleepSession], goal_minutes: f64) -> u32 {
    let debt: f64 = window
        .iter()
        .map(|s| (goal_minutes - f64::from(s.duration_minutes)).max(0.0))
        .sum();
    debt.round() as u32
}

/// Scores bedtime regularity from the spread of start times of day.
///
/// Times are taken as minutes since midnight with no wrap-around handling, so
/// 23:30 and 00:30 are far apart. Each start is converted with the offset in
/// force at that instant, so a DST switch inside the window does not move it.
/// An empty window has zero spread and scores 100.
pub fn consistency_score<Tz: TimeZone>(window: &[SleepSession], zone: &Tz) -> u8 {
    if window.is_empty() {
        return 100;
    }
    let starts: Vec<f64> = window
        .iter()
        .map(|s| {
            let local = s.start_time.with_timezone(zone);
            f64::from(local.hour() * 60 + local.minute())
        })
        .collect();
    let count = starts.len() as f64;
    let mean = starts.iter().sum::<f64>() / count;
    let variance = starts.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let deviation_hours = variance.sqrt() / 60.0;

    clamp_score(100.0 - deviation_hours * CONSISTENCY_SENSITIVITY)
}

pub fn readiness_score(
    average_hours: f64,
    average_quality: f64,
    goal_hours: f64,
    stress_level: Option<u8>,
) -> u8 {
    let ratio = if goal_hours > 0.0 {
        (average_hours / goal_hours).min(READINESS_RATIO_CAP)
    } else {
        0.0
    };
    let base = ratio * READINESS_DURATION_WEIGHT + (average_quality / 5.0) * READINESS_QUALITY_WEIGHT;
    let stress = stress_level.unwrap_or(STRESS_BASELINE);
    let penalty = f64::from(stress.saturating_sub(STRESS_BASELINE)) * STRESS_PENALTY;

    clamp_score(base - penalty)
}

/// Consecutive nights, newest first, that reached the goal.
pub fn streak_count(sessions: &[SleepSession], goal_minutes: f64) -> usize {
    sessions
        .iter()
        .take_while(|s| f64::from(s.duration_minutes) >= goal_minutes)
        .count()
}

pub fn recommended_bedtime(wake_time: ClockTime, goal_hours: f64) -> ClockTime {
    let goal_minutes = (goal_hours * 60.0).round();
    // Reduced to one day before the cast so any goal stays in range.
    let goal_minutes = if goal_minutes.is_finite() {
        goal_minutes.rem_euclid(MINUTES_PER_DAY) as i64
    } else {
        0
    };
    ClockTime::from_minutes(wake_time.minutes_since_midnight() - goal_minutes)
}

/// First matching rule wins.
pub fn recommend(
    sleep_debt_minutes: u32,
    average_hours: f64,
    goal_hours: f64,
    consistency_score: u8,
) -> Recommendation {
    if sleep_debt_minutes > HIGH_DEBT_MINUTES {
        Recommendation::HighDebt
    } else if average_hours < goal_hours - LOW_AVERAGE_MARGIN_HOURS {
        Recommendation::LowAverage
    } else if consistency_score < IRREGULAR_BELOW {
        Recommendation::IrregularSchedule
    } else {
        Recommendation::Stable
    }
}

/// Last nights in chronological order, plus a preview of the newest one.
pub fn build_chart_series<Tz>(sessions: &[SleepSession], zone: &Tz) -> ChartSeries
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let points: Vec<ChartPoint> = recent_window(sessions, CHART_POINTS)
        .iter()
        .rev()
        .map(|s| ChartPoint {
            date: s.start_time.with_timezone(zone).format("%a").to_string(),
            hours: round_tenths(f64::from(s.duration_minutes) / 60.0),
            quality: s.quality,
        })
        .collect();

    let average_hours = if points.is_empty() {
        0.0
    } else {
        round_tenths(points.iter().map(|p| p.hours).sum::<f64>() / points.len() as f64)
    };

    let latest = sessions.first().map(|s| {
        let minutes = f64::from(s.duration_minutes);
        NightPreview {
            hours: round_tenths(minutes / 60.0),
            goal_percent: (minutes / PREVIEW_TARGET_MINUTES * 100.0).min(100.0),
        }
    });

    ChartSeries {
        points,
        average_hours,
        latest,
    }
}

fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
