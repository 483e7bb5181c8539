//! Sleep analysis delegated to a hosted language model.
//!
//! The model is reached through [`SleepAnalyzer`]; [`analyze_or_fallback`] is
//! the only entry point the HTTP layer uses and it never fails, so a dead
//! network or a missing key shows up as the fixed fallback result.

use crate::config::GeminiConfig;
use crate::models::{AppData, DailyJournalEntry, DreamEntry, SleepSession};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

const MAX_SESSIONS: usize = 10;
const MAX_DREAMS: usize = 20;
const MAX_JOURNAL: usize = 20;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const FALLBACK_SUMMARY: &str = "Could not reach the analysis service. Try again later.";
pub const FALLBACK_TIP: &str = "Check your internet connection.";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("analysis API key is not configured")]
    MissingApiKey,

    #[error("analysis request failed: {0}")]
    Transport(String),

    #[error("analysis service answered with status {0}")]
    Status(u16),

    #[error("analysis response had no text")]
    EmptyResponse,

    #[error("analysis response was not valid JSON: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    SleepOnly,
    #[default]
    DreamsAndHabits,
}

/// Payload sent to the model: recent history, plus dreams and journal in combined mode.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub mode: AnalysisMode,
    pub sessions: Vec<SleepSession>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dreams: Vec<DreamEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub journal: Vec<DailyJournalEntry>,
}

impl AnalysisRequest {
    pub fn from_data(data: &AppData, mode: AnalysisMode) -> Self {
        let sessions = data.sessions.iter().take(MAX_SESSIONS).cloned().collect();
        let (dreams, journal) = match mode {
            AnalysisMode::SleepOnly => (Vec::new(), Vec::new()),
            AnalysisMode::DreamsAndHabits => (
                data.dreams.iter().take(MAX_DREAMS).cloned().collect(),
                data.journal.iter().take(MAX_JOURNAL).cloned().collect(),
            ),
        };
        Self {
            mode,
            sessions,
            dreams,
            journal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub score: u8,
    pub tips: Vec<String>,
}

impl AnalysisResult {
    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_string(),
            score: 0,
            tips: vec![FALLBACK_TIP.to_string()],
        }
    }
}

#[async_trait]
pub trait SleepAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

pub async fn analyze_or_fallback(
    analyzer: &dyn SleepAnalyzer,
    request: &AnalysisRequest,
) -> AnalysisResult {
    match analyzer.analyze(request).await {
        Ok(result) => {
            info!(score = result.score, tips = result.tips.len(), "analysis completed");
            result
        }
        Err(err) => {
            error!("analysis failed: {err}");
            AnalysisResult::fallback()
        }
    }
}

/// Reads the model's `{summary, score, tips}` answer, clamping the score to 0..=100.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    #[derive(Deserialize)]
    struct RawAnalysis {
        summary: String,
        score: f64,
        tips: Vec<String>,
    }

    let raw: RawAnalysis =
        serde_json::from_str(text).map_err(|err| AnalysisError::Malformed(err.to_string()))?;
    let score = if raw.score.is_finite() {
        raw.score.round().clamp(0.0, 100.0) as u8
    } else {
        0
    };
    Ok(AnalysisResult {
        summary: raw.summary,
        score,
        tips: raw.tips,
    })
}

pub fn build_prompt(request: &AnalysisRequest) -> Result<String, AnalysisError> {
    let data = serde_json::to_string(request).map_err(|err| AnalysisError::Malformed(err.to_string()))?;
    let focus = match request.mode {
        AnalysisMode::SleepOnly => "the user's sleep sessions",
        AnalysisMode::DreamsAndHabits => {
            "the user's sleep sessions together with their dream diary and daily habit journal"
        }
    };
    Ok(format!(
        "Act as an expert sleep scientist. Analyze {focus} (JSON below).\n\
         Give a scientific but easy to follow summary, a sleep score from 0 to 100 \
         based on consistency and duration, and 3 practical tips.\n\
         Keep the tone encouraging and professional.\n\
         Data: {data}\n\
         Answer strictly in JSON."
    ))
}

/// Client for the hosted `generateContent` endpoint.
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiAnalyzer {
    pub fn new(config: GeminiConfig) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn request_body(prompt: String) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "summary": { "type": "STRING" },
                        "score": { "type": "INTEGER" },
                        "tips": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["summary", "score", "tips"]
                }
            }
        })
    }
}

#[async_trait]
impl SleepAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let api_key = self.config.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(build_prompt(request)?))
            .send()
            .await
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16()));
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|err| AnalysisError::Malformed(err.to_string()))?;
        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|text| !text.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)?;

        parse_analysis(text)
    }
}

/// Analyzer that always answers the same way.
pub struct StaticAnalyzer {
    outcome: Result<AnalysisResult, AnalysisError>,
}

impl StaticAnalyzer {
    pub fn answering(result: AnalysisResult) -> Self {
        Self { outcome: Ok(result) }
    }

    pub fn failing(err: AnalysisError) -> Self {
        Self { outcome: Err(err) }
    }
}

#[async_trait]
impl SleepAnalyzer for StaticAnalyzer {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.outcome.clone()
    }
}
