//! Daily report generation.
//!
//! [`ReportGenerator`] is the capability seam: it either produces a report or
//! says why it could not. [`generate_daily_report`] is the only caller-facing
//! entry point and never fails; it swaps any error for [`fallback_report`].

use crate::config::ReportConfig;
use crate::models::{DailyReport, Widget};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

const COACH_INSTRUCTION: &str = "Act as a professional life coach and health expert. \
Analyze the following daily tracking data and provide a constructive daily report.";

const RESPONSE_INSTRUCTION: &str = "Provide a response in JSON format including:
- summary: A 2-sentence overview of the day's performance.
- score: An overall score from 0 to 100.
- tips: An array of 3 actionable improvement tips for tomorrow.";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("report breaks contract: {0}")]
    Contract(String),
}

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, widgets: &[Widget]) -> Result<DailyReport, ReportError>;
}

pub fn fallback_report() -> DailyReport {
    DailyReport {
        summary: "Great job completing your tasks today! Keep up the momentum.".to_string(),
        score: 85,
        tips: vec![
            "Stay hydrated".to_string(),
            "Get 8 hours of sleep".to_string(),
            "Review your goals early tomorrow".to_string(),
        ],
    }
}

pub async fn generate_daily_report(generator: &dyn ReportGenerator, widgets: &[Widget]) -> DailyReport {
    match generator.generate(widgets).await {
        Ok(report) => report,
        Err(err) => {
            warn!("report generation failed, using fallback: {err}");
            fallback_report()
        }
    }
}

pub fn build_prompt(widgets: &[Widget]) -> String {
    let data = widgets
        .iter()
        .map(|widget| {
            format!(
                "{} ({}): {}",
                widget.title,
                widget.kind(),
                widget.payload.data_json()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{COACH_INSTRUCTION}\n\nData:\n{data}\n\n{RESPONSE_INSTRUCTION}")
}

#[derive(Debug, Deserialize)]
struct RawReport {
    summary: String,
    score: f64,
    tips: Vec<String>,
}

/// Parses the model's JSON text and checks the score and tip count.
pub fn parse_report(text: &str) -> Result<DailyReport, ReportError> {
    let raw: RawReport =
        serde_json::from_str(text.trim()).map_err(|err| ReportError::Malformed(err.to_string()))?;

    if !raw.score.is_finite() || !(0.0..=f64::from(DailyReport::MAX_SCORE)).contains(&raw.score) {
        return Err(ReportError::Contract(format!("score {} out of range", raw.score)));
    }
    if raw.tips.len() != DailyReport::TIP_COUNT {
        return Err(ReportError::Contract(format!(
            "expected {} tips, got {}",
            DailyReport::TIP_COUNT,
            raw.tips.len()
        )));
    }

    Ok(DailyReport {
        summary: raw.summary,
        score: raw.score.round() as u8,
        tips: raw.tips,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Report generator backed by the Gemini `generateContent` API.
pub struct GeminiReportClient {
    client: Client,
    config: ReportConfig,
}

impl GeminiReportClient {
    pub fn new(config: ReportConfig) -> Result<Self, ReportError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(prompt: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: json!({
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "summary": { "type": "STRING" },
                        "score": { "type": "NUMBER" },
                        "tips": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["summary", "score", "tips"]
                }
            }),
        }
    }
}

#[async_trait]
impl ReportGenerator for GeminiReportClient {
    async fn generate(&self, widgets: &[Widget]) -> Result<DailyReport, ReportError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ReportError::MissingApiKey)?;

        let body = Self::request_body(build_prompt(widgets));
        debug!(model = %self.config.model, widgets = widgets.len(), "requesting daily report");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ReportError::Malformed(err.to_string()))?;

        let text = payload
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| part.text)
            .ok_or_else(|| ReportError::Malformed("response has no text".to_string()))?;

        parse_report(&text)
    }
}
