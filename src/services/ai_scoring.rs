use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::db::models::SubmissionRecord;
use crate::services::scoring::{ScoreResult, Scorer, ScoringError};

const SCORING_SYSTEM_PROMPT: &str = r#"You are an experienced primary-school physical education and activities teacher.
You assess short student videos recorded for a school activity and score them with a fixed rubric.

Rubric (each criterion is an integer from 0 to 5):
1. content_accuracy: the video shows what the activity asked for
2. participation: the student is actively and fully involved
3. presentation: the video is clear, well framed and easy to follow
4. discipline: the student behaves safely, follows instructions and finishes on time

Write the comment in Thai, two or three sentences, encouraging and specific.

Respond with a strict JSON object and nothing else:
{
  "content_accuracy": <0-5>,
  "participation": <0-5>,
  "presentation": <0-5>,
  "discipline": <0-5>,
  "comment": "<feedback for the student>"
}
"#;

/// OpenAI-compatible chat-completions client that scores one submission per call.
#[derive(Debug, Clone)]
pub(crate) struct AiScoringService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl AiScoringService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().ai_request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().openai_api_key.clone(),
            base_url: settings.ai().openai_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().ai_model.clone(),
            max_tokens: settings.ai().ai_max_tokens,
            temperature: settings.ai().ai_temperature,
        })
    }

    fn request_payload(&self, submission: &SubmissionRecord) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SCORING_SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(submission)}
            ],
            "max_completion_tokens": self.max_tokens,
            "temperature": self.temperature,
            "response_format": {"type": "json_object"}
        })
    }
}

fn user_prompt(submission: &SubmissionRecord) -> String {
    format!(
        "Student: {name} (number {number}), {grade}, {room}\nActivity: {activity}\nTask: the student filmed {task}.\nVideo: {url}\n\nScore this submission with the rubric and return the JSON object.",
        name = submission.name,
        number = submission.student_number,
        grade = submission.grade.label(),
        room = submission.room,
        activity = submission.activity_type.label(),
        task = submission.activity_type.task_description(),
        url = submission.file_url,
    )
}

/// Extracts the rubric object from a chat-completions response body.
pub(crate) fn parse_completion(body: &Value) -> Result<ScoreResult, ScoringError> {
    let content = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| ScoringError::Malformed("missing message content".to_string()))?;

    let parsed: Value = serde_json::from_str(content.trim())
        .map_err(|err| ScoringError::Malformed(format!("content is not JSON: {err}")))?;
    if !parsed.is_object() {
        return Err(ScoringError::Malformed("content is not a JSON object".to_string()));
    }

    serde_json::from_value(parsed).map_err(|err| ScoringError::Malformed(err.to_string()))
}

#[async_trait]
impl Scorer for AiScoringService {
    async fn score(&self, submission: &SubmissionRecord) -> Result<ScoreResult, ScoringError> {
        let timer = Instant::now();
        let row_id = submission.row_id;
        let url = format!("{}/chat/completions", self.base_url);

        tracing::info!(row_id = ?row_id, model = %self.model, "Sending AI scoring request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_payload(submission))
            .send()
            .await
            .map_err(|err| ScoringError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::Upstream { status: status.as_u16(), body });
        }

        let body: Value =
            response.json().await.map_err(|err| ScoringError::Malformed(err.to_string()))?;
        let result = parse_completion(&body)?;

        let elapsed = timer.elapsed().as_secs_f64();
        metrics::histogram!("ai_scoring_duration_seconds").record(elapsed);
        let tokens_used = body
            .get("usage")
            .and_then(|usage| usage.get("total_tokens"))
            .and_then(Value::as_u64);

        tracing::info!(
            row_id = ?row_id,
            duration_seconds = elapsed,
            tokens_used = tokens_used,
            total = result.scores().total(),
            "AI scoring completed"
        );

        Ok(result)
    }
}
