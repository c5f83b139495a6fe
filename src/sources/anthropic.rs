//! Anthropic messages API client for deep news analysis.

use crate::error::{AppError, Result};
use crate::sources::DeepAnalysisProvider;
use crate::types::AiInsight;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 300;

const SYSTEM_PROMPT: &str = "You are a senior hedge fund analyst. Your job is to analyze \
financial news and provide a strict sentiment score (1-10) and a concise summary. \
1 is Extremely Bearish, 10 is Extremely Bullish, 5 is Neutral.";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn user_prompt(symbol: &str, text: &str) -> String {
    format!(
        "Analyze the following news text for the stock \"{}\".\n\
         Provide the output in valid JSON format ONLY, with keys: \"score\" (number 1-10), \
         \"summary\" (max 2 sentences), \"reasoning\" (bullet points).\n\n\
         News Text:\n{}",
        symbol, text
    )
}

/// Parse the first `{...}` block of a model reply into an insight.
///
/// Missing or zero scores fall back to 5; `reasoning` may be a string or a
/// list of strings.
pub fn parse_insight(reply: &str) -> Result<AiInsight> {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Err(AppError::MalformedResponse(
            "No JSON object in model reply".to_string(),
        ));
    };
    if end < start {
        return Err(AppError::MalformedResponse(
            "No JSON object in model reply".to_string(),
        ));
    }

    let value: Value = serde_json::from_str(&reply[start..=end])?;

    let score = value
        .get("score")
        .and_then(Value::as_f64)
        .filter(|s| *s != 0.0)
        .unwrap_or(5.0)
        .clamp(1.0, 10.0);

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("Analysis failed.")
        .to_string();

    let reasoning = match value.get("reasoning") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| format!("- {}", s.trim_start_matches("- ")))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "No reasoning provided.".to_string(),
    };

    Ok(AiInsight {
        score,
        summary,
        reasoning,
    })
}

/// Anthropic client.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("Missing ANTHROPIC_API_KEY".to_string()));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl DeepAnalysisProvider for AnthropicClient {
    async fn analyze(&self, symbol: &str, text: &str) -> Result<AiInsight> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: user_prompt(symbol, text),
            }],
        };

        debug!(symbol = %symbol, chars = text.len(), "Sending deep analysis request");

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!("Status {}: {}", status, body)));
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("Parse error: {}", e)))?;

        let text = reply
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .unwrap_or_default();

        parse_insight(&text)
    }
}
