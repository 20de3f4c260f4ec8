use async_trait::async_trait;
use std::time::Duration;

use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::api::{client::SummaryProvider, error::ApiError};
use crate::models::ContractRecord;

const BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Prompt asking for a Bengali financial overview of the record set
pub fn build_prompt(records: &[ContractRecord]) -> Result<String, ApiError> {
    let records_json = serde_json::to_string_pretty(records)?;

    Ok(format!(
        "Analyze these land contract and collection records and provide a concise summary in Bengali.
Focus on:
1. Total Security Amount invested in land.
2. Total collected profit/rent (collections) across all records.
3. ROI (Return on Investment) insights.
4. Strategic advice for managing these land contracts and collections.

Data: {}

Format the response in Markdown with clear headings. Use Bengali digits for numbers where possible.
Note: 'amount' is the security/investment, 'collections' is the profit history.",
        records_json
    ))
}

pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: BASE_URL.to_string(),
            http_client,
        }
    }

    /// Key from `GEMINI_API_KEY`, then `API_KEY`
    pub fn from_env() -> Result<Self, ApiError> {
        std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
            .ok_or(ApiError::MissingApiKey("GEMINI_API_KEY"))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        self.base_url = base_url.into();
        self.http_client = http_client;
        self
    }
}

#[async_trait]
impl SummaryProvider for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, records: &[ContractRecord]) -> Result<String, ApiError> {
        let prompt = build_prompt(records)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::RemoteStatus {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)?;
        parsed
            .text()
            .ok_or_else(|| ApiError::ParseError("Model returned no text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::serve_once;

    fn record() -> ContractRecord {
        serde_json::from_value(serde_json::json!({
            "id": "r1",
            "title": "Plot A",
            "amount": 100000,
            "ownerName": "X",
            "duration": "1 বছর",
            "startDate": "2024-01-01"
        }))
        .unwrap()
    }

    fn client(base_url: &str) -> GeminiClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        GeminiClient::new("test-key").with_base_url(base_url, http)
    }

    #[test]
    fn test_prompt_embeds_records() {
        let prompt = build_prompt(&[record()]).unwrap();
        assert!(prompt.contains("\"title\": \"Plot A\""));
        assert!(prompt.contains("summary in Bengali"));
    }

    #[tokio::test]
    async fn test_summarize_returns_candidate_text() {
        let body = r###"{"candidates":[{"content":{"role":"model","parts":[{"text":"## সারাংশ"},{"text":"\nভালো"}]},"finishReason":"STOP"}]}"###;
        let (url, request) = serve_once(200, body).await;

        let text = client(&url).summarize(&[record()]).await.unwrap();
        assert_eq!(text, "## সারাংশ\nভালো");

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-3-flash-preview:generateContent"));
        assert!(request.contains("x-goog-api-key: test-key"));
    }

    #[tokio::test]
    async fn test_summarize_error_status() {
        let (url, _request) = serve_once(403, r#"{"error":"denied"}"#).await;
        let err = client(&url).summarize(&[]).await.unwrap_err();
        assert!(matches!(err, ApiError::RemoteStatus { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_summarize_empty_candidates() {
        let (url, _request) = serve_once(200, r#"{"candidates":[]}"#).await;
        let err = client(&url).summarize(&[]).await.unwrap_err();
        assert!(matches!(err, ApiError::ParseError(_)));
    }
}
