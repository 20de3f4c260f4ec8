use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use std::time::Duration;

use crate::api::{
    client::{Delivery, SyncEndpoint},
    error::ApiError,
};
use crate::models::ContractRecord;
use crate::sync::{RemoteSnapshot, SyncAction};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the spreadsheet web-app that mirrors the record set
pub struct SheetClient {
    endpoint: String,
    http_client: reqwest::Client,
}

impl SheetClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self::with_client(endpoint, http_client)
    }

    pub fn with_client(endpoint: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into().trim().to_string(),
            http_client,
        }
    }

    fn url(&self) -> Result<Url, ApiError> {
        if self.endpoint.is_empty() {
            return Err(ApiError::NotConfigured);
        }
        Url::parse(&self.endpoint)
            .map_err(|e| ApiError::ParseError(format!("Invalid endpoint URL {}: {}", self.endpoint, e)))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::RemoteStatus {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SyncEndpoint for SheetClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn push(&self, action: &SyncAction) -> Result<Delivery, ApiError> {
        let url = self.url()?;
        let body = serde_json::to_string(action)?;

        // The web-app only reads the raw body, so no JSON content type
        let response = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .body(body)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(Delivery {
            http_status: response.status().as_u16(),
        })
    }

    async fn fetch_records(&self) -> Result<Option<Vec<ContractRecord>>, ApiError> {
        let url = self.url()?;
        let cache_buster = chrono::Utc::now().timestamp_millis().to_string();

        let response = self
            .http_client
            .get(url)
            .query(&[("t", cache_buster.as_str())])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        let snapshot: RemoteSnapshot = serde_json::from_str(&text).map_err(|e| {
            ApiError::ParseError(format!(
                "Failed to parse records: {} - Body: {}",
                e,
                text.chars().take(200).collect::<String>()
            ))
        })?;

        if !snapshot.is_success() {
            log::warn!(
                "Endpoint answered status {:?}: {}",
                snapshot.status,
                snapshot.message.as_deref().unwrap_or("")
            );
        }
        Ok(snapshot.into_records())
    }

    fn print_url(&self, contract_id: &str) -> Result<String, ApiError> {
        let mut url = self.url()?;
        url.query_pairs_mut()
            .append_pair("action", "print")
            .append_pair("id", contract_id);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::serve_once;

    fn client(endpoint: &str) -> SheetClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        SheetClient::with_client(endpoint, http)
    }

    #[tokio::test]
    async fn test_push_posts_envelope_as_plain_text() {
        let (url, request) = serve_once(200, "{}").await;
        let action = SyncAction::Delete { id: "rec-7".to_string() };

        let delivery = client(&url).push(&action).await.unwrap();
        assert_eq!(delivery.http_status, 200);

        let request = request.await.unwrap();
        assert!(request.starts_with("POST "));
        assert!(request.to_lowercase().contains("content-type: text/plain"));
        assert!(request.ends_with(r#"{"action":"delete","id":"rec-7"}"#));
    }

    #[tokio::test]
    async fn test_push_surfaces_server_errors() {
        let (url, _request) = serve_once(500, "script error").await;
        let action = SyncAction::Delete { id: "rec-7".to_string() };

        let err = client(&url).push(&action).await.unwrap_err();
        assert!(matches!(err, ApiError::RemoteStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_fetch_sends_cache_buster_and_parses_records() {
        let body = r#"{"status":"success","records":[{"id":"1","title":"Plot A","amount":"100000"}]}"#;
        let (url, request) = serve_once(200, body).await;

        let records = client(&url).fetch_records().await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, 100000.0);

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /?t="));
    }

    #[tokio::test]
    async fn test_fetch_non_success_body_is_no_update() {
        let (url, _request) = serve_once(200, r#"{"status":"error","message":"quota"}"#).await;
        assert_eq!(client(&url).fetch_records().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_garbage_is_parse_error() {
        let (url, _request) = serve_once(200, "<html>login</html>").await;
        let err = client(&url).fetch_records().await.unwrap_err();
        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint() {
        let err = client("  ").fetch_records().await.unwrap_err();
        assert!(matches!(err, ApiError::NotConfigured));
    }

    #[test]
    fn test_print_url_shape() {
        let url = client("https://script.example.test/macros/s/abc/exec")
            .print_url("a b")
            .unwrap();
        assert_eq!(
            url,
            "https://script.example.test/macros/s/abc/exec?action=print&id=a+b"
        );
    }
}
