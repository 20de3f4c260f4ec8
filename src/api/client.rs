use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::models::ContractRecord;
use crate::sync::SyncAction;

/// Result of a write that reached the endpoint.
///
/// The endpoint never reports whether it applied the action, so a
/// `Delivery` only says the request was accepted at the HTTP level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub http_status: u16,
}

/// Remote mirror of the record set
#[async_trait]
pub trait SyncEndpoint: Send + Sync {
    /// Configured endpoint URL
    fn endpoint(&self) -> &str;

    /// Send one action envelope. Fire-and-forget: no retry happens here.
    async fn push(&self, action: &SyncAction) -> Result<Delivery, ApiError>;

    /// Full remote record set, or `None` when the endpoint answered with a
    /// non-success body
    async fn fetch_records(&self) -> Result<Option<Vec<ContractRecord>>, ApiError>;

    /// Server-rendered print view for one contract
    fn print_url(&self, contract_id: &str) -> Result<String, ApiError>;
}

/// Produces a written analysis of the record set
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    fn model_name(&self) -> &str;

    async fn summarize(&self, records: &[ContractRecord]) -> Result<String, ApiError>;
}
