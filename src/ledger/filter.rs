use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::expiry::is_expired_at;
use crate::models::ContractRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Expired,
}

impl StatusFilter {
    pub fn matches(self, expired: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !expired,
            StatusFilter::Expired => expired,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: StatusFilter,
}

/// Case-insensitive substring match on title, owner, mobile or contractor
pub fn matches_search(record: &ContractRecord, search: &str) -> bool {
    let needle = search.to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [
        &record.title,
        &record.owner_name,
        &record.mobile,
        &record.contractor_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Records matching both the search text and the status filter, in their
/// original order
pub fn filter_records<'a>(
    records: &'a [ContractRecord],
    query: &RecordQuery,
    now: DateTime<Utc>,
) -> Vec<&'a ContractRecord> {
    records
        .iter()
        .filter(|r| matches_search(r, &query.search))
        .filter(|r| query.status.matches(is_expired_at(r, now)))
        .collect()
}
