use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::expiry::is_expired_at;
use crate::models::record::finite_or_zero;
use crate::models::ContractRecord;

/// Figures shown on the dashboard cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total_investment: f64,
    pub total_collected: f64,
    pub active_contracts: usize,
    pub total_contracts: usize,
}

pub fn compute_stats(records: &[ContractRecord], now: DateTime<Utc>) -> LedgerStats {
    let total_investment = records.iter().map(|r| finite_or_zero(r.amount)).sum();
    let total_collected = records.iter().map(ContractRecord::total_collected).sum();
    let active_contracts = records.iter().filter(|r| !is_expired_at(r, now)).count();

    LedgerStats {
        total_investment,
        total_collected,
        active_contracts,
        total_contracts: records.len(),
    }
}
