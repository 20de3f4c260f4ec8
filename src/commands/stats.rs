use chrono::Utc;

use super::state::AppState;
use crate::ledger::LedgerStats;

pub async fn get_dashboard_stats(state: &AppState) -> LedgerStats {
    state.ledger.read().await.stats(Utc::now())
}
