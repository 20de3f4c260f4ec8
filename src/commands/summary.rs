use super::state::AppState;

pub const SUMMARY_UNAVAILABLE: &str = "দুঃখিত, এই মুহূর্তে এনালাইসিস সামারি তৈরি করা সম্ভব হচ্ছে না।";

/// Written analysis of the current record set. Never fails: any provider
/// problem is logged and the fixed apology text is returned instead.
pub async fn financial_summary(state: &AppState) -> String {
    let Some(provider) = state.summary_provider() else {
        log::warn!("No summary provider configured");
        return SUMMARY_UNAVAILABLE.to_string();
    };

    let records = state.ledger.read().await.records().to_vec();
    match provider.summarize(&records).await {
        Ok(text) => text,
        Err(e) => {
            log::error!("Summary from {} failed: {}", provider.model_name(), e);
            SUMMARY_UNAVAILABLE.to_string()
        }
    }
}
