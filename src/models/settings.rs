use serde::{Deserialize, Serialize};

pub const DEFAULT_BUSINESS_NAME: &str = "জমি বন্ধক ম্যানেজার";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Process-wide settings, persisted as a single document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub business_name: String,
    /// Only seeds `collectionAmount` on new contracts
    pub profit_percentage: f64,
    pub warning_days: i64,
    pub currency: String,
    pub theme: Theme,
    /// Spreadsheet web-app endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_sheet_url: Option<String>,
    /// Link to the sheet itself, display only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet_url: Option<String>,
    /// Push every local mutation to the endpoint
    pub auto_sync: bool,
    pub restrict_collection_to_expired: bool,
    /// Poll the endpoint in the background
    pub live_sync: bool,
    pub poll_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            business_name: DEFAULT_BUSINESS_NAME.to_string(),
            profit_percentage: 9.0,
            warning_days: 15,
            currency: "৳".to_string(),
            theme: Theme::Light,
            google_sheet_url: None,
            spreadsheet_url: None,
            auto_sync: true,
            restrict_collection_to_expired: false,
            live_sync: true,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl AppConfig {
    /// Endpoint URL, if one is set to something non-blank
    pub fn endpoint(&self) -> Option<&str> {
        self.google_sheet_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn should_push(&self) -> bool {
        self.auto_sync && self.endpoint().is_some()
    }

    pub fn should_poll(&self) -> bool {
        self.live_sync && self.endpoint().is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigInput {
    pub business_name: Option<String>,
    pub profit_percentage: Option<f64>,
    pub warning_days: Option<i64>,
    pub currency: Option<String>,
    pub theme: Option<Theme>,
    pub google_sheet_url: Option<String>,
    pub spreadsheet_url: Option<String>,
    pub auto_sync: Option<bool>,
    pub restrict_collection_to_expired: Option<bool>,
    pub live_sync: Option<bool>,
    pub poll_interval_secs: Option<u64>,
}

impl UpdateConfigInput {
    pub fn apply_to(self, config: &mut AppConfig) {
        if let Some(val) = self.business_name {
            config.business_name = val;
        }
        if let Some(val) = self.profit_percentage {
            config.profit_percentage = val;
        }
        if let Some(val) = self.warning_days {
            config.warning_days = val;
        }
        if let Some(val) = self.currency {
            config.currency = val;
        }
        if let Some(val) = self.theme {
            config.theme = val;
        }
        // An empty string clears the URL
        if let Some(val) = self.google_sheet_url {
            config.google_sheet_url = Some(val).filter(|v| !v.trim().is_empty());
        }
        if let Some(val) = self.spreadsheet_url {
            config.spreadsheet_url = Some(val).filter(|v| !v.trim().is_empty());
        }
        if let Some(val) = self.auto_sync {
            config.auto_sync = val;
        }
        if let Some(val) = self.restrict_collection_to_expired {
            config.restrict_collection_to_expired = val;
        }
        if let Some(val) = self.live_sync {
            config.live_sync = val;
        }
        if let Some(val) = self.poll_interval_secs {
            config.poll_interval_secs = val.max(1);
        }
    }
}
