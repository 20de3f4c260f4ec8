use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One installment payment against a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<String>,
}

/// One land-mortgage agreement between an owner and a contractor.
///
/// Field names follow the camelCase keys of the persisted document and of
/// the spreadsheet endpoint, so remote payloads deserialize directly. Numeric
/// and text fields coerce loosely (see [`lenient_f64`]) because spreadsheet
/// cells come back as whatever type the sheet guessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub area: f64, // শতক
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64, // Security amount
    #[serde(default, deserialize_with = "lenient_string")]
    pub owner_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String, // "<n> <unit>"
    #[serde(default, deserialize_with = "lenient_string")]
    pub contractor_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contractor_mobile: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contractor_address: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub collection_amount: f64,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_collections")]
    pub collections: Vec<CollectionEntry>,
}

impl ContractRecord {
    /// Sum of every recorded installment for this contract
    pub fn total_collected(&self) -> f64 {
        self.collections.iter().map(|c| finite_or_zero(c.amount)).sum()
    }
}

/// Input for registering a new contract (no id, no collections yet)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub title: String,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub location: String,
    pub amount: f64,
    pub owner_name: String,
    #[serde(default)]
    pub mobile: String,
    pub duration: String,
    pub contractor_name: String,
    #[serde(default)]
    pub contractor_mobile: String,
    #[serde(default)]
    pub contractor_address: String,
    /// Seeded from the configured profit percentage when omitted
    #[serde(default)]
    pub collection_amount: Option<f64>,
    #[serde(default)]
    pub reference: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for an existing contract. Omitted fields keep their
/// current value. Collections are managed through the collection
/// operations and cannot be replaced here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPatch {
    pub id: String,
    pub title: Option<String>,
    pub area: Option<f64>,
    pub location: Option<String>,
    pub amount: Option<f64>,
    pub owner_name: Option<String>,
    pub mobile: Option<String>,
    pub duration: Option<String>,
    pub contractor_name: Option<String>,
    pub contractor_mobile: Option<String>,
    pub contractor_address: Option<String>,
    pub collection_amount: Option<f64>,
    pub reference: Option<String>,
    pub start_date: Option<String>,
    pub notes: Option<String>,
}

impl ContractPatch {
    /// Shallow-merge the provided fields into `record`
    pub fn apply_to(&self, record: &mut ContractRecord) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(val) = &self.$field {
                        record.$field = val.clone();
                    }
                )*
            };
        }

        merge!(
            title,
            area,
            location,
            amount,
            owner_name,
            mobile,
            duration,
            contractor_name,
            contractor_mobile,
            contractor_address,
            collection_amount,
            start_date,
        );

        if self.reference.is_some() {
            record.reference = self.reference.clone();
        }
        if self.notes.is_some() {
            record.notes = self.notes.clone();
        }
    }
}

/// One installment to record, before an id is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInput {
    pub date: String,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Accepts numbers, numeric strings and null. Anything unreadable becomes 0.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().map(finite_or_zero).unwrap_or(0.0),
        Value::Bool(b) => {
            if b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Like [`lenient_string`], but a null or missing cell stays `None`
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_collections<'de, D>(deserializer: D) -> Result<Vec<CollectionEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Vec<CollectionEntry>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
