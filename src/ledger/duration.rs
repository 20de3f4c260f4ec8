use chrono::{Days, Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?\d+)").expect("static regex"));

/// Unit of a contract duration. Anything other than year or month is
/// counted in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationUnit {
    #[serde(rename = "বছর")]
    Year,
    #[serde(rename = "মাস")]
    Month,
    #[serde(rename = "দিন")]
    Day,
}

impl DurationUnit {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "বছর" => DurationUnit::Year,
            "মাস" => DurationUnit::Month,
            _ => DurationUnit::Day,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationUnit::Year => "বছর",
            DurationUnit::Month => "মাস",
            DurationUnit::Day => "দিন",
        }
    }
}

/// Parsed form of the `"<n> <unit>"` duration string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractDuration {
    pub magnitude: i64,
    pub unit: DurationUnit,
}

impl ContractDuration {
    /// Returns `None` when the string is blank or has no leading integer.
    pub fn parse(duration: &str) -> Option<Self> {
        let mut parts = duration.split_whitespace();
        let magnitude = leading_int(parts.next()?)?;
        let unit = parts
            .next()
            .map(DurationUnit::from_label)
            .unwrap_or(DurationUnit::Day);

        Some(Self { magnitude, unit })
    }

    /// `start` moved forward by this duration. Month arithmetic clamps to the
    /// last day of the target month (Jan 31 + 1 month = Feb 28/29).
    pub fn add_to(&self, start: NaiveDate) -> Option<NaiveDate> {
        shift(start, self.magnitude, self.unit)
    }
}

/// Extension applied while recording a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationExtension {
    pub value: i64,
    pub unit: DurationUnit,
}

impl DurationExtension {
    pub fn label(&self) -> String {
        format!("{} {}", self.value, self.unit.label())
    }
}

/// Adds the extension to the numeric magnitude of `current` and switches the
/// unit to the extension's unit: `"2 বছর"` + `(1, মাস)` is `"3 মাস"`.
/// Stored contracts depend on this exact arithmetic, so it must not be
/// "fixed" into unit-aware addition.
pub fn extend_duration(current: &str, extension: DurationExtension) -> String {
    let current_value = current
        .split_whitespace()
        .next()
        .and_then(leading_int)
        .unwrap_or(0);

    format!(
        "{} {}",
        current_value + extension.value,
        extension.unit.label()
    )
}

pub(crate) fn shift(date: NaiveDate, amount: i64, unit: DurationUnit) -> Option<NaiveDate> {
    match unit {
        DurationUnit::Year => shift_months(date, amount.checked_mul(12)?),
        DurationUnit::Month => shift_months(date, amount),
        DurationUnit::Day => {
            let days = Days::new(amount.unsigned_abs());
            if amount >= 0 {
                date.checked_add_days(days)
            } else {
                date.checked_sub_days(days)
            }
        }
    }
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let count = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(count)
    } else {
        date.checked_sub_months(count)
    }
}

/// Leading integer of a token, like "12" from "12" or "3" from "3rd"
pub(crate) fn leading_int(token: &str) -> Option<i64> {
    let caps = LEADING_INT.captures(token)?;
    caps.get(1)?.as_str().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_known_units() {
        assert_eq!(
            ContractDuration::parse("2 বছর"),
            Some(ContractDuration { magnitude: 2, unit: DurationUnit::Year })
        );
        assert_eq!(
            ContractDuration::parse("6 মাস"),
            Some(ContractDuration { magnitude: 6, unit: DurationUnit::Month })
        );
    }

    #[test]
    fn test_parse_unknown_or_missing_unit_is_days() {
        assert_eq!(
            ContractDuration::parse("45 days").map(|d| d.unit),
            Some(DurationUnit::Day)
        );
        assert_eq!(
            ContractDuration::parse("30"),
            Some(ContractDuration { magnitude: 30, unit: DurationUnit::Day })
        );
    }

    #[test]
    fn test_parse_rejects_blank_and_non_numeric() {
        assert_eq!(ContractDuration::parse(""), None);
        assert_eq!(ContractDuration::parse("   "), None);
        assert_eq!(ContractDuration::parse("এক বছর"), None);
    }

    #[test]
    fn test_extend_switches_unit_and_adds_magnitude() {
        let ext = DurationExtension { value: 1, unit: DurationUnit::Month };
        assert_eq!(extend_duration("2 বছর", ext), "3 মাস");

        let ext = DurationExtension { value: 2, unit: DurationUnit::Year };
        assert_eq!(extend_duration("1 বছর", ext), "3 বছর");
    }

    #[test]
    fn test_extend_unparseable_current_counts_as_zero() {
        let ext = DurationExtension { value: 1, unit: DurationUnit::Year };
        assert_eq!(extend_duration("", ext), "1 বছর");
        assert_eq!(extend_duration("unknown", ext), "1 বছর");
    }

    #[test]
    fn test_add_to_clamps_month_end() {
        let d = ContractDuration { magnitude: 1, unit: DurationUnit::Month };
        assert_eq!(d.add_to(date(2024, 1, 31)), Some(date(2024, 2, 29)));

        let d = ContractDuration { magnitude: 1, unit: DurationUnit::Year };
        assert_eq!(d.add_to(date(2024, 2, 29)), Some(date(2025, 2, 28)));

        let d = ContractDuration { magnitude: 10, unit: DurationUnit::Day };
        assert_eq!(d.add_to(date(2024, 12, 25)), Some(date(2025, 1, 4)));
    }

    #[test]
    fn test_unit_serializes_as_label() {
        let json = serde_json::to_string(&DurationUnit::Year).unwrap();
        assert_eq!(json, "\"বছর\"");
    }
}
