//! Expiry math. Everything here is pure and cheap: it runs on every
//! derivation pass over the record set.
//!
//! A contract whose start date or duration is missing or unreadable is
//! never considered expired.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::duration::{leading_int, shift, ContractDuration, DurationExtension, DurationUnit};
use crate::models::ContractRecord;

/// Start date as stored: a plain `YYYY-MM-DD`, or a full timestamp when the
/// record came back from the spreadsheet.
pub fn parse_start_date(start_date: &str) -> Option<NaiveDateTime> {
    let s = start_date.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
}

fn expiry_for(start_date: &str, duration: &str) -> Option<DateTime<Utc>> {
    let start = parse_start_date(start_date)?;
    let duration = ContractDuration::parse(duration)?;
    let end = duration.add_to(start.date())?;
    Some(end.and_time(start.time()).and_utc())
}

/// Instant the contract ends, or `None` when it cannot be computed
pub fn expiry_instant(record: &ContractRecord) -> Option<DateTime<Utc>> {
    expiry_for(&record.start_date, &record.duration)
}

pub fn expiry_date(record: &ContractRecord) -> Option<NaiveDate> {
    expiry_instant(record).map(|dt| dt.date_naive())
}

pub fn is_expired_at(record: &ContractRecord, now: DateTime<Utc>) -> bool {
    expiry_instant(record).is_some_and(|expiry| now > expiry)
}

pub fn is_expired(record: &ContractRecord) -> bool {
    is_expired_at(record, Utc::now())
}

/// Still running but ends within `warning_days`
pub fn is_expiring_soon(record: &ContractRecord, now: DateTime<Utc>, warning_days: i64) -> bool {
    match expiry_instant(record) {
        Some(expiry) if now <= expiry => (expiry - now).num_days() < warning_days,
        _ => false,
    }
}

/// End date shown while an extension is being entered: the current
/// duration in its own unit (years when the unit is missing), then the
/// extension in its unit. This is not the date the saved duration produces,
/// since saving adds magnitudes and keeps only the extension's unit.
pub fn projected_expiry(
    record: &ContractRecord,
    extension: Option<DurationExtension>,
) -> Option<NaiveDate> {
    let start = parse_start_date(&record.start_date)?;
    let mut parts = record.duration.split_whitespace();
    let first = parts.next()?;
    let value = leading_int(first).unwrap_or(0);
    let unit = parts
        .next()
        .map(DurationUnit::from_label)
        .unwrap_or(DurationUnit::Year);

    let end = shift(start.date(), value, unit)?;
    match extension {
        Some(ext) => shift(end, ext.value, ext.unit),
        None => Some(end),
    }
}
