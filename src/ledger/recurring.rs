use chrono::{DateTime, Months, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::expiry::parse_start_date;
use crate::models::{CollectionEntry, CollectionInput, ContractRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    fn months(self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Yearly => 12,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Monthly => "মাসিক",
            Frequency::Quarterly => "ত্রৈমাসিক",
            Frequency::Yearly => "বার্ষিক",
        }
    }

    pub fn note(self) -> String {
        format!("স্বয়ংক্রিয় রিকারিং কিস্তি ({})", self.label())
    }
}

/// Lazily yields the installments missing from a contract, one period at a
/// time from one period after the start date up to `now`.
///
/// A step is skipped when any existing entry is dated in the same calendar
/// month (`YYYY-MM` prefix), whatever the day or frequency.
pub struct RecurringSchedule<'a> {
    start: Option<NaiveDateTime>,
    now: NaiveDateTime,
    step_months: u32,
    period: u32,
    amount: f64,
    frequency: Frequency,
    existing: &'a [CollectionEntry],
}

impl<'a> RecurringSchedule<'a> {
    pub fn new(record: &'a ContractRecord, frequency: Frequency, now: DateTime<Utc>) -> Self {
        Self {
            start: parse_start_date(&record.start_date),
            now: now.naive_utc(),
            step_months: frequency.months(),
            period: 0,
            amount: record.collection_amount,
            frequency,
            existing: &record.collections,
        }
    }

    fn already_collected(&self, month_key: &str) -> bool {
        self.existing.iter().any(|c| c.date.starts_with(month_key))
    }
}

impl Iterator for RecurringSchedule<'_> {
    type Item = CollectionInput;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.start?;

        loop {
            self.period = self.period.checked_add(1)?;
            let offset = self.period.checked_mul(self.step_months)?;
            let due = match start.checked_add_months(Months::new(offset)) {
                Some(due) if due <= self.now => due,
                _ => {
                    self.start = None;
                    return None;
                }
            };

            let date = due.format("%Y-%m-%d").to_string();
            if self.already_collected(&date[..7]) {
                continue;
            }

            return Some(CollectionInput {
                date,
                amount: self.amount,
                note: Some(self.frequency.note()),
            });
        }
    }
}
