use chrono::{DateTime, Local, Utc};
use std::sync::Arc;

use super::duration::{extend_duration, DurationExtension};
use super::expiry::is_expired_at;
use super::filter::{filter_records, RecordQuery};
use super::recurring::{Frequency, RecurringSchedule};
use super::stats::{compute_stats, LedgerStats};
use crate::db::store::{load_json, save_json, CONFIG_KEY, LAST_SYNC_KEY, RECORDS_KEY};
use crate::db::DocumentStore;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AppConfig, CollectionEntry, CollectionInput, ContractPatch, ContractRecord, NewContract,
    UpdateConfigInput,
};
use crate::sync::SyncAction;

pub const NEVER_SYNCED: &str = "কখনো নয়";
const REGULAR_INSTALLMENT_NOTE: &str = "নিয়মিত কিস্তি";

/// `round(amount × percentage / 100)`, the installment a new contract
/// starts with
pub fn default_collection_amount(amount: f64, profit_percentage: f64) -> f64 {
    let value = (amount * (profit_percentage / 100.0)).round();
    if value.is_finite() { value } else { 0.0 }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn required(value: &str, field: &'static str) -> LedgerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::Validation(field));
    }
    Ok(())
}

/// Owns the record set and configuration. Every mutation is written to the
/// document store before it returns; remote pushes are queued in an outbox
/// for the caller to dispatch.
pub struct Ledger {
    store: Arc<dyn DocumentStore>,
    config: AppConfig,
    records: Vec<ContractRecord>,
    last_sync: String,
    outbox: Vec<SyncAction>,
}

impl Ledger {
    /// Load persisted state, falling back to defaults for anything absent
    /// or corrupt.
    pub fn load(store: Arc<dyn DocumentStore>) -> Self {
        let config: AppConfig = load_json(store.as_ref(), CONFIG_KEY).unwrap_or_default();
        let records: Vec<ContractRecord> = load_json(store.as_ref(), RECORDS_KEY).unwrap_or_default();
        let last_sync: String =
            load_json(store.as_ref(), LAST_SYNC_KEY).unwrap_or_else(|| NEVER_SYNCED.to_string());

        log::info!("Loaded {} contracts from local store", records.len());

        Self {
            store,
            config,
            records,
            last_sync,
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn records(&self) -> &[ContractRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&ContractRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn last_sync(&self) -> &str {
        &self.last_sync
    }

    pub fn update_config(&mut self, input: UpdateConfigInput) -> LedgerResult<AppConfig> {
        input.apply_to(&mut self.config);
        save_json(self.store.as_ref(), CONFIG_KEY, &self.config)?;
        Ok(self.config.clone())
    }

    pub fn replace_config(&mut self, config: AppConfig) -> LedgerResult<()> {
        self.config = config;
        save_json(self.store.as_ref(), CONFIG_KEY, &self.config)
    }

    fn persist_records(&self) -> LedgerResult<()> {
        save_json(self.store.as_ref(), RECORDS_KEY, &self.records)
    }

    fn enqueue(&mut self, action: SyncAction) {
        if self.config.should_push() {
            self.outbox.push(action);
        }
    }

    /// Pending remote writes, oldest first
    pub fn take_outbox(&mut self) -> Vec<SyncAction> {
        std::mem::take(&mut self.outbox)
    }

    fn position(&self, id: &str) -> LedgerResult<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| LedgerError::ContractNotFound(id.to_string()))
    }

    pub fn create_contract(&mut self, input: NewContract) -> LedgerResult<ContractRecord> {
        required(&input.title, "title")?;
        required(&input.owner_name, "ownerName")?;
        required(&input.contractor_name, "contractorName")?;
        if !(input.amount.is_finite() && input.amount > 0.0) {
            return Err(LedgerError::Validation("amount"));
        }

        let collection_amount = input.collection_amount.unwrap_or_else(|| {
            default_collection_amount(input.amount, self.config.profit_percentage)
        });

        let record = ContractRecord {
            id: new_id(),
            title: input.title,
            area: input.area.max(0.0),
            location: input.location,
            amount: input.amount,
            owner_name: input.owner_name,
            mobile: input.mobile,
            duration: input.duration,
            contractor_name: input.contractor_name,
            contractor_mobile: input.contractor_mobile,
            contractor_address: input.contractor_address,
            collection_amount,
            reference: input.reference,
            start_date: input.start_date,
            notes: input.notes,
            collections: Vec::new(),
        };

        self.records.push(record.clone());
        self.persist_records()?;
        log::info!("Created contract {} ({})", record.id, record.title);

        self.enqueue(SyncAction::Add {
            record: record.clone(),
        });
        Ok(record)
    }

    pub fn update_contract(&mut self, patch: ContractPatch) -> LedgerResult<ContractRecord> {
        let idx = self.position(&patch.id)?;
        patch.apply_to(&mut self.records[idx]);
        let record = self.records[idx].clone();

        self.persist_records()?;
        log::info!("Updated contract {}", record.id);

        self.enqueue(SyncAction::Edit {
            record: record.clone(),
        });
        Ok(record)
    }

    /// Irreversible. Callers confirm with the user first and drop any view
    /// still showing the removed record.
    pub fn delete_contract(&mut self, id: &str) -> LedgerResult<ContractRecord> {
        let idx = self.position(id)?;
        let removed = self.records.remove(idx);

        self.persist_records()?;
        log::info!("Deleted contract {} ({})", removed.id, removed.title);

        self.enqueue(SyncAction::Delete {
            id: removed.id.clone(),
        });
        Ok(removed)
    }

    fn check_collection_allowed(&self, record: &ContractRecord, now: DateTime<Utc>) -> LedgerResult<()> {
        if self.config.restrict_collection_to_expired && !is_expired_at(record, now) {
            return Err(LedgerError::CollectionNotAllowed(record.id.clone()));
        }
        Ok(())
    }

    /// Appends `entries` in order, each with a fresh id, and optionally
    /// extends the duration (see [`extend_duration`]).
    pub fn record_collections(
        &mut self,
        contract_id: &str,
        entries: Vec<CollectionInput>,
        extension: Option<DurationExtension>,
    ) -> LedgerResult<ContractRecord> {
        let idx = self.position(contract_id)?;
        if entries.is_empty() {
            return Err(LedgerError::NothingToCollect(contract_id.to_string()));
        }
        self.check_collection_allowed(&self.records[idx], Utc::now())?;

        let record = &mut self.records[idx];
        let count = entries.len();
        record
            .collections
            .extend(entries.into_iter().map(|e| CollectionEntry {
                id: new_id(),
                date: e.date,
                amount: e.amount,
                note: e.note,
            }));
        if let Some(ext) = extension {
            record.duration = extend_duration(&record.duration, ext);
        }
        let record = record.clone();

        self.persist_records()?;
        log::info!(
            "Recorded {} collection(s) for {} (duration now {})",
            count,
            record.id,
            record.duration
        );

        self.enqueue(SyncAction::Edit {
            record: record.clone(),
        });
        Ok(record)
    }

    /// Single installment entered by hand. The amount must be positive; a
    /// blank note gets the standard wording.
    pub fn record_collection(
        &mut self,
        contract_id: &str,
        entry: CollectionInput,
        extension: Option<DurationExtension>,
    ) -> LedgerResult<ContractRecord> {
        if !(entry.amount.is_finite() && entry.amount > 0.0) {
            return Err(LedgerError::Validation("amount"));
        }
        required(&entry.date, "date")?;

        let note = match entry.note.filter(|n| !n.trim().is_empty()) {
            Some(note) => note,
            None => match extension {
                Some(ext) => format!("কিস্তি আদায় + মেয়াদ বৃদ্ধি ({})", ext.label()),
                None => REGULAR_INSTALLMENT_NOTE.to_string(),
            },
        };

        self.record_collections(
            contract_id,
            vec![CollectionInput {
                date: entry.date,
                amount: entry.amount,
                note: Some(note),
            }],
            extension,
        )
    }

    /// Outstanding installments for a contract, without recording them
    pub fn preview_recurring(
        &self,
        contract_id: &str,
        frequency: Frequency,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<CollectionInput>> {
        let idx = self.position(contract_id)?;
        Ok(RecurringSchedule::new(&self.records[idx], frequency, now).collect())
    }

    /// Records every outstanding installment up to `now` in one batch
    pub fn record_recurring(
        &mut self,
        contract_id: &str,
        frequency: Frequency,
        extension: Option<DurationExtension>,
        now: DateTime<Utc>,
    ) -> LedgerResult<ContractRecord> {
        let entries = self.preview_recurring(contract_id, frequency, now)?;
        self.record_collections(contract_id, entries, extension)
    }

    pub fn remove_collection(&mut self, contract_id: &str, entry_id: &str) -> LedgerResult<ContractRecord> {
        let idx = self.position(contract_id)?;
        let record = &mut self.records[idx];

        let before = record.collections.len();
        record.collections.retain(|c| c.id != entry_id);
        if record.collections.len() == before {
            return Err(LedgerError::CollectionNotFound {
                contract_id: contract_id.to_string(),
                entry_id: entry_id.to_string(),
            });
        }
        let record = record.clone();

        self.persist_records()?;
        log::info!("Removed collection {} from {}", entry_id, contract_id);

        self.enqueue(SyncAction::Edit {
            record: record.clone(),
        });
        Ok(record)
    }

    /// Swap in a whole record set (remote refresh, backup restore). Nothing
    /// is queued for the remote.
    pub fn replace_records(&mut self, records: Vec<ContractRecord>) -> LedgerResult<()> {
        self.records = records;
        self.persist_records()
    }

    /// Stamp and persist the last successful sync time
    pub fn mark_synced(&mut self) -> LedgerResult<String> {
        self.last_sync = Local::now().format("%d/%m/%Y, %I:%M:%S %p").to_string();
        save_json(self.store.as_ref(), LAST_SYNC_KEY, &self.last_sync)?;
        Ok(self.last_sync.clone())
    }

    pub fn stats(&self, now: DateTime<Utc>) -> LedgerStats {
        compute_stats(&self.records, now)
    }

    pub fn search(&self, query: &RecordQuery, now: DateTime<Utc>) -> Vec<ContractRecord> {
        filter_records(&self.records, query, now)
            .into_iter()
            .cloned()
            .collect()
    }
}
