/// Host capabilities the resolver depends on: the record store and the
/// action history.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::history::HistoryEntry;
use crate::schema::record::{RecordId, StoryRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record {0:?} not found")]
    NotFound(RecordId),
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// A collection of tagged, titled text records owned by the host.
pub trait RecordStore {
    /// The record with this title (case-insensitive exact match).
    fn find(&self, title: &str) -> Result<Option<StoryRecord>, StoreError>;

    /// Every record carrying this type tag, in store order.
    fn find_all_by_type(&self, record_type: &str) -> Result<Vec<StoryRecord>, StoreError>;

    fn find_by_type(
        &self,
        record_type: &str,
        title: &str,
    ) -> Result<Option<StoryRecord>, StoreError> {
        Ok(self
            .find_all_by_type(record_type)?
            .into_iter()
            .find(|r| r.has_title(title)))
    }

    /// Overwrites the body of the record titled `title`, or creates it.
    fn upsert(&mut self, title: &str, body: &str, record_type: &str) -> Result<RecordId, StoreError>;

    /// Replaces the body of an existing record.
    fn mutate(&mut self, id: RecordId, body: &str) -> Result<(), StoreError>;
}

/// Read access to the host's ordered action history, newest last.
pub trait HistoryReader {
    /// The entry `look_back` steps before the newest one, saturating at the
    /// oldest. `None` only when the history is empty.
    fn latest(&self, look_back: usize) -> Option<&HistoryEntry>;
}

impl HistoryReader for [HistoryEntry] {
    fn latest(&self, look_back: usize) -> Option<&HistoryEntry> {
        let index = self.len().checked_sub(1)?.saturating_sub(look_back);
        self.get(index)
    }
}

impl HistoryReader for Vec<HistoryEntry> {
    fn latest(&self, look_back: usize) -> Option<&HistoryEntry> {
        self.as_slice().latest(look_back)
    }
}

/// In-process record store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRecordStore {
    records: Vec<StoryRecord>,
    next_id: u64,
    /// Writes made through the `RecordStore` interface.
    #[serde(skip)]
    writes: usize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from host-supplied records, keeping their IDs.
    pub fn from_records(records: Vec<StoryRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id.0 + 1).max().unwrap_or(0);
        Self {
            records,
            next_id,
            writes: 0,
        }
    }

    /// Adds a record without counting it as a write.
    pub fn insert(&mut self, record_type: &str, title: &str, body: &str) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.records.push(StoryRecord {
            id,
            record_type: record_type.to_string(),
            title: title.to_string(),
            keys: title.to_string(),
            body: body.to_string(),
            description: String::new(),
            updated_at: Utc::now(),
        });
        id
    }

    pub fn with_record(mut self, record_type: &str, title: &str, body: &str) -> Self {
        self.insert(record_type, title, body);
        self
    }

    pub fn get(&self, id: RecordId) -> Option<&StoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Case-insensitive title lookup without cloning.
    pub fn by_title(&self, title: &str) -> Option<&StoryRecord> {
        self.records.iter().find(|r| r.has_title(title))
    }

    pub fn records(&self) -> &[StoryRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StoryRecord> {
        self.records
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn reset_writes(&mut self) {
        self.writes = 0;
    }
}

impl RecordStore for MemoryRecordStore {
    fn find(&self, title: &str) -> Result<Option<StoryRecord>, StoreError> {
        Ok(self.by_title(title).cloned())
    }

    fn find_all_by_type(&self, record_type: &str) -> Result<Vec<StoryRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.has_type(record_type))
            .cloned()
            .collect())
    }

    fn upsert(&mut self, title: &str, body: &str, record_type: &str) -> Result<RecordId, StoreError> {
        self.writes += 1;
        if let Some(existing) = self.records.iter_mut().find(|r| r.has_title(title)) {
            existing.body = body.to_string();
            existing.updated_at = Utc::now();
            return Ok(existing.id);
        }
        Ok(self.insert(record_type, title, body))
    }

    fn mutate(&mut self, id: RecordId, body: &str) -> Result<(), StoreError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.body = body.to_string();
        record.updated_at = Utc::now();
        self.writes += 1;
        Ok(())
    }
}
