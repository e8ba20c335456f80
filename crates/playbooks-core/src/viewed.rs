//! Stores for the per-user "has viewed channel" record.
//!
//! `MemoryViewedStore` lives for one process. `ViewedDb` persists to redb so
//! later sessions short-circuit before any network call.
//!
//! # Table design
//!
//! A single `VIEWED` table keyed by channel id; the value is a JSON-encoded
//! [`ViewedRecord`]. Marking an already-viewed channel keeps the first
//! timestamp.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{PlaybooksError, Result};
use crate::host::ViewedStore;

// ---------------------------------------------------------------------------
// MemoryViewedStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryViewedStore {
    viewed: Mutex<HashMap<String, bool>>,
}

impl MemoryViewedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already reports `channel_ids` as viewed.
    pub fn with_viewed<I, S>(channel_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let viewed = channel_ids.into_iter().map(|id| (id.into(), true)).collect();
        Self {
            viewed: Mutex::new(viewed),
        }
    }
}

impl ViewedStore for MemoryViewedStore {
    fn has_viewed_by_channel_id(&self) -> Result<HashMap<String, bool>> {
        let viewed = self.viewed.lock().unwrap_or_else(|e| e.into_inner());
        Ok(viewed.clone())
    }

    fn mark_channel_viewed(&self, channel_id: &str) -> Result<()> {
        let mut viewed = self.viewed.lock().unwrap_or_else(|e| e.into_inner());
        viewed.insert(channel_id.to_string(), true);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ViewedDb
// ---------------------------------------------------------------------------

const VIEWED: TableDefinition<&str, &[u8]> = TableDefinition::new("viewed");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewedRecord {
    pub channel_id: String,
    pub viewed_at: DateTime<Utc>,
}

pub struct ViewedDb {
    db: Database,
}

fn db_err(e: impl std::fmt::Display) -> PlaybooksError {
    PlaybooksError::ViewedDb(e.to_string())
}

impl ViewedDb {
    /// Open or create the redb database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        // Ensure the table exists before any reads
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(VIEWED).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    /// All viewed channels, most recent first.
    pub fn list(&self) -> Result<Vec<ViewedRecord>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(VIEWED).map_err(db_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            let record: ViewedRecord = serde_json::from_slice(v.value())?;
            records.push(record);
        }
        records.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
        Ok(records)
    }

    pub fn get(&self, channel_id: &str) -> Result<Option<ViewedRecord>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(VIEWED).map_err(db_err)?;
        match table.get(channel_id).map_err(db_err)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }
}

impl ViewedStore for ViewedDb {
    fn has_viewed_by_channel_id(&self) -> Result<HashMap<String, bool>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|r| (r.channel_id, true))
            .collect())
    }

    fn mark_channel_viewed(&self, channel_id: &str) -> Result<()> {
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(VIEWED).map_err(db_err)?;
            let exists = table.get(channel_id).map_err(db_err)?.is_some();
            if !exists {
                let record = ViewedRecord {
                    channel_id: channel_id.to_string(),
                    viewed_at: Utc::now(),
                };
                let value = serde_json::to_vec(&record)?;
                table
                    .insert(channel_id, value.as_slice())
                    .map_err(db_err)?;
            }
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn has_viewed(&self, channel_id: &str) -> Result<bool> {
        Ok(self.get(channel_id)?.is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
