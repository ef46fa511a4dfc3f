//! Append-only journal for durability
//!
//! Every committed write is journaled before the engine acknowledges it.
//! On startup the journal is replayed over the last snapshot to rebuild the
//! tree. A torn or corrupt tail (partial line after a crash) is tolerated:
//! replay stops at the first bad line and keeps everything before it.
//!
//! Format per line:
//! - crc: 8 lowercase hex chars (CRC32 of the entry JSON)
//! - separator: single tab
//! - entry: one JSON object, no embedded newlines

use crate::store::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sync strategy for journal writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalSyncMode {
    /// Fsync after every write (safest, slowest)
    EveryWrite,
    /// Fsync in batches (balanced)
    Batched,
    /// No fsync, rely on OS (fastest, risk of loss)
    None,
}

impl Default for JournalSyncMode {
    fn default() -> Self {
        JournalSyncMode::Batched
    }
}

/// A single journaled write
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalEntry {
    /// Full-value write at a path
    Set { path: String, value: Value, ts: i64 },
    /// One-level merge at a path
    Update {
        path: String,
        fields: Map<String, Value>,
        ts: i64,
    },
    /// Subtree removal
    Remove { path: String, ts: i64 },
}

/// Append-only journal of committed writes
pub struct Journal {
    /// File handle for writing
    writer: BufWriter<File>,
    /// Path to journal file
    path: PathBuf,
    /// Number of entries written
    entry_count: u64,
    /// Bytes written since last sync
    bytes_since_sync: usize,
    /// Sync mode
    sync_mode: JournalSyncMode,
    /// Batch sync threshold (bytes)
    sync_threshold: usize,
}

impl Journal {
    /// Open or create a journal file
    pub fn open(path: impl AsRef<Path>, sync_mode: JournalSyncMode) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        // Count existing entries
        let entry_count = Self::count_entries(&path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            entry_count,
            bytes_since_sync: 0,
            sync_mode,
            sync_threshold: 64 * 1024, // 64KB default batch
        })
    }

    /// Count valid entries in an existing journal (for recovery)
    fn count_entries(path: &Path) -> StoreResult<u64> {
        if !path.exists() {
            return Ok(0);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut count = 0u64;

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Journal unreadable at entry {}: {}", count, e);
                    break;
                }
            };
            if line.is_empty() {
                continue;
            }
            match Self::parse_line(&line) {
                Ok(_) => count += 1,
                Err(e) => {
                    tracing::warn!("Journal corruption at entry {}: {}", count, e);
                    break;
                }
            }
        }

        Ok(count)
    }

    /// Append an entry to the journal
    pub fn append(&mut self, entry: &JournalEntry) -> StoreResult<()> {
        let json = serde_json::to_string(entry)?;
        let crc = crc32fast::hash(json.as_bytes());

        let line = format!("{:08x}\t{}\n", crc, json);
        self.writer.write_all(line.as_bytes())?;

        self.entry_count += 1;
        self.bytes_since_sync += line.len();

        // Sync based on mode
        self.maybe_sync()?;

        Ok(())
    }

    /// Conditionally sync based on mode and threshold
    fn maybe_sync(&mut self) -> StoreResult<()> {
        match self.sync_mode {
            JournalSyncMode::EveryWrite => {
                self.sync()?;
            }
            JournalSyncMode::Batched => {
                if self.bytes_since_sync >= self.sync_threshold {
                    self.sync()?;
                }
            }
            JournalSyncMode::None => {
                // Just flush the buffer, no fsync
                self.writer.flush()?;
            }
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> StoreResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.bytes_since_sync = 0;
        Ok(())
    }

    /// Read all valid entries for recovery
    ///
    /// Stops at the first corrupt line and returns everything before it.
    pub fn replay(&self) -> StoreResult<Vec<JournalEntry>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Journal replay stopped at entry {}: {}", entries.len(), e);
                    break;
                }
            };
            if line.is_empty() {
                continue;
            }
            match Self::parse_line(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!("Journal replay stopped at entry {}: {}", entries.len(), e);
                    break;
                }
            }
        }

        Ok(entries)
    }

    /// Parse and verify a single journal line
    fn parse_line(line: &str) -> StoreResult<JournalEntry> {
        let (crc_part, json_part) = line
            .split_once('\t')
            .ok_or_else(|| StoreError::Journal("missing crc separator".to_string()))?;

        let stored_crc = u32::from_str_radix(crc_part, 16)
            .map_err(|e| StoreError::Journal(format!("bad crc field: {}", e)))?;

        let computed_crc = crc32fast::hash(json_part.as_bytes());
        if stored_crc != computed_crc {
            return Err(StoreError::Corruption(format!(
                "CRC mismatch: stored={:08x}, computed={:08x}",
                stored_crc, computed_crc
            )));
        }

        let entry: JournalEntry = serde_json::from_str(json_part)?;
        Ok(entry)
    }

    /// Truncate the journal (after a successful snapshot)
    pub fn truncate(&mut self) -> StoreResult<()> {
        // Sync first to ensure all data is written
        self.sync()?;

        // Close current writer
        drop(std::mem::replace(
            &mut self.writer,
            BufWriter::new(File::open(&self.path)?),
        ));

        // Truncate the file
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;

        self.writer = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?,
        );

        drop(file); // Close truncate handle

        self.entry_count = 0;
        self.bytes_since_sync = 0;

        Ok(())
    }

    /// Get the number of entries in the journal
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Check if the journal has pending entries
    pub fn has_pending(&self) -> bool {
        self.entry_count > 0
    }

    /// Get the file size
    pub fn file_size(&self) -> StoreResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn set_entry(path: &str, value: Value, ts: i64) -> JournalEntry {
        JournalEntry::Set {
            path: path.to_string(),
            value,
            ts,
        }
    }

    #[test]
    fn test_append_and_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.journal");

        {
            let mut journal = Journal::open(&path, JournalSyncMode::EveryWrite).unwrap();
            journal
                .append(&set_entry("accounts/u1", json!({"username": "ada"}), 1))
                .unwrap();
            journal
                .append(&JournalEntry::Remove {
                    path: "accounts/u1".to_string(),
                    ts: 2,
                })
                .unwrap();
            assert_eq!(journal.entry_count(), 2);
        }

        let journal = Journal::open(&path, JournalSyncMode::EveryWrite).unwrap();
        assert_eq!(journal.entry_count(), 2);

        let entries = journal.replay().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], JournalEntry::Set { .. }));
        assert!(matches!(entries[1], JournalEntry::Remove { .. }));
    }

    #[test]
    fn test_corrupt_tail_tolerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.journal");

        {
            let mut journal = Journal::open(&path, JournalSyncMode::EveryWrite).unwrap();
            journal.append(&set_entry("a", json!(1), 1)).unwrap();
            journal.append(&set_entry("b", json!(2), 2)).unwrap();
        }

        // Simulate a torn write at the tail
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"deadbeef\t{\"op\":\"set\",\"pa").unwrap();
        }

        let journal = Journal::open(&path, JournalSyncMode::EveryWrite).unwrap();
        assert_eq!(journal.entry_count(), 2);

        let entries = journal.replay().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_crc_mismatch_detected() {
        let line = "00000000\t{\"op\":\"remove\",\"path\":\"a\",\"ts\":1}";
        assert!(matches!(
            Journal::parse_line(line),
            Err(StoreError::Corruption(_))
        ));
    }

    #[test]
    fn test_truncate_resets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.journal");

        let mut journal = Journal::open(&path, JournalSyncMode::EveryWrite).unwrap();
        journal.append(&set_entry("a", json!(1), 1)).unwrap();
        assert!(journal.has_pending());

        journal.truncate().unwrap();
        assert_eq!(journal.entry_count(), 0);
        assert_eq!(journal.file_size().unwrap(), 0);

        // Journal remains usable after truncation
        journal.append(&set_entry("b", json!(2), 2)).unwrap();
        assert_eq!(journal.replay().unwrap().len(), 1);
    }
}
