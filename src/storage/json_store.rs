//! JSON file record store
//!
//! Records are appended to a JSON-lines log, one object per line, each line
//! written and synced on its own so that an interrupted crawl leaves every
//! finished record readable. The snapshot is a single JSON array rewritten
//! through a temporary file and a rename.

use crate::config::OutputConfig;
use crate::record::Record;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Record store backed by a JSON-lines log and a JSON snapshot
#[derive(Debug)]
pub struct JsonFileStore {
    records_path: PathBuf,
    snapshot_path: PathBuf,
    log: File,
    records: Vec<Record>,
    seen: HashSet<String>,
}

impl JsonFileStore {
    /// Opens the store described by the output configuration
    pub fn open(output: &OutputConfig, fresh: bool) -> StorageResult<Self> {
        Self::open_paths(&output.records_path, &output.snapshot_path, fresh)
    }

    /// Opens a store on explicit paths
    ///
    /// With `fresh` the log is truncated. Otherwise its records are loaded so
    /// that a resumed crawl neither duplicates them nor drops them from the
    /// next snapshot.
    pub fn open_paths(
        records_path: impl AsRef<Path>,
        snapshot_path: impl AsRef<Path>,
        fresh: bool,
    ) -> StorageResult<Self> {
        let records_path = records_path.as_ref().to_path_buf();
        let snapshot_path = snapshot_path.as_ref().to_path_buf();

        for path in [&records_path, &snapshot_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(StorageError::io(parent.display().to_string()))?;
            }
        }

        let log_path = records_path.display().to_string();
        let mut log = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&records_path)
            .map_err(StorageError::io(log_path.clone()))?;

        let mut store = Self {
            records_path,
            snapshot_path,
            log: log.try_clone().map_err(StorageError::io(log_path.clone()))?,
            records: Vec::new(),
            seen: HashSet::new(),
        };

        if fresh {
            store.log.set_len(0).map_err(StorageError::io(log_path))?;
        } else {
            store.load_existing(&mut log)?;
        }

        Ok(store)
    }

    /// Records held in memory, in append order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    fn load_existing(&mut self, log: &mut File) -> StorageResult<()> {
        let log_path = self.records_path.display().to_string();

        let mut content = String::new();
        log.seek(SeekFrom::Start(0))
            .map_err(StorageError::io(log_path.clone()))?;
        log.read_to_string(&mut content)
            .map_err(StorageError::io(log_path.clone()))?;

        let mut skipped = 0;
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(line) {
                Ok(record) => {
                    if self.seen.insert(record.url().to_string()) {
                        self.records.push(record);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable line {} of {}: {}", number + 1, log_path, e);
                    skipped += 1;
                }
            }
        }

        // A torn last line must not swallow the next append
        if !content.is_empty() && !content.ends_with('\n') {
            self.log
                .write_all(b"\n")
                .map_err(StorageError::io(log_path.clone()))?;
        }

        tracing::info!(
            "Resuming with {} records from {} ({} unreadable lines skipped)",
            self.records.len(),
            log_path,
            skipped
        );
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn append_record(&mut self, record: Record) -> StorageResult<bool> {
        if self.seen.contains(record.url()) {
            tracing::debug!("Already stored: {}", record.url());
            return Ok(false);
        }

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let log_path = self.records_path.display().to_string();
        self.log
            .write_all(line.as_bytes())
            .and_then(|()| self.log.sync_data())
            .map_err(StorageError::io(log_path))?;

        self.seen.insert(record.url().to_string());
        self.records.push(record);
        Ok(true)
    }

    fn snapshot(&mut self) -> StorageResult<()> {
        let mut tmp_path = self.snapshot_path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        let tmp_display = tmp_path.display().to_string();

        let file = File::create(&tmp_path).map_err(StorageError::io(tmp_display.clone()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.records)?;
        writer
            .flush()
            .map_err(StorageError::io(tmp_display.clone()))?;

        fs::rename(&tmp_path, &self.snapshot_path)
            .map_err(StorageError::io(self.snapshot_path.display().to_string()))?;

        tracing::debug!(
            "Snapshot of {} records written to {}",
            self.records.len(),
            self.snapshot_path.display()
        );
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
