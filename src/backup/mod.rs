// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Manual backup and restore of the whole ledger.
//!
//! Files are named `FinanceTracker_backup_<yyyyMMdd_HHmmss>.<json|csv>` so a
//! plain descending sort by name puts the newest backup first.

pub mod json;
pub mod tabular;

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::NamedTempFile;

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::models::BackupSnapshot;

pub const BACKUP_PREFIX: &str = "FinanceTracker_backup_";

static BACKUP_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^FinanceTracker_backup_\d{8}_\d{6}\.(?i:json|csv)$")
        .expect("backup file pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupFormat {
    #[default]
    Json,
    Csv,
}

impl BackupFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            BackupFormat::Json => "json",
            BackupFormat::Csv => "csv",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse().map_err(LedgerError::DecodeFailed)
    }
}

impl fmt::Display for BackupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for BackupFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(BackupFormat::Json),
            "csv" => Ok(BackupFormat::Csv),
            other => Err(format!("Unsupported backup format '{}' (use json|csv)", other)),
        }
    }
}

pub fn backup_file_name(at: DateTime<Utc>, format: BackupFormat) -> String {
    format!(
        "{}{}.{}",
        BACKUP_PREFIX,
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub fn is_backup_file_name(name: &str) -> bool {
    BACKUP_NAME.is_match(name)
}

pub fn encode(
    snapshot: &BackupSnapshot,
    format: BackupFormat,
    exported_at: DateTime<Utc>,
) -> Result<String> {
    match format {
        BackupFormat::Json => json::encode(snapshot, exported_at),
        BackupFormat::Csv => tabular::encode(snapshot, exported_at),
    }
}

pub fn decode(text: &str, format: BackupFormat) -> Result<BackupSnapshot> {
    match format {
        BackupFormat::Json => json::decode(text),
        BackupFormat::Csv => tabular::decode(text),
    }
}

/// Writes through a temp file in `dir` that is renamed into place, so a
/// failed write never leaves a partial backup behind.
pub fn write_atomically(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let target = dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(&target)
        .map_err(|e| LedgerError::persistence(format!("{}: {}", target.display(), e.error)))?;
    Ok(target)
}

/// Encodes the current ledger into a new timestamped file in `dir`.
pub fn export_snapshot(ledger: &Ledger, dir: &Path, format: BackupFormat) -> Result<PathBuf> {
    let exported_at = Utc::now();
    let contents = encode(ledger.state(), format, exported_at)?;
    let path = write_atomically(dir, &backup_file_name(exported_at, format), &contents)?;
    info!(
        "Exported {} records to {}",
        ledger.state().record_count(),
        path.display()
    );
    Ok(path)
}

/// Reads and fully decodes a backup file, picking the codec by extension.
pub fn read_snapshot(path: &Path) -> Result<BackupSnapshot> {
    let format = BackupFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    decode(&text, format)
}

/// Decodes `path` and replaces the ledger with it. Nothing changes unless the
/// whole file decodes and the restored state is persisted.
pub fn import_snapshot(ledger: &mut Ledger, path: &Path) -> Result<usize> {
    let snapshot = read_snapshot(path)?;
    let count = snapshot.record_count();
    ledger.restore(snapshot)?;
    info!("Imported {} records from {}", count, path.display());
    Ok(count)
}

/// Backup files in `dir`, newest first.
pub fn list_backups(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(is_backup_file_name) {
            found.push(entry.path());
        }
    }
    found.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(found)
}
