// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use crate::backup::{self, BackupFormat};
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// A ledger shared across threads.
///
/// Queries hold the read lock and may overlap. Mutations, restores and
/// backup exports are serialized against each other by the same lock, so no
/// reader ever sees half of a write.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T> {
        let guard = self
            .inner
            .read()
            .map_err(|_| LedgerError::persistence("ledger lock poisoned"))?;
        Ok(f(&guard))
    }

    pub fn write<T>(&self, f: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| LedgerError::persistence("ledger lock poisoned"))?;
        f(&mut guard)
    }

    /// Exports on a worker thread; the handle yields the written path.
    pub fn export_in_background(
        &self,
        dir: PathBuf,
        format: BackupFormat,
    ) -> JoinHandle<Result<PathBuf>> {
        let shared = self.clone();
        thread::spawn(move || shared.read(|ledger| backup::export_snapshot(ledger, &dir, format))?)
    }

    /// Imports on a worker thread; the handle yields the restored record count.
    pub fn import_in_background(&self, path: PathBuf) -> JoinHandle<Result<usize>> {
        let shared = self.clone();
        thread::spawn(move || shared.write(|ledger| backup::import_snapshot(ledger, &path)))
    }
}
