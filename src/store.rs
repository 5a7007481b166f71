// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use rusqlite::Connection;

use crate::db;
use crate::error::{LedgerError, Result};

/// The six persisted collections and their stable keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Accounts,
    Transactions,
    Categories,
    Loans,
    Allocations,
    Members,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Accounts,
        Collection::Transactions,
        Collection::Categories,
        Collection::Loans,
        Collection::Allocations,
        Collection::Members,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Collection::Accounts => "accounts",
            Collection::Transactions => "transactions",
            Collection::Categories => "categories",
            Collection::Loans => "loans",
            Collection::Allocations => "allocations",
            Collection::Members => "members",
        }
    }
}

/// Key-value sink the ledger writes whole collections into.
pub trait BlobStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Writes every pair or none of them.
    fn save(&self, blobs: &[(&str, String)]) -> Result<()>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Result<Self> {
        db::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| LedgerError::persistence("database connection lock poisoned"))?;
        f(&mut guard)
    }
}

impl BlobStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| Ok(db::get_setting(conn, key)?))
    }

    fn save(&self, blobs: &[(&str, String)]) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for (key, value) in blobs {
                db::set_setting(&tx, key, value)?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

/// In-process store; `set_fail_writes` makes every later `save` fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.lock().ok().and_then(|m| m.get(key).cloned())
    }

    pub fn insert(&self, key: &str, value: impl Into<String>) {
        if let Ok(mut m) = self.blobs.lock() {
            m.insert(key.to_string(), value.into());
        }
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let map = self
            .blobs
            .lock()
            .map_err(|_| LedgerError::persistence("memory store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, blobs: &[(&str, String)]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::persistence("memory store is read-only"));
        }
        let mut map = self
            .blobs
            .lock()
            .map_err(|_| LedgerError::persistence("memory store lock poisoned"))?;
        for (key, value) in blobs {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}

impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, blobs: &[(&str, String)]) -> Result<()> {
        (**self).save(blobs)
    }
}
