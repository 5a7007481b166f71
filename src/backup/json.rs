// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::models::{
    Account, BackupSnapshot, Category, IncomeAllocation, Loan, Member, Transaction,
};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct Document<'a> {
    version: u32,
    exported_at: DateTime<Utc>,
    accounts: &'a [Account],
    transactions: &'a [Transaction],
    categories: &'a [Category],
    loans: &'a [Loan],
    allocations: &'a [IncomeAllocation],
    members: &'a [Member],
}

#[derive(Deserialize)]
struct OwnedDocument {
    version: u32,
    #[serde(rename = "exported_at")]
    _exported_at: Option<DateTime<Utc>>,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    loans: Vec<Loan>,
    allocations: Vec<IncomeAllocation>,
    members: Vec<Member>,
}

pub fn encode(snapshot: &BackupSnapshot, exported_at: DateTime<Utc>) -> Result<String> {
    let doc = Document {
        version: FORMAT_VERSION,
        exported_at,
        accounts: &snapshot.accounts,
        transactions: &snapshot.transactions,
        categories: &snapshot.categories,
        loans: &snapshot.loans,
        allocations: &snapshot.allocations,
        members: &snapshot.members,
    };
    serde_json::to_string_pretty(&doc).map_err(LedgerError::persistence)
}

/// Parses a whole document or fails; there is no partial result.
pub fn decode(text: &str) -> Result<BackupSnapshot> {
    let doc: OwnedDocument = serde_json::from_str(text)
        .map_err(|e| LedgerError::decode(format!("JSON backup: {}", e)))?;
    if doc.version != FORMAT_VERSION {
        return Err(LedgerError::decode(format!(
            "Unsupported backup version {}",
            doc.version
        )));
    }
    Ok(BackupSnapshot {
        accounts: doc.accounts,
        transactions: doc.transactions,
        categories: doc.categories,
        loans: doc.loans,
        allocations: doc.allocations,
        members: doc.members,
    })
}
