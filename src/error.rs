// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The entity collection a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Account,
    Category,
    Member,
    Transaction,
    Loan,
    Allocation,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Account => "Account",
            EntityKind::Category => "Category",
            EntityKind::Member => "Member",
            EntityKind::Transaction => "Transaction",
            EntityKind::Loan => "Loan",
            EntityKind::Allocation => "Allocation",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Decode failed: {0}")]
    DecodeFailed(String),
}

impl LedgerError {
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        LedgerError::NotFound { kind, id }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::ValidationFailed(msg.into())
    }

    pub fn decode(msg: impl fmt::Display) -> Self {
        LedgerError::DecodeFailed(msg.to_string())
    }

    pub fn persistence(msg: impl fmt::Display) -> Self {
        LedgerError::PersistenceFailed(msg.to_string())
    }

    /// Returns the missing entity kind when this is a `NotFound`.
    pub fn missing_kind(&self) -> Option<EntityKind> {
        match self {
            LedgerError::NotFound { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::PersistenceFailed(err.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::PersistenceFailed(err.to_string())
    }
}
