// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plain string enums share one textual form across the blob store, CSV
/// backups and the command line.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let norm = s.trim().to_lowercase().replace('-', "_");
                match norm.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Unknown {} '{}'", stringify!($name), s)),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    #[default]
    Cash,
    Bank,
    Credit,
    Savings,
    Investment,
}

text_enum!(AccountKind {
    Cash => "cash",
    Bank => "bank",
    Credit => "credit",
    Savings => "savings",
    Investment => "investment",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Income,
    #[default]
    Expense,
}

text_enum!(CategoryKind {
    Income => "income",
    Expense => "expense",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
    Transfer,
}

text_enum!(TransactionType {
    Income => "income",
    Expense => "expense",
    Transfer => "transfer",
});

/// Which side of a transfer a leg sits on. `Out` debits its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    In,
    Out,
}

text_enum!(TransferDirection {
    In => "in",
    Out => "out",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    #[default]
    BorrowIn,
    BorrowOut,
}

text_enum!(LoanType {
    BorrowIn => "borrow_in",
    BorrowOut => "borrow_out",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    /// Cached: `opening_balance` plus the signed effect of every transaction on this account.
    pub balance: Decimal,
    #[serde(default)]
    pub opening_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    /// Set only on transfer legs.
    #[serde(default)]
    pub transfer: Option<TransferDirection>,
}

impl Transaction {
    /// Contribution of this row to its account balance.
    pub fn signed_amount(&self) -> Decimal {
        match (self.kind, self.transfer) {
            (TransactionType::Income, _) => self.amount,
            (TransactionType::Expense, _) => -self.amount,
            (TransactionType::Transfer, Some(TransferDirection::In)) => self.amount,
            (TransactionType::Transfer, _) => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: LoanType,
    pub amount: Decimal,
    pub account_id: Uuid,
    pub member_id: Option<Uuid>,
    pub counterparty: String,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub settled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeAllocation {
    pub id: Uuid,
    pub account_id: Uuid,
    pub percentage: u8,
    pub updated_at: DateTime<Utc>,
}

/// Every collection at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub loans: Vec<Loan>,
    pub allocations: Vec<IncomeAllocation>,
    pub members: Vec<Member>,
}

impl BackupSnapshot {
    pub fn record_count(&self) -> usize {
        self.accounts.len()
            + self.transactions.len()
            + self.categories.len()
            + self.loans.len()
            + self.allocations.len()
            + self.members.len()
    }
}

/// A ledger row for unified, date-ordered display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum LedgerRecord {
    Transaction(Transaction),
    Loan(Loan),
}

impl LedgerRecord {
    pub fn id(&self) -> Uuid {
        match self {
            LedgerRecord::Transaction(t) => t.id,
            LedgerRecord::Loan(l) => l.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LedgerRecord::Transaction(t) => t.date,
            LedgerRecord::Loan(l) => l.date,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            LedgerRecord::Transaction(t) => t.amount,
            LedgerRecord::Loan(l) => l.amount,
        }
    }

    pub fn account_id(&self) -> Uuid {
        match self {
            LedgerRecord::Transaction(t) => t.account_id,
            LedgerRecord::Loan(l) => l.account_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub kind: TransactionType,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub transfer: Option<TransferDirection>,
}

impl NewTransaction {
    pub fn income(account_id: Uuid, amount: Decimal) -> Self {
        Self::plain(TransactionType::Income, account_id, amount)
    }

    pub fn expense(account_id: Uuid, amount: Decimal) -> Self {
        Self::plain(TransactionType::Expense, account_id, amount)
    }

    fn plain(kind: TransactionType, account_id: Uuid, amount: Decimal) -> Self {
        NewTransaction {
            amount,
            kind,
            account_id,
            category_id: None,
            member_id: None,
            date: Utc::now(),
            note: None,
            transfer: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: Decimal,
    pub member_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub kind: LoanType,
    pub amount: Decimal,
    pub account_id: Uuid,
    pub member_id: Option<Uuid>,
    pub counterparty: String,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}

/// Income to be split across accounts by the stored allocation weights.
#[derive(Debug, Clone)]
pub struct IncomeDistribution {
    pub amount: Decimal,
    pub category_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}
