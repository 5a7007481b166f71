// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::{Ledger, LoanFilter, TransactionFilter};
use crate::models::{LoanType, TransactionType};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoanSummary {
    pub borrowed_in: Decimal,
    pub borrowed_out: Decimal,
    pub outstanding_in: Decimal,
    pub outstanding_out: Decimal,
}

/// Income and expense totals; transfer legs move money without earning or spending it.
pub fn summary(ledger: &Ledger, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Summary {
    let mut out = Summary::default();
    for tx in ledger.transactions(&TransactionFilter::default().between(from, to)) {
        match tx.kind {
            TransactionType::Income => out.income += tx.amount,
            TransactionType::Expense => out.expense += tx.amount,
            TransactionType::Transfer => {}
        }
    }
    out.net = out.income - out.expense;
    out
}

/// Expense totals per category, largest first. Uncategorized spend is keyed by `None`.
pub fn spending_by_category(
    ledger: &Ledger,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Vec<(Option<Uuid>, Decimal)> {
    let filter = TransactionFilter::default()
        .kind(TransactionType::Expense)
        .between(from, to);
    let mut totals: HashMap<Option<Uuid>, Decimal> = HashMap::new();
    let mut seen: Vec<Option<Uuid>> = Vec::new();
    for tx in ledger.transactions(&filter) {
        if !totals.contains_key(&tx.category_id) {
            seen.push(tx.category_id);
        }
        *totals.entry(tx.category_id).or_default() += tx.amount;
    }
    let mut rows: Vec<(Option<Uuid>, Decimal)> = seen
        .into_iter()
        .map(|cid| (cid, totals.get(&cid).copied().unwrap_or_default()))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows
}

pub fn loan_summary(ledger: &Ledger) -> LoanSummary {
    let mut out = LoanSummary::default();
    for loan in ledger.loans(&LoanFilter::default()) {
        match loan.kind {
            LoanType::BorrowIn => {
                out.borrowed_in += loan.amount;
                if !loan.settled {
                    out.outstanding_in += loan.amount;
                }
            }
            LoanType::BorrowOut => {
                out.borrowed_out += loan.amount;
                if !loan.settled {
                    out.outstanding_out += loan.amount;
                }
            }
        }
    }
    out
}

pub fn net_worth(ledger: &Ledger) -> Decimal {
    ledger.accounts().iter().map(|a| a.balance).sum()
}

/// Net worth once open loans are repaid in both directions.
pub fn projected_savings(ledger: &Ledger) -> Decimal {
    let loans = loan_summary(ledger);
    net_worth(ledger) + loans.outstanding_out - loans.outstanding_in
}
