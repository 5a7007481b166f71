// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Flat CSV backup: a title banner, then one `#SECTION` line per collection
//! followed by its header row and data rows.
//!
//! Columns are looked up by header name. A column the file does not carry
//! comes back as the field's default; in particular the category section has
//! no parent column, so category parents do not survive a CSV round trip.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};

use crate::error::{LedgerError, Result};
use crate::models::{
    Account, BackupSnapshot, Category, IncomeAllocation, Loan, Member, Transaction,
};

pub const TITLE: &str = "FinanceTracker Backup";

const ACCOUNT_COLUMNS: &[&str] = &[
    "id",
    "name",
    "kind",
    "balance",
    "opening_balance",
    "created_at",
];
const CATEGORY_COLUMNS: &[&str] = &["id", "name", "kind", "icon"];
const MEMBER_COLUMNS: &[&str] = &["id", "name", "avatar", "created_at", "is_active"];
const TRANSACTION_COLUMNS: &[&str] = &[
    "id",
    "amount",
    "type",
    "account_id",
    "category_id",
    "member_id",
    "date",
    "note",
    "transfer",
];
const LOAN_COLUMNS: &[&str] = &[
    "id",
    "type",
    "amount",
    "account_id",
    "member_id",
    "counterparty",
    "date",
    "note",
    "settled",
];
const ALLOCATION_COLUMNS: &[&str] = &["id", "account_id", "percentage", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Accounts,
    Categories,
    Members,
    Transactions,
    Loans,
    Allocations,
}

impl Section {
    fn marker(&self) -> &'static str {
        match self {
            Section::Accounts => "#ACCOUNTS",
            Section::Categories => "#CATEGORIES",
            Section::Members => "#MEMBERS",
            Section::Transactions => "#TRANSACTIONS",
            Section::Loans => "#LOANS",
            Section::Allocations => "#ALLOCATIONS",
        }
    }

    fn from_marker(s: &str) -> Option<Self> {
        [
            Section::Accounts,
            Section::Categories,
            Section::Members,
            Section::Transactions,
            Section::Loans,
            Section::Allocations,
        ]
        .into_iter()
        .find(|sec| sec.marker().eq_ignore_ascii_case(s))
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(|x| x.to_string()).unwrap_or_default()
}

fn write_err(e: csv::Error) -> LedgerError {
    LedgerError::persistence(format!("CSV backup: {}", e))
}

fn write_section(
    wtr: &mut Writer<Vec<u8>>,
    section: Section,
    columns: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<()> {
    wtr.write_record([section.marker()]).map_err(write_err)?;
    wtr.write_record(columns).map_err(write_err)?;
    for row in rows {
        wtr.write_record(&row).map_err(write_err)?;
    }
    Ok(())
}

pub fn encode(snapshot: &BackupSnapshot, exported_at: DateTime<Utc>) -> Result<String> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    wtr.write_record([TITLE]).map_err(write_err)?;
    wtr.write_record(["Exported", timestamp(exported_at).as_str()])
        .map_err(write_err)?;

    write_section(
        &mut wtr,
        Section::Accounts,
        ACCOUNT_COLUMNS,
        snapshot.accounts.iter().map(|a| {
            vec![
                a.id.to_string(),
                a.name.clone(),
                a.kind.to_string(),
                a.balance.to_string(),
                a.opening_balance.to_string(),
                timestamp(a.created_at),
            ]
        }),
    )?;
    write_section(
        &mut wtr,
        Section::Categories,
        CATEGORY_COLUMNS,
        snapshot.categories.iter().map(|c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.kind.to_string(),
                opt(&c.icon),
            ]
        }),
    )?;
    write_section(
        &mut wtr,
        Section::Members,
        MEMBER_COLUMNS,
        snapshot.members.iter().map(|m| {
            vec![
                m.id.to_string(),
                m.name.clone(),
                opt(&m.avatar),
                timestamp(m.created_at),
                m.is_active.to_string(),
            ]
        }),
    )?;
    write_section(
        &mut wtr,
        Section::Transactions,
        TRANSACTION_COLUMNS,
        snapshot.transactions.iter().map(|t| {
            vec![
                t.id.to_string(),
                t.amount.to_string(),
                t.kind.to_string(),
                t.account_id.to_string(),
                opt(&t.category_id),
                opt(&t.member_id),
                timestamp(t.date),
                opt(&t.note),
                opt(&t.transfer),
            ]
        }),
    )?;
    write_section(
        &mut wtr,
        Section::Loans,
        LOAN_COLUMNS,
        snapshot.loans.iter().map(|l| {
            vec![
                l.id.to_string(),
                l.kind.to_string(),
                l.amount.to_string(),
                l.account_id.to_string(),
                opt(&l.member_id),
                l.counterparty.clone(),
                timestamp(l.date),
                opt(&l.note),
                l.settled.to_string(),
            ]
        }),
    )?;
    write_section(
        &mut wtr,
        Section::Allocations,
        ALLOCATION_COLUMNS,
        snapshot.allocations.iter().map(|a| {
            vec![
                a.id.to_string(),
                a.account_id.to_string(),
                a.percentage.to_string(),
                timestamp(a.updated_at),
            ]
        }),
    )?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| LedgerError::persistence(format!("CSV backup: {}", e)))?;
    String::from_utf8(bytes).map_err(LedgerError::persistence)
}

/// Column name to field index, taken from a section's header row.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_header(rec: &StringRecord) -> Self {
        Columns(
            rec.iter()
                .enumerate()
                .map(|(i, name)| (name.trim().to_lowercase(), i))
                .collect(),
        )
    }
}

struct Row<'a> {
    cols: &'a Columns,
    rec: &'a StringRecord,
    section: Section,
}

impl Row<'_> {
    fn cell(&self, name: &str) -> Option<&str> {
        self.cols.0.get(name).and_then(|&i| self.rec.get(i))
    }

    fn fail(&self, name: &str, msg: impl Display) -> LedgerError {
        let line = self.rec.position().map(|p| p.line()).unwrap_or_default();
        LedgerError::decode(format!(
            "{} line {}, column '{}': {}",
            self.section.marker(),
            line,
            name,
            msg
        ))
    }

    /// Must be present and parse.
    fn required<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.cell(name) {
            None => Err(self.fail(name, "missing column")),
            Some(raw) if raw.trim().is_empty() => Err(self.fail(name, "empty value")),
            Some(raw) => raw.trim().parse().map_err(|e| self.fail(name, e)),
        }
    }

    /// Default when the column is absent; otherwise must parse.
    fn value<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr + Default,
        T::Err: Display,
    {
        match self.cell(name) {
            None => Ok(T::default()),
            Some(raw) => raw.trim().parse().map_err(|e| self.fail(name, e)),
        }
    }

    /// `None` when the column is absent or the cell is empty.
    fn optional<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.cell(name).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|e| self.fail(name, e)),
        }
    }

    fn text(&self, name: &str) -> String {
        self.cell(name).unwrap_or_default().to_string()
    }

    fn optional_text(&self, name: &str) -> Option<String> {
        self.cell(name)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }
}

fn push_row(snapshot: &mut BackupSnapshot, row: &Row<'_>) -> Result<()> {
    match row.section {
        Section::Accounts => snapshot.accounts.push(Account {
            id: row.required("id")?,
            name: row.text("name"),
            kind: row.value("kind")?,
            balance: row.value("balance")?,
            opening_balance: row.value("opening_balance")?,
            created_at: row.value("created_at")?,
        }),
        Section::Categories => snapshot.categories.push(Category {
            id: row.required("id")?,
            name: row.text("name"),
            kind: row.value("kind")?,
            icon: row.optional_text("icon"),
            parent_id: row.optional("parent_id")?,
        }),
        Section::Members => snapshot.members.push(Member {
            id: row.required("id")?,
            name: row.text("name"),
            avatar: row.optional_text("avatar"),
            created_at: row.value("created_at")?,
            is_active: row.value("is_active")?,
        }),
        Section::Transactions => snapshot.transactions.push(Transaction {
            id: row.required("id")?,
            amount: row.required("amount")?,
            kind: row.value("type")?,
            account_id: row.required("account_id")?,
            category_id: row.optional("category_id")?,
            member_id: row.optional("member_id")?,
            date: row.value("date")?,
            note: row.optional_text("note"),
            transfer: row.optional("transfer")?,
        }),
        Section::Loans => snapshot.loans.push(Loan {
            id: row.required("id")?,
            kind: row.value("type")?,
            amount: row.required("amount")?,
            account_id: row.required("account_id")?,
            member_id: row.optional("member_id")?,
            counterparty: row.text("counterparty"),
            date: row.value("date")?,
            note: row.optional_text("note"),
            settled: row.value("settled")?,
        }),
        Section::Allocations => snapshot.allocations.push(IncomeAllocation {
            id: row.required("id")?,
            account_id: row.required("account_id")?,
            percentage: row.value("percentage")?,
            updated_at: row.value("updated_at")?,
        }),
    }
    Ok(())
}

enum State {
    /// Title and timestamp lines before the first section.
    Preamble,
    Header(Section),
    Rows(Section, Columns),
}

/// Parses a whole CSV backup or fails; there is no partial result.
pub fn decode(text: &str) -> Result<BackupSnapshot> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut snapshot = BackupSnapshot::default();
    let mut state = State::Preamble;
    let mut sections = 0usize;

    for result in rdr.records() {
        let rec = result.map_err(|e| LedgerError::decode(format!("CSV backup: {}", e)))?;
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if rec.len() == 1 {
            if let Some(section) = Section::from_marker(rec[0].trim()) {
                state = State::Header(section);
                sections += 1;
                continue;
            }
        }
        state = match state {
            State::Preamble => State::Preamble,
            State::Header(section) => State::Rows(section, Columns::from_header(&rec)),
            State::Rows(section, cols) => {
                push_row(
                    &mut snapshot,
                    &Row {
                        cols: &cols,
                        rec: &rec,
                        section,
                    },
                )?;
                State::Rows(section, cols)
            }
        };
    }

    if sections == 0 {
        return Err(LedgerError::decode("CSV backup: no sections found"));
    }
    Ok(snapshot)
}
