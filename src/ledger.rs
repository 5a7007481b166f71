// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The authoritative in-process store.
//!
//! Every mutation runs against the in-memory collections first, then the
//! touched collections are written to the [`BlobStore`] in one call. If any
//! step fails the collections are put back exactly as they were, so memory,
//! storage and cached account balances never diverge. One [`LedgerEvent`] is
//! emitted after each successful write.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::allocation;
use crate::error::{EntityKind, LedgerError, Result};
use crate::events::{EventSink, LedgerEvent, NullSink};
use crate::models::{
    Account, BackupSnapshot, Category, CategoryKind, IncomeAllocation, IncomeDistribution,
    LedgerRecord, Loan, LoanType, Member, NewAccount, NewCategory, NewLoan, NewMember,
    NewTransaction, NewTransfer, Transaction, TransactionType, TransferDirection,
};
use crate::store::{BlobStore, Collection, MemoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Insertion,
    NewestFirst,
    OldestFirst,
}

/// Date bounds are half-open: `from` inclusive, `to` exclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account_id: Option<Uuid>,
    pub category_kind: Option<CategoryKind>,
    pub member_id: Option<Uuid>,
    pub kind: Option<TransactionType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub order: SortOrder,
}

impl TransactionFilter {
    pub fn account(mut self, id: Uuid) -> Self {
        self.account_id = Some(id);
        self
    }

    pub fn member(mut self, id: Uuid) -> Self {
        self.member_id = Some(id);
        self
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category_kind(mut self, kind: CategoryKind) -> Self {
        self.category_kind = Some(kind);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    fn matches(&self, tx: &Transaction, categories: &[Category]) -> bool {
        if self.account_id.is_some_and(|id| tx.account_id != id) {
            return false;
        }
        if self.member_id.is_some() && tx.member_id != self.member_id {
            return false;
        }
        if self.kind.is_some_and(|k| tx.kind != k) {
            return false;
        }
        if let Some(kind) = self.category_kind {
            let found = tx
                .category_id
                .and_then(|cid| categories.iter().find(|c| c.id == cid));
            if found.is_none_or(|c| c.kind != kind) {
                return false;
            }
        }
        in_range(tx.date, self.from, self.to)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    pub account_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub kind: Option<LoanType>,
    pub settled: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub order: SortOrder,
}

impl LoanFilter {
    fn matches(&self, loan: &Loan) -> bool {
        if self.account_id.is_some_and(|id| loan.account_id != id) {
            return false;
        }
        if self.member_id.is_some() && loan.member_id != self.member_id {
            return false;
        }
        if self.kind.is_some_and(|k| loan.kind != k) {
            return false;
        }
        if self.settled.is_some_and(|s| loan.settled != s) {
            return false;
        }
        in_range(loan.date, self.from, self.to)
    }
}

fn in_range(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.is_none_or(|f| at >= f) && to.is_none_or(|t| at < t)
}

fn sort_by_date<T>(rows: &mut [T], order: SortOrder, date: impl Fn(&T) -> DateTime<Utc>) {
    match order {
        SortOrder::Insertion => {}
        SortOrder::OldestFirst => rows.sort_by_key(|r| date(r)),
        SortOrder::NewestFirst => rows.sort_by_key(|r| std::cmp::Reverse(date(r))),
    }
}

pub struct Ledger {
    state: BackupSnapshot,
    store: Box<dyn BlobStore>,
    events: Box<dyn EventSink>,
}

impl Ledger {
    /// Loads all six collections from `store`. Missing keys are empty collections.
    pub fn open(store: impl BlobStore + 'static, events: impl EventSink + 'static) -> Result<Self> {
        let mut state = BackupSnapshot::default();
        for collection in Collection::ALL {
            let Some(blob) = store.load(collection.key())? else {
                continue;
            };
            let key = collection.key();
            let bad = |e: serde_json::Error| LedgerError::decode(format!("{}: {}", key, e));
            match collection {
                Collection::Accounts => state.accounts = serde_json::from_str(&blob).map_err(bad)?,
                Collection::Transactions => {
                    state.transactions = serde_json::from_str(&blob).map_err(bad)?
                }
                Collection::Categories => {
                    state.categories = serde_json::from_str(&blob).map_err(bad)?
                }
                Collection::Loans => state.loans = serde_json::from_str(&blob).map_err(bad)?,
                Collection::Allocations => {
                    state.allocations = serde_json::from_str(&blob).map_err(bad)?
                }
                Collection::Members => state.members = serde_json::from_str(&blob).map_err(bad)?,
            }
        }
        debug!("Opened ledger with {} records", state.record_count());
        Ok(Self {
            state,
            store: Box::new(store),
            events: Box::new(events),
        })
    }

    /// Empty ledger over a [`MemoryStore`] that discards events.
    pub fn in_memory() -> Self {
        Self {
            state: BackupSnapshot::default(),
            store: Box::new(MemoryStore::new()),
            events: Box::new(NullSink),
        }
    }

    pub fn snapshot(&self) -> BackupSnapshot {
        self.state.clone()
    }

    pub fn state(&self) -> &BackupSnapshot {
        &self.state
    }

    /// Reads a non-collection key, e.g. a user preference.
    pub fn setting(&self, key: &str) -> Result<Option<String>> {
        self.store.load(key)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        if Collection::ALL.iter().any(|c| c.key() == key) {
            return Err(LedgerError::invalid(format!("'{}' is a reserved key", key)));
        }
        self.store.save(&[(key, value.to_string())])
    }

    fn persist(&self, touched: &[Collection]) -> Result<()> {
        let mut blobs = Vec::with_capacity(touched.len());
        for collection in touched {
            let encoded = match collection {
                Collection::Accounts => serde_json::to_string(&self.state.accounts),
                Collection::Transactions => serde_json::to_string(&self.state.transactions),
                Collection::Categories => serde_json::to_string(&self.state.categories),
                Collection::Loans => serde_json::to_string(&self.state.loans),
                Collection::Allocations => serde_json::to_string(&self.state.allocations),
                Collection::Members => serde_json::to_string(&self.state.members),
            }
            .map_err(LedgerError::persistence)?;
            blobs.push((collection.key(), encoded));
        }
        self.store.save(&blobs)
    }

    /// Applies `mutate`, persists `touched`, and emits `event`; restores the
    /// previous state if either step fails.
    fn commit<T>(
        &mut self,
        touched: &[Collection],
        event: LedgerEvent,
        mutate: impl FnOnce(&mut BackupSnapshot) -> Result<T>,
    ) -> Result<T> {
        let before = self.state.clone();
        let out = match mutate(&mut self.state) {
            Ok(out) => out,
            Err(e) => {
                self.state = before;
                return Err(e);
            }
        };
        if let Err(e) = self.persist(touched) {
            warn!("Rolling back {:?}: {}", event, e);
            self.state = before;
            return Err(e);
        }
        self.events.emit(event);
        Ok(out)
    }

    // ---- accounts ----

    pub fn add_account(&mut self, input: NewAccount) -> Result<Account> {
        let name = required_name(&input.name, "Account")?;
        let account = Account {
            id: Uuid::new_v4(),
            name,
            kind: input.kind,
            balance: input.opening_balance,
            opening_balance: input.opening_balance,
            created_at: Utc::now(),
        };
        let created = self.commit(&[Collection::Accounts], LedgerEvent::AccountsChanged, |s| {
            unique_name(s.accounts.iter().map(|a| &a.name), &account.name, "Account")?;
            s.accounts.push(account.clone());
            Ok(account)
        })?;
        debug!("Added account {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Name, kind and opening balance are editable; the cached balance follows
    /// any change of opening balance and is otherwise left alone.
    pub fn update_account(&mut self, updated: Account) -> Result<Account> {
        let name = required_name(&updated.name, "Account")?;
        let out = self.commit(&[Collection::Accounts], LedgerEvent::AccountsChanged, |s| {
            let others = s.accounts.iter().filter(|a| a.id != updated.id);
            unique_name(others.map(|a| &a.name), &name, "Account")?;
            let current = s
                .accounts
                .iter_mut()
                .find(|a| a.id == updated.id)
                .ok_or_else(|| LedgerError::not_found(EntityKind::Account, updated.id))?;
            let shift = updated
                .opening_balance
                .checked_sub(current.opening_balance)
                .ok_or_else(|| LedgerError::invalid("Opening balance change is out of range"))?;
            current.balance = checked_balance(current, shift)?;
            current.opening_balance = updated.opening_balance;
            current.name = name;
            current.kind = updated.kind;
            Ok(current.clone())
        })?;
        debug!("Updated account {}", out.id);
        Ok(out)
    }

    /// Transactions and loans that reference the account are left in place;
    /// its income allocation row goes with it.
    pub fn delete_account(&mut self, id: Uuid) -> Result<Account> {
        let removed = self.commit(
            &[Collection::Accounts, Collection::Allocations],
            LedgerEvent::AccountsChanged,
            |s| {
                let idx = position(&s.accounts, |a| a.id == id, EntityKind::Account, id)?;
                s.allocations.retain(|a| a.account_id != id);
                Ok(s.accounts.remove(idx))
            },
        )?;
        debug!("Deleted account {}", id);
        Ok(removed)
    }

    // ---- categories ----

    pub fn add_category(&mut self, input: NewCategory) -> Result<Category> {
        let name = required_name(&input.name, "Category")?;
        let category = Category {
            id: Uuid::new_v4(),
            name,
            kind: input.kind,
            icon: clean_text(input.icon),
            parent_id: input.parent_id,
        };
        let created = self.commit(
            &[Collection::Categories],
            LedgerEvent::CategoriesChanged,
            |s| {
                unique_name(s.categories.iter().map(|c| &c.name), &category.name, "Category")?;
                s.categories.push(category.clone());
                Ok(category)
            },
        )?;
        debug!("Added category {} ({})", created.id, created.name);
        Ok(created)
    }

    pub fn update_category(&mut self, updated: Category) -> Result<Category> {
        let name = required_name(&updated.name, "Category")?;
        if updated.parent_id == Some(updated.id) {
            return Err(LedgerError::invalid("A category cannot be its own parent"));
        }
        let out = self.commit(
            &[Collection::Categories],
            LedgerEvent::CategoriesChanged,
            |s| {
                let others = s.categories.iter().filter(|c| c.id != updated.id);
                unique_name(others.map(|c| &c.name), &name, "Category")?;
                let current = s
                    .categories
                    .iter_mut()
                    .find(|c| c.id == updated.id)
                    .ok_or_else(|| LedgerError::not_found(EntityKind::Category, updated.id))?;
                *current = Category {
                    name,
                    icon: clean_text(updated.icon),
                    ..updated
                };
                Ok(current.clone())
            },
        )?;
        debug!("Updated category {}", out.id);
        Ok(out)
    }

    pub fn delete_category(&mut self, id: Uuid) -> Result<Category> {
        let removed = self.commit(
            &[Collection::Categories],
            LedgerEvent::CategoriesChanged,
            |s| {
                let idx = position(&s.categories, |c| c.id == id, EntityKind::Category, id)?;
                Ok(s.categories.remove(idx))
            },
        )?;
        debug!("Deleted category {}", id);
        Ok(removed)
    }

    // ---- members ----

    pub fn add_member(&mut self, input: NewMember) -> Result<Member> {
        let name = required_name(&input.name, "Member")?;
        let member = Member {
            id: Uuid::new_v4(),
            name,
            avatar: clean_text(input.avatar),
            created_at: Utc::now(),
            is_active: true,
        };
        let created = self.commit(&[Collection::Members], LedgerEvent::MembersChanged, |s| {
            unique_name(s.members.iter().map(|m| &m.name), &member.name, "Member")?;
            s.members.push(member.clone());
            Ok(member)
        })?;
        debug!("Added member {} ({})", created.id, created.name);
        Ok(created)
    }

    pub fn update_member(&mut self, updated: Member) -> Result<Member> {
        let name = required_name(&updated.name, "Member")?;
        self.commit(&[Collection::Members], LedgerEvent::MembersChanged, |s| {
            let others = s.members.iter().filter(|m| m.id != updated.id);
            unique_name(others.map(|m| &m.name), &name, "Member")?;
            let current = s
                .members
                .iter_mut()
                .find(|m| m.id == updated.id)
                .ok_or_else(|| LedgerError::not_found(EntityKind::Member, updated.id))?;
            current.name = name;
            current.avatar = clean_text(updated.avatar);
            current.is_active = updated.is_active;
            Ok(current.clone())
        })
    }

    pub fn toggle_member_active(&mut self, id: Uuid) -> Result<Member> {
        self.commit(&[Collection::Members], LedgerEvent::MembersChanged, |s| {
            let member = s
                .members
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| LedgerError::not_found(EntityKind::Member, id))?;
            member.is_active = !member.is_active;
            Ok(member.clone())
        })
    }

    pub fn delete_member(&mut self, id: Uuid) -> Result<Member> {
        self.commit(&[Collection::Members], LedgerEvent::MembersChanged, |s| {
            let idx = position(&s.members, |m| m.id == id, EntityKind::Member, id)?;
            Ok(s.members.remove(idx))
        })
    }

    // ---- transactions ----

    pub fn add_transaction(&mut self, input: NewTransaction) -> Result<Transaction> {
        let tx = Transaction {
            id: Uuid::new_v4(),
            amount: input.amount,
            kind: input.kind,
            account_id: input.account_id,
            category_id: input.category_id,
            member_id: input.member_id,
            date: input.date,
            note: clean_text(input.note),
            transfer: input.transfer,
        };
        let created = self.commit(
            &[Collection::Accounts, Collection::Transactions],
            LedgerEvent::TransactionsChanged,
            |s| {
                validate_transaction(s, &tx)?;
                apply_delta(&mut s.accounts, tx.account_id, tx.signed_amount())?;
                s.transactions.push(tx.clone());
                Ok(tx)
            },
        )?;
        debug!(
            "Added {} {} on account {}",
            created.kind, created.amount, created.account_id
        );
        Ok(created)
    }

    /// Reverses the stored row's effect on its account, applies the new row's
    /// effect on its (possibly different) account, then replaces the row.
    pub fn update_transaction(&mut self, updated: Transaction) -> Result<Transaction> {
        let updated = Transaction {
            note: clean_text(updated.note),
            ..updated
        };
        let out = self.commit(
            &[Collection::Accounts, Collection::Transactions],
            LedgerEvent::TransactionsChanged,
            |s| {
                let idx = position(
                    &s.transactions,
                    |t| t.id == updated.id,
                    EntityKind::Transaction,
                    updated.id,
                )?;
                validate_transaction(s, &updated)?;
                let old = s.transactions[idx].clone();
                reverse_delta(&mut s.accounts, &old)?;
                apply_delta(&mut s.accounts, updated.account_id, updated.signed_amount())?;
                s.transactions[idx] = updated.clone();
                Ok(updated)
            },
        )?;
        debug!("Updated transaction {}", out.id);
        Ok(out)
    }

    pub fn delete_transaction(&mut self, id: Uuid) -> Result<Transaction> {
        let removed = self.commit(
            &[Collection::Accounts, Collection::Transactions],
            LedgerEvent::TransactionsChanged,
            |s| {
                let idx = position(&s.transactions, |t| t.id == id, EntityKind::Transaction, id)?;
                let old = s.transactions.remove(idx);
                reverse_delta(&mut s.accounts, &old)?;
                Ok(old)
            },
        )?;
        debug!("Deleted transaction {}", id);
        Ok(removed)
    }

    /// Records a transfer as two independent legs, written together.
    pub fn transfer(&mut self, input: NewTransfer) -> Result<(Transaction, Transaction)> {
        if input.from_account == input.to_account {
            return Err(LedgerError::invalid(
                "Transfer source and destination must differ",
            ));
        }
        let leg = |account_id: Uuid, direction: TransferDirection| Transaction {
            id: Uuid::new_v4(),
            amount: input.amount,
            kind: TransactionType::Transfer,
            account_id,
            category_id: None,
            member_id: input.member_id,
            date: input.date,
            note: clean_text(input.note.clone()),
            transfer: Some(direction),
        };
        let out = leg(input.from_account, TransferDirection::Out);
        let inn = leg(input.to_account, TransferDirection::In);
        self.commit(
            &[Collection::Accounts, Collection::Transactions],
            LedgerEvent::TransactionsChanged,
            |s| {
                for tx in [&out, &inn] {
                    validate_transaction(s, tx)?;
                    apply_delta(&mut s.accounts, tx.account_id, tx.signed_amount())?;
                    s.transactions.push(tx.clone());
                }
                Ok((out, inn))
            },
        )
    }

    /// Splits income by the stored allocation weights and records one income
    /// transaction per share, all in one write.
    pub fn allocate_income(&mut self, input: IncomeDistribution) -> Result<Vec<Transaction>> {
        validate_amount(input.amount)?;
        let shares = allocation::allocate(input.amount, &self.state.allocations)?;
        if shares.is_empty() {
            return Err(LedgerError::invalid(
                "No allocation weights produce a nonzero share",
            ));
        }
        let rows: Vec<Transaction> = shares
            .into_iter()
            .map(|(account_id, amount)| Transaction {
                id: Uuid::new_v4(),
                amount,
                kind: TransactionType::Income,
                account_id,
                category_id: input.category_id,
                member_id: input.member_id,
                date: input.date,
                note: clean_text(input.note.clone()),
                transfer: None,
            })
            .collect();
        let created = self.commit(
            &[Collection::Accounts, Collection::Transactions],
            LedgerEvent::TransactionsChanged,
            |s| {
                for tx in &rows {
                    validate_transaction(s, tx)?;
                    apply_delta(&mut s.accounts, tx.account_id, tx.signed_amount())?;
                    s.transactions.push(tx.clone());
                }
                Ok(rows)
            },
        )?;
        debug!(
            "Allocated {} across {} accounts",
            input.amount,
            created.len()
        );
        Ok(created)
    }

    /// Rebuilds every cached balance from its opening balance and the log.
    pub fn recalculate_balances(&mut self) -> Result<()> {
        self.commit(&[Collection::Accounts], LedgerEvent::AccountsChanged, |s| {
            for account in s.accounts.iter_mut() {
                let id = account.id;
                account.balance = account.opening_balance;
                for tx in s.transactions.iter().filter(|t| t.account_id == id) {
                    account.balance = checked_balance(account, tx.signed_amount())?;
                }
            }
            Ok(())
        })
    }

    // ---- loans ----

    pub fn add_loan(&mut self, input: NewLoan) -> Result<Loan> {
        let loan = Loan {
            id: Uuid::new_v4(),
            kind: input.kind,
            amount: input.amount,
            account_id: input.account_id,
            member_id: input.member_id,
            counterparty: input.counterparty.trim().to_string(),
            date: input.date,
            note: clean_text(input.note),
            settled: false,
        };
        validate_loan(&loan)?;
        let created = self.commit(&[Collection::Loans], LedgerEvent::LoansChanged, |s| {
            s.loans.push(loan.clone());
            Ok(loan)
        })?;
        debug!("Added loan {} with {}", created.id, created.counterparty);
        Ok(created)
    }

    pub fn update_loan(&mut self, updated: Loan) -> Result<Loan> {
        let updated = Loan {
            counterparty: updated.counterparty.trim().to_string(),
            note: clean_text(updated.note),
            ..updated
        };
        validate_loan(&updated)?;
        self.commit(&[Collection::Loans], LedgerEvent::LoansChanged, |s| {
            let idx = position(&s.loans, |l| l.id == updated.id, EntityKind::Loan, updated.id)?;
            s.loans[idx] = updated.clone();
            Ok(updated)
        })
    }

    pub fn set_loan_settled(&mut self, id: Uuid, settled: bool) -> Result<Loan> {
        self.commit(&[Collection::Loans], LedgerEvent::LoansChanged, |s| {
            let loan = s
                .loans
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or_else(|| LedgerError::not_found(EntityKind::Loan, id))?;
            loan.settled = settled;
            Ok(loan.clone())
        })
    }

    pub fn delete_loan(&mut self, id: Uuid) -> Result<Loan> {
        self.commit(&[Collection::Loans], LedgerEvent::LoansChanged, |s| {
            let idx = position(&s.loans, |l| l.id == id, EntityKind::Loan, id)?;
            Ok(s.loans.remove(idx))
        })
    }

    // ---- allocations ----

    pub fn add_allocation(&mut self, account_id: Uuid, percentage: u8) -> Result<IncomeAllocation> {
        validate_percentage(percentage)?;
        let row = IncomeAllocation {
            id: Uuid::new_v4(),
            account_id,
            percentage,
            updated_at: Utc::now(),
        };
        self.commit(
            &[Collection::Allocations],
            LedgerEvent::AllocationsChanged,
            |s| {
                require_account(s, row.account_id)?;
                s.allocations.push(row.clone());
                Ok(row)
            },
        )
    }

    pub fn update_allocation(&mut self, updated: IncomeAllocation) -> Result<IncomeAllocation> {
        validate_percentage(updated.percentage)?;
        self.commit(
            &[Collection::Allocations],
            LedgerEvent::AllocationsChanged,
            |s| {
                require_account(s, updated.account_id)?;
                let current = s
                    .allocations
                    .iter_mut()
                    .find(|a| a.id == updated.id)
                    .ok_or_else(|| LedgerError::not_found(EntityKind::Allocation, updated.id))?;
                *current = IncomeAllocation {
                    updated_at: Utc::now(),
                    ..updated
                };
                Ok(current.clone())
            },
        )
    }

    pub fn delete_allocation(&mut self, id: Uuid) -> Result<IncomeAllocation> {
        self.commit(
            &[Collection::Allocations],
            LedgerEvent::AllocationsChanged,
            |s| {
                let idx = position(&s.allocations, |a| a.id == id, EntityKind::Allocation, id)?;
                Ok(s.allocations.remove(idx))
            },
        )
    }

    /// Creates the account's row on first nonzero share, updates it in place
    /// afterwards, and removes it when the share drops to zero. A zero share
    /// clears a row even when its account no longer exists.
    pub fn set_allocation(
        &mut self,
        account_id: Uuid,
        percentage: u8,
    ) -> Result<Option<IncomeAllocation>> {
        validate_percentage(percentage)?;
        if percentage != 0 && self.account(account_id).is_none() {
            return Err(LedgerError::not_found(EntityKind::Account, account_id));
        }
        let existing = self
            .state
            .allocations
            .iter()
            .find(|a| a.account_id == account_id)
            .cloned();
        match (existing, percentage) {
            (None, 0) => Ok(None),
            (None, p) => self.add_allocation(account_id, p).map(Some),
            (Some(row), 0) => self.delete_allocation(row.id).map(|_| None),
            (Some(row), p) => self
                .update_allocation(IncomeAllocation {
                    percentage: p,
                    ..row
                })
                .map(Some),
        }
    }

    // ---- snapshot ----

    /// Replaces every collection with `snapshot` in one write.
    pub fn restore(&mut self, snapshot: BackupSnapshot) -> Result<()> {
        check_snapshot(&snapshot)?;
        let count = snapshot.record_count();
        self.commit(&Collection::ALL, LedgerEvent::SnapshotRestored, |s| {
            *s = snapshot;
            Ok(())
        })?;
        debug!("Restored snapshot with {} records", count);
        Ok(())
    }

    // ---- queries ----

    pub fn accounts(&self) -> &[Account] {
        &self.state.accounts
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.state.accounts.iter().find(|a| a.id == id)
    }

    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        self.state.accounts.iter().find(|a| a.name == name)
    }

    pub fn categories(&self, kind: Option<CategoryKind>) -> Vec<&Category> {
        self.state
            .categories
            .iter()
            .filter(|c| kind.is_none_or(|k| c.kind == k))
            .collect()
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.state.categories.iter().find(|c| c.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.state.categories.iter().find(|c| c.name == name)
    }

    /// Direct children of `parent`.
    pub fn subcategories(&self, parent: Uuid) -> Vec<&Category> {
        self.state
            .categories
            .iter()
            .filter(|c| c.parent_id == Some(parent))
            .collect()
    }

    pub fn members(&self, active: Option<bool>) -> Vec<&Member> {
        self.state
            .members
            .iter()
            .filter(|m| active.is_none_or(|a| m.is_active == a))
            .collect()
    }

    pub fn member(&self, id: Uuid) -> Option<&Member> {
        self.state.members.iter().find(|m| m.id == id)
    }

    pub fn member_by_name(&self, name: &str) -> Option<&Member> {
        self.state.members.iter().find(|m| m.name == name)
    }

    pub fn transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut rows: Vec<&Transaction> = self
            .state
            .transactions
            .iter()
            .filter(|t| filter.matches(t, &self.state.categories))
            .collect();
        sort_by_date(&mut rows, filter.order, |t| t.date);
        rows
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.state.transactions.iter().find(|t| t.id == id)
    }

    pub fn loans(&self, filter: &LoanFilter) -> Vec<&Loan> {
        let mut rows: Vec<&Loan> = self
            .state
            .loans
            .iter()
            .filter(|l| filter.matches(l))
            .collect();
        sort_by_date(&mut rows, filter.order, |l| l.date);
        rows
    }

    pub fn loan(&self, id: Uuid) -> Option<&Loan> {
        self.state.loans.iter().find(|l| l.id == id)
    }

    pub fn allocations(&self) -> &[IncomeAllocation] {
        &self.state.allocations
    }

    pub fn allocation_for(&self, account_id: Uuid) -> Option<&IncomeAllocation> {
        self.state
            .allocations
            .iter()
            .find(|a| a.account_id == account_id)
    }

    /// Transactions and loans in one timeline, newest first.
    pub fn records(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<LedgerRecord> {
        let mut rows: Vec<LedgerRecord> = self
            .state
            .transactions
            .iter()
            .filter(|t| in_range(t.date, from, to))
            .cloned()
            .map(LedgerRecord::Transaction)
            .chain(
                self.state
                    .loans
                    .iter()
                    .filter(|l| in_range(l.date, from, to))
                    .cloned()
                    .map(LedgerRecord::Loan),
            )
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.timestamp()));
        rows
    }
}

fn position<T>(
    rows: &[T],
    pred: impl Fn(&T) -> bool,
    kind: EntityKind,
    id: Uuid,
) -> Result<usize> {
    rows.iter()
        .position(pred)
        .ok_or_else(|| LedgerError::not_found(kind, id))
}

fn checked_balance(account: &Account, delta: Decimal) -> Result<Decimal> {
    account.balance.checked_add(delta).ok_or_else(|| {
        LedgerError::invalid(format!(
            "Balance of account '{}' would overflow ({} + {})",
            account.name, account.balance, delta
        ))
    })
}

fn require_account(s: &BackupSnapshot, id: Uuid) -> Result<()> {
    if s.accounts.iter().any(|a| a.id == id) {
        Ok(())
    } else {
        Err(LedgerError::not_found(EntityKind::Account, id))
    }
}

fn apply_delta(accounts: &mut [Account], account_id: Uuid, delta: Decimal) -> Result<()> {
    let account = accounts
        .iter_mut()
        .find(|a| a.id == account_id)
        .ok_or_else(|| LedgerError::not_found(EntityKind::Account, account_id))?;
    account.balance = checked_balance(account, delta)?;
    Ok(())
}

/// Takes a row's effect back out of its account. An account that has since
/// been deleted holds no balance to correct.
fn reverse_delta(accounts: &mut [Account], tx: &Transaction) -> Result<()> {
    match accounts.iter_mut().find(|a| a.id == tx.account_id) {
        Some(account) => account.balance = checked_balance(account, -tx.signed_amount())?,
        None => debug!(
            "Account {} of transaction {} no longer exists",
            tx.account_id, tx.id
        ),
    }
    Ok(())
}

fn required_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::invalid(format!("{} name must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

/// Names are unique per collection, compared after trimming.
fn unique_name<'a>(
    mut taken: impl Iterator<Item = &'a String>,
    name: &str,
    what: &str,
) -> Result<()> {
    if taken.any(|t| t.trim() == name) {
        return Err(LedgerError::invalid(format!(
            "{} name '{}' is already in use",
            what, name
        )));
    }
    Ok(())
}

fn clean_text(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid(format!(
            "Amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

fn validate_percentage(percentage: u8) -> Result<()> {
    if percentage > 100 {
        return Err(LedgerError::invalid(format!(
            "Percentage must be within 0..=100, got {}",
            percentage
        )));
    }
    Ok(())
}

fn validate_transaction(s: &BackupSnapshot, tx: &Transaction) -> Result<()> {
    validate_amount(tx.amount)?;
    match (tx.kind, tx.transfer) {
        (TransactionType::Transfer, None) => {
            return Err(LedgerError::invalid("Transfer legs need a direction"));
        }
        (TransactionType::Income | TransactionType::Expense, Some(_)) => {
            return Err(LedgerError::invalid(format!(
                "A {} transaction cannot carry a transfer direction",
                tx.kind
            )));
        }
        _ => {}
    }
    let wanted = match tx.kind {
        TransactionType::Income => Some(CategoryKind::Income),
        TransactionType::Expense => Some(CategoryKind::Expense),
        TransactionType::Transfer => None,
    };
    let category = tx
        .category_id
        .and_then(|cid| s.categories.iter().find(|c| c.id == cid));
    if let (Some(wanted), Some(category)) = (wanted, category) {
        if category.kind != wanted {
            return Err(LedgerError::invalid(format!(
                "Category '{}' is {} but the transaction is {}",
                category.name, category.kind, tx.kind
            )));
        }
    }
    Ok(())
}

fn validate_loan(loan: &Loan) -> Result<()> {
    validate_amount(loan.amount)?;
    if loan.counterparty.is_empty() {
        return Err(LedgerError::invalid("Loan counterparty must not be empty"));
    }
    Ok(())
}

/// Rejects snapshots whose records could not have been written through the
/// ledger's own operations.
fn check_snapshot(snapshot: &BackupSnapshot) -> Result<()> {
    for tx in &snapshot.transactions {
        validate_transaction(snapshot, tx)
            .map_err(|e| LedgerError::decode(format!("transaction {}: {}", tx.id, e)))?;
    }
    for loan in &snapshot.loans {
        validate_loan(loan).map_err(|e| LedgerError::decode(format!("loan {}: {}", loan.id, e)))?;
    }
    for row in &snapshot.allocations {
        validate_percentage(row.percentage)
            .map_err(|e| LedgerError::decode(format!("allocation {}: {}", row.id, e)))?;
    }
    Ok(())
}
