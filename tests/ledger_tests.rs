// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use fintrack::events::{LedgerEvent, RecordingSink};
use fintrack::ledger::{LoanFilter, SortOrder, TransactionFilter};
use fintrack::models::{
    AccountKind, CategoryKind, LoanType, NewAccount, NewCategory, NewLoan, NewMember,
    NewTransaction, NewTransfer, Transaction, TransactionType,
};
use fintrack::store::MemoryStore;
use fintrack::{EntityKind, Ledger, LedgerError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn account(ledger: &mut Ledger, name: &str, opening: Decimal) -> Uuid {
    ledger
        .add_account(NewAccount {
            name: name.into(),
            kind: AccountKind::Bank,
            opening_balance: opening,
        })
        .unwrap()
        .id
}

fn balance(ledger: &Ledger, id: Uuid) -> Decimal {
    ledger.account(id).unwrap().balance
}

fn signed_sum(ledger: &Ledger, id: Uuid) -> Decimal {
    ledger
        .transactions(&TransactionFilter::default().account(id))
        .iter()
        .map(|t| t.signed_amount())
        .sum()
}

fn ids(rows: Vec<&Transaction>) -> Vec<Uuid> {
    rows.iter().map(|t| t.id).collect()
}

fn observed() -> (Ledger, Arc<MemoryStore>, Arc<RecordingSink>) {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::new());
    let ledger = Ledger::open(store.clone(), sink.clone()).unwrap();
    (ledger, store, sink)
}

#[test]
fn income_add_raises_balance() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(100));
    ledger
        .add_transaction(NewTransaction::income(a, dec!(50)))
        .unwrap();
    assert_eq!(balance(&ledger, a), dec!(150));
}

#[test]
fn expense_then_delete_restores_balance() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(100));
    let tx = ledger
        .add_transaction(NewTransaction::expense(a, dec!(30)))
        .unwrap();
    assert_eq!(balance(&ledger, a), dec!(70));
    ledger.delete_transaction(tx.id).unwrap();
    assert_eq!(balance(&ledger, a), dec!(100));
    assert!(ledger.transaction(tx.id).is_none());
}

#[test]
fn cross_account_update_moves_the_effect() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(100));
    let b = account(&mut ledger, "B", dec!(0));
    let tx = ledger
        .add_transaction(NewTransaction::income(a, dec!(20)))
        .unwrap();
    assert_eq!(balance(&ledger, a), dec!(120));

    ledger
        .update_transaction(Transaction {
            account_id: b,
            ..tx
        })
        .unwrap();
    assert_eq!(balance(&ledger, a), dec!(100));
    assert_eq!(balance(&ledger, b), dec!(20));
}

#[test]
fn update_switching_type_and_amount() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let tx = ledger
        .add_transaction(NewTransaction::income(a, dec!(40)))
        .unwrap();
    ledger
        .update_transaction(Transaction {
            kind: TransactionType::Expense,
            amount: dec!(15.25),
            ..tx
        })
        .unwrap();
    assert_eq!(balance(&ledger, a), dec!(-15.25));
}

#[test]
fn update_to_missing_account_changes_nothing() {
    let (mut ledger, store, sink) = observed();
    let a = account(&mut ledger, "A", dec!(100));
    let tx = ledger
        .add_transaction(NewTransaction::income(a, dec!(20)))
        .unwrap();
    let stored_before = store.get("transactions");
    sink.take();

    let ghost = Uuid::new_v4();
    let err = ledger
        .update_transaction(Transaction {
            account_id: ghost,
            amount: dec!(99),
            ..tx.clone()
        })
        .unwrap_err();

    match err {
        LedgerError::NotFound { kind, id } => {
            assert_eq!(kind, EntityKind::Account);
            assert_eq!(id, ghost);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(balance(&ledger, a), dec!(120));
    assert_eq!(ledger.transaction(tx.id), Some(&tx));
    assert_eq!(store.get("transactions"), stored_before);
    assert!(sink.events().is_empty());
}

#[test]
fn update_unknown_transaction_is_not_found() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let tx = ledger
        .add_transaction(NewTransaction::income(a, dec!(5)))
        .unwrap();
    let err = ledger
        .update_transaction(Transaction {
            id: Uuid::new_v4(),
            ..tx
        })
        .unwrap_err();
    assert_eq!(err.missing_kind(), Some(EntityKind::Transaction));
    assert_eq!(balance(&ledger, a), dec!(5));
}

#[test]
fn delete_unknown_transaction_is_not_found() {
    let mut ledger = Ledger::in_memory();
    let err = ledger.delete_transaction(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.missing_kind(), Some(EntityKind::Transaction));
}

#[test]
fn add_to_missing_account_is_rejected() {
    let mut ledger = Ledger::in_memory();
    let err = ledger
        .add_transaction(NewTransaction::income(Uuid::new_v4(), dec!(10)))
        .unwrap_err();
    assert_eq!(err.missing_kind(), Some(EntityKind::Account));
    assert!(ledger.transactions(&TransactionFilter::default()).is_empty());
}

#[test]
fn balance_matches_log_after_mixed_mutations() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let b = account(&mut ledger, "B", dec!(0));

    let t1 = ledger
        .add_transaction(NewTransaction::income(a, dec!(1000)))
        .unwrap();
    let t2 = ledger
        .add_transaction(NewTransaction::expense(a, dec!(250.40)))
        .unwrap();
    let t3 = ledger
        .add_transaction(NewTransaction::expense(b, dec!(12.60)))
        .unwrap();
    ledger
        .update_transaction(Transaction {
            account_id: b,
            ..t2
        })
        .unwrap();
    ledger
        .update_transaction(Transaction {
            amount: dec!(900),
            ..t1
        })
        .unwrap();
    ledger.delete_transaction(t3.id).unwrap();
    ledger
        .transfer(NewTransfer {
            from_account: a,
            to_account: b,
            amount: dec!(100),
            member_id: None,
            date: Utc::now(),
            note: None,
        })
        .unwrap();
    ledger
        .add_loan(NewLoan {
            kind: LoanType::BorrowIn,
            amount: dec!(5000),
            account_id: a,
            member_id: None,
            counterparty: "Bank".into(),
            date: Utc::now(),
            note: None,
        })
        .unwrap();

    for id in [a, b] {
        assert_eq!(balance(&ledger, id), signed_sum(&ledger, id));
    }
    assert_eq!(balance(&ledger, a), dec!(800));
    assert_eq!(balance(&ledger, b), dec!(-150.40));
}

#[test]
fn non_positive_amounts_are_rejected() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(10));
    for amount in [dec!(0), dec!(-1)] {
        let err = ledger
            .add_transaction(NewTransaction::expense(a, amount))
            .unwrap_err();
        assert!(matches!(err, LedgerError::ValidationFailed(_)));
    }
    assert_eq!(balance(&ledger, a), dec!(10));
}

#[test]
fn blank_names_are_rejected() {
    let mut ledger = Ledger::in_memory();
    let err = ledger
        .add_account(NewAccount {
            name: "   ".into(),
            kind: AccountKind::Cash,
            opening_balance: dec!(0),
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
    let err = ledger
        .add_member(NewMember {
            name: String::new(),
            avatar: None,
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
}

#[test]
fn category_kind_must_match_transaction_type() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let salary = ledger
        .add_category(NewCategory {
            name: "Salary".into(),
            kind: CategoryKind::Income,
            icon: None,
            parent_id: None,
        })
        .unwrap();
    let mut input = NewTransaction::expense(a, dec!(5));
    input.category_id = Some(salary.id);
    let err = ledger.add_transaction(input).unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));

    let mut input = NewTransaction::income(a, dec!(5));
    input.category_id = Some(salary.id);
    ledger.add_transaction(input).unwrap();
    assert_eq!(balance(&ledger, a), dec!(5));
}

#[test]
fn deleting_referenced_entities_leaves_dangling_rows() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let food = ledger
        .add_category(NewCategory {
            name: "Food".into(),
            kind: CategoryKind::Expense,
            icon: None,
            parent_id: None,
        })
        .unwrap();
    let mut input = NewTransaction::expense(a, dec!(8));
    input.category_id = Some(food.id);
    let tx = ledger.add_transaction(input).unwrap();

    ledger.delete_category(food.id).unwrap();
    ledger.delete_account(a).unwrap();

    let kept = ledger.transaction(tx.id).unwrap();
    assert_eq!(kept.category_id, Some(food.id));
    assert_eq!(kept.account_id, a);

    // nothing left to reverse once the account is gone
    ledger.delete_transaction(tx.id).unwrap();
}

#[test]
fn loans_never_touch_balances() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(100));
    let loan = ledger
        .add_loan(NewLoan {
            kind: LoanType::BorrowOut,
            amount: dec!(40),
            account_id: a,
            member_id: None,
            counterparty: "Sam".into(),
            date: Utc::now(),
            note: Some("  rent help ".into()),
        })
        .unwrap();
    assert_eq!(loan.note.as_deref(), Some("rent help"));
    ledger.set_loan_settled(loan.id, true).unwrap();
    ledger.delete_loan(loan.id).unwrap();
    assert_eq!(balance(&ledger, a), dec!(100));
}

#[test]
fn loan_requires_counterparty() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let err = ledger
        .add_loan(NewLoan {
            kind: LoanType::BorrowIn,
            amount: dec!(10),
            account_id: a,
            member_id: None,
            counterparty: " ".into(),
            date: Utc::now(),
            note: None,
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
}

#[test]
fn transfer_writes_two_legs() {
    let (mut ledger, _store, sink) = observed();
    let a = account(&mut ledger, "A", dec!(100));
    let b = account(&mut ledger, "B", dec!(0));
    sink.take();

    let (out, inn) = ledger
        .transfer(NewTransfer {
            from_account: a,
            to_account: b,
            amount: dec!(30),
            member_id: None,
            date: Utc::now(),
            note: None,
        })
        .unwrap();
    assert_eq!(out.kind, TransactionType::Transfer);
    assert_eq!(out.signed_amount(), dec!(-30));
    assert_eq!(inn.signed_amount(), dec!(30));
    assert_eq!(balance(&ledger, a), dec!(70));
    assert_eq!(balance(&ledger, b), dec!(30));
    assert_eq!(sink.events(), vec![LedgerEvent::TransactionsChanged]);
}

#[test]
fn transfer_to_missing_account_rolls_back_first_leg() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(100));
    let err = ledger
        .transfer(NewTransfer {
            from_account: a,
            to_account: Uuid::new_v4(),
            amount: dec!(30),
            member_id: None,
            date: Utc::now(),
            note: None,
        })
        .unwrap_err();
    assert_eq!(err.missing_kind(), Some(EntityKind::Account));
    assert_eq!(balance(&ledger, a), dec!(100));
    assert!(ledger.transactions(&TransactionFilter::default()).is_empty());
}

#[test]
fn persistence_failure_rolls_back_memory() {
    let (mut ledger, store, sink) = observed();
    let a = account(&mut ledger, "A", dec!(100));
    sink.take();

    store.set_fail_writes(true);
    let err = ledger
        .add_transaction(NewTransaction::expense(a, dec!(60)))
        .unwrap_err();
    assert!(matches!(err, LedgerError::PersistenceFailed(_)));
    assert_eq!(balance(&ledger, a), dec!(100));
    assert!(ledger.transactions(&TransactionFilter::default()).is_empty());
    assert!(sink.events().is_empty());

    store.set_fail_writes(false);
    ledger
        .add_transaction(NewTransaction::expense(a, dec!(60)))
        .unwrap();
    assert_eq!(balance(&ledger, a), dec!(40));
}

#[test]
fn one_event_per_mutation_scoped_to_collection() {
    let (mut ledger, _store, sink) = observed();
    let a = account(&mut ledger, "A", dec!(0));
    let member = ledger
        .add_member(NewMember {
            name: "Kim".into(),
            avatar: None,
        })
        .unwrap();
    ledger
        .add_category(NewCategory {
            name: "Fuel".into(),
            kind: CategoryKind::Expense,
            icon: None,
            parent_id: None,
        })
        .unwrap();
    ledger
        .add_transaction(NewTransaction::income(a, dec!(1)))
        .unwrap();
    ledger.toggle_member_active(member.id).unwrap();
    ledger.set_allocation(a, 50).unwrap();
    let _ = ledger.delete_member(Uuid::new_v4());

    assert_eq!(
        sink.events(),
        vec![
            LedgerEvent::AccountsChanged,
            LedgerEvent::MembersChanged,
            LedgerEvent::CategoriesChanged,
            LedgerEvent::TransactionsChanged,
            LedgerEvent::MembersChanged,
            LedgerEvent::AllocationsChanged,
        ]
    );
}

#[test]
fn reopen_reads_back_persisted_state() {
    let store = Arc::new(MemoryStore::new());
    let mut ledger = Ledger::open(store.clone(), fintrack::events::NullSink).unwrap();
    let a = account(&mut ledger, "A", dec!(10));
    ledger
        .add_transaction(NewTransaction::income(a, dec!(5)))
        .unwrap();
    let expected = ledger.snapshot();
    drop(ledger);

    let reopened = Ledger::open(store, fintrack::events::NullSink).unwrap();
    assert_eq!(reopened.snapshot(), expected);
}

#[test]
fn corrupt_blob_fails_open() {
    let store = MemoryStore::new();
    store.insert("accounts", "{not json");
    let err = Ledger::open(store, fintrack::events::NullSink).err().unwrap();
    assert!(matches!(err, LedgerError::DecodeFailed(_)));
}

#[test]
fn account_edit_keeps_balance_consistent() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(100));
    ledger
        .add_transaction(NewTransaction::expense(a, dec!(30)))
        .unwrap();
    let mut edited = ledger.account(a).unwrap().clone();
    edited.name = "Checking".into();
    edited.opening_balance = dec!(150);
    edited.balance = dec!(999999);
    let updated = ledger.update_account(edited).unwrap();
    assert_eq!(updated.name, "Checking");
    assert_eq!(updated.balance, dec!(120));
}

#[test]
fn recalculate_repairs_cached_balances() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(10));
    ledger
        .add_transaction(NewTransaction::income(a, dec!(5)))
        .unwrap();
    let mut snapshot = ledger.snapshot();
    snapshot.accounts[0].balance = dec!(-1);
    ledger.restore(snapshot).unwrap();
    assert_eq!(balance(&ledger, a), dec!(-1));

    ledger.recalculate_balances().unwrap();
    assert_eq!(balance(&ledger, a), dec!(15));
}

#[test]
fn member_toggle_and_active_filter() {
    let mut ledger = Ledger::in_memory();
    let kim = ledger
        .add_member(NewMember {
            name: "Kim".into(),
            avatar: None,
        })
        .unwrap();
    ledger
        .add_member(NewMember {
            name: "Lee".into(),
            avatar: Some("lee.png".into()),
        })
        .unwrap();
    assert!(kim.is_active);
    let kim = ledger.toggle_member_active(kim.id).unwrap();
    assert!(!kim.is_active);
    assert_eq!(ledger.members(Some(true)).len(), 1);
    assert_eq!(ledger.members(Some(false))[0].name, "Kim");
    assert_eq!(ledger.members(None).len(), 2);
}

#[test]
fn transaction_filters_and_ordering() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let b = account(&mut ledger, "B", dec!(0));
    let food = ledger
        .add_category(NewCategory {
            name: "Food".into(),
            kind: CategoryKind::Expense,
            icon: None,
            parent_id: None,
        })
        .unwrap();
    let kim = ledger
        .add_member(NewMember {
            name: "Kim".into(),
            avatar: None,
        })
        .unwrap();

    let day = |d| Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap();
    let mut t1 = NewTransaction::expense(a, dec!(10));
    t1.date = day(5);
    t1.category_id = Some(food.id);
    t1.member_id = Some(kim.id);
    let t1 = ledger.add_transaction(t1).unwrap();
    let mut t2 = NewTransaction::income(b, dec!(20));
    t2.date = day(1);
    let t2 = ledger.add_transaction(t2).unwrap();
    let mut t3 = NewTransaction::expense(a, dec!(30));
    t3.date = day(9);
    let t3 = ledger.add_transaction(t3).unwrap();

    assert_eq!(
        ids(ledger.transactions(&TransactionFilter::default())),
        vec![t1.id, t2.id, t3.id]
    );
    assert_eq!(
        ids(ledger.transactions(&TransactionFilter::default().order(SortOrder::NewestFirst))),
        vec![t3.id, t1.id, t2.id]
    );
    assert_eq!(
        ids(ledger.transactions(&TransactionFilter::default().order(SortOrder::OldestFirst))),
        vec![t2.id, t1.id, t3.id]
    );
    assert_eq!(
        ids(ledger.transactions(&TransactionFilter::default().account(a))),
        vec![t1.id, t3.id]
    );
    assert_eq!(
        ids(ledger.transactions(&TransactionFilter::default().member(kim.id))),
        vec![t1.id]
    );
    assert_eq!(
        ids(ledger.transactions(&TransactionFilter::default().kind(TransactionType::Income))),
        vec![t2.id]
    );
    assert_eq!(
        ids(ledger.transactions(
            &TransactionFilter::default().category_kind(CategoryKind::Expense)
        )),
        vec![t1.id]
    );
    assert_eq!(
        ids(ledger.transactions(
            &TransactionFilter::default().between(Some(day(5)), Some(day(9)))
        )),
        vec![t1.id]
    );
}

#[test]
fn records_merge_transactions_and_loans_newest_first() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let mut tx = NewTransaction::income(a, dec!(10));
    tx.date = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    let tx = ledger.add_transaction(tx).unwrap();
    let loan = ledger
        .add_loan(NewLoan {
            kind: LoanType::BorrowIn,
            amount: dec!(50),
            account_id: a,
            member_id: None,
            counterparty: "Ana".into(),
            date: Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap(),
            note: None,
        })
        .unwrap();

    let records = ledger.records(None, None);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id(), loan.id);
    assert_eq!(records[1].id(), tx.id);
    assert!(records[0].timestamp() > records[1].timestamp());

    let open = ledger.loans(&LoanFilter {
        settled: Some(false),
        ..LoanFilter::default()
    });
    assert_eq!(open.len(), 1);
}

#[test]
fn set_allocation_creates_updates_and_removes() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));

    assert_eq!(ledger.set_allocation(a, 0).unwrap(), None);
    assert!(ledger.allocations().is_empty());

    let row = ledger.set_allocation(a, 60).unwrap().unwrap();
    assert_eq!(row.percentage, 60);
    let again = ledger.set_allocation(a, 70).unwrap().unwrap();
    assert_eq!(again.id, row.id);
    assert_eq!(ledger.allocations().len(), 1);

    assert_eq!(ledger.set_allocation(a, 0).unwrap(), None);
    assert!(ledger.allocation_for(a).is_none());

    let err = ledger.set_allocation(a, 101).unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
}

#[test]
fn allocate_income_records_one_income_per_share() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let b = account(&mut ledger, "B", dec!(0));
    let c = account(&mut ledger, "C", dec!(0));
    ledger.add_allocation(a, 50).unwrap();
    ledger.add_allocation(b, 30).unwrap();
    ledger.add_allocation(c, 0).unwrap();

    let created = ledger
        .allocate_income(fintrack::models::IncomeDistribution {
            amount: dec!(2000),
            category_id: None,
            member_id: None,
            date: Utc::now(),
            note: Some("March salary".into()),
        })
        .unwrap();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|t| t.kind == TransactionType::Income));
    assert_eq!(balance(&ledger, a), dec!(1000));
    assert_eq!(balance(&ledger, b), dec!(600));
    assert_eq!(balance(&ledger, c), dec!(0));
}

#[test]
fn subcategories_follow_parent_reference() {
    let mut ledger = Ledger::in_memory();
    let home = ledger
        .add_category(NewCategory {
            name: "Home".into(),
            kind: CategoryKind::Expense,
            icon: Some("house".into()),
            parent_id: None,
        })
        .unwrap();
    ledger
        .add_category(NewCategory {
            name: "Rent".into(),
            kind: CategoryKind::Expense,
            icon: None,
            parent_id: Some(home.id),
        })
        .unwrap();
    let kids = ledger.subcategories(home.id);
    assert_eq!(kids.len(), 1);
    assert_eq!(kids[0].name, "Rent");
    assert_eq!(ledger.categories(Some(CategoryKind::Income)).len(), 0);

    let mut own_parent = home.clone();
    own_parent.parent_id = Some(home.id);
    assert!(ledger.update_category(own_parent).is_err());
}

#[test]
fn collection_keys_are_reserved() {
    let ledger = Ledger::in_memory();
    assert!(ledger.set_setting("accounts", "[]").is_err());
    ledger.set_setting("currency_code", "EUR").unwrap();
    assert_eq!(
        ledger.setting("currency_code").unwrap().as_deref(),
        Some("EUR")
    );
}

#[test]
fn balance_overflow_is_rejected_without_side_effects() {
    let (mut ledger, _store, sink) = observed();
    let a = account(&mut ledger, "A", Decimal::MAX);
    sink.take();

    let err = ledger
        .add_transaction(NewTransaction::income(a, dec!(1)))
        .unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
    assert_eq!(balance(&ledger, a), Decimal::MAX);
    assert!(ledger.transactions(&TransactionFilter::default()).is_empty());
    assert!(sink.events().is_empty());

    ledger
        .add_transaction(NewTransaction::expense(a, dec!(1)))
        .unwrap();
    assert_eq!(balance(&ledger, a), Decimal::MAX - dec!(1));
}

#[test]
fn transfer_overflowing_destination_rolls_back_first_leg() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let b = account(&mut ledger, "B", Decimal::MAX);
    let err = ledger
        .transfer(NewTransfer {
            from_account: a,
            to_account: b,
            amount: dec!(1),
            member_id: None,
            date: Utc::now(),
            note: None,
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
    assert_eq!(balance(&ledger, a), dec!(0));
    assert_eq!(balance(&ledger, b), Decimal::MAX);
    assert!(ledger.transactions(&TransactionFilter::default()).is_empty());
}

#[test]
fn opening_balance_edit_that_overflows_changes_nothing() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    ledger
        .add_transaction(NewTransaction::income(a, dec!(10)))
        .unwrap();
    let mut edited = ledger.account(a).unwrap().clone();
    edited.name = "Renamed".into();
    edited.opening_balance = Decimal::MAX;
    let err = ledger.update_account(edited).unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
    let kept = ledger.account(a).unwrap();
    assert_eq!(kept.name, "A");
    assert_eq!(kept.balance, dec!(10));
    assert_eq!(kept.opening_balance, dec!(0));
}

#[test]
fn huge_income_distribution_is_rejected() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    ledger.set_allocation(a, 100).unwrap();
    let err = ledger
        .allocate_income(fintrack::models::IncomeDistribution {
            amount: Decimal::MAX,
            category_id: None,
            member_id: None,
            date: Utc::now(),
            note: None,
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
    assert_eq!(balance(&ledger, a), dec!(0));
    assert!(ledger.transactions(&TransactionFilter::default()).is_empty());
}

#[test]
fn zero_share_clears_row_of_deleted_account() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let b = account(&mut ledger, "B", dec!(0));
    ledger.set_allocation(a, 50).unwrap();
    ledger.set_allocation(b, 50).unwrap();
    let mut snapshot = ledger.snapshot();
    snapshot.accounts.retain(|acc| acc.id != b);
    ledger.restore(snapshot).unwrap();

    let salary = || fintrack::models::IncomeDistribution {
        amount: dec!(100),
        category_id: None,
        member_id: None,
        date: Utc::now(),
        note: None,
    };
    let err = ledger.allocate_income(salary()).unwrap_err();
    assert_eq!(err.missing_kind(), Some(EntityKind::Account));

    assert_eq!(ledger.set_allocation(b, 0).unwrap(), None);
    assert!(ledger.allocation_for(b).is_none());
    let err = ledger.set_allocation(b, 10).unwrap_err();
    assert_eq!(err.missing_kind(), Some(EntityKind::Account));

    ledger.allocate_income(salary()).unwrap();
    assert_eq!(balance(&ledger, a), dec!(50));
}

#[test]
fn deleting_account_drops_its_allocation_row() {
    let (mut ledger, store, sink) = observed();
    let a = account(&mut ledger, "A", dec!(0));
    let b = account(&mut ledger, "B", dec!(0));
    ledger.set_allocation(a, 40).unwrap();
    ledger.set_allocation(b, 60).unwrap();
    sink.take();

    ledger.delete_account(a).unwrap();
    assert_eq!(sink.events(), vec![LedgerEvent::AccountsChanged]);
    assert!(ledger.allocation_for(a).is_none());
    assert_eq!(ledger.allocations().len(), 1);

    let reopened = Ledger::open(store, fintrack::events::NullSink).unwrap();
    assert_eq!(reopened.allocations(), ledger.allocations());
}

#[test]
fn allocation_rows_need_an_existing_account() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(0));
    let err = ledger.add_allocation(Uuid::new_v4(), 20).unwrap_err();
    assert_eq!(err.missing_kind(), Some(EntityKind::Account));

    let row = ledger.add_allocation(a, 20).unwrap();
    let mut moved = row.clone();
    moved.account_id = Uuid::new_v4();
    let err = ledger.update_allocation(moved).unwrap_err();
    assert_eq!(err.missing_kind(), Some(EntityKind::Account));
    assert_eq!(ledger.allocations(), &[row]);
}

#[test]
fn restore_rejects_records_the_ledger_would_refuse() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "A", dec!(100));
    let b = account(&mut ledger, "B", dec!(0));
    ledger
        .transfer(NewTransfer {
            from_account: a,
            to_account: b,
            amount: dec!(25),
            member_id: None,
            date: Utc::now(),
            note: None,
        })
        .unwrap();
    let before = ledger.snapshot();

    let mut zero = before.clone();
    zero.transactions[0].amount = dec!(0);
    assert!(matches!(
        ledger.restore(zero),
        Err(LedgerError::DecodeFailed(_))
    ));

    let mut undirected = before.clone();
    undirected.transactions[1].transfer = None;
    assert!(matches!(
        ledger.restore(undirected),
        Err(LedgerError::DecodeFailed(_))
    ));

    let mut negative_loan = before.clone();
    negative_loan.loans.push(fintrack::models::Loan {
        id: Uuid::new_v4(),
        kind: LoanType::BorrowIn,
        amount: dec!(-5),
        account_id: a,
        member_id: None,
        counterparty: "Sam".into(),
        date: Utc::now(),
        note: None,
        settled: false,
    });
    assert!(matches!(
        ledger.restore(negative_loan),
        Err(LedgerError::DecodeFailed(_))
    ));

    let mut oversized = before.clone();
    oversized.allocations.push(fintrack::models::IncomeAllocation {
        id: Uuid::new_v4(),
        account_id: a,
        percentage: 150,
        updated_at: Utc::now(),
    });
    assert!(matches!(
        ledger.restore(oversized),
        Err(LedgerError::DecodeFailed(_))
    ));

    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn names_are_unique_per_collection() {
    let mut ledger = Ledger::in_memory();
    let a = account(&mut ledger, "Checking", dec!(0));
    account(&mut ledger, "Savings", dec!(0));
    let err = ledger
        .add_account(NewAccount {
            name: "  Checking ".into(),
            kind: AccountKind::Cash,
            opening_balance: dec!(0),
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::ValidationFailed(_)));
    assert_eq!(ledger.accounts().len(), 2);

    let mut renamed = ledger.account(a).unwrap().clone();
    renamed.name = "Savings".into();
    assert!(matches!(
        ledger.update_account(renamed),
        Err(LedgerError::ValidationFailed(_))
    ));
    let mut same = ledger.account(a).unwrap().clone();
    same.kind = AccountKind::Cash;
    ledger.update_account(same).unwrap();

    let food = NewCategory {
        name: "Food".into(),
        kind: CategoryKind::Expense,
        icon: None,
        parent_id: None,
    };
    ledger.add_category(food.clone()).unwrap();
    assert!(matches!(
        ledger.add_category(food),
        Err(LedgerError::ValidationFailed(_))
    ));

    let kim = ledger
        .add_member(NewMember {
            name: "Kim".into(),
            avatar: None,
        })
        .unwrap();
    let lee = ledger
        .add_member(NewMember {
            name: "Lee".into(),
            avatar: None,
        })
        .unwrap();
    assert!(matches!(
        ledger.add_member(NewMember {
            name: "Kim".into(),
            avatar: None,
        }),
        Err(LedgerError::ValidationFailed(_))
    ));
    let mut clash = lee.clone();
    clash.name = kim.name.clone();
    assert!(matches!(
        ledger.update_member(clash),
        Err(LedgerError::ValidationFailed(_))
    ));
    assert_eq!(ledger.member(lee.id).unwrap().name, "Lee");
}
