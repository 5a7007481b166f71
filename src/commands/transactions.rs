// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{Ledger, SortOrder, TransactionFilter};
use crate::models::{CategoryKind, NewTransaction, NewTransfer, TransactionType};
use crate::utils::{
    account_name, category_name, date_or_now, day_start, id_for_account, id_for_category,
    id_for_member, maybe_print_json, member_name, parse_date, parse_decimal, parse_uuid,
    pretty_table,
};
use anyhow::{Result, anyhow};
use serde::Serialize;

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("rm", sub)) => {
            let id = parse_uuid(sub.get_one::<String>("id").unwrap())?;
            let removed = ledger.delete_transaction(id)?;
            println!(
                "Deleted {} {} on {}",
                removed.kind,
                removed.amount,
                account_name(ledger, removed.account_id)
            );
        }
        Some(("transfer", sub)) => transfer(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn parse_type(s: &str) -> Result<TransactionType> {
    s.parse::<TransactionType>().map_err(|e| anyhow!(e))
}

fn add(ledger: &mut Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(ledger, sub.get_one::<String>("account").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let kind = parse_type(sub.get_one::<String>("type").unwrap())?;
    if kind == TransactionType::Transfer {
        return Err(anyhow!("Use `tx transfer` to move money between accounts"));
    }
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(id_for_category(ledger, c)?),
        None => None,
    };
    let member_id = match sub.get_one::<String>("member") {
        Some(m) => Some(id_for_member(ledger, m)?),
        None => None,
    };
    let date = date_or_now(sub.get_one::<String>("date"))?;

    let tx = ledger.add_transaction(NewTransaction {
        amount,
        kind,
        account_id,
        category_id,
        member_id,
        date,
        note: sub.get_one::<String>("note").cloned(),
        transfer: None,
    })?;
    println!(
        "Recorded {} {} on {} (acct: {}, id: {})",
        tx.kind,
        tx.amount,
        tx.date.format("%Y-%m-%d"),
        account_name(ledger, tx.account_id),
        tx.id
    );
    Ok(())
}

fn list(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(ledger, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.account.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.member.clone(),
                    r.note.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Account", "Type", "Amount", "Category", "Member", "Note", "ID"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub account: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub member: String,
    pub note: String,
}

pub fn query_rows(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut filter = TransactionFilter::default().order(if sub.get_flag("oldest") {
        SortOrder::OldestFirst
    } else {
        SortOrder::NewestFirst
    });
    if let Some(acct) = sub.get_one::<String>("account") {
        filter = filter.account(id_for_account(ledger, acct)?);
    }
    if let Some(member) = sub.get_one::<String>("member") {
        filter = filter.member(id_for_member(ledger, member)?);
    }
    if let Some(kind) = sub.get_one::<String>("type") {
        filter = filter.kind(parse_type(kind)?);
    }
    if let Some(kind) = sub.get_one::<String>("category-kind") {
        filter = filter.category_kind(kind.parse::<CategoryKind>().map_err(|e| anyhow!(e))?);
    }
    let from = match sub.get_one::<String>("from") {
        Some(d) => Some(day_start(parse_date(d)?)),
        None => None,
    };
    let to = match sub.get_one::<String>("to") {
        Some(d) => Some(day_start(parse_date(d)?)),
        None => None,
    };
    filter = filter.between(from, to);

    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);
    let data = ledger
        .transactions(&filter)
        .into_iter()
        .take(limit)
        .map(|t| TransactionRow {
            id: t.id.to_string(),
            date: t.date.format("%Y-%m-%d").to_string(),
            account: account_name(ledger, t.account_id),
            kind: match t.transfer {
                Some(dir) => format!("{} ({})", t.kind, dir),
                None => t.kind.to_string(),
            },
            amount: t.signed_amount().to_string(),
            category: category_name(ledger, t.category_id),
            member: member_name(ledger, t.member_id),
            note: t.note.clone().unwrap_or_default(),
        })
        .collect();
    Ok(data)
}

fn edit(ledger: &mut Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_uuid(sub.get_one::<String>("id").unwrap())?;
    let mut tx = ledger
        .transaction(id)
        .cloned()
        .ok_or_else(|| anyhow!("Transaction {} not found", id))?;
    if let Some(amount) = sub.get_one::<String>("amount") {
        tx.amount = parse_decimal(amount)?;
    }
    if let Some(kind) = sub.get_one::<String>("type") {
        tx.kind = parse_type(kind)?;
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        tx.account_id = id_for_account(ledger, acct)?;
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        tx.category_id = Some(id_for_category(ledger, cat)?);
    }
    if let Some(member) = sub.get_one::<String>("member") {
        tx.member_id = Some(id_for_member(ledger, member)?);
    }
    if let Some(date) = sub.get_one::<String>("date") {
        tx.date = day_start(parse_date(date)?);
    }
    if let Some(note) = sub.get_one::<String>("note") {
        tx.note = Some(note.clone());
    }
    let tx = ledger.update_transaction(tx)?;
    println!("Updated transaction {}", tx.id);
    Ok(())
}

fn transfer(ledger: &mut Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let from_account = id_for_account(ledger, sub.get_one::<String>("from").unwrap())?;
    let to_account = id_for_account(ledger, sub.get_one::<String>("to").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let member_id = match sub.get_one::<String>("member") {
        Some(m) => Some(id_for_member(ledger, m)?),
        None => None,
    };
    let (out, inn) = ledger.transfer(NewTransfer {
        from_account,
        to_account,
        amount,
        member_id,
        date: date_or_now(sub.get_one::<String>("date"))?,
        note: sub.get_one::<String>("note").cloned(),
    })?;
    println!(
        "Transferred {} from {} to {}",
        amount,
        account_name(ledger, out.account_id),
        account_name(ledger, inn.account_id)
    );
    Ok(())
}
