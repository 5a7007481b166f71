// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::allocation::{total_percentage, unallocated};
use crate::ledger::Ledger;
use crate::models::IncomeDistribution;
use crate::utils::{
    account_name, date_or_now, fmt_money, get_currency, id_for_account, id_for_category,
    id_for_member, maybe_print_json, parse_decimal, pretty_table,
};
use anyhow::{Result, anyhow};
use uuid::Uuid;

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let account_id = id_for_account(ledger, sub.get_one::<String>("account").unwrap())?;
            let percent = *sub.get_one::<u8>("percent").unwrap();
            let name = account_name(ledger, account_id);
            match ledger.set_allocation(account_id, percent)? {
                Some(row) => println!("{} now receives {}% of income", name, row.percentage),
                None => println!("{} no longer receives allocated income", name),
            }
            let total = total_percentage(ledger.allocations());
            if total != 100 {
                println!("Note: allocations sum to {}%", total);
            }
        }
        Some(("rm", sub)) => {
            let key = sub.get_one::<String>("account").unwrap();
            let account_id = allocation_target(ledger, key)?;
            let name = account_name(ledger, account_id);
            ledger.set_allocation(account_id, 0)?;
            println!("{} no longer receives allocated income", name);
        }
        Some(("list", sub)) => {
            let rows = ledger.allocations();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .iter()
                    .map(|a| {
                        vec![
                            account_name(ledger, a.account_id),
                            format!("{}%", a.percentage),
                            a.updated_at.format("%Y-%m-%d").to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Account", "Share", "Updated"], data));
                println!("Total: {}%", total_percentage(rows));
            }
        }
        Some(("distribute", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let category_id = match sub.get_one::<String>("category") {
                Some(c) => Some(id_for_category(ledger, c)?),
                None => None,
            };
            let member_id = match sub.get_one::<String>("member") {
                Some(m) => Some(id_for_member(ledger, m)?),
                None => None,
            };
            let leftover = unallocated(amount, ledger.allocations())?;
            let created = ledger.allocate_income(IncomeDistribution {
                amount,
                category_id,
                member_id,
                date: date_or_now(sub.get_one::<String>("date"))?,
                note: sub.get_one::<String>("note").cloned(),
            })?;
            let ccy = get_currency(ledger)?;
            for tx in &created {
                println!(
                    "  {} -> {}",
                    fmt_money(&tx.amount, &ccy),
                    account_name(ledger, tx.account_id)
                );
            }
            if !leftover.is_zero() {
                println!("Unallocated: {}", fmt_money(&leftover, &ccy));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Resolves the account whose row `alloc rm` clears. A raw id matches a row
/// even after its account is gone.
pub fn allocation_target(ledger: &Ledger, key: &str) -> Result<Uuid> {
    let account_id = match Uuid::parse_str(key.trim()) {
        Ok(id) if ledger.allocation_for(id).is_some() => id,
        _ => id_for_account(ledger, key)?,
    };
    if ledger.allocation_for(account_id).is_none() {
        return Err(anyhow!("No allocation row for account '{}'", key.trim()));
    }
    Ok(account_id)
}
