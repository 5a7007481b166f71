// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{AccountKind, NewAccount};
use crate::utils::{
    fmt_money, get_currency, id_for_account, maybe_print_json, parse_decimal, pretty_table,
};
use anyhow::{Result, anyhow};

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind: AccountKind = sub
                .get_one::<String>("kind")
                .unwrap()
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let opening = parse_decimal(sub.get_one::<String>("opening").unwrap())?;
            let account = ledger.add_account(NewAccount {
                name: name.clone(),
                kind,
                opening_balance: opening,
            })?;
            println!(
                "Added account '{}' ({}, opening {})",
                account.name, account.kind, account.opening_balance
            );
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            if !maybe_print_json(json_flag, jsonl_flag, &ledger.accounts())? {
                let ccy = get_currency(ledger)?;
                let rows = ledger
                    .accounts()
                    .iter()
                    .map(|a| {
                        vec![
                            a.name.clone(),
                            a.kind.to_string(),
                            fmt_money(&a.balance, &ccy),
                            a.created_at.format("%Y-%m-%d").to_string(),
                            a.id.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Name", "Kind", "Balance", "Created", "ID"], rows)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = id_for_account(ledger, sub.get_one::<String>("account").unwrap())?;
            let mut account = ledger
                .account(id)
                .cloned()
                .ok_or_else(|| anyhow!("Account {} not found", id))?;
            if let Some(name) = sub.get_one::<String>("name") {
                account.name = name.clone();
            }
            if let Some(kind) = sub.get_one::<String>("kind") {
                account.kind = kind.parse().map_err(|e: String| anyhow!(e))?;
            }
            if let Some(opening) = sub.get_one::<String>("opening") {
                account.opening_balance = parse_decimal(opening)?;
            }
            let account = ledger.update_account(account)?;
            println!("Updated account '{}' (balance {})", account.name, account.balance);
        }
        Some(("rm", sub)) => {
            let id = id_for_account(ledger, sub.get_one::<String>("account").unwrap())?;
            let removed = ledger.delete_account(id)?;
            println!("Removed account '{}'", removed.name);
        }
        _ => {}
    }
    Ok(())
}
