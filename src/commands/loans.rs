// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{Ledger, LoanFilter, SortOrder};
use crate::models::{LoanType, NewLoan};
use crate::utils::{
    account_name, date_or_now, id_for_account, id_for_member, maybe_print_json, member_name,
    parse_decimal, parse_uuid, pretty_table,
};
use anyhow::{Result, anyhow};

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind: LoanType = sub
                .get_one::<String>("type")
                .unwrap()
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let account_id = id_for_account(ledger, sub.get_one::<String>("account").unwrap())?;
            let member_id = match sub.get_one::<String>("member") {
                Some(m) => Some(id_for_member(ledger, m)?),
                None => None,
            };
            let loan = ledger.add_loan(NewLoan {
                kind,
                amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
                account_id,
                member_id,
                counterparty: sub.get_one::<String>("counterparty").unwrap().clone(),
                date: date_or_now(sub.get_one::<String>("date"))?,
                note: sub.get_one::<String>("note").cloned(),
            })?;
            println!(
                "Recorded {} {} with {} (id: {})",
                loan.kind, loan.amount, loan.counterparty, loan.id
            );
        }
        Some(("list", sub)) => {
            let filter = LoanFilter {
                settled: sub.get_flag("open").then_some(false),
                order: SortOrder::NewestFirst,
                ..LoanFilter::default()
            };
            let loans = ledger.loans(&filter);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &loans)? {
                let rows = loans
                    .iter()
                    .map(|l| {
                        vec![
                            l.date.format("%Y-%m-%d").to_string(),
                            l.kind.to_string(),
                            l.amount.to_string(),
                            l.counterparty.clone(),
                            account_name(ledger, l.account_id),
                            member_name(ledger, l.member_id),
                            if l.settled { "yes" } else { "no" }.to_string(),
                            l.id.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &[
                            "Date",
                            "Type",
                            "Amount",
                            "Counterparty",
                            "Account",
                            "Member",
                            "Settled",
                            "ID"
                        ],
                        rows
                    )
                );
            }
        }
        Some(("settle", sub)) => {
            let id = parse_uuid(sub.get_one::<String>("id").unwrap())?;
            let loan = ledger.set_loan_settled(id, !sub.get_flag("undo"))?;
            let state = if loan.settled { "settled" } else { "open" };
            println!("Loan with {} is now {}", loan.counterparty, state);
        }
        Some(("rm", sub)) => {
            let id = parse_uuid(sub.get_one::<String>("id").unwrap())?;
            let removed = ledger.delete_loan(id)?;
            println!("Deleted loan with {}", removed.counterparty);
        }
        _ => {}
    }
    Ok(())
}
