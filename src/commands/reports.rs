// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::stats;
use crate::utils::{
    category_name, day_start, fmt_money, get_currency, maybe_print_json, parse_date, pretty_table,
};
use anyhow::Result;
use chrono::{DateTime, Utc};

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(ledger, sub)?,
        Some(("categories", sub)) => spend_by_category(ledger, sub)?,
        Some(("balances", sub)) => balances(ledger, sub)?,
        Some(("loans", sub)) => loans(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn range(sub: &clap::ArgMatches) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let from = match sub.get_one::<String>("from") {
        Some(d) => Some(day_start(parse_date(d)?)),
        None => None,
    };
    let to = match sub.get_one::<String>("to") {
        Some(d) => Some(day_start(parse_date(d)?)),
        None => None,
    };
    Ok((from, to))
}

fn summary(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let (from, to) = range(sub)?;
    let s = stats::summary(ledger, from, to);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        let ccy = get_currency(ledger)?;
        println!(
            "{}",
            pretty_table(
                &["Income", "Expense", "Net"],
                vec![vec![
                    fmt_money(&s.income, &ccy),
                    fmt_money(&s.expense, &ccy),
                    fmt_money(&s.net, &ccy),
                ]],
            )
        );
    }
    Ok(())
}

fn spend_by_category(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let (from, to) = range(sub)?;
    let ccy = get_currency(ledger)?;
    let data: Vec<Vec<String>> = stats::spending_by_category(ledger, from, to)
        .into_iter()
        .map(|(cid, amt)| {
            let name = match cid {
                Some(_) => category_name(ledger, cid),
                None => "(uncategorized)".to_string(),
            };
            vec![name, fmt_money(&amt, &ccy)]
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!("{}", pretty_table(&["Category", "Spent"], data));
    }
    Ok(())
}

fn balances(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let ccy = get_currency(ledger)?;
    let mut data: Vec<Vec<String>> = ledger
        .accounts()
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.kind.to_string(),
                fmt_money(&a.balance, &ccy),
            ]
        })
        .collect();
    data.push(vec![
        "Net worth".to_string(),
        String::new(),
        fmt_money(&stats::net_worth(ledger), &ccy),
    ]);
    data.push(vec![
        "Projected savings".to_string(),
        String::new(),
        fmt_money(&stats::projected_savings(ledger), &ccy),
    ]);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!("{}", pretty_table(&["Account", "Kind", "Balance"], data));
    }
    Ok(())
}

fn loans(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let s = stats::loan_summary(ledger);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        let ccy = get_currency(ledger)?;
        println!(
            "{}",
            pretty_table(
                &["", "Total", "Outstanding"],
                vec![
                    vec![
                        "Borrowed in".to_string(),
                        fmt_money(&s.borrowed_in, &ccy),
                        fmt_money(&s.outstanding_in, &ccy),
                    ],
                    vec![
                        "Lent out".to_string(),
                        fmt_money(&s.borrowed_out, &ccy),
                        fmt_money(&s.outstanding_out, &ccy),
                    ],
                ],
            )
        );
    }
    Ok(())
}
