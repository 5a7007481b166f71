// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use fintrack::events::NullSink;
use fintrack::store::SqliteStore;
use fintrack::{Ledger, cli, commands, db, utils};

fn main() -> Result<()> {
    env_logger::init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let store = SqliteStore::new(db::open_or_init()?)?;
    let mut ledger = Ledger::open(store, NullSink)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Data store initialized at {}", db::db_path()?.display());
        }
        Some(("account", sub)) => commands::accounts::handle(&mut ledger, sub)?,
        Some(("category", sub)) => commands::categories::handle(&mut ledger, sub)?,
        Some(("member", sub)) => commands::members::handle(&mut ledger, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut ledger, sub)?,
        Some(("loan", sub)) => commands::loans::handle(&mut ledger, sub)?,
        Some(("alloc", sub)) => commands::allocations::handle(&mut ledger, sub)?,
        Some(("report", sub)) => commands::reports::handle(&ledger, sub)?,
        Some(("backup", sub)) => commands::backups::handle(&mut ledger, sub)?,
        Some(("config", sub)) => {
            if let Some(("currency", c)) = sub.subcommand() {
                if let Some(ccy) = c.get_one::<String>("set") {
                    utils::set_currency(&ledger, ccy)?;
                }
                println!("Currency: {}", utils::get_currency(&ledger)?);
            }
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
