// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::NewMember;
use crate::utils::{id_for_member, maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let member = ledger.add_member(NewMember {
                name: sub.get_one::<String>("name").unwrap().clone(),
                avatar: sub.get_one::<String>("avatar").cloned(),
            })?;
            println!("Added member '{}'", member.name);
        }
        Some(("list", sub)) => {
            let active = if sub.get_flag("all") { None } else { Some(true) };
            let members = ledger.members(active);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &members)? {
                let rows = members
                    .iter()
                    .map(|m| {
                        vec![
                            m.name.clone(),
                            if m.is_active { "yes" } else { "no" }.to_string(),
                            m.created_at.format("%Y-%m-%d").to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Member", "Active", "Since"], rows));
            }
        }
        Some(("toggle", sub)) => {
            let id = id_for_member(ledger, sub.get_one::<String>("member").unwrap())?;
            let member = ledger.toggle_member_active(id)?;
            let state = if member.is_active { "active" } else { "inactive" };
            println!("Member '{}' is now {}", member.name, state);
        }
        Some(("rm", sub)) => {
            let id = id_for_member(ledger, sub.get_one::<String>("member").unwrap())?;
            let removed = ledger.delete_member(id)?;
            println!("Removed member '{}'", removed.name);
        }
        _ => {}
    }
    Ok(())
}
