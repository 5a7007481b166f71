// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{CategoryKind, NewCategory};
use crate::utils::{category_name, id_for_category, maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind: CategoryKind = sub
                .get_one::<String>("kind")
                .unwrap()
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let parent_id = match sub.get_one::<String>("parent") {
                Some(p) => Some(id_for_category(ledger, p)?),
                None => None,
            };
            let category = ledger.add_category(NewCategory {
                name: name.clone(),
                kind,
                icon: sub.get_one::<String>("icon").cloned(),
                parent_id,
            })?;
            println!("Added {} category '{}'", category.kind, category.name);
        }
        Some(("list", sub)) => {
            let kind = match sub.get_one::<String>("kind") {
                Some(k) => Some(k.parse::<CategoryKind>().map_err(|e| anyhow!(e))?),
                None => None,
            };
            let cats = ledger.categories(kind);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let rows = cats
                    .iter()
                    .map(|c| {
                        vec![
                            c.name.clone(),
                            c.kind.to_string(),
                            category_name(ledger, c.parent_id),
                            c.icon.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Kind", "Parent", "Icon"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = id_for_category(ledger, sub.get_one::<String>("category").unwrap())?;
            let removed = ledger.delete_category(id)?;
            println!("Removed category '{}'", removed.name);
        }
        _ => {}
    }
    Ok(())
}
