// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use crate::backup::{self, BackupFormat};
use crate::db;
use crate::ledger::Ledger;
use anyhow::{Context, Result, anyhow};

fn target_dir(sub: &clap::ArgMatches) -> Result<PathBuf> {
    match sub.get_one::<String>("dir") {
        Some(d) => Ok(PathBuf::from(d.trim())),
        None => db::backup_dir(),
    }
}

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("export", sub)) => {
            let format: BackupFormat = sub
                .get_one::<String>("format")
                .unwrap()
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let dir = target_dir(sub)?;
            let path = backup::export_snapshot(ledger, &dir, format)
                .with_context(|| format!("Export backup to {}", dir.display()))?;
            println!("Exported backup to {}", path.display());
        }
        Some(("import", sub)) => {
            let path = PathBuf::from(sub.get_one::<String>("path").unwrap().trim());
            let count = backup::import_snapshot(ledger, &path)
                .with_context(|| format!("Import backup {}", path.display()))?;
            println!("Restored {} records from {}", count, path.display());
        }
        Some(("list", sub)) => {
            let dir = target_dir(sub)?;
            let files = backup::list_backups(&dir)
                .with_context(|| format!("List backups in {}", dir.display()))?;
            if files.is_empty() {
                println!("No backups in {}", dir.display());
            }
            for f in files {
                println!("{}", f.display());
            }
        }
        _ => {}
    }
    Ok(())
}
