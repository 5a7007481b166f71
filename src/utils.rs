// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ledger::Ledger;

pub const CURRENCY_KEY: &str = "currency_code";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Midnight UTC at the start of `date`.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Optional `YYYY-MM-DD` argument as a timestamp; now when absent.
pub fn date_or_now(s: Option<&String>) -> Result<DateTime<Utc>> {
    match s {
        Some(v) => Ok(day_start(parse_date(v)?)),
        None => Ok(Utc::now()),
    }
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim()).with_context(|| format!("Invalid id '{}'", s))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

/// Accepts an account id or its exact name.
pub fn id_for_account(ledger: &Ledger, key: &str) -> Result<Uuid> {
    let key = key.trim();
    if let Ok(id) = Uuid::parse_str(key) {
        if ledger.account(id).is_some() {
            return Ok(id);
        }
    }
    let hits = ledger.accounts().iter().filter(|a| a.name == key);
    Ok(single(hits, "Account", key)?.id)
}

pub fn id_for_category(ledger: &Ledger, key: &str) -> Result<Uuid> {
    let key = key.trim();
    if let Ok(id) = Uuid::parse_str(key) {
        if ledger.category(id).is_some() {
            return Ok(id);
        }
    }
    let hits = ledger.categories(None).into_iter().filter(|c| c.name == key);
    Ok(single(hits, "Category", key)?.id)
}

pub fn id_for_member(ledger: &Ledger, key: &str) -> Result<Uuid> {
    let key = key.trim();
    if let Ok(id) = Uuid::parse_str(key) {
        if ledger.member(id).is_some() {
            return Ok(id);
        }
    }
    let hits = ledger.members(None).into_iter().filter(|m| m.name == key);
    Ok(single(hits, "Member", key)?.id)
}

/// The only record a name lookup hit.
fn single<'a, T>(mut hits: impl Iterator<Item = &'a T>, what: &str, key: &str) -> Result<&'a T> {
    let first = hits
        .next()
        .ok_or_else(|| anyhow!("{} '{}' not found", what, key))?;
    if hits.next().is_some() {
        bail!("{} name '{}' is ambiguous; use its id", what, key);
    }
    Ok(first)
}

pub fn account_name(ledger: &Ledger, id: Uuid) -> String {
    ledger
        .account(id)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| format!("<deleted {}>", id))
}

pub fn category_name(ledger: &Ledger, id: Option<Uuid>) -> String {
    match id {
        Some(id) => ledger
            .category(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("<deleted {}>", id)),
        None => String::new(),
    }
}

pub fn member_name(ledger: &Ledger, id: Option<Uuid>) -> String {
    match id {
        Some(id) => ledger
            .member(id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| format!("<deleted {}>", id)),
        None => String::new(),
    }
}

pub fn get_currency(ledger: &Ledger) -> Result<String> {
    Ok(ledger
        .setting(CURRENCY_KEY)?
        .unwrap_or_else(|| "USD".to_string()))
}

pub fn set_currency(ledger: &Ledger, ccy: &str) -> Result<()> {
    ledger.set_setting(CURRENCY_KEY, &ccy.trim().to_uppercase())?;
    Ok(())
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
