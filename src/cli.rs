// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::SetTrue)
}

fn with_output_flags(cmd: Command) -> Command {
    cmd.arg(flag("json", "Print as pretty JSON"))
        .arg(flag("jsonl", "Print as JSON lines"))
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand(
            Command::new("add")
                .about("Add an account")
                .arg(req("name", "Display name"))
                .arg(
                    opt("kind", "cash|bank|credit|savings|investment")
                        .default_value("bank"),
                )
                .arg(opt("opening", "Opening balance").default_value("0")),
        )
        .subcommand(with_output_flags(
            Command::new("list").about("List accounts with balances"),
        ))
        .subcommand(
            Command::new("edit")
                .about("Edit an account")
                .arg(req("account", "Account name or id"))
                .arg(opt("name", "New name"))
                .arg(opt("kind", "New kind"))
                .arg(opt("opening", "New opening balance")),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove an account (transactions are kept)")
                .arg(req("account", "Account name or id")),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand(
            Command::new("add")
                .about("Add a category")
                .arg(req("name", "Category name"))
                .arg(opt("kind", "income|expense").default_value("expense"))
                .arg(opt("icon", "Icon reference"))
                .arg(opt("parent", "Parent category name or id")),
        )
        .subcommand(with_output_flags(
            Command::new("list")
                .about("List categories")
                .arg(opt("kind", "income|expense")),
        ))
        .subcommand(
            Command::new("rm")
                .about("Remove a category")
                .arg(req("category", "Category name or id")),
        )
}

fn member_cmd() -> Command {
    Command::new("member")
        .about("Manage household members")
        .subcommand(
            Command::new("add")
                .about("Add a member")
                .arg(req("name", "Member name"))
                .arg(opt("avatar", "Avatar reference")),
        )
        .subcommand(with_output_flags(
            Command::new("list")
                .about("List members")
                .arg(flag("all", "Include inactive members")),
        ))
        .subcommand(
            Command::new("toggle")
                .about("Flip a member's active flag")
                .arg(req("member", "Member name or id")),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove a member")
                .arg(req("member", "Member name or id")),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and browse transactions")
        .subcommand(
            Command::new("add")
                .about("Record an income or expense")
                .arg(req("account", "Account name or id"))
                .arg(req("amount", "Positive amount"))
                .arg(opt("type", "income|expense").default_value("expense"))
                .arg(opt("category", "Category name or id"))
                .arg(opt("member", "Member name or id"))
                .arg(opt("date", "YYYY-MM-DD (default now)"))
                .arg(opt("note", "Free text")),
        )
        .subcommand(with_output_flags(
            Command::new("list")
                .about("List transactions")
                .arg(opt("account", "Account name or id"))
                .arg(opt("member", "Member name or id"))
                .arg(opt("type", "income|expense|transfer"))
                .arg(opt("category-kind", "income|expense"))
                .arg(opt("from", "Start date, inclusive"))
                .arg(opt("to", "End date, exclusive"))
                .arg(opt("limit", "Maximum rows").value_parser(value_parser!(usize)))
                .arg(flag("oldest", "Oldest first instead of newest first")),
        ))
        .subcommand(
            Command::new("edit")
                .about("Edit a transaction")
                .arg(req("id", "Transaction id"))
                .arg(opt("amount", "New amount"))
                .arg(opt("type", "income|expense"))
                .arg(opt("account", "Account name or id"))
                .arg(opt("category", "Category name or id"))
                .arg(opt("member", "Member name or id"))
                .arg(opt("date", "YYYY-MM-DD"))
                .arg(opt("note", "Free text")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a transaction")
                .arg(req("id", "Transaction id")),
        )
        .subcommand(
            Command::new("transfer")
                .about("Move money between two accounts")
                .arg(req("from", "Source account"))
                .arg(req("to", "Destination account"))
                .arg(req("amount", "Positive amount"))
                .arg(opt("member", "Member name or id"))
                .arg(opt("date", "YYYY-MM-DD (default now)"))
                .arg(opt("note", "Free text")),
        )
}

fn loan_cmd() -> Command {
    Command::new("loan")
        .about("Track money borrowed and lent")
        .subcommand(
            Command::new("add")
                .about("Record a loan")
                .arg(req("type", "borrow-in|borrow-out"))
                .arg(req("amount", "Positive amount"))
                .arg(req("account", "Account name or id"))
                .arg(req("counterparty", "Who the loan is with"))
                .arg(opt("member", "Member name or id"))
                .arg(opt("date", "YYYY-MM-DD (default now)"))
                .arg(opt("note", "Free text")),
        )
        .subcommand(with_output_flags(
            Command::new("list")
                .about("List loans")
                .arg(flag("open", "Only loans not yet settled")),
        ))
        .subcommand(
            Command::new("settle")
                .about("Mark a loan settled")
                .arg(req("id", "Loan id"))
                .arg(flag("undo", "Mark as open again")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a loan")
                .arg(req("id", "Loan id")),
        )
}

fn alloc_cmd() -> Command {
    Command::new("alloc")
        .about("Income allocation weights")
        .subcommand(
            Command::new("set")
                .about("Set an account's share of income (0 removes it)")
                .arg(req("account", "Account name or id"))
                .arg(req("percent", "0-100").value_parser(value_parser!(u8))),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove an account's allocation row")
                .arg(req("account", "Account name or id")),
        )
        .subcommand(with_output_flags(
            Command::new("list").about("List allocation weights"),
        ))
        .subcommand(
            Command::new("distribute")
                .about("Record income split across accounts by weight")
                .arg(req("amount", "Gross income"))
                .arg(opt("category", "Income category name or id"))
                .arg(opt("member", "Member name or id"))
                .arg(opt("date", "YYYY-MM-DD (default now)"))
                .arg(opt("note", "Free text")),
        )
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Statistics")
        .subcommand(with_output_flags(
            Command::new("summary")
                .about("Income, expense and net")
                .arg(opt("from", "Start date, inclusive"))
                .arg(opt("to", "End date, exclusive")),
        ))
        .subcommand(with_output_flags(
            Command::new("categories")
                .about("Spending by category")
                .arg(opt("from", "Start date, inclusive"))
                .arg(opt("to", "End date, exclusive")),
        ))
        .subcommand(with_output_flags(
            Command::new("balances").about("Account balances and net worth"),
        ))
        .subcommand(with_output_flags(
            Command::new("loans").about("Borrowed and lent totals"),
        ))
}

fn backup_cmd() -> Command {
    Command::new("backup")
        .about("Export and restore the whole ledger")
        .subcommand(
            Command::new("export")
                .about("Write a timestamped backup file")
                .arg(opt("format", "json|csv").default_value("json"))
                .arg(opt("dir", "Target directory (default: data dir)")),
        )
        .subcommand(
            Command::new("import")
                .about("Replace the ledger with a backup file")
                .arg(req("path", "Backup file (.json or .csv)")),
        )
        .subcommand(
            Command::new("list")
                .about("List backup files, newest first")
                .arg(opt("dir", "Directory to scan (default: data dir)")),
        )
}

fn config_cmd() -> Command {
    Command::new("config").about("Preferences").subcommand(
        Command::new("currency")
            .about("Show or set the display currency")
            .arg(opt("set", "ISO currency code")),
    )
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .about("Household ledger: accounts, transactions, loans, income allocation")
        .version(crate_version!())
        .subcommand(Command::new("init").about("Create the data store"))
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(member_cmd())
        .subcommand(tx_cmd())
        .subcommand(loan_cmd())
        .subcommand(alloc_cmd())
        .subcommand(report_cmd())
        .subcommand(backup_cmd())
        .subcommand(config_cmd())
}
