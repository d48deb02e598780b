// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, command, value_parser};

pub fn build_cli() -> Command {
    command!()
        .name("homeledger")
        .about("Shared household expenses, cost splitting, loans and template-driven budgets")
        .arg(
            arg!(--db <PATH> "SQLite database file")
                .env("HOMELEDGER_DB")
                .global(true),
        )
        .arg(
            Arg::new("as")
                .long("as")
                .value_name("USER_ID")
                .help("Acting user")
                .env("HOMELEDGER_USER")
                .value_parser(value_parser!(i64))
                .global(true),
        )
        .arg(
            arg!(--household <ID> "Household to act in (defaults to the user's first household)")
                .env("HOMELEDGER_HOUSEHOLD")
                .value_parser(value_parser!(i64))
                .global(true),
        )
        .arg(
            arg!(--"log-level" <LEVEL> "error|warn|info|debug|trace (RUST_LOG wins when set)")
                .default_value("warn")
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("user")
                .about("Registered users")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--email <EMAIL>)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(household_cmd())
        .subcommand(movement_cmd())
        .subcommand(template_cmd())
        .subcommand(budget_cmd())
        .subcommand(card_cmd())
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("movements")
                        .arg(
                            arg!(--format <FORMAT> "csv|json")
                                .required(true)
                                .value_parser(["csv", "json"]),
                        )
                        .arg(arg!(--out <PATH>).required(true))
                        .arg(arg!(--from <DATE> "YYYY-MM-DD"))
                        .arg(arg!(--to <DATE> "YYYY-MM-DD")),
                ),
        )
        .subcommand(Command::new("doctor").about("Check ledger consistency"))
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Output JSON").action(ArgAction::SetTrue))
        .arg(arg!(--jsonl "Output JSON Lines").action(ArgAction::SetTrue))
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn type_arg(help: &'static str) -> Arg {
    Arg::new("type")
        .long("type")
        .value_name("TYPE")
        .help(help)
        .required(true)
}

fn role_arg() -> Arg {
    arg!(--role <ROLE> "owner|member")
        .value_parser(["owner", "member"])
        .default_value("member")
}

fn household_cmd() -> Command {
    let user = || {
        arg!(--user <USER_ID>)
            .required(true)
            .value_parser(value_parser!(i64))
    };
    Command::new("household")
        .about("Households and the people, accounts and categories in them")
        .subcommand(Command::new("create").arg(arg!(--name <NAME>).required(true)))
        .subcommand(
            Command::new("member")
                .subcommand(Command::new("add").arg(user()).arg(role_arg()))
                .subcommand(
                    Command::new("role")
                        .arg(user())
                        .arg(
                            arg!(--role <ROLE> "owner|member")
                                .required(true)
                                .value_parser(["owner", "member"]),
                        ),
                )
                .subcommand(Command::new("rm").arg(user()))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("contact")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--email <EMAIL>))
                        .arg(arg!(--phone <PHONE>)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("account")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(
                            type_arg("savings|checking|cash|other")
                                .value_parser(["savings", "checking", "cash", "other"]),
                        )
                        .arg(arg!(--initial <AMOUNT> "Opening balance").default_value("0")),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("card")
                .about("Payment methods")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(
                            type_arg("cash|debit|credit|other")
                                .value_parser(["cash", "debit", "credit", "other"]),
                        )
                        .arg(arg!(--shared "Usable by every member").action(ArgAction::SetTrue)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("category")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--group <GROUP>)),
                )
                .subcommand(Command::new("list")),
        )
}

/// Arguments describing a movement of each kind; shared by `movement add` and `template add`,
/// which add their own arguments through `extra`.
fn kind_subcommands(cmd: Command, extra: fn(Command) -> Command) -> Command {
    let base = |name: &'static str| {
        extra(Command::new(name).arg(arg!(--amount <AMOUNT>).required(true)))
    };
    cmd.subcommand(
        base("household")
            .about("Household expense paid by one member")
            .arg(arg!(--payer <USER_ID>).required(true).value_parser(value_parser!(i64)))
            .arg(arg!(--category <CATEGORY>).required(true))
            .arg(arg!(--"payment-method" <PAYMENT_METHOD>).required(true)),
    )
    .subcommand(
        base("split")
            .about("Expense divided among participants")
            .arg(arg!(--payer <WHO> "member:ID or contact:ID").required(true))
            .arg(arg!(--category <CATEGORY>).required(true))
            .arg(arg!(--"payment-method" <PAYMENT_METHOD>))
            .arg(
                arg!(--participant <WHO> "member:ID or contact:ID, repeatable")
                    .required(true)
                    .action(ArgAction::Append),
            )
            .arg(
                arg!(--percent <PCT> "Share per participant, e.g. 50% or 0.5")
                    .action(ArgAction::Append)
                    .conflicts_with("share"),
            )
            .arg(arg!(--share <AMOUNT> "Exact amount per participant").action(ArgAction::Append)),
    )
    .subcommand(
        base("loan")
            .about("Money lent or repaid between two people")
            .arg(
                arg!(--direction <DIRECTION> "lend|repay")
                    .required(true)
                    .value_parser(["lend", "repay"]),
            )
            .arg(arg!(--payer <WHO>).required(true))
            .arg(arg!(--counterparty <WHO>).required(true))
            .arg(arg!(--"payment-method" <PAYMENT_METHOD>))
            .arg(arg!(--"receiver-account" <ACCOUNT> "Required when the counterparty is a member")),
    )
    .subcommand(
        base("income")
            .about("Money received by a member")
            .arg(arg!(--member <USER_ID>).required(true).value_parser(value_parser!(i64)))
            .arg(arg!(--account <ACCOUNT>).required(true))
            .arg(
                arg!(--"income-type" <TYPE>)
                    .value_parser([
                        "salary",
                        "bonus",
                        "reimbursement",
                        "gift",
                        "savings_withdrawal",
                        "other_income",
                    ])
                    .default_value("other_income"),
            ),
    )
}

fn movement_cmd() -> Command {
    Command::new("movement")
        .about("Record and inspect movements")
        .subcommand(kind_subcommands(Command::new("add"), |c| {
            c.arg(arg!(--date <DATE> "YYYY-MM-DD").required(true))
                .arg(arg!(--description <TEXT>).required(true))
        }))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--amount <AMOUNT>))
                .arg(arg!(--date <DATE>))
                .arg(arg!(--description <TEXT>))
                .arg(arg!(--participant <WHO>).action(ArgAction::Append))
                .arg(
                    arg!(--percent <PCT>)
                        .action(ArgAction::Append)
                        .conflicts_with("share"),
                )
                .arg(arg!(--share <AMOUNT>).action(ArgAction::Append)),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(json_flags(Command::new("show").arg(id_arg())))
        .subcommand(json_flags(
            Command::new("list")
                .arg(arg!(--category <CATEGORY>))
                .arg(arg!(--from <DATE>))
                .arg(arg!(--to <DATE>))
                .arg(arg!(--payer <WHO>))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_name("TYPE")
                        .value_parser(["household", "split", "loan", "income"]),
                ),
        ))
}

fn template_cmd() -> Command {
    let add = kind_subcommands(Command::new("add"), |c| {
        c.arg(arg!(--name <NAME>).required(true))
            .arg(
                arg!(--day <DAY> "Day of month, 1-31")
                    .required(true)
                    .value_parser(value_parser!(u32).range(1..=31)),
            )
            .arg(arg!(--auto "Generate the movement every month").action(ArgAction::SetTrue))
    });
    Command::new("template")
        .about("Recurring movements feeding budget floors")
        .subcommand(add)
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(arg!(--amount <AMOUNT>))
                .arg(arg!(--day <DAY>).value_parser(value_parser!(u32).range(1..=31)))
                .arg(arg!(--auto <BOOL>).value_parser(value_parser!(bool))),
        )
        .subcommand(Command::new("activate").arg(id_arg()))
        .subcommand(Command::new("deactivate").arg(id_arg()))
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(
            Command::new("generate")
                .about("Create the month's movements of auto-generating templates")
                .arg(arg!(--month <MONTH> "YYYY-MM").required(true)),
        )
}

fn budget_cmd() -> Command {
    let month = || arg!(--month <MONTH> "YYYY-MM").required(true);
    Command::new("budget")
        .about("Monthly category budgets")
        .subcommand(
            Command::new("set")
                .arg(arg!(--category <CATEGORY>).required(true))
                .arg(month())
                .arg(arg!(--amount <AMOUNT>).required(true)),
        )
        .subcommand(json_flags(Command::new("list").arg(month())))
        .subcommand(Command::new("copy").about("Copy the previous month's budgets").arg(month()))
        .subcommand(json_flags(Command::new("report").arg(month())))
}

fn card_cmd() -> Command {
    Command::new("card")
        .about("Credit card payments")
        .subcommand(
            Command::new("pay")
                .arg(arg!(--card <PAYMENT_METHOD>).required(true))
                .arg(arg!(--amount <AMOUNT>).required(true))
                .arg(arg!(--date <DATE>).required(true))
                .arg(arg!(--from <ACCOUNT> "Savings account funding the payment").required(true))
                .arg(arg!(--notes <TEXT>)),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(id_arg()))
}
