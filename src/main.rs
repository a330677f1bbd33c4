mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    CategoryCmd, Cli, Command, DateRangeArgs, ExpenseCmd, ExportCmd, ListArgs, StatsCmd,
};
use spendbook::catalog::Catalog;
use spendbook::config::{
    AppConfig, DEFAULT_LOG_FILTER, app_paths, load_or_init_config, today_local,
};
use spendbook::db::Db;
use spendbook::domain::{ExpenseUpdate, ExpenseView, NewExpense};
use spendbook::export::write_csv;
use spendbook::{
    RawDateRange, RawFilter, category_stats, monthly_stats, parse_sort_spec, query_expenses,
    total_stats, validate_date_range, validate_filter,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &AppConfig) {
    let filter = EnvFilter::try_from_env("SPENDBOOK_LOG")
        .or_else(|_| EnvFilter::try_new(cfg.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = app_paths(cli.home.clone())?;
    let (cfg, cfg_path) = load_or_init_config(&paths)?;
    init_tracing(&cfg);

    let (db, db_path) = Db::open(&paths)?;
    tracing::debug!(config = %cfg_path.display(), db = %db_path.display(), "opened store");

    let out = Output { json: cli.json };
    match cli.command {
        Command::Category(args) => handle_category(&db, args.cmd, out),
        Command::Expense(args) => handle_expense(&db, &cfg, args.cmd, out),
        Command::Stats(args) => handle_stats(&db, args.cmd, out),
        Command::Export(args) => handle_export(&db, args.cmd),
    }
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn show<T: Serialize + ?Sized>(self, value: &T, table: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            table(value);
        }
        Ok(())
    }
}

fn handle_category(db: &Db, cmd: CategoryCmd, out: Output) -> Result<()> {
    let catalog = Catalog::new(db);

    match cmd {
        CategoryCmd::Add { name } => {
            let category = catalog.add_category(&name)?;
            out.show(&category, |c| {
                println!("Added category '{}' ({}).", c.name, c.id)
            })
        }
        CategoryCmd::List => {
            let categories = catalog.list_categories()?;
            out.show(&categories, |categories| {
                if categories.is_empty() {
                    println!("(no categories)");
                    return;
                }
                let rows: Vec<Vec<String>> = categories
                    .iter()
                    .map(|c| vec![c.name.clone(), c.id.to_string()])
                    .collect();
                print_table(&["name", "id"], &rows);
            })
        }
        CategoryCmd::Rename { id, name } => {
            let category = catalog.rename_category(id, &name)?;
            out.show(&category, |c| {
                println!("Renamed category {} to '{}'.", c.id, c.name)
            })
        }
        CategoryCmd::Delete { id } => {
            catalog.delete_category(id)?;
            out.show(&serde_json::json!({ "deleted": id }), |_| {
                println!("Deleted category {id}.")
            })
        }
    }
}

fn handle_expense(db: &Db, cfg: &AppConfig, cmd: ExpenseCmd, out: Output) -> Result<()> {
    let catalog = Catalog::new(db);

    match cmd {
        ExpenseCmd::Add {
            category,
            amount,
            date,
            comment,
        } => {
            let category = catalog.resolve_category(&category)?;
            let view = catalog.add_expense(NewExpense {
                category_id: category.id,
                amount,
                date: date.unwrap_or_else(today_local),
                comment,
            })?;
            out.show(&view, |v| {
                println!(
                    "Added expense {} ({} {} on {}).",
                    v.id, v.category_name, v.amount, v.date
                )
            })
        }
        ExpenseCmd::Get { id } => {
            let view = catalog.get_expense(id)?;
            out.show(&view, |v| print_expenses(std::slice::from_ref(v)))
        }
        ExpenseCmd::Update {
            id,
            category,
            amount,
            date,
            comment,
        } => {
            let category_id = match category {
                Some(key) => Some(catalog.resolve_category(&key)?.id),
                None => None,
            };
            let view = catalog.update_expense(
                id,
                ExpenseUpdate {
                    category_id,
                    amount,
                    date,
                    comment,
                },
            )?;
            out.show(&view, |v| print_expenses(std::slice::from_ref(v)))
        }
        ExpenseCmd::Delete { id } => {
            catalog.delete_expense(id)?;
            out.show(&serde_json::json!({ "deleted": id }), |_| {
                println!("Deleted expense {id}.")
            })
        }
        ExpenseCmd::List(args) => {
            let rows = list_expenses(db, &catalog, cfg, args)?;
            out.show(&rows, |rows| print_expenses(rows))
        }
    }
}

fn list_expenses(
    db: &Db,
    catalog: &Catalog<'_>,
    cfg: &AppConfig,
    args: ListArgs,
) -> Result<Vec<ExpenseView>> {
    let category_ids = if args.categories.is_empty() {
        None
    } else {
        let mut ids = Vec::with_capacity(args.categories.len());
        for key in &args.categories {
            ids.push(catalog.resolve_category(key)?.id);
        }
        Some(ids)
    };

    let criteria = validate_filter(RawFilter {
        category_ids,
        date_from: args.from,
        date_to: args.to,
        min_amount: args.min,
        max_amount: args.max,
        page: args.page,
        size: args.size.unwrap_or(cfg.default_page_size),
    })
    .context("Invalid filter")?;
    let spec =
        parse_sort_spec(args.sort.as_deref().unwrap_or_default()).context("Invalid --sort")?;

    query_expenses(db, &criteria, &spec)
}

fn date_range(args: DateRangeArgs) -> Result<spendbook::DateRange> {
    validate_date_range(RawDateRange {
        from: args.from,
        to: args.to,
    })
    .context("Invalid date range")
}

fn money_row(
    label: Option<&str>,
    net: impl ToString,
    income: impl ToString,
    expense: impl ToString,
) -> Vec<String> {
    let mut row = Vec::with_capacity(4);
    if let Some(label) = label {
        row.push(label.to_string());
    }
    row.push(net.to_string());
    row.push(income.to_string());
    row.push(expense.to_string());
    row
}

fn handle_stats(db: &Db, cmd: StatsCmd, out: Output) -> Result<()> {
    match cmd {
        StatsCmd::Total(args) => {
            let stats = total_stats(db, date_range(args)?)?;
            out.show(&stats, |s| {
                print_table(
                    &["net", "income", "expense"],
                    &[money_row(None, s.net, s.income, s.expense)],
                )
            })
        }
        StatsCmd::ByCategory(args) => {
            let stats = category_stats(db, date_range(args)?)?;
            out.show(&stats, |rows| {
                if rows.is_empty() {
                    println!("(no expenses)");
                    return;
                }
                let rows: Vec<Vec<String>> = rows
                    .iter()
                    .map(|s| money_row(Some(&s.category), s.net, s.income, s.expense))
                    .collect();
                print_table(&["category", "net", "income", "expense"], &rows);
            })
        }
        StatsCmd::Monthly { year } => {
            let stats = monthly_stats(db, year)?;
            out.show(&stats, |rows| {
                if rows.is_empty() {
                    println!("(no expenses)");
                    return;
                }
                let rows: Vec<Vec<String>> = rows
                    .iter()
                    .map(|s| money_row(Some(&s.month), s.net, s.income, s.expense))
                    .collect();
                print_table(&["month", "net", "income", "expense"], &rows);
            })
        }
    }
}

fn handle_export(db: &Db, cmd: ExportCmd) -> Result<()> {
    match cmd {
        ExportCmd::Csv { range, out } => {
            // Open-ended exports stop at today, or at `from` when that is later.
            let today = today_local();
            let range = date_range(DateRangeArgs {
                from: range.from,
                to: range
                    .to
                    .or_else(|| Some(range.from.map_or(today, |from| from.max(today)))),
            })?;

            match out {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let written = write_csv(db, range, file)?;
                    println!("Exported {written} expenses to {}", path.display());
                }
                None => {
                    write_csv(db, range, io::stdout().lock())?;
                }
            }
            Ok(())
        }
    }
}

fn print_expenses(rows: &[ExpenseView]) {
    if rows.is_empty() {
        println!("(no expenses)");
        return;
    }

    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|e| {
            vec![
                e.date.to_string(),
                e.category_name.clone(),
                e.amount.to_string(),
                e.comment.clone().unwrap_or_default(),
                e.id.to_string(),
            ]
        })
        .collect();
    print_table(&["date", "category", "amount", "comment", "id"], &rows);
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// Pipe-delimited table, columns padded to their widest cell. Cells past the
/// last header are dropped and missing cells render blank.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
        out.push('|');
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).copied().unwrap_or("");
            let pad = width.saturating_sub(cell.chars().count());
            out.push(' ');
            out.push_str(cell);
            out.extend(std::iter::repeat_n(' ', pad));
            out.push_str(" |");
        }
        out.push('\n');
    }

    let mut table = String::new();
    push_line(&mut table, headers, &widths);
    table.push('|');
    for width in &widths {
        table.push_str(&"-".repeat(width + 2));
        table.push('|');
    }
    table.push('\n');
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_line(&mut table, &cells, &widths);
    }
    table
}
