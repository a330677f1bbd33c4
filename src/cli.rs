use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::num::NonZeroU32;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "spendbook")]
#[command(about = "Local-first expense tracker", long_about = None)]
pub struct Cli {
    /// Override spendbook home directory (config/data subdirs will be created inside it).
    #[arg(long, env = "SPENDBOOK_HOME")]
    pub home: Option<PathBuf>,

    /// Print results as JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Category(CategoryArgs),
    Expense(ExpenseArgs),
    Stats(StatsArgs),
    Export(ExportArgs),
}

#[derive(Debug, Subcommand)]
pub enum CategoryCmd {
    Add {
        name: String,
    },
    List,
    Rename {
        id: Uuid,
        name: String,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Debug, Args)]
pub struct CategoryArgs {
    #[command(subcommand)]
    pub cmd: CategoryCmd,
}

#[derive(Debug, Subcommand)]
pub enum ExpenseCmd {
    Add {
        /// Category id or exact name.
        category: String,

        /// Signed amount: positive for income, negative for spending.
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,

        /// Calendar date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, short = 'm', alias = "note")]
        comment: Option<String>,
    },
    Get {
        id: Uuid,
    },
    Update {
        id: Uuid,

        /// Category id or exact name.
        #[arg(long)]
        category: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        amount: Option<Decimal>,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, short = 'm', alias = "note")]
        comment: Option<String>,
    },
    Delete {
        id: Uuid,
    },
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct ExpenseArgs {
    #[command(subcommand)]
    pub cmd: ExpenseCmd,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only these categories (id or exact name). Repeatable.
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Earliest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<Decimal>,

    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<Decimal>,

    /// Sort rules like "date:desc,amount:asc".
    #[arg(long)]
    pub sort: Option<String>,

    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    pub page: u32,

    /// Page size. Defaults to `default_page_size` from the config.
    #[arg(long)]
    pub size: Option<NonZeroU32>,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct DateRangeArgs {
    /// Earliest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Subcommand)]
pub enum StatsCmd {
    Total(DateRangeArgs),
    ByCategory(DateRangeArgs),
    Monthly {
        #[arg(allow_negative_numbers = true)]
        year: i32,
    },
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub cmd: StatsCmd,
}

#[derive(Debug, Subcommand)]
pub enum ExportCmd {
    Csv {
        #[command(flatten)]
        range: DateRangeArgs,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(subcommand)]
    pub cmd: ExportCmd,
}
