//! Expense tracking core: filter validation, sort parsing, query composition
//! and income/expense statistics over a pluggable record source.
//!
//! The `filter`, `sort`, `query` and `stats` modules are pure; they read from a
//! [`source::RecordSource`] handed in by the caller and never touch storage
//! themselves. [`db::Db`] is the SQLite-backed source used by the CLI.

pub mod catalog;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod export;
pub mod filter;
pub mod query;
pub mod sort;
pub mod source;
pub mod stats;

pub use error::{CatalogError, StatsError, ValidationError};
pub use filter::{
    DateRange, FilterCriteria, RawDateRange, RawFilter, validate_date_range, validate_filter,
};
pub use query::query_expenses;
pub use sort::{SortDirection, SortField, SortRule, SortSpec, parse_sort_spec};
pub use source::{InMemorySource, RecordSource};
pub use stats::{
    CategoryStats, MonthlyStats, TotalStats, category_stats, monthly_stats, total_stats,
};
