use crate::config::AppPaths;
use crate::domain::{Category, Expense, ExpenseView};
use crate::filter::{DateRange, FilterCriteria};
use crate::source::RecordSource;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct Db {
    conn: Connection,
}

/// Columns of an expense row before parsing.
struct RawExpense {
    id: String,
    category_id: String,
    amount: String,
    date: NaiveDate,
    comment: Option<String>,
}

impl RawExpense {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            category_id: row.get(1)?,
            amount: row.get(2)?,
            date: row.get(3)?,
            comment: row.get(4)?,
        })
    }

    fn decode(self) -> Result<Expense> {
        Ok(Expense {
            id: Uuid::parse_str(&self.id).context("Invalid expense UUID in DB")?,
            category_id: Uuid::parse_str(&self.category_id)
                .context("Invalid category UUID in expenses table")?,
            amount: self
                .amount
                .parse::<Decimal>()
                .context("Invalid decimal amount in expenses table")?,
            date: self.date,
            comment: self.comment,
        })
    }
}

const EXPENSE_COLUMNS: &str = "e.id, e.category_id, e.amount, e.date, e.comment";

impl Db {
    pub fn open(paths: &AppPaths) -> Result<(Self, PathBuf)> {
        fs::create_dir_all(&paths.data_dir)
            .with_context(|| format!("Failed to create data dir {}", paths.data_dir.display()))?;

        let db_path = paths.data_dir.join("spendbook.sqlite3");
        let db = Self::open_at(&db_path)?;
        Ok((db, db_path))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DB {}", path.display()))?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 64)
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_name ON categories(name);

            CREATE TABLE IF NOT EXISTS expenses (
                id TEXT PRIMARY KEY,
                category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                comment TEXT CHECK (comment IS NULL OR length(comment) <= 256)
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id);
            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            "#,
        )?;
        Ok(())
    }

    pub fn insert_category(&self, category: &Category) -> Result<()> {
        self.conn.execute(
            "INSERT INTO categories (id, name) VALUES (?1, ?2)",
            params![category.id.to_string(), category.name],
        )?;
        Ok(())
    }

    /// Categories in insertion order.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY rowid ASC")?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            Ok((id, name))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, name) = row?;
            let id = Uuid::parse_str(&id).context("Invalid category UUID in DB")?;
            out.push(Category { id, name });
        }
        Ok(out)
    }

    pub fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM categories WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.map(|name| Category { id, name }))
    }

    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            None => Ok(None),
            Some(id) => Ok(Some(Category {
                id: Uuid::parse_str(&id).context("Invalid category UUID in DB")?,
                name: name.to_string(),
            })),
        }
    }

    /// Returns the number of rows changed (0 when the id is unknown).
    pub fn rename_category(&self, id: Uuid, name: &str) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE categories SET name = ?2 WHERE id = ?1",
            params![id.to_string(), name],
        )?;
        Ok(changed)
    }

    pub fn delete_category(&self, id: Uuid) -> Result<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id.to_string()])?;
        Ok(changed)
    }

    pub fn count_expenses_in_category(&self, id: Uuid) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE category_id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn insert_expense(&self, expense: &Expense) -> Result<()> {
        self.conn.execute(
            "INSERT INTO expenses (id, category_id, amount, date, comment) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                expense.id.to_string(),
                expense.category_id.to_string(),
                expense.amount.to_string(),
                expense.date,
                expense.comment,
            ],
        )?;
        Ok(())
    }

    pub fn update_expense(&self, expense: &Expense) -> Result<usize> {
        let changed = self.conn.execute(
            r#"
            UPDATE expenses
            SET category_id = ?2, amount = ?3, date = ?4, comment = ?5
            WHERE id = ?1
            "#,
            params![
                expense.id.to_string(),
                expense.category_id.to_string(),
                expense.amount.to_string(),
                expense.date,
                expense.comment,
            ],
        )?;
        Ok(changed)
    }

    pub fn delete_expense(&self, id: Uuid) -> Result<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id.to_string()])?;
        Ok(changed)
    }

    pub fn get_expense(&self, id: Uuid) -> Result<Option<Expense>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {EXPENSE_COLUMNS} FROM expenses e WHERE e.id = ?1"),
                params![id.to_string()],
                RawExpense::from_row,
            )
            .optional()?;
        raw.map(RawExpense::decode).transpose()
    }

    pub fn get_expense_view(&self, id: Uuid) -> Result<Option<ExpenseView>> {
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {EXPENSE_COLUMNS}, c.name FROM expenses e
                     JOIN categories c ON c.id = e.category_id
                     WHERE e.id = ?1"
                ),
                params![id.to_string()],
                |row| Ok((RawExpense::from_row(row)?, row.get::<_, String>(5)?)),
            )
            .optional()?;

        match raw {
            None => Ok(None),
            Some((raw, name)) => Ok(Some(ExpenseView::new(raw.decode()?, name))),
        }
    }

    /// Every expense joined with its category name, in insertion order.
    pub fn list_expense_views(&self) -> Result<Vec<ExpenseView>> {
        self.query_expense_views("", [])
    }

    /// Like [`Db::list_expense_views`], restricted to `start..=end`. The same
    /// four-digit year caveat as [`Db::list_expenses_between`] applies.
    pub fn list_expense_views_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExpenseView>> {
        self.query_expense_views("WHERE e.date >= ?1 AND e.date <= ?2", params![start, end])
    }

    fn query_expense_views<P: rusqlite::Params>(
        &self,
        where_clause: &str,
        args: P,
    ) -> Result<Vec<ExpenseView>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS}, c.name FROM expenses e
             JOIN categories c ON c.id = e.category_id
             {where_clause}
             ORDER BY e.rowid ASC"
        ))?;

        let rows = stmt.query_map(args, |row| {
            Ok((RawExpense::from_row(row)?, row.get::<_, String>(5)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (raw, name) = row?;
            out.push(ExpenseView::new(raw.decode()?, name));
        }
        Ok(out)
    }

    pub fn list_expenses_in_category(&self, category_id: Uuid) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses e WHERE e.category_id = ?1 ORDER BY e.rowid ASC"
        ))?;
        let rows = stmt.query_map(params![category_id.to_string()], RawExpense::from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }

    /// Expenses dated between `start` and `end` inclusive.
    ///
    /// Relies on `YYYY-MM-DD` text ordering, so both ends must have
    /// four-digit, non-negative years.
    pub fn list_expenses_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses e
             WHERE e.date >= ?1 AND e.date <= ?2
             ORDER BY e.rowid ASC"
        ))?;
        let rows = stmt.query_map(params![start, end], RawExpense::from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }

    pub fn list_expenses(&self) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses e ORDER BY e.rowid ASC"
        ))?;
        let rows = stmt.query_map([], RawExpense::from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }
}

/// Whether `date` renders as a fixed-width `YYYY-MM-DD` string.
fn text_comparable(date: NaiveDate) -> bool {
    (0..=9999).contains(&date.year())
}

impl RecordSource for Db {
    type Error = anyhow::Error;

    fn fetch_expenses(&self, criteria: &FilterCriteria) -> Result<Vec<ExpenseView>> {
        // Only the date bounds are pushed down; amounts are stored as text.
        let dates = criteria.dates();
        if !text_comparable(dates.start()) || !text_comparable(dates.end()) {
            return self.list_expense_views();
        }
        self.list_expense_views_between(dates.start(), dates.end())
    }

    fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.list_categories()
    }

    fn fetch_expenses_by_category(
        &self,
        category_id: Uuid,
        dates: DateRange,
    ) -> Result<Vec<Expense>> {
        Ok(self
            .list_expenses_in_category(category_id)?
            .into_iter()
            .filter(|e| dates.contains(e.date))
            .collect())
    }

    fn fetch_expenses_by_year(&self, year: i32) -> Result<Vec<Expense>> {
        if !(0..=9999).contains(&year) {
            return Ok(self
                .list_expenses()?
                .into_iter()
                .filter(|e| e.date.year() == year)
                .collect());
        }

        let start = NaiveDate::from_ymd_opt(year, 1, 1).context("Invalid year")?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31).context("Invalid year")?;
        self.list_expenses_between(start, end)
    }
}
