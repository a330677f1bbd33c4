use chrono::Datelike;
use std::collections::HashMap;
use std::convert::Infallible;
use uuid::Uuid;

use crate::domain::{Category, Expense, ExpenseView};
use crate::filter::{DateRange, FilterCriteria};

/// Where the query and stats functions read records from.
///
/// Implementations may narrow results using the arguments they are given, but
/// callers re-check every bound, so returning a superset is always correct.
pub trait RecordSource {
    type Error;

    /// Every expense joined with its category's current name.
    fn fetch_expenses(&self, criteria: &FilterCriteria) -> Result<Vec<ExpenseView>, Self::Error>;

    fn fetch_categories(&self) -> Result<Vec<Category>, Self::Error>;

    fn fetch_expenses_by_category(
        &self,
        category_id: Uuid,
        dates: DateRange,
    ) -> Result<Vec<Expense>, Self::Error>;

    fn fetch_expenses_by_year(&self, year: i32) -> Result<Vec<Expense>, Self::Error>;
}

/// Plain vectors, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    categories: Vec<Category>,
    expenses: Vec<Expense>,
}

impl InMemorySource {
    pub fn new(categories: Vec<Category>, expenses: Vec<Expense>) -> Self {
        Self {
            categories,
            expenses,
        }
    }

    pub fn push_category(&mut self, category: Category) {
        self.categories.push(category);
    }

    pub fn push_expense(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }
}

impl RecordSource for InMemorySource {
    type Error = Infallible;

    fn fetch_expenses(&self, _criteria: &FilterCriteria) -> Result<Vec<ExpenseView>, Infallible> {
        let names: HashMap<Uuid, &str> = self
            .categories
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect();

        // Expenses pointing at an unknown category have nothing to join with.
        Ok(self
            .expenses
            .iter()
            .filter_map(|e| {
                names
                    .get(&e.category_id)
                    .map(|name| ExpenseView::new(e.clone(), *name))
            })
            .collect())
    }

    fn fetch_categories(&self) -> Result<Vec<Category>, Infallible> {
        Ok(self.categories.clone())
    }

    fn fetch_expenses_by_category(
        &self,
        category_id: Uuid,
        dates: DateRange,
    ) -> Result<Vec<Expense>, Infallible> {
        Ok(self
            .expenses
            .iter()
            .filter(|e| e.category_id == category_id && dates.contains(e.date))
            .cloned()
            .collect())
    }

    fn fetch_expenses_by_year(&self, year: i32) -> Result<Vec<Expense>, Infallible> {
        Ok(self
            .expenses
            .iter()
            .filter(|e| e.date.year() == year)
            .cloned()
            .collect())
    }
}
