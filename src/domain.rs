use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CATEGORY_NAME_MAX_LEN: usize = 64;
pub const COMMENT_MAX_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub category_id: Uuid,
    /// Signed amount: positive is income, zero or negative is spending.
    pub amount: Decimal,
    pub date: NaiveDate,
    pub comment: Option<String>,
}

/// An expense joined with the current name of its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseView {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub comment: Option<String>,
}

impl ExpenseView {
    pub fn new(expense: Expense, category_name: impl Into<String>) -> Self {
        Self {
            id: expense.id,
            category_id: expense.category_id,
            category_name: category_name.into(),
            amount: expense.amount,
            date: expense.date,
            comment: expense.comment,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub category_id: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub comment: Option<String>,
}

/// Partial update: `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub category_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub comment: Option<String>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.comment.is_none()
    }

    /// Applies the provided fields and reports whether anything changed.
    pub fn apply_to(&self, expense: &mut Expense) -> bool {
        let mut changed = false;

        if let Some(id) = self.category_id {
            if id != expense.category_id {
                expense.category_id = id;
                changed = true;
            }
        }
        if let Some(amount) = self.amount {
            if amount != expense.amount {
                expense.amount = amount;
                changed = true;
            }
        }
        if let Some(date) = self.date {
            if date != expense.date {
                expense.date = date;
                changed = true;
            }
        }
        if let Some(comment) = &self.comment {
            if expense.comment.as_deref() != Some(comment.as_str()) {
                expense.comment = Some(comment.clone());
                changed = true;
            }
        }

        changed
    }
}
