use thiserror::Error;
use uuid::Uuid;

/// Rejections of caller-supplied filter, date range or sort input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid {0} range: lower bound is greater than upper bound")]
    InvalidRange(&'static str),
    #[error("Invalid sort token: '{0}'")]
    MalformedToken(String),
    #[error("Invalid sort field: '{0}'")]
    UnknownField(String),
    #[error("Invalid sort direction: '{0}'")]
    UnknownDirection(String),
    #[error("Duplicated sort field: '{0}'")]
    DuplicateField(String),
}

/// Failures of the stats functions, generic over the record source's error.
#[derive(Debug, Error)]
pub enum StatsError<E> {
    #[error("Sum of {0} amounts is out of range")]
    Overflow(&'static str),
    #[error("{0:#}")]
    Source(E),
}

/// Failures of category and expense bookkeeping.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Category name must not be empty")]
    EmptyCategoryName,
    #[error("Category name is {0} characters long, the limit is 64")]
    CategoryNameTooLong(usize),
    #[error("Category already exists: '{0}'")]
    DuplicateCategory(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Category {0} still has expenses")]
    CategoryInUse(Uuid),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(Uuid),
    #[error("Comment is {0} characters long, the limit is 256")]
    CommentTooLong(usize),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
