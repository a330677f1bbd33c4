//! Category and expense bookkeeping on top of [`Db`], with the integrity
//! rules the tables alone cannot express as friendly errors.

use tracing::{debug, info};
use uuid::Uuid;

use crate::db::Db;
use crate::domain::{
    CATEGORY_NAME_MAX_LEN, COMMENT_MAX_LEN, Category, Expense, ExpenseUpdate, ExpenseView,
    NewExpense,
};
use crate::error::CatalogError;

pub type Result<T> = std::result::Result<T, CatalogError>;

pub struct Catalog<'a> {
    db: &'a Db,
}

fn normalize_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyCategoryName);
    }
    let len = name.chars().count();
    if len > CATEGORY_NAME_MAX_LEN {
        return Err(CatalogError::CategoryNameTooLong(len));
    }
    Ok(name.to_string())
}

fn check_comment(comment: Option<&str>) -> Result<()> {
    if let Some(c) = comment {
        let len = c.chars().count();
        if len > COMMENT_MAX_LEN {
            return Err(CatalogError::CommentTooLong(len));
        }
    }
    Ok(())
}

impl<'a> Catalog<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    pub fn add_category(&self, name: &str) -> Result<Category> {
        let name = normalize_name(name)?;
        if self.db.get_category_by_name(&name)?.is_some() {
            return Err(CatalogError::DuplicateCategory(name));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name,
        };
        self.db.insert_category(&category)?;
        info!(id = %category.id, name = %category.name, "added category");
        Ok(category)
    }

    /// All categories, ordered by name.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.db.list_categories()?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    /// Looks a category up by id, falling back to an exact name match.
    pub fn resolve_category(&self, key: &str) -> Result<Category> {
        let found = match Uuid::parse_str(key.trim()) {
            Ok(id) => self.db.get_category(id)?,
            Err(_) => self.db.get_category_by_name(key.trim())?,
        };
        found.ok_or_else(|| CatalogError::CategoryNotFound(key.to_string()))
    }

    pub fn rename_category(&self, id: Uuid, name: &str) -> Result<Category> {
        let name = normalize_name(name)?;
        if self.db.get_category(id)?.is_none() {
            return Err(CatalogError::CategoryNotFound(id.to_string()));
        }
        if let Some(other) = self.db.get_category_by_name(&name)? {
            if other.id != id {
                return Err(CatalogError::DuplicateCategory(name));
            }
        }

        self.db.rename_category(id, &name)?;
        info!(id = %id, name = %name, "renamed category");
        Ok(Category { id, name })
    }

    pub fn delete_category(&self, id: Uuid) -> Result<()> {
        if self.db.get_category(id)?.is_none() {
            return Err(CatalogError::CategoryNotFound(id.to_string()));
        }
        let in_use = self.db.count_expenses_in_category(id)?;
        if in_use > 0 {
            debug!(id = %id, expenses = in_use, "refusing to delete category in use");
            return Err(CatalogError::CategoryInUse(id));
        }

        self.db.delete_category(id)?;
        info!(id = %id, "deleted category");
        Ok(())
    }

    pub fn add_expense(&self, new: NewExpense) -> Result<ExpenseView> {
        let Some(category) = self.db.get_category(new.category_id)? else {
            return Err(CatalogError::CategoryNotFound(new.category_id.to_string()));
        };
        check_comment(new.comment.as_deref())?;

        let expense = Expense {
            id: Uuid::new_v4(),
            category_id: category.id,
            amount: new.amount,
            date: new.date,
            comment: new.comment,
        };
        self.db.insert_expense(&expense)?;
        info!(
            id = %expense.id,
            category = %category.name,
            amount = %expense.amount,
            "added expense"
        );
        Ok(ExpenseView::new(expense, category.name))
    }

    pub fn get_expense(&self, id: Uuid) -> Result<ExpenseView> {
        self.db
            .get_expense_view(id)?
            .ok_or(CatalogError::ExpenseNotFound(id))
    }

    /// Changes only the fields present in `update`.
    pub fn update_expense(&self, id: Uuid, update: ExpenseUpdate) -> Result<ExpenseView> {
        let Some(mut expense) = self.db.get_expense(id)? else {
            return Err(CatalogError::ExpenseNotFound(id));
        };

        if let Some(category_id) = update.category_id {
            if self.db.get_category(category_id)?.is_none() {
                return Err(CatalogError::CategoryNotFound(category_id.to_string()));
            }
        }
        check_comment(update.comment.as_deref())?;

        if update.apply_to(&mut expense) {
            self.db.update_expense(&expense)?;
            info!(id = %id, "updated expense");
        } else {
            debug!(id = %id, "expense update changed nothing");
        }

        self.get_expense(id)
    }

    pub fn delete_expense(&self, id: Uuid) -> Result<()> {
        if self.db.delete_expense(id)? == 0 {
            return Err(CatalogError::ExpenseNotFound(id));
        }
        info!(id = %id, "deleted expense");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn new_expense(category_id: Uuid, amount: i64) -> NewExpense {
        NewExpense {
            category_id,
            amount: Decimal::from(amount),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            comment: None,
        }
    }

    #[test]
    fn category_names_are_trimmed_unique_and_bounded() {
        let db = Db::open_in_memory().unwrap();
        let catalog = Catalog::new(&db);

        let food = catalog.add_category("  food ").unwrap();
        assert_eq!(food.name, "food");

        assert!(matches!(
            catalog.add_category("food"),
            Err(CatalogError::DuplicateCategory(_))
        ));
        assert!(matches!(
            catalog.add_category("   "),
            Err(CatalogError::EmptyCategoryName)
        ));
        assert!(matches!(
            catalog.add_category(&"x".repeat(65)),
            Err(CatalogError::CategoryNameTooLong(65))
        ));
        assert!(catalog.add_category(&"x".repeat(64)).is_ok());
        // Matching is exact, so a different case is a different category.
        assert!(catalog.add_category("Food").is_ok());
    }

    #[test]
    fn listing_is_by_name() {
        let db = Db::open_in_memory().unwrap();
        let catalog = Catalog::new(&db);
        for name in ["rent", "food", "travel"] {
            catalog.add_category(name).unwrap();
        }

        let names: Vec<_> = catalog
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["food", "rent", "travel"]);
    }

    #[test]
    fn rename_rejects_taken_names() {
        let db = Db::open_in_memory().unwrap();
        let catalog = Catalog::new(&db);
        let food = catalog.add_category("food").unwrap();
        catalog.add_category("rent").unwrap();

        assert!(matches!(
            catalog.rename_category(food.id, "rent"),
            Err(CatalogError::DuplicateCategory(_))
        ));
        assert_eq!(catalog.rename_category(food.id, "food").unwrap().name, "food");
        assert_eq!(
            catalog.rename_category(food.id, "groceries").unwrap().name,
            "groceries"
        );
        assert!(matches!(
            catalog.rename_category(Uuid::new_v4(), "x"),
            Err(CatalogError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn categories_in_use_cannot_be_deleted() {
        let db = Db::open_in_memory().unwrap();
        let catalog = Catalog::new(&db);
        let food = catalog.add_category("food").unwrap();
        let expense = catalog.add_expense(new_expense(food.id, -5)).unwrap();

        assert!(matches!(
            catalog.delete_category(food.id),
            Err(CatalogError::CategoryInUse(id)) if id == food.id
        ));

        catalog.delete_expense(expense.id).unwrap();
        catalog.delete_category(food.id).unwrap();
        assert!(matches!(
            catalog.delete_category(food.id),
            Err(CatalogError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn expenses_need_an_existing_category() {
        let db = Db::open_in_memory().unwrap();
        let catalog = Catalog::new(&db);

        assert!(matches!(
            catalog.add_expense(new_expense(Uuid::new_v4(), 1)),
            Err(CatalogError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn long_comments_are_rejected() {
        let db = Db::open_in_memory().unwrap();
        let catalog = Catalog::new(&db);
        let food = catalog.add_category("food").unwrap();

        let mut new = new_expense(food.id, -1);
        new.comment = Some("c".repeat(257));
        assert!(matches!(
            catalog.add_expense(new),
            Err(CatalogError::CommentTooLong(257))
        ));
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let db = Db::open_in_memory().unwrap();
        let catalog = Catalog::new(&db);
        let food = catalog.add_category("food").unwrap();
        let rent = catalog.add_category("rent").unwrap();

        let mut new = new_expense(food.id, -20);
        new.comment = Some("lunch".to_string());
        let created = catalog.add_expense(new).unwrap();

        let updated = catalog
            .update_expense(
                created.id,
                ExpenseUpdate {
                    category_id: Some(rent.id),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.category_name, "rent");
        assert_eq!(updated.amount, created.amount);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.comment.as_deref(), Some("lunch"));

        assert!(matches!(
            catalog.update_expense(
                created.id,
                ExpenseUpdate {
                    category_id: Some(Uuid::new_v4()),
                    ..Default::default()
                }
            ),
            Err(CatalogError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn missing_expenses_are_reported() {
        let db = Db::open_in_memory().unwrap();
        let catalog = Catalog::new(&db);
        let id = Uuid::new_v4();

        assert!(matches!(catalog.get_expense(id), Err(CatalogError::ExpenseNotFound(_))));
        assert!(matches!(catalog.delete_expense(id), Err(CatalogError::ExpenseNotFound(_))));
        assert!(matches!(
            catalog.update_expense(id, ExpenseUpdate::default()),
            Err(CatalogError::ExpenseNotFound(_))
        ));
    }
}
