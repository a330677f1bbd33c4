//! Income/expense breakdowns.
//!
//! An amount counts as income when it is strictly positive. Everything else,
//! zero included, lands in the expense bucket, so `expense` sums are never
//! positive and `net = income + expense`.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::StatsError;
use crate::filter::{DateRange, FilterCriteria};
use crate::source::RecordSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Buckets {
    income: Decimal,
    expense: Decimal,
}

impl Buckets {
    /// On overflow, returns the name of the bucket that overflowed.
    fn add(&mut self, amount: Decimal) -> Result<(), &'static str> {
        let (bucket, label) = if amount > Decimal::ZERO {
            (&mut self.income, "income")
        } else {
            (&mut self.expense, "expense")
        };
        *bucket = bucket.checked_add(amount).ok_or(label)?;
        Ok(())
    }

    fn try_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Self, &'static str> {
        let mut buckets = Self::default();
        for amount in amounts {
            buckets.add(amount)?;
        }
        Ok(buckets)
    }

    fn net(&self) -> Decimal {
        // Opposite signs, so this cannot overflow.
        self.income + self.expense
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalStats {
    pub net: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub net: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyStats {
    /// `YYYY-MM`
    pub month: String,
    pub net: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
}

pub fn total_stats<S>(source: &S, dates: DateRange) -> Result<TotalStats, StatsError<S::Error>>
where
    S: RecordSource + ?Sized,
{
    let records = source
        .fetch_expenses(&FilterCriteria::for_dates(dates))
        .map_err(StatsError::Source)?;
    let buckets = Buckets::try_sum(
        records
            .into_iter()
            .filter(|e| dates.contains(e.date))
            .map(|e| e.amount),
    )
    .map_err(StatsError::Overflow)?;

    Ok(TotalStats {
        net: buckets.net(),
        income: buckets.income,
        expense: buckets.expense,
    })
}

/// One row per category that has expenses in `dates`, ascending by net.
pub fn category_stats<S>(
    source: &S,
    dates: DateRange,
) -> Result<Vec<CategoryStats>, StatsError<S::Error>>
where
    S: RecordSource + ?Sized,
{
    let mut rows = Vec::new();

    for category in source.fetch_categories().map_err(StatsError::Source)? {
        let mut amounts = source
            .fetch_expenses_by_category(category.id, dates)
            .map_err(StatsError::Source)?
            .into_iter()
            .filter(|e| e.category_id == category.id && dates.contains(e.date))
            .map(|e| e.amount)
            .peekable();

        if amounts.peek().is_none() {
            continue;
        }

        let buckets = Buckets::try_sum(amounts).map_err(StatsError::Overflow)?;
        rows.push(CategoryStats {
            category: category.name,
            net: buckets.net(),
            income: buckets.income,
            expense: buckets.expense,
        });
    }

    rows.sort_by(|a, b| a.net.cmp(&b.net));
    Ok(rows)
}

/// One row per month of `year` that has expenses, in calendar order.
pub fn monthly_stats<S>(source: &S, year: i32) -> Result<Vec<MonthlyStats>, StatsError<S::Error>>
where
    S: RecordSource + ?Sized,
{
    let mut months: BTreeMap<u32, Buckets> = BTreeMap::new();

    for expense in source.fetch_expenses_by_year(year).map_err(StatsError::Source)? {
        if expense.date.year() != year {
            continue;
        }
        months
            .entry(expense.date.month())
            .or_default()
            .add(expense.amount)
            .map_err(StatsError::Overflow)?;
    }

    Ok(months
        .into_iter()
        .map(|(month, buckets)| MonthlyStats {
            month: format!("{year:04}-{month:02}"),
            net: buckets.net(),
            income: buckets.income,
            expense: buckets.expense,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Expense};
    use crate::filter::{RawDateRange, validate_date_range};
    use crate::source::InMemorySource;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range(from: NaiveDate, to: NaiveDate) -> DateRange {
        validate_date_range(RawDateRange {
            from: Some(from),
            to: Some(to),
        })
        .unwrap()
    }

    fn category(name: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    fn expense(cat: &Category, amount: i64, date: NaiveDate) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            category_id: cat.id,
            amount: Decimal::from(amount),
            date,
            comment: None,
        }
    }

    fn sample() -> InMemorySource {
        let a = category("catA");
        let b = category("catB");
        let unused = category("unused");
        let expenses = vec![
            expense(&a, 100, d(2024, 1, 10)),
            expense(&a, -40, d(2024, 1, 15)),
            expense(&b, -10, d(2024, 2, 1)),
        ];
        InMemorySource::new(vec![a, b, unused], expenses)
    }

    #[test]
    fn total_over_a_year() {
        let stats = total_stats(&sample(), range(d(2024, 1, 1), d(2024, 12, 31))).unwrap();
        assert_eq!(
            stats,
            TotalStats {
                net: Decimal::from(50),
                income: Decimal::from(100),
                expense: Decimal::from(-50),
            }
        );
    }

    #[test]
    fn total_of_nothing_is_zero() {
        let stats = total_stats(&sample(), range(d(2030, 1, 1), d(2030, 12, 31))).unwrap();
        assert_eq!(stats.net, Decimal::ZERO);
        assert_eq!(stats.income, Decimal::ZERO);
        assert_eq!(stats.expense, Decimal::ZERO);
    }

    #[test]
    fn total_range_bounds_are_inclusive() {
        let stats = total_stats(&sample(), range(d(2024, 1, 15), d(2024, 2, 1))).unwrap();
        assert_eq!(stats.expense, Decimal::from(-50));
        assert_eq!(stats.income, Decimal::ZERO);
    }

    #[test]
    fn categories_ordered_by_net_and_empty_ones_omitted() {
        let stats = category_stats(&sample(), range(d(2024, 1, 1), d(2024, 12, 31))).unwrap();

        let got: Vec<_> = stats.iter().map(|s| (s.category.as_str(), s.net)).collect();
        assert_eq!(
            got,
            vec![("catB", Decimal::from(-10)), ("catA", Decimal::from(60))]
        );
        assert_eq!(stats[1].income, Decimal::from(100));
        assert_eq!(stats[1].expense, Decimal::from(-40));
    }

    #[test]
    fn category_outside_range_is_omitted() {
        let stats = category_stats(&sample(), range(d(2024, 2, 1), d(2024, 2, 29))).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].category, "catB");
    }

    #[test]
    fn months_in_calendar_order() {
        let stats = monthly_stats(&sample(), 2024).unwrap();
        assert_eq!(
            stats,
            vec![
                MonthlyStats {
                    month: "2024-01".to_string(),
                    net: Decimal::from(60),
                    income: Decimal::from(100),
                    expense: Decimal::from(-40),
                },
                MonthlyStats {
                    month: "2024-02".to_string(),
                    net: Decimal::from(-10),
                    income: Decimal::ZERO,
                    expense: Decimal::from(-10),
                },
            ]
        );
    }

    #[test]
    fn other_years_are_ignored() {
        assert!(monthly_stats(&sample(), 2023).unwrap().is_empty());
    }

    #[test]
    fn zero_counts_as_expense() {
        let cat = category("misc");
        let source = InMemorySource::new(
            vec![cat.clone()],
            vec![
                expense(&cat, 0, d(2024, 5, 5)),
                expense(&cat, 1, d(2024, 5, 6)),
            ],
        );

        let total = total_stats(&source, DateRange::all()).unwrap();
        assert_eq!(total.income, Decimal::from(1));
        assert_eq!(total.expense, Decimal::ZERO);

        // A category with only a zero amount still has a row.
        let zero_only = InMemorySource::new(
            vec![cat.clone()],
            vec![expense(&cat, 0, d(2024, 5, 5))],
        );
        let by_cat = category_stats(&zero_only, DateRange::all()).unwrap();
        assert_eq!(by_cat.len(), 1);
        assert_eq!(by_cat[0].income, Decimal::ZERO);
        assert_eq!(by_cat[0].expense, Decimal::ZERO);

        let monthly = monthly_stats(&zero_only, 2024).unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].month, "2024-05");
    }

    #[test]
    fn buckets_split_by_sign() {
        let buckets = Buckets::try_sum([5, -3, 0, 7, -1].into_iter().map(Decimal::from)).unwrap();
        assert_eq!(buckets.income, Decimal::from(12));
        assert_eq!(buckets.expense, Decimal::from(-4));
        assert_eq!(buckets.net(), Decimal::from(8));
    }

    #[test]
    fn oversized_sums_are_errors() {
        let cat = category("huge");
        let max = |date| Expense {
            amount: Decimal::MAX,
            ..expense(&cat, 0, date)
        };
        let min = |date| Expense {
            amount: Decimal::MIN,
            ..expense(&cat, 0, date)
        };
        let source = InMemorySource::new(
            vec![cat.clone()],
            vec![
                max(d(2024, 3, 1)),
                max(d(2024, 3, 2)),
                min(d(2025, 3, 1)),
                min(d(2025, 3, 2)),
            ],
        );

        assert!(matches!(
            total_stats(&source, DateRange::all()),
            Err(StatsError::Overflow("income"))
        ));
        assert!(matches!(
            category_stats(&source, DateRange::all()),
            Err(StatsError::Overflow("income"))
        ));
        assert!(matches!(
            monthly_stats(&source, 2024),
            Err(StatsError::Overflow("income"))
        ));
        assert!(matches!(
            monthly_stats(&source, 2025),
            Err(StatsError::Overflow("expense"))
        ));

        // A single extreme amount still sums fine.
        let single = InMemorySource::new(vec![cat.clone()], vec![max(d(2024, 3, 1))]);
        let total = total_stats(&single, DateRange::all()).unwrap();
        assert_eq!(total.income, Decimal::MAX);
        assert_eq!(total.net, Decimal::MAX);
    }
}
