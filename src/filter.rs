use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::num::NonZeroU32;
use uuid::Uuid;

use crate::domain::ExpenseView;
use crate::error::ValidationError;

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(20).unwrap();

/// Filter request as received from the caller, before defaults are applied.
#[derive(Debug, Clone)]
pub struct RawFilter {
    pub category_ids: Option<Vec<Uuid>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    /// Zero-based page index.
    pub page: u32,
    pub size: NonZeroU32,
}

impl Default for RawFilter {
    fn default() -> Self {
        Self {
            category_ids: None,
            date_from: None,
            date_to: None,
            min_amount: None,
            max_amount: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RawDateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Inclusive date range with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Every representable date.
    pub fn all() -> Self {
        Self {
            from: NaiveDate::MIN,
            to: NaiveDate::MAX,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.from
    }

    pub fn end(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Canonical filter. Only [`validate_filter`] and [`FilterCriteria::for_dates`]
/// build one, so both ranges are always ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    category_ids: BTreeSet<Uuid>,
    dates: DateRange,
    min_amount: Decimal,
    max_amount: Decimal,
    page: u32,
    size: NonZeroU32,
}

impl FilterCriteria {
    /// Matches every record in `dates` and returns them all on one page.
    pub fn for_dates(dates: DateRange) -> Self {
        Self {
            category_ids: BTreeSet::new(),
            dates,
            min_amount: Decimal::MIN,
            max_amount: Decimal::MAX,
            page: 0,
            size: NonZeroU32::MAX,
        }
    }

    /// Empty means no category restriction.
    pub fn category_ids(&self) -> &BTreeSet<Uuid> {
        &self.category_ids
    }

    pub fn dates(&self) -> DateRange {
        self.dates
    }

    pub fn min_amount(&self) -> Decimal {
        self.min_amount
    }

    pub fn max_amount(&self) -> Decimal {
        self.max_amount
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> NonZeroU32 {
        self.size
    }

    /// Number of matching records that precede the requested page.
    pub fn offset(&self) -> usize {
        (self.page as usize).saturating_mul(self.size.get() as usize)
    }

    pub fn limit(&self) -> usize {
        self.size.get() as usize
    }

    pub fn matches(&self, record: &ExpenseView) -> bool {
        (self.category_ids.is_empty() || self.category_ids.contains(&record.category_id))
            && self.dates.contains(record.date)
            && self.min_amount <= record.amount
            && record.amount <= self.max_amount
    }
}

fn check_order<T: PartialOrd>(
    lower: Option<&T>,
    upper: Option<&T>,
    what: &'static str,
) -> Result<(), ValidationError> {
    match (lower, upper) {
        (Some(lo), Some(hi)) if lo > hi => Err(ValidationError::InvalidRange(what)),
        _ => Ok(()),
    }
}

pub fn validate_date_range(raw: RawDateRange) -> Result<DateRange, ValidationError> {
    check_order(raw.from.as_ref(), raw.to.as_ref(), "date")?;

    Ok(DateRange {
        from: raw.from.unwrap_or(NaiveDate::MIN),
        to: raw.to.unwrap_or(NaiveDate::MAX),
    })
}

/// Checks the raw bounds as given, then fills in the open ends.
pub fn validate_filter(raw: RawFilter) -> Result<FilterCriteria, ValidationError> {
    let dates = validate_date_range(RawDateRange {
        from: raw.date_from,
        to: raw.date_to,
    })?;
    check_order(raw.min_amount.as_ref(), raw.max_amount.as_ref(), "amount")?;

    Ok(FilterCriteria {
        category_ids: raw.category_ids.unwrap_or_default().into_iter().collect(),
        dates,
        min_amount: raw.min_amount.unwrap_or(Decimal::MIN),
        max_amount: raw.max_amount.unwrap_or(Decimal::MAX),
        page: raw.page,
        size: raw.size,
    })
}
