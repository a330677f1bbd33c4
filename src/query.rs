use crate::domain::ExpenseView;
use crate::filter::FilterCriteria;
use crate::sort::SortSpec;
use crate::source::RecordSource;

/// Filters, orders and pages the records of `source`.
///
/// Fails only when the source does; an empty page is a normal result.
pub fn query_expenses<S>(
    source: &S,
    criteria: &FilterCriteria,
    spec: &SortSpec,
) -> Result<Vec<ExpenseView>, S::Error>
where
    S: RecordSource + ?Sized,
{
    let records = source.fetch_expenses(criteria)?;
    let page = compose(records, criteria, spec);

    tracing::debug!(
        page = criteria.page(),
        size = criteria.size().get(),
        sort = %spec,
        returned = page.len(),
        "queried expenses"
    );
    Ok(page)
}

/// The pure part of [`query_expenses`], over already-fetched records.
pub fn compose<I>(records: I, criteria: &FilterCriteria, spec: &SortSpec) -> Vec<ExpenseView>
where
    I: IntoIterator<Item = ExpenseView>,
{
    let mut matched: Vec<ExpenseView> = records
        .into_iter()
        .filter(|r| criteria.matches(r))
        .collect();

    // `sort_by` is stable, so records equal under every rule keep source order.
    matched.sort_by(|a, b| spec.compare(a, b));

    matched
        .into_iter()
        .skip(criteria.offset())
        .take(criteria.limit())
        .collect()
}
