use anyhow::Result;
use std::io::Write;

use crate::filter::{DateRange, FilterCriteria};
use crate::source::RecordSource;

pub const CSV_HEADER: [&str; 4] = ["Date", "Category", "Amount", "Comment"];

/// Writes every expense dated within `dates` as CSV, ordered by date and then
/// category name. Returns the number of data rows written.
pub fn write_csv<S, W>(source: &S, dates: DateRange, out: W) -> Result<usize>
where
    S: RecordSource + ?Sized,
    S::Error: Into<anyhow::Error>,
    W: Write,
{
    let mut rows: Vec<_> = source
        .fetch_expenses(&FilterCriteria::for_dates(dates))
        .map_err(Into::into)?
        .into_iter()
        .filter(|e| dates.contains(e.date))
        .collect();
    rows.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(CSV_HEADER)?;
    for e in &rows {
        wtr.write_record([
            e.date.format("%Y-%m-%d").to_string(),
            e.category_name.clone(),
            e.amount.to_string(),
            e.comment.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;

    tracing::debug!(rows = rows.len(), "exported csv");
    Ok(rows.len())
}
