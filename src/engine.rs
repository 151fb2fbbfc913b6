use crate::error::{BillingsError, Result};
use crate::headers::{normalize, NormalizedTable};
use crate::labels::classify;
use crate::schema::{InterimRecord, LongRecord, SeriesLabel, WideTable, COMMENT_SUCCESS};
use crate::utils::{parse_date_key, parse_value};
use chrono::NaiveDate;
use log::{debug, info, warn};

/// One unpivoted cell before classification and coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpivotedCell<'a> {
    pub label: &'a SeriesLabel,
    pub date_key: Option<&'a str>,
    pub value: Option<&'a str>,
}

pub struct Reshaper;

impl Reshaper {
    /// Transposes, normalizes, unpivots, classifies and coerces the table.
    /// Returns the full diagnostic table; see [`project`] for the canonical
    /// columns.
    pub fn reshape(table: &WideTable) -> Result<Vec<InterimRecord>> {
        info!("Transposing data");
        let transposed = table.transpose();

        info!("Cleaning column headers");
        let normalized = normalize(&transposed)?;

        info!("Unpivoting the data");
        let cells = unpivot(&normalized);
        info!(
            "Data to process: {} rows ({} series x {} dates)",
            cells.len(),
            normalized.labels.len(),
            normalized.date_keys.len()
        );

        info!("Classifying series labels and formatting date & value columns");
        let records = cells
            .iter()
            .map(build_record)
            .collect::<Result<Vec<_>>>()?;

        let failures = records
            .iter()
            .filter(|r| r.comment != COMMENT_SUCCESS)
            .count();
        if failures > 0 {
            warn!("{} rows could not be classified", failures);
        }

        Ok(records)
    }
}

/// One cell per (series, date column). Date-major order.
pub fn unpivot(table: &NormalizedTable) -> Vec<UnpivotedCell<'_>> {
    let mut cells = Vec::with_capacity(table.cell_count());

    for (col, date_key) in table.date_keys.iter().enumerate() {
        for (label, row) in table.labels.iter().zip(&table.values) {
            cells.push(UnpivotedCell {
                label,
                date_key: date_key.as_deref(),
                value: row[col].as_deref(),
            });
        }
    }

    debug!("Unpivoted {} cells", cells.len());
    cells
}

fn build_record(cell: &UnpivotedCell<'_>) -> Result<InterimRecord> {
    let label = cell.label;
    let typed = classify(
        label.composite.as_deref(),
        label.type_name.as_deref(),
        label.subtype.as_deref(),
    );

    let date = coerce_date(cell)?;
    let value = parse_value(cell.value).ok_or_else(|| BillingsError::ValueCoercion {
        series: label.describe(),
        date: date.to_string(),
        raw: cell.value.unwrap_or_default().to_string(),
    })?;

    Ok(InterimRecord::new(date, label, value, typed))
}

fn coerce_date(cell: &UnpivotedCell<'_>) -> Result<NaiveDate> {
    cell.date_key
        .and_then(parse_date_key)
        .ok_or_else(|| BillingsError::DateCoercion {
            series: cell.label.describe(),
            raw: cell.date_key.unwrap_or_default().to_string(),
        })
}

/// Projects the diagnostic table onto the canonical six columns.
pub fn project(records: &[InterimRecord]) -> Vec<LongRecord> {
    records.iter().map(InterimRecord::to_long_record).collect()
}
