use crate::error::{BillingsError, Result};
use crate::schema::{WideTable, LABEL_SLOTS};
use crate::utils::is_missing_marker;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads the export at `path`, skipping `skip_rows` preamble lines before the
/// header row.
pub fn read_wide_table(path: &Path, skip_rows: usize) -> Result<WideTable> {
    info!("Reading {}", path.display());
    let file = File::open(path)?;
    read_wide_table_from(file, skip_rows)
}

pub fn read_wide_table_from<R: Read>(reader: R, skip_rows: usize) -> Result<WideTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();

    for _ in 0..skip_rows {
        if records.next().transpose()?.is_none() {
            return Err(BillingsError::LayoutError(format!(
                "file ended inside the {} line preamble",
                skip_rows
            )));
        }
    }

    let headers: Vec<String> = match records.next().transpose()? {
        Some(record) => record.iter().map(|h| h.trim().to_string()).collect(),
        None => {
            return Err(BillingsError::LayoutError(
                "missing header row after preamble".to_string(),
            ))
        }
    };

    let mut rows = Vec::new();
    for record in records {
        rows.push(to_cells(&record?));
    }

    let table = WideTable::new(headers, rows);
    debug!(
        "Loaded {} rows x {} columns",
        table.height(),
        table.width()
    );

    Ok(drop_empty_columns(drop_empty_rows(table)))
}

/// Removes data rows whose cells are all empty, such as the separator-only
/// lines spreadsheet tools append. The label rows are never dropped.
pub fn drop_empty_rows(table: WideTable) -> WideTable {
    let before = table.height();
    let rows: Vec<Vec<Option<String>>> = table
        .rows
        .into_iter()
        .enumerate()
        .filter(|(idx, row)| *idx < LABEL_SLOTS || row.iter().any(Option::is_some))
        .map(|(_, row)| row)
        .collect();

    if rows.len() < before {
        info!("Dropping {} all-empty rows", before - rows.len());
    }

    WideTable::new(table.headers, rows)
}

/// Removes every column whose data cells are all empty. Exports pad the
/// right edge with separator-only columns.
pub fn drop_empty_columns(table: WideTable) -> WideTable {
    let width = table.width();
    let keep: Vec<bool> = (0..width)
        .map(|col| table.rows.iter().any(|row| row[col].is_some()))
        .collect();

    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return table;
    }
    info!("Dropping {} all-empty columns", dropped);

    let headers = table
        .headers
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| keep.get(*idx).copied().unwrap_or(false))
        .map(|(_, h)| h)
        .collect();

    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(keep.iter())
                .filter(|(_, k)| **k)
                .map(|(cell, _)| cell)
                .collect()
        })
        .collect();

    WideTable::new(headers, rows)
}

fn to_cells(record: &StringRecord) -> Vec<Option<String>> {
    record
        .iter()
        .map(|field| {
            let trimmed = field.trim();
            if is_missing_marker(trimmed) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}
