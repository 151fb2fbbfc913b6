use crate::error::{BillingsError, Result};
use crate::schema::{
    SeriesLabel, WideTable, LABEL_SLOTS, SEGMENT_PERIOD_HEADER, SUBTYPE_HEADER, TYPE_HEADER,
};
use log::{debug, warn};

/// Transposed table split into its label index and date-keyed value area.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// Raw header text of each remaining (date) column.
    pub date_keys: Vec<Option<String>>,
    /// One label per series, in original order.
    pub labels: Vec<SeriesLabel>,
    /// `values[series][date_column]`.
    pub values: Vec<Vec<Option<String>>>,
}

impl NormalizedTable {
    /// Headers as they stand after the first three slots are overridden.
    pub fn column_headers(&self) -> Vec<String> {
        let mut headers = vec![
            SEGMENT_PERIOD_HEADER.to_string(),
            TYPE_HEADER.to_string(),
            SUBTYPE_HEADER.to_string(),
        ];
        headers.extend(
            self.date_keys
                .iter()
                .map(|k| k.clone().unwrap_or_default()),
        );
        headers
    }

    pub fn cell_count(&self) -> usize {
        self.labels.len() * self.date_keys.len()
    }
}

/// Recovers the label triple of every series in a transposed table.
///
/// Row 0 supplies the column headers (its first three slots are replaced by
/// fixed names); each later row is one series whose first three cells are
/// the composite label, type and subtype. Type is forward-filled.
pub fn normalize(transposed: &WideTable) -> Result<NormalizedTable> {
    if transposed.width() < LABEL_SLOTS {
        return Err(BillingsError::LayoutError(format!(
            "expected at least {} label rows, found {}",
            LABEL_SLOTS,
            transposed.width()
        )));
    }

    let (header_row, series_rows) = match transposed.rows.split_first() {
        Some(split) => split,
        None => {
            return Err(BillingsError::LayoutError(
                "table has no columns".to_string(),
            ))
        }
    };

    let date_keys = header_row[LABEL_SLOTS..].to_vec();

    let raw_types: Vec<Option<String>> = series_rows.iter().map(|r| r[1].clone()).collect();
    let types = forward_fill(&raw_types);

    if types.first().map(|t| t.is_none()).unwrap_or(false) {
        warn!("First series has no type; it stays unclassified");
    }

    let labels: Vec<SeriesLabel> = series_rows
        .iter()
        .zip(types)
        .map(|(row, type_name)| SeriesLabel {
            composite: row[0].clone(),
            type_name,
            subtype: row[2].clone(),
        })
        .collect();

    let values = series_rows
        .iter()
        .map(|row| row[LABEL_SLOTS..].to_vec())
        .collect();

    debug!(
        "Normalized {} series over {} date columns",
        labels.len(),
        date_keys.len()
    );

    Ok(NormalizedTable {
        date_keys,
        labels,
        values,
    })
}

/// Single forward scan: each missing entry takes the last present value
/// above it. Leading missing entries stay missing.
pub fn forward_fill(values: &[Option<String>]) -> Vec<Option<String>> {
    let mut last: Option<String> = None;
    let mut filled = Vec::with_capacity(values.len());

    for value in values {
        if value.is_some() {
            last = value.clone();
        }
        filled.push(last.clone());
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_forward_fill() {
        let filled = forward_fill(&[some("A"), None, None, some("B"), None]);
        assert_eq!(
            filled,
            vec![some("A"), some("A"), some("A"), some("B"), some("B")]
        );
    }

    #[test]
    fn test_forward_fill_keeps_leading_gap() {
        let filled = forward_fill(&[None, some("B"), None]);
        assert_eq!(filled, vec![None, some("B"), some("B")]);
    }

    fn transposed() -> WideTable {
        // Already transposed: row 0 is the caption/date column of the export.
        WideTable::new(
            vec![],
            vec![
                vec![some("Label"), some("Kind"), some("Detail"), some("2016-01-01"), some("2016-02-01")],
                vec![some("US - Q1"), some("Market"), some("Online"), some("1"), some("2")],
                vec![some("FR - Q1"), None, some("Retail"), some("3"), None],
                vec![some("DE - Q1"), some("Countries"), some("DE"), some("5"), some("6")],
            ],
        )
    }

    #[test]
    fn test_normalize_overrides_first_headers() {
        let table = normalize(&transposed()).unwrap();
        assert_eq!(
            table.column_headers(),
            vec!["Segment - Period", "Type", "Subtype", "2016-01-01", "2016-02-01"]
        );
    }

    #[test]
    fn test_normalize_fills_type_and_strips_label_columns() {
        let table = normalize(&transposed()).unwrap();

        assert_eq!(table.labels.len(), 3);
        assert_eq!(table.labels[1].type_name, some("Market"));
        assert_eq!(table.labels[2].type_name, some("Countries"));
        assert_eq!(table.values[0], vec![some("1"), some("2")]);
        assert_eq!(table.values[1], vec![some("3"), None]);
        assert_eq!(table.cell_count(), 6);
    }

    #[test]
    fn test_normalize_rejects_narrow_table() {
        let narrow = WideTable::new(vec![], vec![vec![some("a"), some("b")]]);
        assert!(matches!(
            normalize(&narrow),
            Err(BillingsError::LayoutError(_))
        ));
    }
}
