use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// Column names that replace the first three header slots of the transposed table.
pub const SEGMENT_PERIOD_HEADER: &str = "Segment - Period";
pub const TYPE_HEADER: &str = "Type";
pub const SUBTYPE_HEADER: &str = "Subtype";

/// Number of leading label slots (composite label, type, subtype) per series.
pub const LABEL_SLOTS: usize = 3;

pub const COMMENT_SUCCESS: &str = "processed successfully";
pub const COMMENT_FAILURE_PREFIX: &str = "processing failed: ";

/// The raw export as loaded: the file's header cells plus a rectangular
/// matrix of optional cells, `None` meaning the cell was empty.
///
/// Column 0 of each data row carries the date (the first three rows carry
/// captions instead); every other column is one metric series whose first
/// three cells are its composite label, type and subtype.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl WideTable {
    /// Builds a table, padding short rows with empty cells so every row has
    /// the same width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = rows
            .iter()
            .map(|r| r.len())
            .chain(std::iter::once(headers.len()))
            .max()
            .unwrap_or(0);

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        Self { headers, rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    /// Swaps rows and columns. The file header does not take part; the
    /// transposed table has no headers of its own.
    pub fn transpose(&self) -> WideTable {
        let width = self.width();
        let rows = (0..width)
            .map(|col| self.rows.iter().map(|row| row[col].clone()).collect())
            .collect();

        WideTable {
            headers: Vec::new(),
            rows,
        }
    }
}

/// The (composite label, type, subtype) triple identifying one series.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeriesLabel {
    pub composite: Option<String>,
    pub type_name: Option<String>,
    pub subtype: Option<String>,
}

impl SeriesLabel {
    pub fn new(composite: Option<&str>, type_name: Option<&str>, subtype: Option<&str>) -> Self {
        Self {
            composite: composite.map(str::to_string),
            type_name: type_name.map(str::to_string),
            subtype: subtype.map(str::to_string),
        }
    }

    /// Human readable form used in log lines and error messages.
    pub fn describe(&self) -> String {
        format!(
            "{} / {} / {}",
            self.composite.as_deref().unwrap_or("<missing>"),
            self.type_name.as_deref().unwrap_or("<missing>"),
            self.subtype.as_deref().unwrap_or("<missing>")
        )
    }
}

/// Successfully split label fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLabel {
    pub segment: String,
    pub period: String,
    pub type_name: String,
    pub subtype: String,
}

/// Classification of one generated row. Failed classifications carry empty
/// fields and the failure cause in `comment`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRow {
    pub segment: String,
    pub period: String,
    pub type_name: String,
    pub subtype: String,
    pub comment: String,
    pub processed_at: NaiveDateTime,
}

impl TypedRow {
    pub fn is_success(&self) -> bool {
        self.comment == COMMENT_SUCCESS
    }
}

/// One observation of the canonical long-format table.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub date: NaiveDate,
    pub segment: String,
    pub period: String,
    pub type_name: String,
    pub subtype: String,
    pub value: f64,
}

/// A long record plus the raw label keys and classification diagnostics,
/// as written to the interim artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterimRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Segment - Period")]
    pub label: Option<String>,
    #[serde(rename = "Label Type")]
    pub label_type: Option<String>,
    #[serde(rename = "Label Subtype")]
    pub label_subtype: Option<String>,
    #[serde(rename = "Value", serialize_with = "serialize_missing_value")]
    pub value: f64,
    #[serde(rename = "Segment")]
    pub segment: String,
    #[serde(rename = "Period")]
    pub period: String,
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(rename = "Subtype")]
    pub subtype: String,
    #[serde(rename = "Comment")]
    pub comment: String,
    #[serde(rename = "Processed Datetime", serialize_with = "serialize_processed_at")]
    pub processed_at: NaiveDateTime,
}

impl InterimRecord {
    pub fn new(date: NaiveDate, label: &SeriesLabel, value: f64, typed: TypedRow) -> Self {
        Self {
            date,
            label: label.composite.clone(),
            label_type: label.type_name.clone(),
            label_subtype: label.subtype.clone(),
            value,
            segment: typed.segment,
            period: typed.period,
            type_name: typed.type_name,
            subtype: typed.subtype,
            comment: typed.comment,
            processed_at: typed.processed_at,
        }
    }

    /// Projection onto the six canonical columns.
    pub fn to_long_record(&self) -> LongRecord {
        LongRecord {
            date: self.date,
            segment: self.segment.clone(),
            period: self.period.clone(),
            type_name: self.type_name.clone(),
            subtype: self.subtype.clone(),
            value: self.value,
        }
    }
}

// Missing observations are NaN in memory and an empty cell on disk.
fn serialize_missing_value<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_f64(*value)
    }
}

pub const PROCESSED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn serialize_processed_at<S: Serializer>(
    processed_at: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&processed_at.format(PROCESSED_AT_FORMAT))
}
