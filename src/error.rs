use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingsError {
    #[error("Input layout error: {0}")]
    LayoutError(String),

    #[error("Invalid date '{raw}' for series '{series}': expected a calendar date")]
    DateCoercion { series: String, raw: String },

    #[error("Invalid value '{raw}' for series '{series}' on {date}: expected a number")]
    ValueCoercion {
        series: String,
        date: String,
        raw: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillingsError>;
