//! # Billings Reshape
//!
//! Turns a wide billings export (one column per metric series, one row per
//! date) into a long-format record table and computes summary reports.
//!
//! ## Core Concepts
//!
//! - **Series label**: each export column is identified by a composite
//!   `"<segment> - <period>"` label plus a type and a subtype. Types are
//!   only written on the first column of a group and are forward-filled.
//! - **Long records**: one row per (date, series) with the label split into
//!   segment, period, type and subtype.
//! - **Two-tier errors**: a label that cannot be split marks its own rows as
//!   failed and processing continues; a date or value that cannot be read
//!   fails the whole run.
//!
//! ## Example
//!
//! ```rust,ignore
//! use billings_reshape::*;
//!
//! let config = PipelineConfig::with_input("data/raw/billings_europe.csv");
//! let run = BillingsProcessor::run(&config)?;
//!
//! for row in &run.summary.country_billings {
//!     println!("{}: {:.2}", row.country, row.billings);
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod headers;
pub mod ingestion;
pub mod labels;
pub mod report;
pub mod schema;
pub mod utils;

pub use aggregate::{Aggregator, CountryBilling, PeriodBilling, SegmentStats, Summary};
pub use config::PipelineConfig;
pub use engine::{project, Reshaper};
pub use error::{BillingsError, Result};
pub use headers::{forward_fill, normalize, NormalizedTable};
pub use ingestion::*;
pub use labels::{classify, parse_label, LabelError};
pub use schema::*;

use log::{debug, info};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub records: Vec<LongRecord>,
    pub summary: Summary,
}

pub struct BillingsProcessor;

impl BillingsProcessor {
    /// Builds the canonical long-format table from an already loaded export.
    pub fn build_base_data(table: &WideTable) -> Result<(Vec<InterimRecord>, Vec<LongRecord>)> {
        info!("Started building base output");
        let interim = Reshaper::reshape(table)?;
        let records = project(&interim);
        debug!("Base output has {} records", records.len());
        Ok((interim, records))
    }

    pub fn summarize(config: &PipelineConfig, records: &[LongRecord]) -> Summary {
        info!("Started summarizing data");
        Aggregator::new(config).summarize(records)
    }

    /// Full batch: read, reshape, save interim CSV, summarize, save workbook.
    /// Nothing is written if the reshape fails.
    pub fn run(config: &PipelineConfig) -> Result<RunOutput> {
        config.validate()?;

        let table = read_wide_table(&config.input_path, config.skip_rows)?;
        let (interim, records) = Self::build_base_data(&table)?;
        report::write_interim_csv(&interim, &config.interim_path)?;

        let summary = Self::summarize(config, &records);

        info!("Writing final summarized output");
        report::write_summary_xlsx(&summary, &config.output_path)?;
        info!("Processing complete!");

        Ok(RunOutput { records, summary })
    }
}

pub fn process_billings(config: &PipelineConfig) -> Result<RunOutput> {
    BillingsProcessor::run(config)
}
