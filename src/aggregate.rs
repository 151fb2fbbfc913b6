use crate::config::PipelineConfig;
use crate::schema::LongRecord;
use crate::utils::{mean, quantile, sample_std};
use chrono::Datelike;
use log::info;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CountryBilling {
    pub country: String,
    pub billings: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBilling {
    pub period: String,
    pub billings: f64,
}

/// Descriptive statistics of `value` for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentStats {
    pub segment: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl SegmentStats {
    pub const LABELS: [&'static str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    /// Values in the order of [`SegmentStats::LABELS`].
    pub fn as_row(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }

    fn from_values(segment: String, mut values: Vec<f64>) -> Self {
        values.sort_by(|a, b| a.total_cmp(b));

        Self {
            segment,
            count: values.len(),
            mean: mean(&values),
            std: sample_std(&values),
            min: values.first().copied().unwrap_or(f64::NAN),
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// The three summary views of one run. Each is computed independently from
/// the same records.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub country_billings: Vec<CountryBilling>,
    pub period_billings: Vec<PeriodBilling>,
    pub segment_stats: Vec<SegmentStats>,
}

pub struct Aggregator<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Aggregator<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn summarize(&self, records: &[LongRecord]) -> Summary {
        info!("Calculating sum of billings by country");
        let country_billings = self.country_billings(records);

        info!(
            "Calculating sum of billings by period for type {} from {}",
            self.config.market_type, self.config.period_start_year
        );
        let period_billings = self.period_billings(records);

        info!("Calculating summary stats by segment");
        let segment_stats = segment_stats(records);

        Summary {
            country_billings,
            period_billings,
            segment_stats,
        }
    }

    pub fn country_billings(&self, records: &[LongRecord]) -> Vec<CountryBilling> {
        let totals = sum_by(
            records
                .iter()
                .filter(|r| r.type_name == self.config.country_type),
            |r| r.subtype.clone(),
        );

        totals
            .into_iter()
            .map(|(country, billings)| CountryBilling { country, billings })
            .collect()
    }

    /// Market records dated on or after January 1st of the start year.
    pub fn period_billings(&self, records: &[LongRecord]) -> Vec<PeriodBilling> {
        let totals = sum_by(
            records.iter().filter(|r| {
                r.type_name == self.config.market_type
                    && r.date.year() >= self.config.period_start_year
            }),
            |r| r.period.clone(),
        );

        totals
            .into_iter()
            .map(|(period, billings)| PeriodBilling { period, billings })
            .collect()
    }
}

/// Groups every record by segment. Missing (NaN) values are left out of
/// the statistics but the segment still gets a row.
pub fn segment_stats(records: &[LongRecord]) -> Vec<SegmentStats> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for record in records {
        let values = groups.entry(record.segment.clone()).or_default();
        if !record.value.is_nan() {
            values.push(record.value);
        }
    }

    groups
        .into_iter()
        .map(|(segment, values)| SegmentStats::from_values(segment, values))
        .collect()
}

// Missing values contribute nothing; a group of only missing values sums to 0.
fn sum_by<'r, I, F>(records: I, key: F) -> BTreeMap<String, f64>
where
    I: Iterator<Item = &'r LongRecord>,
    F: Fn(&LongRecord) -> String,
{
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();

    for record in records {
        let total = totals.entry(key(record)).or_insert(0.0);
        if !record.value.is_nan() {
            *total += record.value;
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: (i32, u32, u32), segment: &str, period: &str, type_name: &str, subtype: &str, value: f64) -> LongRecord {
        LongRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            segment: segment.to_string(),
            period: period.to_string(),
            type_name: type_name.to_string(),
            subtype: subtype.to_string(),
            value,
        }
    }

    #[test]
    fn test_country_billings_sums_by_subtype() {
        let config = PipelineConfig::default();
        let records = vec![
            record((2016, 1, 1), "EU", "Q1", "Countries", "US", 10.0),
            record((2016, 2, 1), "EU", "Q1", "Countries", "US", 5.0),
            record((2016, 1, 1), "EU", "Q1", "Countries", "FR", 3.0),
            record((2016, 1, 1), "EU", "Q1", "Market", "Online", 100.0),
        ];

        let billings = Aggregator::new(&config).country_billings(&records);

        assert_eq!(
            billings,
            vec![
                CountryBilling { country: "FR".to_string(), billings: 3.0 },
                CountryBilling { country: "US".to_string(), billings: 15.0 },
            ]
        );
    }

    #[test]
    fn test_period_billings_year_boundary() {
        let config = PipelineConfig::default();
        let records = vec![
            record((2016, 1, 1), "EU", "Q1", "Market", "Online", 7.0),
            record((2015, 12, 31), "EU", "Q1", "Market", "Online", 100.0),
            record((2017, 6, 1), "EU", "Q2", "Market", "Retail", 2.0),
            record((2017, 6, 1), "EU", "Q2", "Countries", "FR", 50.0),
        ];

        let billings = Aggregator::new(&config).period_billings(&records);

        assert_eq!(
            billings,
            vec![
                PeriodBilling { period: "Q1".to_string(), billings: 7.0 },
                PeriodBilling { period: "Q2".to_string(), billings: 2.0 },
            ]
        );
    }

    #[test]
    fn test_segment_stats_describe_values() {
        let records = vec![
            record((2016, 1, 1), "EU", "Q1", "Market", "A", 1.0),
            record((2016, 1, 1), "EU", "Q1", "Market", "B", 2.0),
            record((2016, 1, 1), "EU", "Q1", "Market", "C", 3.0),
            record((2016, 1, 1), "EU", "Q1", "Market", "D", 4.0),
            record((2016, 1, 1), "US", "Q1", "Market", "A", 9.0),
        ];

        let stats = segment_stats(&records);
        assert_eq!(stats.len(), 2);

        let eu = &stats[0];
        assert_eq!(eu.segment, "EU");
        assert_eq!(eu.count, 4);
        assert_eq!(eu.mean, 2.5);
        assert_eq!(eu.min, 1.0);
        assert_eq!(eu.q25, 1.75);
        assert_eq!(eu.median, 2.5);
        assert_eq!(eu.q75, 3.25);
        assert_eq!(eu.max, 4.0);
        assert!((eu.std - 1.290_994_448).abs() < 1e-6);

        let us = &stats[1];
        assert_eq!(us.count, 1);
        assert!(us.std.is_nan());
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let config = PipelineConfig::default();
        let records = vec![
            record((2016, 1, 1), "EU", "Q1", "Countries", "US", f64::NAN),
            record((2016, 2, 1), "EU", "Q1", "Countries", "US", 4.0),
        ];

        let summary = Aggregator::new(&config).summarize(&records);

        assert_eq!(summary.country_billings[0].billings, 4.0);
        assert_eq!(summary.segment_stats[0].count, 1);
        assert!(summary.period_billings.is_empty());
    }
}
