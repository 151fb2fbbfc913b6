use crate::aggregate::{SegmentStats, Summary};
use crate::error::Result;
use crate::schema::InterimRecord;
use log::{debug, info};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use std::fs;
use std::path::Path;

pub const OUTPUT_SHEET: &str = "Output";
pub const STATS_SHEET: &str = "Segment Summary Stats";

/// Header row of both billings tables on the output sheet.
pub const TABLE_START_ROW: u32 = 3;
pub const COUNTRY_TABLE_COL: u16 = 0;
pub const PERIOD_TABLE_COL: u16 = 4;

/// Writes the full diagnostic table as CSV, replacing any previous file.
pub fn write_interim_csv(records: &[InterimRecord], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Base data saved to {} ({} rows)", path.display(), records.len());
    Ok(())
}

/// Renders the summary views into a two-sheet workbook.
pub fn write_summary_xlsx(summary: &Summary, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;

    let header = Format::new().set_bold();
    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(OUTPUT_SHEET)?;

        let countries: Vec<(&str, f64)> = summary
            .country_billings
            .iter()
            .map(|b| (b.country.as_str(), b.billings))
            .collect();
        write_two_column_table(sheet, COUNTRY_TABLE_COL, ("Countries", "Billings"), &countries, &header)?;

        let periods: Vec<(&str, f64)> = summary
            .period_billings
            .iter()
            .map(|b| (b.period.as_str(), b.billings))
            .collect();
        write_two_column_table(sheet, PERIOD_TABLE_COL, ("Period", "Billings"), &periods, &header)?;
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(STATS_SHEET)?;
        write_stats_table(sheet, &summary.segment_stats, &header)?;
    }

    workbook.save(path)?;
    info!("Summary workbook saved to {}", path.display());
    Ok(())
}

fn write_two_column_table(
    sheet: &mut Worksheet,
    col: u16,
    titles: (&str, &str),
    rows: &[(&str, f64)],
    header: &Format,
) -> Result<()> {
    sheet.write_string_with_format(TABLE_START_ROW, col, titles.0, header)?;
    sheet.write_string_with_format(TABLE_START_ROW, col + 1, titles.1, header)?;

    for (offset, (key, value)) in rows.iter().enumerate() {
        let row = TABLE_START_ROW + 1 + offset as u32;
        sheet.write_string(row, col, *key)?;
        write_number_or_blank(sheet, row, col + 1, *value)?;
    }

    debug!("Wrote {} rows for table '{}'", rows.len(), titles.0);
    Ok(())
}

// Layout: a merged "Value" band, the statistic names, an index-name row,
// then one row per segment.
fn write_stats_table(sheet: &mut Worksheet, stats: &[SegmentStats], header: &Format) -> Result<()> {
    let stat_count = SegmentStats::LABELS.len() as u16;
    let band = header.clone().set_align(FormatAlign::Center);

    sheet.merge_range(0, 1, 0, stat_count, "Value", &band)?;
    for (idx, label) in SegmentStats::LABELS.iter().enumerate() {
        sheet.write_string_with_format(1, 1 + idx as u16, *label, header)?;
    }
    sheet.write_string_with_format(2, 0, "Segment", header)?;

    for (offset, segment) in stats.iter().enumerate() {
        let row = 3 + offset as u32;
        sheet.write_string_with_format(row, 0, &segment.segment, header)?;
        for (idx, value) in segment.as_row().iter().enumerate() {
            write_number_or_blank(sheet, row, 1 + idx as u16, *value)?;
        }
    }

    Ok(())
}

fn write_number_or_blank(sheet: &mut Worksheet, row: u32, col: u16, value: f64) -> Result<()> {
    if value.is_finite() {
        sheet.write_number(row, col, value)?;
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{CountryBilling, PeriodBilling};
    use crate::labels::classify_at;
    use crate::schema::SeriesLabel;
    use calamine::{open_workbook, Data, Range, Reader, Xlsx};
    use chrono::NaiveDate;

    #[test]
    fn test_interim_csv_has_diagnostic_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interim").join("base_output.csv");

        let label = SeriesLabel::new(Some("USQ1"), Some("Market"), None);
        let processed_at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_micro_opt(3, 4, 5, 123_456)
            .unwrap();
        let typed = classify_at(Some("USQ1"), Some("Market"), None, processed_at);
        let record = InterimRecord::new(
            NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
            &label,
            f64::NAN,
            typed,
        );

        write_interim_csv(&[record], &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Segment - Period,Label Type,Label Subtype,Value,Segment,Period,Type,Subtype,Comment,Processed Datetime"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("2016-01-01,USQ1,Market,,,,,,,processing failed:"));
        assert!(row.ends_with(",2024-01-02 03:04:05.123456"));
    }

    fn cell(range: &Range<Data>, row: u32, col: u32) -> Data {
        range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn test_summary_workbook_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("output.xlsx");

        let summary = Summary {
            country_billings: vec![
                CountryBilling {
                    country: "FR".to_string(),
                    billings: 3.0,
                },
                CountryBilling {
                    country: "US".to_string(),
                    billings: 15.0,
                },
            ],
            period_billings: vec![PeriodBilling {
                period: "Q1".to_string(),
                billings: 7.0,
            }],
            segment_stats: vec![SegmentStats {
                segment: "EU".to_string(),
                count: 1,
                mean: 4.0,
                std: f64::NAN,
                min: 4.0,
                q25: 4.0,
                median: 4.0,
                q75: 4.0,
                max: 4.0,
            }],
        };

        write_summary_xlsx(&summary, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![OUTPUT_SHEET, STATS_SHEET]);

        let output = workbook.worksheet_range(OUTPUT_SHEET).unwrap();
        assert_eq!(cell(&output, 3, 0), text("Countries"));
        assert_eq!(cell(&output, 3, 1), text("Billings"));
        assert_eq!(cell(&output, 4, 0), text("FR"));
        assert_eq!(cell(&output, 4, 1), Data::Float(3.0));
        assert_eq!(cell(&output, 5, 0), text("US"));
        assert_eq!(cell(&output, 5, 1), Data::Float(15.0));
        assert_eq!(cell(&output, 3, 4), text("Period"));
        assert_eq!(cell(&output, 3, 5), text("Billings"));
        assert_eq!(cell(&output, 4, 4), text("Q1"));
        assert_eq!(cell(&output, 4, 5), Data::Float(7.0));
        assert_eq!(cell(&output, 0, 0), Data::Empty);

        let stats = workbook.worksheet_range(STATS_SHEET).unwrap();
        assert_eq!(cell(&stats, 0, 1), text("Value"));
        for (idx, label) in SegmentStats::LABELS.iter().enumerate() {
            assert_eq!(cell(&stats, 1, 1 + idx as u32), text(label));
        }
        assert_eq!(cell(&stats, 2, 0), text("Segment"));
        assert_eq!(cell(&stats, 3, 0), text("EU"));
        assert_eq!(cell(&stats, 3, 1), Data::Float(1.0));
        assert_eq!(cell(&stats, 3, 2), Data::Float(4.0));
        // undefined std is left blank
        assert_eq!(cell(&stats, 3, 3), Data::Empty);
        assert_eq!(cell(&stats, 3, 8), Data::Float(4.0));
    }
}
