use chrono::{Local, NaiveDate, NaiveDateTime};

const FULL_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d-%b-%Y", "%d-%b-%y", "%Y/%m/%d",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

// Month-only headers ("Jan-16", "Jan 2016", "2016-01") resolve to the 1st.
const MONTH_FORMATS: &[&str] = &["%b-%y", "%b-%Y", "%b %Y", "%B %Y", "%Y-%m"];

/// Parses a date header cell from the export. Returns `None` if no known
/// format matches.
pub fn parse_date_key(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in FULL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }

    // chrono needs a day field, so month-only formats are parsed with one appended.
    let with_day = format!("{} 01", text);
    MONTH_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&with_day, &format!("{} %d", fmt)).ok()
    })
}

/// Cell texts that exports use for "no data". Matched against the whole
/// trimmed cell.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing_marker(text: &str) -> bool {
    MISSING_MARKERS.contains(&text.trim())
}

/// Parses an observation cell. An empty cell or a missing marker is a
/// missing observation (NaN); anything else must be a plain number.
pub fn parse_value(raw: Option<&str>) -> Option<f64> {
    match raw.map(str::trim) {
        None => Some(f64::NAN),
        Some(text) if is_missing_marker(text) => Some(f64::NAN),
        Some(text) => text.parse::<f64>().ok(),
    }
}

pub fn now_timestamp() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be ascending.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
