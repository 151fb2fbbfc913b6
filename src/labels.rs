use crate::schema::{ParsedLabel, TypedRow, COMMENT_FAILURE_PREFIX, COMMENT_SUCCESS};
use crate::utils::now_timestamp;
use chrono::NaiveDateTime;
use thiserror::Error;

pub const LABEL_SEPARATOR: &str = " - ";

/// Why a series label could not be classified. Recorded on the row, never
/// returned past [`classify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("composite label is missing")]
    MissingLabel,

    #[error("no '{separator}' separator in label '{label}'")]
    MissingSeparator {
        label: String,
        separator: &'static str,
    },

    #[error("type is missing for label '{0}'")]
    MissingType(String),

    #[error("subtype is missing for label '{0}'")]
    MissingSubtype(String),
}

/// Splits `"<segment> - <period>"` and pairs it with the type fields.
/// Parts after the second separator are ignored.
pub fn parse_label(
    composite: Option<&str>,
    type_name: Option<&str>,
    subtype: Option<&str>,
) -> Result<ParsedLabel, LabelError> {
    let label = composite.ok_or(LabelError::MissingLabel)?;

    let mut parts = label.split(LABEL_SEPARATOR);
    let segment = parts.next().unwrap_or_default();
    let period = parts.next().ok_or_else(|| LabelError::MissingSeparator {
        label: label.to_string(),
        separator: LABEL_SEPARATOR,
    })?;

    let type_name = type_name.ok_or_else(|| LabelError::MissingType(label.to_string()))?;
    let subtype = subtype.ok_or_else(|| LabelError::MissingSubtype(label.to_string()))?;

    Ok(ParsedLabel {
        segment: segment.to_string(),
        period: period.to_string(),
        type_name: type_name.to_string(),
        subtype: subtype.to_string(),
    })
}

/// Classifies one generated row. Every input produces a `TypedRow`; failures
/// leave the label fields empty and describe the cause in `comment`.
pub fn classify(composite: Option<&str>, type_name: Option<&str>, subtype: Option<&str>) -> TypedRow {
    classify_at(composite, type_name, subtype, now_timestamp())
}

pub fn classify_at(
    composite: Option<&str>,
    type_name: Option<&str>,
    subtype: Option<&str>,
    processed_at: NaiveDateTime,
) -> TypedRow {
    match parse_label(composite, type_name, subtype) {
        Ok(parsed) => TypedRow {
            segment: parsed.segment,
            period: parsed.period,
            type_name: parsed.type_name,
            subtype: parsed.subtype,
            comment: COMMENT_SUCCESS.to_string(),
            processed_at,
        },
        Err(e) => TypedRow {
            segment: String::new(),
            period: String::new(),
            type_name: String::new(),
            subtype: String::new(),
            comment: format!("{}{}", COMMENT_FAILURE_PREFIX, e),
            processed_at,
        },
    }
}
