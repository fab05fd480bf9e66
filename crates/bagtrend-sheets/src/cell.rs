//! Typed cell values and their write-side string coercion.

use chrono::{DateTime, NaiveDate, Utc};

/// A single cell value on its way into the remote store.
///
/// The store holds string-typed cells, so every value is coerced on write:
/// timestamps become ISO-8601 strings, missing values become empty strings,
/// and everything else passes through in its display form.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Missing,
}

impl CellValue {
    /// Coerce this value into the string cell written to the store.
    #[must_use]
    pub fn into_cell(self) -> String {
        match self {
            CellValue::Text(s) => s,
            CellValue::Number(n) => n.to_string(),
            CellValue::Timestamp(t) => t.to_rfc3339(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Missing => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(t: DateTime<Utc>) -> Self {
        CellValue::Timestamp(t)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

/// `None` is a missing cell, coerced to an empty string on write.
impl From<Option<f64>> for CellValue {
    fn from(n: Option<f64>) -> Self {
        n.map_or(CellValue::Missing, CellValue::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_coerces_to_iso8601() {
        let t = Utc.with_ymd_and_hms(2026, 8, 7, 12, 30, 0).unwrap();
        assert_eq!(
            CellValue::Timestamp(t).into_cell(),
            "2026-08-07T12:30:00+00:00"
        );
    }

    #[test]
    fn missing_coerces_to_empty_string() {
        assert_eq!(CellValue::Missing.into_cell(), "");
        assert_eq!(CellValue::from(None::<f64>).into_cell(), "");
    }

    #[test]
    fn date_coerces_to_calendar_day() {
        let d = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert_eq!(CellValue::Date(d).into_cell(), "2026-08-07");
    }

    #[test]
    fn numbers_and_text_pass_through() {
        assert_eq!(CellValue::Number(130.0).into_cell(), "130");
        assert_eq!(CellValue::Number(95.5).into_cell(), "95.5");
        assert_eq!(CellValue::from("tote bag").into_cell(), "tote bag");
    }
}
