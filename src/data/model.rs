use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// CellValue – a single cell in a pass-through column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value for columns beyond `time` / `water level`.
/// Custom uploads may carry arbitrary extra columns; they are preserved as-is
/// and only ever displayed, never interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, ""),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of a dataset
// ---------------------------------------------------------------------------

/// One timestamped water-level sample (one row of the source table).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Sample time, normalized to UTC. Always successfully parsed: rows whose
    /// time value cannot be coerced never make it into a [`TimeSeries`].
    pub timestamp: DateTime<Utc>,
    /// Water level in meters. `None` when the cell is absent or non-numeric;
    /// no plausibility check is applied.
    pub water_level: Option<f64>,
    /// Any further columns, passed through unmodified.
    pub extra: BTreeMap<String, CellValue>,
}

// ---------------------------------------------------------------------------
// TimeSeries – the complete loaded dataset
// ---------------------------------------------------------------------------

/// An ordered sequence of records in source-row order. The loader never sorts;
/// chronological order is a property of the source data, not enforced here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    /// All records (rows).
    pub records: Vec<Record>,
    /// Ordered list of extra column names (excludes time, water level).
    pub extra_columns: Vec<String>,
}

impl TimeSeries {
    /// Build the extra-column index from loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut extra_columns: Vec<String> = Vec::new();
        for rec in &records {
            for col in rec.extra.keys() {
                if !extra_columns.contains(col) {
                    extra_columns.push(col.clone());
                }
            }
        }
        extra_columns.sort();
        TimeSeries {
            records,
            extra_columns,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn rec(ts: &str, level: f64) -> Record {
        let naive = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap();
        Record {
            timestamp: naive.and_utc(),
            water_level: Some(level),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn from_records_collects_extra_columns_sorted() {
        let mut a = rec("2023-01-01 10:00", 1.2);
        a.extra
            .insert("station".into(), CellValue::String("Dublin".into()));
        let mut b = rec("2023-01-01 11:00", 1.3);
        b.extra.insert("quality".into(), CellValue::Integer(1));

        let series = TimeSeries::from_records(vec![a, b]);
        assert_eq!(series.extra_columns, vec!["quality", "station"]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn cell_value_display() {
        assert_eq!(CellValue::String("x".into()).to_string(), "x");
        assert_eq!(CellValue::Integer(4).to_string(), "4");
        assert_eq!(CellValue::Bool(true).to_string(), "true");
        assert_eq!(CellValue::Null.to_string(), "");
    }
}
