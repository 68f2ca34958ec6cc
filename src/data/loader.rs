use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{CellValue, Record, TimeSeries};

/// Required time column name, shared by workbook sheets and uploads.
pub const TIME_COLUMN: &str = "time";
/// Required measurement column name.
pub const LEVEL_COLUMN: &str = "water level";

// ---------------------------------------------------------------------------
// Stations – the built-in workbook sheets
// ---------------------------------------------------------------------------

/// The three coastal stations shipped in the built-in workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Station {
    DublinPort,
    GalwayPort,
    Sligo,
}

impl Station {
    pub const ALL: [Station; 3] = [Station::DublinPort, Station::GalwayPort, Station::Sligo];

    /// Sheet name inside the workbook, also used as the page / chart title.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Station::DublinPort => "Dublin Port",
            Station::GalwayPort => "Galway Port",
            Station::Sligo => "Sligo",
        }
    }

    /// Heading shown at the top of the station page.
    pub fn page_title(self) -> String {
        format!("Water Level - {}", self.sheet_name())
    }

    /// (latitude, longitude) for the station map on the main page.
    pub fn coordinates(self) -> (f64, f64) {
        match self {
            Station::DublinPort => (53.3457, -6.2217),
            Station::GalwayPort => (53.269, -9.048),
            Station::Sligo => (54.3099, -8.582),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors and load policy
// ---------------------------------------------------------------------------

/// What to do with a row whose time value cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Exclude the row and count it (the lenient historical behavior).
    #[default]
    Drop,
    /// Abort the whole load on the first bad row.
    Fail,
    /// Exclude the row but keep a [`RowIssue`] describing it.
    Flag,
}

/// A row excluded under [`ParsePolicy::Flag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// Zero-based data-row index in the source table.
    pub row: usize,
    /// The raw time value that failed to parse.
    pub value: String,
}

/// Why a load failed wholesale. Bad individual rows are not fatal unless the
/// policy is [`ParsePolicy::Fail`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset '{name}' not found, available: {}", available.join(", "))]
    DatasetNotFound { name: String, available: Vec<String> },
    #[error("table is missing required column '{column}'")]
    SchemaMismatch { column: String },
    #[error("unsupported file type: .{extension} (expected .csv)")]
    UnsupportedFileType { extension: String },
    #[error("row {row}: cannot parse time value '{value}'")]
    Timestamp { row: usize, value: String },
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("workbook is not valid JSON: {0}")]
    Workbook(#[from] serde_json::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// The result of a successful load: the parsed series plus an account of every
/// row that was excluded on the way.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub series: TimeSeries,
    /// Rows excluded because their time value failed to parse.
    pub dropped: usize,
    /// Details for excluded rows, populated only under [`ParsePolicy::Flag`].
    pub issues: Vec<RowIssue>,
}

// ---------------------------------------------------------------------------
// Built-in workbook (JSON, one key per sheet)
// ---------------------------------------------------------------------------

/// Load one sheet of the built-in workbook.
///
/// The schema check inspects the first row only: row objects carry their own
/// keys, so a later row lacking `"water level"` is not a schema error — the
/// level is simply missing (`None`), mirroring how blank cells load. Only a
/// sheet whose very shape is wrong is rejected as a mismatch.
///
/// Workbook layout: a JSON object mapping sheet names to arrays of row
/// objects, each with at least `"time"` and `"water level"`:
///
/// ```json
/// {
///   "Dublin Port": [
///     { "time": "2023-01-01 00:00:00", "water level": 1.42 },
///     ...
///   ],
///   ...
/// }
/// ```
pub fn load_station(path: &Path, sheet: &str, policy: ParsePolicy) -> Result<LoadReport, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_workbook_sheet(&text, sheet, policy)
}

/// Parse a sheet out of workbook JSON text. Split from [`load_station`] so the
/// parsing path is testable without touching the filesystem.
pub fn parse_workbook_sheet(
    text: &str,
    sheet: &str,
    policy: ParsePolicy,
) -> Result<LoadReport, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;

    let sheets = root.as_object().ok_or_else(|| {
        LoadError::Workbook(serde::de::Error::custom(
            "expected a top-level object of sheets",
        ))
    })?;

    let rows = match sheets.get(sheet).and_then(|v| v.as_array()) {
        Some(rows) => rows,
        None => {
            return Err(LoadError::DatasetNotFound {
                name: sheet.to_string(),
                available: sheets.keys().cloned().collect(),
            })
        }
    };

    // Schema check against the first row only, see the doc comment above.
    if let Some(first) = rows.first().and_then(|r| r.as_object()) {
        for column in [TIME_COLUMN, LEVEL_COLUMN] {
            if !first.contains_key(column) {
                return Err(LoadError::SchemaMismatch {
                    column: column.to_string(),
                });
            }
        }
    }

    let mut report = LoadReport::default();
    let mut records = Vec::with_capacity(rows.len());

    for (row_no, row) in rows.iter().enumerate() {
        let obj = match row.as_object() {
            Some(obj) => obj,
            None => {
                exclude_row(&mut report, policy, row_no, row.to_string())?;
                continue;
            }
        };

        let raw_time = obj
            .get(TIME_COLUMN)
            .map(json_cell_text)
            .unwrap_or_default();
        let timestamp = match parse_timestamp(&raw_time) {
            Some(ts) => ts,
            None => {
                exclude_row(&mut report, policy, row_no, raw_time)?;
                continue;
            }
        };

        let water_level = obj.get(LEVEL_COLUMN).and_then(json_number);

        let mut extra = BTreeMap::new();
        for (key, val) in obj {
            if key == TIME_COLUMN || key == LEVEL_COLUMN {
                continue;
            }
            extra.insert(key.clone(), json_cell(val));
        }

        records.push(Record {
            timestamp,
            water_level,
            extra,
        });
    }

    report.series = TimeSeries::from_records(records);
    Ok(report)
}

fn json_cell_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_number(val: &JsonValue) -> Option<f64> {
    match val {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn json_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Custom upload (CSV)
// ---------------------------------------------------------------------------

/// Load a user-supplied file. Only `.csv` is accepted; the extension is
/// checked before any bytes are parsed.
pub fn load_upload(path: &Path, policy: ParsePolicy) -> Result<LoadReport, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "csv" {
        return Err(LoadError::UnsupportedFileType { extension: ext });
    }

    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(file, policy)
}

/// Parse CSV with a header row containing `time` and `water level` columns.
/// All other columns are carried through as extra cells.
pub fn parse_csv<R: Read>(reader: R, policy: ParsePolicy) -> Result<LoadReport, LoadError> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let time_idx = headers
        .iter()
        .position(|h| h == TIME_COLUMN)
        .ok_or_else(|| LoadError::SchemaMismatch {
            column: TIME_COLUMN.to_string(),
        })?;
    let level_idx = headers
        .iter()
        .position(|h| h == LEVEL_COLUMN)
        .ok_or_else(|| LoadError::SchemaMismatch {
            column: LEVEL_COLUMN.to_string(),
        })?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;

        let raw_time = record.get(time_idx).unwrap_or("").to_string();
        let timestamp = match parse_timestamp(&raw_time) {
            Some(ts) => ts,
            None => {
                exclude_row(&mut report, policy, row_no, raw_time)?;
                continue;
            }
        };

        let water_level = record
            .get(level_idx)
            .and_then(|s| s.trim().parse::<f64>().ok());

        let mut extra = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == time_idx || col_idx == level_idx {
                continue;
            }
            let Some(col_name) = headers.get(col_idx) else {
                continue;
            };
            extra.insert(col_name.clone(), guess_cell_type(value));
        }

        records.push(Record {
            timestamp,
            water_level,
            extra,
        });
    }

    report.series = TimeSeries::from_records(records);
    Ok(report)
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Timestamp coercion
// ---------------------------------------------------------------------------

/// Best-effort timestamp parse. Accepts RFC 3339 / ISO-8601 with an offset,
/// the usual naive `YYYY-MM-DD HH:MM[:SS]` variants, Irish-style
/// `DD/MM/YYYY` date-times, and bare dates (midnight). Naive values are taken
/// as UTC; offset-carrying values are converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

/// Apply the parse-failure policy to one bad row.
fn exclude_row(
    report: &mut LoadReport,
    policy: ParsePolicy,
    row: usize,
    value: String,
) -> Result<(), LoadError> {
    match policy {
        ParsePolicy::Drop => {
            report.dropped += 1;
            Ok(())
        }
        ParsePolicy::Fail => Err(LoadError::Timestamp { row, value }),
        ParsePolicy::Flag => {
            report.dropped += 1;
            report.issues.push(RowIssue { row, value });
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKBOOK: &str = r#"{
        "Dublin Port": [
            { "time": "2023-01-01 00:00:00", "water level": 1.42 },
            { "time": "2023-01-01 01:00:00", "water level": 1.05 },
            { "time": "not a date",          "water level": 0.90 }
        ],
        "Galway Port": [],
        "Sligo": [
            { "time": "2023-06-01T06:00:00Z", "water level": 2.1, "quality": "good" }
        ]
    }"#;

    #[test]
    fn parses_known_timestamp_shapes() {
        for raw in [
            "2023-01-02T03:04:05Z",
            "2023-01-02T03:04:05+00:00",
            "2023-01-02 03:04:05",
            "2023-01-02 03:04",
            "02/01/2023 03:04",
            "2023-01-02",
            "02/01/2023",
        ] {
            assert!(parse_timestamp(raw).is_some(), "failed to parse {raw}");
        }
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday-ish").is_none());
    }

    #[test]
    fn offset_timestamps_normalize_to_utc() {
        let ts = parse_timestamp("2023-01-02T03:00:00+01:00").unwrap();
        assert_eq!(ts, parse_timestamp("2023-01-02 02:00:00").unwrap());
    }

    #[test]
    fn workbook_sheet_loads_and_drops_bad_rows() {
        let report =
            parse_workbook_sheet(WORKBOOK, "Dublin Port", ParsePolicy::Drop).unwrap();
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.dropped, 1);
        assert!(report.issues.is_empty());
        assert_eq!(report.series.records[0].water_level, Some(1.42));
    }

    #[test]
    fn flag_policy_records_the_bad_row() {
        let report =
            parse_workbook_sheet(WORKBOOK, "Dublin Port", ParsePolicy::Flag).unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(
            report.issues,
            vec![RowIssue {
                row: 2,
                value: "not a date".to_string()
            }]
        );
    }

    #[test]
    fn fail_policy_aborts_on_the_bad_row() {
        let err =
            parse_workbook_sheet(WORKBOOK, "Dublin Port", ParsePolicy::Fail).unwrap_err();
        assert!(matches!(err, LoadError::Timestamp { row: 2, .. }));
    }

    #[test]
    fn unknown_sheet_is_dataset_not_found() {
        let err = parse_workbook_sheet(WORKBOOK, "Cork", ParsePolicy::Drop).unwrap_err();
        match err {
            LoadError::DatasetNotFound { name, available } => {
                assert_eq!(name, "Cork");
                assert_eq!(available, vec!["Dublin Port", "Galway Port", "Sligo"]);
            }
            other => panic!("expected DatasetNotFound, got {other}"),
        }
    }

    #[test]
    fn first_row_missing_level_is_schema_mismatch() {
        let workbook = r#"{ "Dublin Port": [ { "time": "2023-01-01 00:00:00" } ] }"#;
        let err = parse_workbook_sheet(workbook, "Dublin Port", ParsePolicy::Drop).unwrap_err();
        assert!(matches!(
            err,
            LoadError::SchemaMismatch { column } if column == LEVEL_COLUMN
        ));
    }

    #[test]
    fn later_rows_missing_level_load_as_missing_values() {
        let workbook = r#"{
            "Dublin Port": [
                { "time": "2023-01-01 00:00:00", "water level": 1.42 },
                { "time": "2023-01-01 01:00:00" }
            ]
        }"#;
        let report = parse_workbook_sheet(workbook, "Dublin Port", ParsePolicy::Drop).unwrap();
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.series.records[1].water_level, None);
    }

    #[test]
    fn station_page_titles_match_sheet_names() {
        assert_eq!(
            Station::DublinPort.page_title(),
            "Water Level - Dublin Port"
        );
        assert_eq!(Station::Sligo.page_title(), "Water Level - Sligo");
    }

    #[test]
    fn empty_sheet_loads_as_empty_series() {
        let report = parse_workbook_sheet(WORKBOOK, "Galway Port", ParsePolicy::Drop).unwrap();
        assert!(report.series.is_empty());
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn extra_workbook_columns_pass_through() {
        let report = parse_workbook_sheet(WORKBOOK, "Sligo", ParsePolicy::Drop).unwrap();
        assert_eq!(report.series.extra_columns, vec!["quality"]);
        assert_eq!(
            report.series.records[0].extra.get("quality"),
            Some(&CellValue::String("good".to_string()))
        );
    }

    #[test]
    fn csv_missing_level_column_is_schema_mismatch() {
        let csv = "time,depth\n2023-01-01 00:00,1.0\n";
        let err = parse_csv(csv.as_bytes(), ParsePolicy::Drop).unwrap_err();
        match err {
            LoadError::SchemaMismatch { column } => assert_eq!(column, LEVEL_COLUMN),
            other => panic!("expected SchemaMismatch, got {other}"),
        }
    }

    #[test]
    fn csv_one_malformed_row_among_ten_yields_nine_records() {
        let mut csv = String::from("time,water level\n");
        for hour in 0..9 {
            csv.push_str(&format!("2023-01-01 0{hour}:00:00,1.{hour}\n"));
        }
        csv.push_str("banana,9.9\n");

        let report = parse_csv(csv.as_bytes(), ParsePolicy::Drop).unwrap();
        assert_eq!(report.series.len(), 9);
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn csv_blank_level_is_preserved_as_missing() {
        let csv = "time,water level,note\n2023-01-01 00:00,,calm\n";
        let report = parse_csv(csv.as_bytes(), ParsePolicy::Drop).unwrap();
        assert_eq!(report.series.records[0].water_level, None);
        assert_eq!(
            report.series.records[0].extra.get("note"),
            Some(&CellValue::String("calm".to_string()))
        );
    }

    #[test]
    fn upload_rejects_non_csv_extension() {
        let err = load_upload(Path::new("tides.xlsx"), ParsePolicy::Drop).unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnsupportedFileType { extension } if extension == "xlsx"
        ));
    }
}
