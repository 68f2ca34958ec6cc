use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use super::model::TimeSeries;

// ---------------------------------------------------------------------------
// Inclusive date-range filter
// ---------------------------------------------------------------------------

/// How the end of the selected range maps onto an instant.
///
/// The historical behavior truncates the end date to midnight, so records on
/// the end date after 00:00 are excluded. That is likely unintended but it is
/// what the deployed system did, so it stays selectable and stays the default;
/// [`EndBound::EndOfDay`] is the corrected semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndBound {
    /// `end` becomes `end 00:00:00 UTC` (legacy truncation).
    #[default]
    StartOfDay,
    /// The whole end date is included.
    EndOfDay,
}

/// Return the records whose timestamp falls inside the inclusive
/// `[start, end]` window, in their original order.
///
/// `start` expands to `start 00:00:00 UTC`; the end instant is controlled by
/// `end_bound`. `start > end` yields an empty series, not an error. The input
/// is untouched; the result is an independent copy.
pub fn filter_range(
    series: &TimeSeries,
    start: NaiveDate,
    end: NaiveDate,
    end_bound: EndBound,
) -> TimeSeries {
    let start_at = start_of_day(start);
    let records = series
        .records
        .iter()
        .filter(|rec| {
            let ts = rec.timestamp;
            if ts < start_at {
                return false;
            }
            match end_bound {
                EndBound::StartOfDay => ts <= start_of_day(end),
                // end == NaiveDate::MAX has no successor; nothing lies beyond it
                EndBound::EndOfDay => end
                    .succ_opt()
                    .map_or(true, |next_day| ts < start_of_day(next_day)),
            }
        })
        .cloned()
        .collect();

    TimeSeries {
        records,
        extra_columns: series.extra_columns.clone(),
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

// ---------------------------------------------------------------------------
// Bounds discovery
// ---------------------------------------------------------------------------

/// Asking for the date bounds of an empty series.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("dataset contains no records")]
pub struct EmptySeries;

/// Calendar dates of the earliest and latest timestamp in `series`, used to
/// seed the UI's date pickers. The series need not be sorted.
pub fn bounds(series: &TimeSeries) -> Result<(NaiveDate, NaiveDate), EmptySeries> {
    let mut timestamps = series.records.iter().map(|rec| rec.timestamp);
    let first = timestamps.next().ok_or(EmptySeries)?;

    let (min, max) = timestamps.fold((first, first), |(min, max), ts| {
        (min.min(ts), max.max(ts))
    });
    Ok((min.date_naive(), max.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use chrono::NaiveDateTime;
    use std::collections::BTreeMap;

    fn series(rows: &[(&str, f64)]) -> TimeSeries {
        let records = rows
            .iter()
            .map(|&(ts, level)| Record {
                timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M")
                    .unwrap()
                    .and_utc(),
                water_level: Some(level),
                extra: BTreeMap::new(),
            })
            .collect();
        TimeSeries::from_records(records)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> TimeSeries {
        series(&[
            ("2023-01-01 10:00", 1.2),
            ("2023-01-02 10:00", 1.5),
            ("2023-01-03 10:00", 0.9),
        ])
    }

    #[test]
    fn legacy_truncation_excludes_end_date_after_midnight() {
        let out = filter_range(
            &sample(),
            date("2023-01-01"),
            date("2023-01-03"),
            EndBound::StartOfDay,
        );
        // 2023-01-03 10:00 lies past the truncated end instant.
        let levels: Vec<_> = out.records.iter().map(|r| r.water_level).collect();
        assert_eq!(levels, vec![Some(1.2), Some(1.5)]);
    }

    #[test]
    fn end_of_day_includes_the_whole_end_date() {
        let out = filter_range(
            &sample(),
            date("2023-01-01"),
            date("2023-01-03"),
            EndBound::EndOfDay,
        );
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn inverted_range_is_empty_not_an_error() {
        for end_bound in [EndBound::StartOfDay, EndBound::EndOfDay] {
            let out = filter_range(&sample(), date("2023-01-03"), date("2023-01-01"), end_bound);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn empty_input_filters_to_empty() {
        let out = filter_range(
            &TimeSeries::default(),
            date("2023-01-01"),
            date("2023-01-03"),
            EndBound::StartOfDay,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn single_day_range_under_truncation_is_midnight_only() {
        let data = series(&[("2023-01-01 00:00", 2.0), ("2023-01-01 10:00", 1.2)]);
        let out = filter_range(&data, date("2023-01-01"), date("2023-01-01"), EndBound::StartOfDay);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records[0].water_level, Some(2.0));
    }

    #[test]
    fn filtering_is_idempotent() {
        let once = filter_range(
            &sample(),
            date("2023-01-01"),
            date("2023-01-02"),
            EndBound::EndOfDay,
        );
        let twice = filter_range(&once, date("2023-01-01"), date("2023-01-02"), EndBound::EndOfDay);
        assert_eq!(once, twice);
    }

    #[test]
    fn filtering_preserves_source_order() {
        // Deliberately unsorted input: order must carry through untouched.
        let data = series(&[
            ("2023-01-02 10:00", 1.5),
            ("2023-01-01 10:00", 1.2),
            ("2023-01-02 04:00", 1.1),
        ]);
        let out = filter_range(&data, date("2023-01-01"), date("2023-01-02"), EndBound::EndOfDay);
        let levels: Vec<_> = out.records.iter().map(|r| r.water_level).collect();
        assert_eq!(levels, vec![Some(1.5), Some(1.2), Some(1.1)]);
    }

    #[test]
    fn bounds_of_unsorted_series() {
        let data = series(&[
            ("2023-01-02 10:00", 1.5),
            ("2023-01-01 10:00", 1.2),
            ("2023-01-03 10:00", 0.9),
        ]);
        let (min, max) = bounds(&data).unwrap();
        assert_eq!(min, date("2023-01-01"));
        assert_eq!(max, date("2023-01-03"));
        assert!(min <= max);
    }

    #[test]
    fn bounds_of_empty_series_is_an_error() {
        assert_eq!(bounds(&TimeSeries::default()), Err(EmptySeries));
    }
}
