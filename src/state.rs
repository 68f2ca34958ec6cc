use std::path::PathBuf;

use chrono::NaiveDate;

use crate::data::filter::{EndBound, bounds, filter_range};
use crate::data::loader::{self, LoadReport, ParsePolicy, Station};
use crate::data::model::TimeSeries;

/// Workbook the station pages read, resolved relative to the working
/// directory. `generate_sample` writes this file.
pub const DEFAULT_WORKBOOK: &str = "ireland_water_level_hourly.json";

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// The five fixed pages of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Main,
    Station(Station),
    Upload,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Main,
        Page::Station(Station::DublinPort),
        Page::Station(Station::GalwayPort),
        Page::Station(Station::Sligo),
        Page::Upload,
    ];

    /// Label shown in the navigation panel.
    pub fn label(self) -> &'static str {
        match self {
            Page::Main => "Main",
            Page::Station(station) => station.sheet_name(),
            Page::Upload => "Visualize Your Own!",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-page views
// ---------------------------------------------------------------------------

/// A loaded station page: the dataset plus the current range selection and
/// its cached filtered view.
pub struct StationView {
    pub station: Station,
    pub report: LoadReport,
    /// Selectable range, from the dataset's bounds.
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// Current selection (inclusive).
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Records inside the selection, recomputed on every range change.
    pub filtered: TimeSeries,
}

/// A loaded custom upload. Rendered whole, without a range control.
pub struct UploadView {
    pub path: PathBuf,
    pub name: String,
    pub report: LoadReport,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Currently selected page.
    pub page: Page,

    /// Path of the station workbook.
    pub workbook_path: PathBuf,

    /// What to do with rows whose time value fails to parse.
    pub parse_policy: ParsePolicy,

    /// End-of-range semantics for the date filter.
    pub end_bound: EndBound,

    /// Loaded state of the current station page, if any.
    pub station_view: Option<StationView>,

    /// Loaded custom upload, if any.
    pub upload_view: Option<UploadView>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            page: Page::default(),
            workbook_path: PathBuf::from(DEFAULT_WORKBOOK),
            parse_policy: ParsePolicy::default(),
            end_bound: EndBound::default(),
            station_view: None,
            upload_view: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Switch pages. Station pages load fresh on every visit; nothing is
    /// cached across page switches.
    pub fn open_page(&mut self, page: Page) {
        self.page = page;
        self.status_message = None;
        self.station_view = None;
        if let Page::Station(station) = page {
            self.load_station(station);
        }
    }

    /// Load one station sheet from the workbook and seed the range selection
    /// from its bounds.
    pub fn load_station(&mut self, station: Station) {
        self.station_view = None;

        let report =
            match loader::load_station(&self.workbook_path, station.sheet_name(), self.parse_policy)
            {
                Ok(report) => report,
                Err(e) => {
                    log::error!("failed to load '{}': {e}", station.sheet_name());
                    self.status_message = Some(format!("Error: {e}"));
                    return;
                }
            };

        let (min_date, max_date) = match bounds(&report.series) {
            Ok(b) => b,
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        };

        log::info!(
            "loaded {} records for '{}' ({} dropped)",
            report.series.len(),
            station.sheet_name(),
            report.dropped
        );

        let filtered = filter_range(&report.series, min_date, max_date, self.end_bound);
        self.station_view = Some(StationView {
            station,
            report,
            min_date,
            max_date,
            start: min_date,
            end: max_date,
            filtered,
        });
    }

    /// Load a user-supplied CSV into the upload page.
    pub fn load_upload(&mut self, path: PathBuf) {
        match loader::load_upload(&path, self.parse_policy) {
            Ok(report) => {
                log::info!(
                    "loaded {} records from {} ({} dropped)",
                    report.series.len(),
                    path.display(),
                    report.dropped
                );
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.upload_view = Some(UploadView { path, name, report });
                self.status_message = None;
            }
            Err(e) => {
                log::error!("failed to load upload {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Apply a new date selection on the station page.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) {
        if let Some(view) = &mut self.station_view {
            view.start = start;
            view.end = end;
        }
        self.refilter();
    }

    /// Recompute the station page's filtered view after a selection change.
    pub fn refilter(&mut self) {
        if let Some(view) = &mut self.station_view {
            view.filtered = filter_range(&view.report.series, view.start, view.end, self.end_bound);
        }
    }

    /// Switch the end-of-range semantics and refilter.
    pub fn set_end_bound(&mut self, end_bound: EndBound) {
        if self.end_bound != end_bound {
            self.end_bound = end_bound;
            self.refilter();
        }
    }

    /// Switch the parse policy and reload whatever is on screen.
    pub fn set_parse_policy(&mut self, policy: ParsePolicy) {
        if self.parse_policy == policy {
            return;
        }
        self.parse_policy = policy;
        if let Page::Station(station) = self.page {
            self.load_station(station);
        }
        let upload_path = self.upload_view.as_ref().map(|view| view.path.clone());
        if let Some(path) = upload_path {
            self.load_upload(path);
        }
    }

    /// Point the app at a different workbook file.
    pub fn set_workbook(&mut self, path: PathBuf) {
        self.workbook_path = path;
        if let Page::Station(station) = self.page {
            self.load_station(station);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_pages_have_distinct_labels() {
        let labels: Vec<_> = Page::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Main",
                "Dublin Port",
                "Galway Port",
                "Sligo",
                "Visualize Your Own!"
            ]
        );
    }

    #[test]
    fn opening_a_station_page_against_a_missing_workbook_reports_inline() {
        let mut state = AppState {
            workbook_path: PathBuf::from("does-not-exist.json"),
            ..AppState::default()
        };
        state.open_page(Page::Station(Station::Sligo));
        assert!(state.station_view.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
    }
}
