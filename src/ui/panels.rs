use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::EndBound;
use crate::data::loader::ParsePolicy;
use crate::state::{AppState, Page};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Left side panel – navigation and range controls
// ---------------------------------------------------------------------------

/// Render the left panel: page selector plus, on station pages, the
/// date-range and policy controls.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Navigation");
    ui.separator();

    for page in Page::ALL {
        if ui
            .selectable_label(state.page == page, page.label())
            .clicked()
        {
            state.open_page(page);
        }
    }

    if matches!(state.page, Page::Station(_)) {
        ui.separator();
        range_controls(ui, state);
    }
}

/// Date pickers seeded from the dataset bounds, the end-bound toggle, and the
/// parse-policy selector.
fn range_controls(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = &state.station_view else {
        return;
    };
    let (mut start, mut end) = (view.start, view.end);
    let (min_date, max_date) = (view.min_date, view.max_date);
    let dropped = view.report.dropped;
    let issues = view.report.issues.clone();

    ui.strong("Choose Time!");
    ui.label(format!("Data from {min_date} to {max_date}"));

    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt("start_date"))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("To");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt("end_date"))
            .changed();
    });
    if changed {
        state.set_range(start.clamp(min_date, max_date), end.clamp(min_date, max_date));
    }

    let mut full_end_day = state.end_bound == EndBound::EndOfDay;
    if ui
        .checkbox(&mut full_end_day, "Include full end day")
        .on_hover_text(
            "Off reproduces the historical behavior: the end date is cut at \
             midnight, so records later that day are excluded.",
        )
        .changed()
    {
        state.set_end_bound(if full_end_day {
            EndBound::EndOfDay
        } else {
            EndBound::StartOfDay
        });
    }

    ui.separator();
    parse_policy_selector(ui, state);

    if dropped > 0 {
        ui.label(
            RichText::new(format!("{dropped} rows skipped (bad time values)"))
                .color(Color32::YELLOW),
        );
    }
    if !issues.is_empty() {
        egui::CollapsingHeader::new("Skipped rows")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                ScrollArea::vertical().max_height(120.0).show(ui, |ui: &mut Ui| {
                    for issue in &issues {
                        ui.monospace(format!("row {}: '{}'", issue.row, issue.value));
                    }
                });
            });
    }
}

fn parse_policy_selector(ui: &mut Ui, state: &mut AppState) {
    ui.strong("On bad time values");
    let current = state.parse_policy;
    egui::ComboBox::from_id_salt("parse_policy")
        .selected_text(policy_label(current))
        .show_ui(ui, |ui: &mut Ui| {
            for policy in [ParsePolicy::Drop, ParsePolicy::Fail, ParsePolicy::Flag] {
                if ui
                    .selectable_label(current == policy, policy_label(policy))
                    .clicked()
                {
                    state.set_parse_policy(policy);
                }
            }
        });
}

fn policy_label(policy: ParsePolicy) -> &'static str {
    match policy {
        ParsePolicy::Drop => "Drop rows silently",
        ParsePolicy::Fail => "Fail the whole load",
        ParsePolicy::Flag => "Drop and list rows",
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status bar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open workbook…").clicked() {
                open_workbook_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(state.workbook_path.display().to_string());

        if let Some(view) = &state.station_view {
            ui.separator();
            ui.label(format!(
                "{} records loaded, {} in range",
                view.report.series.len(),
                view.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Page bodies (central panel)
// ---------------------------------------------------------------------------

/// Main page: project intro plus the station map.
pub fn main_page(ui: &mut Ui) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading("🌊 Water Level Monitoring in Ireland 🌊");
        ui.add_space(8.0);
        ui.label(
            "Hourly water-level measurements across multiple locations in \
             Ireland, in one interactive viewer.",
        );
        ui.add_space(4.0);
        ui.label(
            "📍 Choose from three locations: Dublin Port, Galway Port and \
             Sligo, with data sourced from Digital Ocean Ireland.",
        );
        ui.label(
            "📈 Visualize trends: pick a location and a time window to track \
             water-level fluctuations over time.",
        );
        ui.label(
            "📂 Upload your own data: bring custom measurements as CSV and \
             analyze them the same way.",
        );
        ui.add_space(8.0);
        plot::station_map(ui);
    });
}

/// Station page: chart plus raw table for the filtered window.
pub fn station_page(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.station_view else {
        // Load failed; the top bar carries the error message.
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(
                state
                    .status_message
                    .as_deref()
                    .unwrap_or("No data loaded for this station."),
            );
        });
        return;
    };

    ui.heading(view.station.page_title());
    ui.add_space(4.0);
    plot::time_series_plot(
        ui,
        "station_plot",
        view.station.sheet_name(),
        &view.filtered,
    );
    ui.separator();
    plot::record_table(ui, &view.filtered);
}

/// Upload page: CSV picker plus chart and table for the whole file.
pub fn upload_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Upload Custom Water Level Data");
    ui.add_space(4.0);
    if ui.button("Choose CSV file…").clicked() {
        open_upload_dialog(state);
    }

    let Some(view) = &state.upload_view else {
        return;
    };
    ui.separator();
    if view.report.dropped > 0 {
        ui.label(
            RichText::new(format!(
                "{} rows skipped (bad time values)",
                view.report.dropped
            ))
            .color(Color32::YELLOW),
        );
    }
    plot::time_series_plot(ui, "upload_plot", &view.name, &view.report.series);
    ui.separator();
    plot::record_table(ui, &view.report.series);
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn open_workbook_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open station workbook")
        .add_filter("Workbook", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.set_workbook(path);
    }
}

fn open_upload_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Choose CSV file")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.load_upload(path);
    }
}
