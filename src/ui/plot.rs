use chrono::{DateTime, Utc};
use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::data::loader::Station;
use crate::data::model::TimeSeries;

// ---------------------------------------------------------------------------
// Time-series line chart
// ---------------------------------------------------------------------------

/// Render the water-level line chart. The x axis carries unix timestamps so
/// the plot stays linear in time; ticks are formatted back into dates.
pub fn time_series_plot(ui: &mut Ui, id: &str, name: &str, series: &TimeSeries) {
    ui.heading(format!("Time Series {name}"));

    if series.is_empty() {
        ui.label("No records in the selected range.");
        return;
    }

    let points: PlotPoints = series
        .records
        .iter()
        .filter_map(|rec| {
            let level = rec.water_level?;
            Some([date_to_chart(rec.timestamp), level])
        })
        .collect();

    let line = Line::new(points).name(name).width(1.5);

    Plot::new(id.to_string())
        .legend(Legend::default())
        .x_axis_label("Time")
        .y_axis_label("Water Level (meters)")
        .x_axis_formatter(|mark, _range| format_time_tick(mark.value))
        .height(ui.available_height() * 0.55)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(line);
        });
}

fn date_to_chart(ts: DateTime<Utc>) -> f64 {
    ts.timestamp() as f64
}

fn format_time_tick(value: f64) -> String {
    match DateTime::from_timestamp(value as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%d\n%H:%M").to_string(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Data table
// ---------------------------------------------------------------------------

/// Render the raw records under the chart: time, water level, then any
/// pass-through columns in index order.
pub fn record_table(ui: &mut Ui, series: &TimeSeries) {
    ui.heading("Water Level Data");

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(160.0))
        .column(Column::auto().at_least(120.0))
        .columns(Column::remainder(), series.extra_columns.len())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("time");
            });
            header.col(|ui| {
                ui.strong("water level");
            });
            for col in &series.extra_columns {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, series.len(), |mut row| {
                let rec = &series.records[row.index()];
                row.col(|ui| {
                    ui.monospace(rec.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
                });
                row.col(|ui| {
                    match rec.water_level {
                        Some(level) => ui.monospace(format!("{level:.3}")),
                        None => ui.weak("–"),
                    };
                });
                for col in &series.extra_columns {
                    row.col(|ui| {
                        match rec.extra.get(col) {
                            Some(val) => ui.label(val.to_string()),
                            None => ui.weak(""),
                        };
                    });
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Station map (main page)
// ---------------------------------------------------------------------------

/// A lightweight map stand-in: the three stations plotted by longitude and
/// latitude over an Ireland-sized viewport.
pub fn station_map(ui: &mut Ui) {
    Plot::new("station_map")
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .include_x(-10.5)
        .include_x(-5.0)
        .include_y(51.3)
        .include_y(55.5)
        .show(ui, |plot_ui| {
            for station in Station::ALL {
                let (lat, lon) = station.coordinates();
                plot_ui.points(
                    Points::new(vec![[lon, lat]])
                        .radius(5.0)
                        .name(station.sheet_name()),
                );
                plot_ui.text(Text::new(
                    PlotPoint::new(lon, lat + 0.12),
                    station.sheet_name(),
                ));
            }
        });
}
