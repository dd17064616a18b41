// src/report.rs
//
// Delimited-text rendering of the analysis results. Column names and order
// are consumed downstream and must not change.

use crate::types::{FrameCongestion, VehicleSummary};

pub const VEHICLE_COLUMNS: [&str; 7] = [
    "id",
    "label",
    "entry_frame",
    "exit_frame",
    "total_frames",
    "speed_kmph",
    "congestion",
];

pub const FRAME_COLUMNS: [&str; 3] = ["frame", "vehicle_count", "congestion"];

pub fn vehicle_csv(summaries: &[VehicleSummary]) -> String {
    let mut out = String::new();
    push_row(&mut out, VEHICLE_COLUMNS.iter().map(|c| c.to_string()));
    for s in summaries {
        push_row(
            &mut out,
            [
                s.track_id.to_string(),
                s.label.clone(),
                s.entry_frame.to_string(),
                s.exit_frame.to_string(),
                s.total_frames.to_string(),
                format_speed(s.speed_kmph),
                s.congestion.to_string(),
            ],
        );
    }
    out
}

pub fn frame_csv<'a>(records: impl IntoIterator<Item = &'a FrameCongestion>) -> String {
    let mut out = String::new();
    push_row(&mut out, FRAME_COLUMNS.iter().map(|c| c.to_string()));
    for r in records {
        push_row(
            &mut out,
            [
                r.frame_index.to_string(),
                r.vehicle_count.to_string(),
                r.congestion.to_string(),
            ],
        );
    }
    out
}

/// Speeds always carry a decimal point (`18.0`, `2.63`).
fn format_speed(speed: f64) -> String {
    let mut s = speed.to_string();
    if !s.contains('.') && speed.is_finite() {
        s.push_str(".0");
    }
    s
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, &field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
