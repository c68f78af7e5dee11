//! Table renderer for status output

use crate::cli::display::{ColorTheme, StatusIcon};
use crate::reconciler::WorkloadStatus;
use chrono::Utc;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render container statuses as a formatted table
    pub fn render_status(&self, statuses: &[WorkloadStatus]) -> String {
        if statuses.is_empty() {
            return "No containers found".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("CONTAINER").set_alignment(CellAlignment::Left),
                Cell::new("KIND").set_alignment(CellAlignment::Left),
                Cell::new("READY").set_alignment(CellAlignment::Center),
                Cell::new("SERVICE").set_alignment(CellAlignment::Center),
                Cell::new("HPA").set_alignment(CellAlignment::Center),
                Cell::new("AGE").set_alignment(CellAlignment::Right),
            ]);

        for status in statuses {
            let ready = status.ready_replicas.unwrap_or(0);
            let desired = status.desired_replicas.unwrap_or(0);
            let ready_cell = match (status.ready_replicas, status.desired_replicas) {
                (Some(r), Some(d)) => Cell::new(format!(
                    "{} {}/{}",
                    StatusIcon::get_replica_icon(r, d),
                    r,
                    d
                ))
                .fg(self.theme.get_replica_color(ready, desired)),
                (Some(r), None) => Cell::new(format!("{} active", r)),
                _ => Cell::new(StatusIcon::UNKNOWN).fg(self.theme.muted),
            };
            table.add_row(vec![
                Cell::new(&status.name),
                Cell::new(status.kind.as_str()),
                ready_cell,
                presence_cell(status.service_present, &self.theme),
                presence_cell(status.hpa_present, &self.theme),
                Cell::new(format_age(status.created.as_ref())),
            ]);
        }
        table.to_string()
    }
}

fn presence_cell(present: bool, theme: &ColorTheme) -> Cell {
    if present {
        Cell::new(StatusIcon::SUCCESS).fg(theme.success)
    } else {
        Cell::new("-").fg(theme.muted)
    }
}

/// kubectl-style age: "45s", "12m", "3h", "7d"
fn format_age(created: Option<&Time>) -> String {
    let Some(Time(timestamp)) = created else {
        return "-".to_string();
    };
    let elapsed = Utc::now().signed_duration_since(*timestamp);
    let seconds = elapsed.num_seconds().max(0);
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h", seconds / 3600)
    } else {
        format!("{}d", seconds / 86400)
    }
}
