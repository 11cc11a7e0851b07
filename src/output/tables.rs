use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Average needs per job; leaf stages have none and render dimmed.
pub fn needs_cell(total_needs: usize, jobs: usize) -> Cell {
    if total_needs == 0 {
        return Cell::new("-").fg(TableColor::DarkGrey);
    }

    #[allow(clippy::cast_precision_loss)]
    let per_job = total_needs as f64 / jobs.max(1) as f64;
    Cell::new(format!("{per_job:.1}"))
}
