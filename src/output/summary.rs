use indexmap::IndexMap;
use std::fmt::Write;
use std::path::Path;

use comfy_table::Cell;

use crate::config::OutputFormat;
use crate::gitlab::JobGraph;

use super::styling::{bright, bright_yellow, cyan, dim};
use super::tables::{create_table, cyan_header, needs_cell};

/// Outcome of one generator run, as reported to the user.
pub struct RunReport<'a> {
    pub graph: &'a JobGraph,
    pub output: &'a Path,
    pub format: OutputFormat,
    pub bytes: u64,
    pub seed: Option<u64>,
}

/// Prints the job count, output size and a per-stage breakdown to stdout.
pub fn print_summary(report: &RunReport) {
    println!("{}", render_summary(report));
}

#[derive(Debug, Default, PartialEq, Eq)]
struct StageRow {
    jobs: usize,
    needs: usize,
}

fn stage_rows(graph: &JobGraph) -> IndexMap<&str, StageRow> {
    let mut rows: IndexMap<&str, StageRow> = graph
        .stages
        .iter()
        .map(|stage| (stage.as_str(), StageRow::default()))
        .collect();

    for job in graph.jobs.values() {
        let row = rows.entry(job.stage.as_str()).or_default();
        row.jobs += 1;
        row.needs += job.needs.len();
    }

    rows
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_summary(report: &RunReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}",
        dim("total number of jobs:"),
        bright_yellow(report.graph.job_count())
    );
    let _ = writeln!(
        output,
        "  {} {}",
        dim(format!("size of generated {} on disk:", report.format.label())),
        bright_yellow(report.bytes)
    );
    let _ = writeln!(
        output,
        "  {} {}",
        dim("Output:"),
        cyan(report.output.display())
    );
    let seed = report
        .seed
        .map_or_else(|| "random".to_string(), |seed| seed.to_string());
    let _ = writeln!(output, "  {} {}\n", dim("Seed:"), dim(seed));

    add_section_header(&mut output, "📋", "Stages");
    let mut table = create_table();
    table.set_header(cyan_header(&["Stage", "Jobs", "Needs per job"]));
    for (stage, row) in stage_rows(report.graph) {
        table.add_row(vec![
            Cell::new(stage),
            Cell::new(row.jobs),
            needs_cell(row.needs, row.jobs),
        ]);
    }
    let _ = writeln!(output, "{table}");

    output
}
