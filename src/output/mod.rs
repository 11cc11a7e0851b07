mod progress;
mod styling;
mod summary;
mod tables;
mod tree;

pub use progress::PhaseProgress;
pub use styling::{dim, green_bold};
pub use summary::{print_summary, RunReport};
pub use tree::print_tree;

/// Prints the `gendag` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        green_bold("🌳 gendag"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Synthetic CI Job Graph Generator")
    );
}
