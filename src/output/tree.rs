use std::fmt::Write;

use crate::dag::StagedTree;

/// Prints the staged tree to stdout, one `id: X, stage: N` line per node.
pub fn print_tree(staged: &StagedTree) {
    print!("{}", render_tree(staged));
}

/// Children are indented two spaces deeper than their parent.
fn render_tree(staged: &StagedTree) -> String {
    let mut output = String::new();
    for (id, level) in staged.tree().pre_order() {
        let _ = writeln!(
            output,
            "{}id: {}, stage: {}",
            " ".repeat(level * 2),
            staged.node(id).id(),
            staged.stage(id)
        );
    }
    output
}
