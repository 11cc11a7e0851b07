use log::debug;

use super::tree::{DagTree, Node, NodeId};

/// A [`DagTree`] whose nodes all carry a pipeline stage.
///
/// Only obtainable through [`assign_stages`], so a stage is never unset once
/// a tree reaches serialization.
#[derive(Debug, Clone)]
pub struct StagedTree {
    tree: DagTree,
    stages: Vec<u32>,
}

/// Assigns every node its stage in one bottom-up pass.
///
/// A leaf is stage 0 and an internal node is one more than the smallest stage
/// among its children. Children always sit at higher arena indices than their
/// parent, so walking the arena backwards visits children first.
pub fn assign_stages(tree: DagTree) -> StagedTree {
    let mut stages = vec![0_u32; tree.len()];

    for (id, node) in tree.iter().rev() {
        let stage = node
            .children()
            .iter()
            .map(|child| stages[child.index()])
            .min()
            .map_or(0, |lowest| lowest + 1);
        stages[id.index()] = stage;
    }

    debug!(
        "Assigned stages to {} nodes, root stage {}",
        tree.len(),
        stages.first().copied().unwrap_or_default()
    );

    StagedTree { tree, stages }
}

impl StagedTree {
    pub fn tree(&self) -> &DagTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.tree.node(id)
    }

    pub fn stage(&self, id: NodeId) -> u32 {
        self.stages[id.index()]
    }

    pub fn root_stage(&self) -> u32 {
        self.stage(DagTree::ROOT)
    }

    /// Highest stage of any node. Equals the root stage for perfect trees.
    pub fn max_stage(&self) -> u32 {
        self.stages.iter().copied().max().unwrap_or_default()
    }
}
