use log::debug;

use super::token::TokenGenerator;

/// Index of a node inside a [`DagTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One synthetic CI job.
///
/// The `id` encodes the path from the root: the root is `"0"` and every child
/// appends `-{sibling_index}` to its parent's id, so ids are unique.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    children: Vec<NodeId>,
    token: String,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Random per-job marker, fixed at construction.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn job_name(&self) -> String {
        format!("job_{}", self.id)
    }
}

/// Arena-backed job tree.
///
/// Children are always appended after their parent, so a child's index is
/// strictly greater than its parent's.
#[derive(Debug, Clone)]
pub struct DagTree {
    nodes: Vec<Node>,
}

impl DagTree {
    pub const ROOT: NodeId = NodeId(0);

    /// Creates a tree holding only the root node `"0"`.
    pub fn with_root(tokens: &mut TokenGenerator) -> Self {
        Self {
            nodes: vec![Node {
                id: "0".to_string(),
                children: Vec::new(),
                token: tokens.next_token(),
            }],
        }
    }

    /// Builds a perfect `children`-ary tree of height `depth`.
    ///
    /// A depth or branching factor of zero yields a lone root. Expansion uses
    /// an explicit stack, so deep trees do not recurse.
    pub fn build(depth: u32, children: u32, tokens: &mut TokenGenerator) -> Self {
        let mut tree = Self::with_root(tokens);
        if let Some(total) = expected_job_count(depth, children)
            .and_then(|total| usize::try_from(total).ok())
        {
            tree.nodes.reserve(total.saturating_sub(1));
        }

        let mut pending = vec![(Self::ROOT, depth)];
        while let Some((parent, remaining)) = pending.pop() {
            if remaining == 0 {
                continue;
            }

            let added: Vec<NodeId> = (0..children)
                .map(|_| tree.add_child(parent, tokens))
                .collect();

            // Reversed so the first child is expanded first.
            pending.extend(added.into_iter().rev().map(|child| (child, remaining - 1)));
        }

        debug!(
            "Built tree with {} nodes (depth {depth}, {children} children per node)",
            tree.len()
        );
        tree
    }

    /// Appends a new child under `parent` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn add_child(&mut self, parent: NodeId, tokens: &mut TokenGenerator) -> NodeId {
        let child = NodeId(self.nodes.len());
        let parent_node = &self.nodes[parent.0];
        let id = format!("{}-{}", parent_node.id, parent_node.children.len());

        self.nodes.push(Node {
            id,
            children: Vec::new(),
            token: tokens.next_token(),
        });
        self.nodes[parent.0].children.push(child);
        child
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Number of nodes in the subtree rooted at `id`, including `id` itself.
    pub fn count(&self, id: NodeId) -> usize {
        let mut total = 0;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            total += 1;
            pending.extend_from_slice(self.node(current).children());
        }
        total
    }

    /// Node ids in depth-first post-order: every node after all its children.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut pending = vec![(Self::ROOT, false)];

        while let Some((id, expanded)) = pending.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            pending.push((id, true));
            pending.extend(self.node(id).children().iter().rev().map(|&c| (c, false)));
        }

        order
    }

    /// Node ids in depth-first pre-order, paired with their distance from the root.
    pub fn pre_order(&self) -> Vec<(NodeId, usize)> {
        let mut order = Vec::with_capacity(self.len());
        let mut pending = vec![(Self::ROOT, 0)];

        while let Some((id, level)) = pending.pop() {
            order.push((id, level));
            pending.extend(
                self.node(id)
                    .children()
                    .iter()
                    .rev()
                    .map(|&c| (c, level + 1)),
            );
        }

        order
    }
}

/// Total node count of a perfect `children`-ary tree of height `depth`.
///
/// Returns `None` when the count does not fit in a `u64`.
pub fn expected_job_count(depth: u32, children: u32) -> Option<u64> {
    let k = u64::from(children);
    let mut level_width: u64 = 1;
    let mut total: u64 = 1;

    for _ in 0..depth {
        if k == 0 {
            break;
        }
        level_width = level_width.checked_mul(k)?;
        total = total.checked_add(level_width)?;
    }

    Some(total)
}

/// Upper bound on the bytes of all node ids in a perfect `children`-ary tree.
///
/// Ids grow by one `-{index}` segment per level, each counted at the width
/// of the largest sibling index. Exact when `children` is at most 10.
/// Returns `None` on overflow.
pub fn expected_id_bytes(depth: u32, children: u32) -> Option<u64> {
    let k = u64::from(children);
    // "-" plus the widest sibling index at this branching factor
    let segment = 1 + k.saturating_sub(1).checked_ilog10().map_or(1, |d| u64::from(d) + 1);

    let mut level_width: u64 = 1;
    let mut id_len: u64 = 1;
    let mut total: u64 = 1;

    for _ in 0..depth {
        if k == 0 {
            break;
        }
        level_width = level_width.checked_mul(k)?;
        id_len = id_len.checked_add(segment)?;
        total = total.checked_add(level_width.checked_mul(id_len)?)?;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tokens() -> TokenGenerator {
        TokenGenerator::seeded(0, 8)
    }

    fn closed_form(depth: u32, children: u32) -> u64 {
        let k = u64::from(children);
        match k {
            0 => 1,
            1 => u64::from(depth) + 1,
            _ => (k.pow(depth + 1) - 1) / (k - 1),
        }
    }

    mod build_tests {
        use super::*;

        #[test]
        fn test_depth_zero_is_lone_root() {
            let tree = DagTree::build(0, 5, &mut tokens());

            assert_eq!(tree.len(), 1);
            assert_eq!(tree.root().id(), "0");
            assert!(tree.root().children().is_empty());
        }

        #[test]
        fn test_zero_children_is_lone_root() {
            let tree = DagTree::build(4, 0, &mut tokens());
            assert_eq!(tree.len(), 1);
        }

        #[test]
        fn test_depth_two_binary_tree_ids() {
            let tree = DagTree::build(2, 2, &mut tokens());

            let mut ids: Vec<&str> = tree.iter().map(|(_, node)| node.id()).collect();
            ids.sort_unstable();

            assert_eq!(
                ids,
                vec!["0", "0-0", "0-0-0", "0-0-1", "0-1", "0-1-0", "0-1-1"]
            );
        }

        #[test]
        fn test_children_keep_creation_order() {
            let tree = DagTree::build(1, 3, &mut tokens());

            let child_ids: Vec<&str> = tree
                .root()
                .children()
                .iter()
                .map(|&c| tree.node(c).id())
                .collect();

            assert_eq!(child_ids, vec!["0-0", "0-1", "0-2"]);
        }

        #[test]
        fn test_unary_chain() {
            let tree = DagTree::build(4, 1, &mut tokens());

            assert_eq!(tree.len(), 5);
            let deepest = tree.iter().map(|(_, n)| n.id().len()).max().unwrap();
            assert_eq!(deepest, "0-0-0-0-0".len());
        }

        #[test]
        fn test_child_index_greater_than_parent() {
            let tree = DagTree::build(3, 3, &mut tokens());
            for (id, node) in tree.iter() {
                for &child in node.children() {
                    assert!(child.index() > id.index());
                }
            }
        }

        #[test]
        fn test_tokens_have_configured_length() {
            let mut generator = TokenGenerator::seeded(3, 5);
            let tree = DagTree::build(2, 2, &mut generator);
            assert!(tree.iter().all(|(_, n)| n.token().len() == 5));
        }

        #[test]
        fn test_same_seed_same_tree() {
            let a = DagTree::build(3, 2, &mut TokenGenerator::seeded(9, 16));
            let b = DagTree::build(3, 2, &mut TokenGenerator::seeded(9, 16));

            let tokens_a: Vec<&str> = a.iter().map(|(_, n)| n.token()).collect();
            let tokens_b: Vec<&str> = b.iter().map(|(_, n)| n.token()).collect();
            assert_eq!(tokens_a, tokens_b);
        }

        #[test]
        fn test_add_child_extends_parent_id() {
            let mut generator = tokens();
            let mut tree = DagTree::with_root(&mut generator);

            let first = tree.add_child(DagTree::ROOT, &mut generator);
            let second = tree.add_child(DagTree::ROOT, &mut generator);
            let grandchild = tree.add_child(second, &mut generator);

            assert_eq!(tree.node(first).id(), "0-0");
            assert_eq!(tree.node(second).id(), "0-1");
            assert_eq!(tree.node(grandchild).id(), "0-1-0");
            assert_eq!(tree.node(grandchild).job_name(), "job_0-1-0");
        }
    }

    mod traversal_tests {
        use super::*;

        #[test]
        fn test_post_order_children_before_parent() {
            let tree = DagTree::build(3, 2, &mut tokens());
            let order = tree.post_order();

            assert_eq!(order.len(), tree.len());
            assert_eq!(order.last(), Some(&DagTree::ROOT));

            let position: std::collections::HashMap<NodeId, usize> =
                order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
            for (id, node) in tree.iter() {
                for child in node.children() {
                    assert!(position[child] < position[&id]);
                }
            }
        }

        #[test]
        fn test_pre_order_levels() {
            let tree = DagTree::build(2, 2, &mut tokens());
            let rendered: Vec<(&str, usize)> = tree
                .pre_order()
                .into_iter()
                .map(|(id, level)| (tree.node(id).id(), level))
                .collect();

            assert_eq!(
                rendered,
                vec![
                    ("0", 0),
                    ("0-0", 1),
                    ("0-0-0", 2),
                    ("0-0-1", 2),
                    ("0-1", 1),
                    ("0-1-0", 2),
                    ("0-1-1", 2),
                ]
            );
        }

        #[test]
        fn test_count_subtree() {
            let tree = DagTree::build(2, 3, &mut tokens());
            let first_child = tree.root().children()[0];

            assert_eq!(tree.count(DagTree::ROOT), 13);
            assert_eq!(tree.count(first_child), 4);
        }
    }

    mod expected_count_tests {
        use super::*;

        #[test]
        fn test_known_counts() {
            assert_eq!(expected_job_count(0, 7), Some(1));
            assert_eq!(expected_job_count(2, 2), Some(7));
            assert_eq!(expected_job_count(3, 1), Some(4));
            assert_eq!(expected_job_count(5, 0), Some(1));
            assert_eq!(expected_job_count(3, 10), Some(1111));
        }

        #[test]
        fn test_overflow_is_none() {
            assert_eq!(expected_job_count(64, 2), None);
            assert_eq!(expected_job_count(10, u32::MAX), None);
        }

        #[test]
        fn test_id_bytes_match_built_tree() {
            for (depth, children) in [(0, 3), (2, 2), (3, 1), (2, 10), (4, 0)] {
                let tree = DagTree::build(depth, children, &mut tokens());
                let actual: usize = tree.iter().map(|(_, n)| n.id().len()).sum();
                assert_eq!(
                    expected_id_bytes(depth, children),
                    Some(actual as u64),
                    "depth {depth}, children {children}"
                );
            }
        }

        #[test]
        fn test_id_bytes_of_long_chain() {
            // 10^6 ids averaging about 10^6 bytes each
            let bytes = expected_id_bytes(999_999, 1).unwrap();
            assert!(bytes > 999_999_000_000);
            assert_eq!(expected_id_bytes(64, 2), None);
        }
    }

    proptest! {
        #[test]
        fn prop_count_matches_closed_form(depth in 0u32..6, children in 0u32..6) {
            let tree = DagTree::build(depth, children, &mut tokens());
            let expected = closed_form(depth, children);

            prop_assert_eq!(tree.len() as u64, expected);
            prop_assert_eq!(tree.count(DagTree::ROOT) as u64, expected);
            prop_assert_eq!(expected_job_count(depth, children), Some(expected));
        }

        #[test]
        fn prop_ids_are_unique(depth in 0u32..5, children in 0u32..5) {
            let tree = DagTree::build(depth, children, &mut tokens());
            let ids: std::collections::HashSet<&str> =
                tree.iter().map(|(_, node)| node.id()).collect();
            prop_assert_eq!(ids.len(), tree.len());
        }
    }
}
