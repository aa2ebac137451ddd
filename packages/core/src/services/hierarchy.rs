//! Node Hierarchy Model
//!
//! Converts the flat, parent-pointer node set returned by the remote node
//! service into an ordered tree, and answers the descendant/ancestor queries
//! the controllers need. Parent references are arena-style integer ids
//! resolved through a lookup map built here - never native object links -
//! so reparenting is an O(1) id rewrite with no dangling-pointer risk.
//!
//! # Build rules
//!
//! - Nodes are grouped by `parent_id`; each sibling group is sorted by
//!   `order` ascending (ties broken by id for determinism).
//! - A node with `parent_id = None` is a root.
//! - A node whose declared parent is absent from the input set is an
//!   orphan root - never silently dropped.
//! - Nodes trapped in a parent cycle are unreachable from any root; they
//!   are promoted to orphan roots with a warning rather than dropped.

use crate::models::SitemapNode;
use std::collections::{HashMap, HashSet};

/// One node of the built tree, with its ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub node: SitemapNode,
    pub children: Vec<TreeNode>,
}

/// Build an ordered forest from a flat node list.
///
/// Idempotent and O(n) up to the sibling sorts: one pass builds the id
/// index and the children-by-parent grouping, then each root's subtree is
/// assembled without revisiting nodes.
pub fn build_forest(nodes: &[SitemapNode]) -> Vec<TreeNode> {
    let by_id: HashMap<i64, &SitemapNode> = nodes.iter().map(|n| (n.id, n)).collect();

    // Group children by resolvable parent; unresolvable parents make roots.
    let mut children: HashMap<i64, Vec<&SitemapNode>> = HashMap::new();
    let mut roots: Vec<&SitemapNode> = Vec::new();
    for node in nodes {
        match node.parent_id.filter(|pid| by_id.contains_key(pid)) {
            Some(pid) => children.entry(pid).or_default().push(node),
            None => roots.push(node),
        }
    }
    sort_siblings(&mut roots);
    for group in children.values_mut() {
        sort_siblings(group);
    }

    let mut visited: HashSet<i64> = HashSet::new();
    let mut forest: Vec<TreeNode> = roots
        .iter()
        .map(|root| assemble(root, &children, &mut visited))
        .collect();

    // Anything unreachable from a root sits on a parent cycle. Promote its
    // members to orphan roots so no node is lost.
    if visited.len() < nodes.len() {
        let mut stranded: Vec<&SitemapNode> = nodes
            .iter()
            .filter(|n| !visited.contains(&n.id))
            .collect();
        sort_siblings(&mut stranded);
        for node in stranded {
            if visited.contains(&node.id) {
                continue;
            }
            tracing::warn!(
                "Node {} is unreachable from any root (parent cycle); promoting to orphan root",
                node.id
            );
            forest.push(assemble(node, &children, &mut visited));
        }
    }

    forest
}

fn sort_siblings(group: &mut [&SitemapNode]) {
    group.sort_by_key(|n| (n.order, n.id));
}

fn assemble(
    node: &SitemapNode,
    children: &HashMap<i64, Vec<&SitemapNode>>,
    visited: &mut HashSet<i64>,
) -> TreeNode {
    visited.insert(node.id);
    let child_nodes = children
        .get(&node.id)
        .map(|group| {
            let mut collected = Vec::new();
            for child in group {
                if !visited.contains(&child.id) {
                    collected.push(assemble(child, children, visited));
                }
            }
            collected
        })
        .unwrap_or_default();

    TreeNode {
        node: node.clone(),
        children: child_nodes,
    }
}

/// The node id plus the ids of every descendant, depth-first.
///
/// Used for "select subtree" and the cascading-delete refusal checks.
/// Returns just `[node_id]` when the id is unknown.
pub fn descendant_ids(nodes: &[SitemapNode], node_id: i64) -> Vec<i64> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for node in nodes {
        if let Some(pid) = node.parent_id {
            children.entry(pid).or_default().push(node.id);
        }
    }
    for group in children.values_mut() {
        group.sort_unstable();
    }

    let mut result = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();
    let mut stack = vec![node_id];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        result.push(id);
        if let Some(kids) = children.get(&id) {
            // Reverse so depth-first order follows sibling order.
            stack.extend(kids.iter().rev());
        }
    }
    result
}

/// The subset of `selection` that is top-most: a node is skipped when any
/// ancestor is also selected.
///
/// Bulk delete targets only these nodes so a parent and its selected child
/// never produce two conflicting delete calls.
pub fn topmost_selected(nodes: &[SitemapNode], selection: &HashSet<i64>) -> Vec<i64> {
    let parent_of: HashMap<i64, Option<i64>> =
        nodes.iter().map(|n| (n.id, n.parent_id)).collect();

    let mut result: Vec<i64> = selection
        .iter()
        .copied()
        .filter(|&id| {
            let mut guard: HashSet<i64> = HashSet::new();
            let mut cursor = parent_of.get(&id).copied().flatten();
            while let Some(ancestor) = cursor {
                if selection.contains(&ancestor) {
                    return false;
                }
                if !guard.insert(ancestor) {
                    break; // cycle in raw data; treat as top-most
                }
                cursor = parent_of.get(&ancestor).copied().flatten();
            }
            true
        })
        .collect();
    result.sort_unstable();
    result
}

/// The unique `is_root` node, if the set carries one.
pub fn root_of(nodes: &[SitemapNode]) -> Option<&SitemapNode> {
    nodes.iter().find(|n| n.is_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentStatus;

    fn node(id: i64, parent_id: Option<i64>, order: i64) -> SitemapNode {
        SitemapNode {
            id,
            sitemap_id: 1,
            title: format!("Node {id}"),
            slug: format!("node-{id}"),
            description: None,
            content_type: "page".to_string(),
            keywords: Vec::new(),
            position_x: 0.0,
            position_y: 0.0,
            order,
            is_root: parent_id.is_none(),
            status: ContentStatus::Draft,
            parent_id,
        }
    }

    /// root(1) -> { 2 -> { 4, 5 }, 3 }
    fn sample_tree() -> Vec<SitemapNode> {
        vec![
            node(1, None, 0),
            node(2, Some(1), 0),
            node(3, Some(1), 1),
            node(4, Some(2), 0),
            node(5, Some(2), 1),
        ]
    }

    #[test]
    fn build_orders_siblings_ascending() {
        let nodes = vec![
            node(1, None, 0),
            node(3, Some(1), 2),
            node(2, Some(1), 1),
            node(4, Some(1), 0),
        ];

        let forest = build_forest(&nodes);
        assert_eq!(forest.len(), 1);
        let children: Vec<i64> = forest[0].children.iter().map(|c| c.node.id).collect();
        assert_eq!(children, vec![4, 2, 3]);
    }

    #[test]
    fn build_is_idempotent() {
        let nodes = sample_tree();
        assert_eq!(build_forest(&nodes), build_forest(&nodes));
    }

    #[test]
    fn absent_parent_becomes_orphan_root() {
        let nodes = vec![node(1, None, 0), node(2, Some(99), 0)];

        let forest = build_forest(&nodes);
        assert_eq!(forest.len(), 2, "orphan must surface as a root, not vanish");
        let ids: Vec<i64> = forest.iter().map(|t| t.node.id).collect();
        assert!(ids.contains(&2));
    }

    #[test]
    fn cycle_members_are_promoted_not_dropped() {
        // 2 and 3 point at each other; unreachable from root 1.
        let nodes = vec![node(1, None, 0), node(2, Some(3), 0), node(3, Some(2), 0)];

        let forest = build_forest(&nodes);
        let mut all_ids: Vec<i64> = Vec::new();
        fn collect(tree: &TreeNode, out: &mut Vec<i64>) {
            out.push(tree.node.id);
            for child in &tree.children {
                collect(child, out);
            }
        }
        for tree in &forest {
            collect(tree, &mut all_ids);
        }
        all_ids.sort_unstable();
        assert_eq!(all_ids, vec![1, 2, 3], "every input node appears exactly once");
    }

    #[test]
    fn descendants_include_self_and_whole_subtree() {
        let nodes = sample_tree();
        let mut ids = descendant_ids(&nodes, 2);
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 4, 5]);

        let all = descendant_ids(&nodes, 1);
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], 1, "self comes first");
    }

    #[test]
    fn descendants_of_leaf_is_just_self() {
        let nodes = sample_tree();
        assert_eq!(descendant_ids(&nodes, 5), vec![5]);
    }

    #[test]
    fn topmost_skips_nodes_with_selected_ancestors() {
        let nodes = sample_tree();
        let selection: HashSet<i64> = [2, 4, 5, 3].into_iter().collect();

        let topmost = topmost_selected(&nodes, &selection);
        assert_eq!(topmost, vec![2, 3], "4 and 5 are covered by 2");
    }

    #[test]
    fn topmost_with_disjoint_selection_keeps_all() {
        let nodes = sample_tree();
        let selection: HashSet<i64> = [4, 3].into_iter().collect();

        let topmost = topmost_selected(&nodes, &selection);
        assert_eq!(topmost, vec![3, 4]);
    }

    #[test]
    fn root_lookup() {
        let nodes = sample_tree();
        assert_eq!(root_of(&nodes).map(|n| n.id), Some(1));
        assert!(root_of(&[]).is_none());
    }
}
