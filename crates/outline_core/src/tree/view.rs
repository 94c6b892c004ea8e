//! Per-user visible projection and hierarchical numbering.
//!
//! # Invariants
//! - The implicit level-0 root is always expanded and never hidden.
//! - A node is surfaced only when every ancestor is expanded.
//! - A node is effectively hidden when it or any ancestor is hidden.
//! - Numbers count only entries that are actually surfaced.

use super::range::has_children;
use crate::model::node::{Level, OutlineNode};
use std::fmt::{Display, Formatter};

/// How hidden nodes are treated by the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Reader view: effectively hidden nodes are left out.
    View,
    /// Editor view: every reachable node is shown, hidden ones flagged.
    Edit,
}

/// Hierarchical number such as `2.5.2.1`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutlineNumber(pub Vec<u32>);

impl Display for OutlineNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

/// One surfaced row of the visible outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleNode {
    pub node: OutlineNode,
    pub number: OutlineNumber,
    /// Hidden itself or below a hidden ancestor.
    pub effectively_hidden: bool,
    pub has_children: bool,
    pub is_expanded: bool,
}

/// Running counters per level while scanning in position order.
#[derive(Debug)]
struct LevelState {
    numbers: Vec<u32>,
    expanded: Vec<bool>,
    hidden: Vec<bool>,
}

impl LevelState {
    fn new(max_level: Level) -> Self {
        // Slot 0 is the root; one spare slot lets `bump` reset children.
        let slots = max_level as usize + 2;
        let mut expanded = vec![false; slots];
        expanded[0] = true;
        Self {
            numbers: vec![0; slots],
            expanded,
            hidden: vec![false; slots],
        }
    }

    fn ancestors_expanded(&self, level: usize) -> bool {
        self.expanded[..level].iter().all(|expanded| *expanded)
    }

    fn ancestor_hidden(&self, level: usize) -> bool {
        self.hidden[1..level].iter().any(|hidden| *hidden)
    }

    fn bump(&mut self, level: usize) -> OutlineNumber {
        self.numbers[level] += 1;
        self.numbers[level + 1] = 0;
        OutlineNumber(self.numbers[1..=level].to_vec())
    }
}

/// Projects `nodes` into the rows a user sees.
///
/// `is_expanded` is consulted once per node, in position order.
pub fn visible_outline<F>(nodes: &[OutlineNode], mut is_expanded: F, mode: ViewMode) -> Vec<VisibleNode>
where
    F: FnMut(&OutlineNode) -> bool,
{
    let mut state = LevelState::new(super::max_level(nodes));
    let mut rows = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        let level = node.level as usize;
        let expanded = is_expanded(node);
        state.expanded[level] = expanded;
        state.hidden[level] = node.is_hidden;

        if !state.ancestors_expanded(level) {
            continue;
        }
        let effectively_hidden = node.is_hidden || state.ancestor_hidden(level);
        if mode == ViewMode::View && effectively_hidden {
            continue;
        }

        rows.push(VisibleNode {
            node: node.clone(),
            number: state.bump(level),
            effectively_hidden,
            has_children: has_children(nodes, index),
            is_expanded: expanded,
        });
    }
    rows
}

/// Numbers every node as if all were expanded and visible.
pub fn number_outline(nodes: &[OutlineNode]) -> Vec<OutlineNumber> {
    let mut state = LevelState::new(super::max_level(nodes));
    nodes
        .iter()
        .map(|node| state.bump(node.level as usize))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{NodeId, Position};
    use crate::model::scope::{Scope, TreeKind};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn node(position: Position, level: Level, title: &str, is_hidden: bool) -> OutlineNode {
        OutlineNode {
            node_id: Uuid::new_v4(),
            scope: Scope::new(1, TreeKind::Program),
            position,
            level,
            title: title.to_string(),
            body: String::new(),
            is_hidden,
            author_id: 7,
            time_range: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn titles(rows: &[VisibleNode]) -> Vec<(String, String)> {
        rows.iter()
            .map(|row| (row.number.to_string(), row.node.title.clone()))
            .collect()
    }

    fn sample() -> Vec<OutlineNode> {
        vec![
            node(1, 1, "Intro", false),
            node(2, 2, "Sub A", false),
            node(3, 3, "Deep", false),
            node(4, 2, "Sub B", true),
            node(5, 3, "Under hidden", false),
            node(6, 1, "Chapter2", false),
            node(7, 2, "Sub C", false),
        ]
    }

    #[test]
    fn number_outline_counts_per_level() {
        let numbers: Vec<String> = number_outline(&sample())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(numbers, ["1", "1.1", "1.1.1", "1.2", "1.2.1", "2", "2.1"]);
    }

    #[test]
    fn contracted_nodes_hide_descendants() {
        let nodes = sample();
        let rows = visible_outline(&nodes, |_| false, ViewMode::Edit);
        assert_eq!(
            titles(&rows),
            [
                ("1".to_string(), "Intro".to_string()),
                ("2".to_string(), "Chapter2".to_string())
            ]
        );
        assert!(rows.iter().all(|row| row.has_children));
        assert!(rows.iter().all(|row| !row.is_expanded));
    }

    #[test]
    fn view_mode_drops_hidden_subtrees_and_renumbers() {
        let nodes = sample();
        let rows = visible_outline(&nodes, |_| true, ViewMode::View);
        let expected: Vec<(String, String)> = [
            ("1", "Intro"),
            ("1.1", "Sub A"),
            ("1.1.1", "Deep"),
            ("2", "Chapter2"),
            ("2.1", "Sub C"),
        ]
        .iter()
        .map(|(n, t)| (n.to_string(), t.to_string()))
        .collect();
        assert_eq!(titles(&rows), expected);
    }

    #[test]
    fn edit_mode_flags_inherited_hidden() {
        let nodes = sample();
        let rows = visible_outline(&nodes, |_| true, ViewMode::Edit);
        assert_eq!(rows.len(), nodes.len());
        let flagged: Vec<&str> = rows
            .iter()
            .filter(|row| row.effectively_hidden)
            .map(|row| row.node.title.as_str())
            .collect();
        assert_eq!(flagged, ["Sub B", "Under hidden"]);
    }

    #[test]
    fn partially_expanded_outline() {
        let nodes = sample();
        let expanded: HashSet<NodeId> = [nodes[0].node_id].into_iter().collect();
        let rows = visible_outline(&nodes, |n| expanded.contains(&n.node_id), ViewMode::Edit);
        let shown: Vec<&str> = rows.iter().map(|row| row.node.title.as_str()).collect();
        assert_eq!(shown, ["Intro", "Sub A", "Sub B", "Chapter2"]);
    }

    #[test]
    fn empty_outline_has_no_rows() {
        assert!(visible_outline(&[], |_| true, ViewMode::View).is_empty());
        assert!(number_outline(&[]).is_empty());
    }
}
