//! Ordered depth-first walks over the organizer tree.
//!
//! A walk flattens a subtree into rows. The report writers turn each row
//! into a line of text or a CSV record, so the order of the rows is the
//! order of the report.

use std::collections::BTreeMap;

use crate::{ActivationScope, NodeId, OrganizerTree, DEPTH_STEP};

/// The order in which the sub-organizers of a node are visited.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ChildOrder {
    /// The order in which they were attached.
    Declared,
    /// Highest activation rate first, organizers without direct contacts
    /// last.
    ByRate(ActivationScope),
}

/// Organizers grouped by activation percentage.
///
/// Organizers with the same percentage keep their insertion order.
/// Organizers without direct contacts have no rate and are kept apart.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RateIndex {
    by_rate: BTreeMap<u32, Vec<NodeId>>,
    inactive: Vec<NodeId>,
}

impl RateIndex {
    pub fn new(tree: &OrganizerTree, organizers: &[NodeId], scope: ActivationScope) -> RateIndex {
        let mut idx = RateIndex::default();
        for o in organizers.iter() {
            if tree.direct_contact_count(*o) == 0 {
                idx.inactive.push(*o);
            } else {
                idx.by_rate
                    .entry(tree.activation_percent(*o, scope))
                    .or_default()
                    .push(*o);
            }
        }
        idx
    }

    /// Descending rate, then the organizers without rate.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_rate
            .iter()
            .rev()
            .flat_map(|(_, ids)| ids.iter().cloned())
            .chain(self.inactive.iter().cloned())
    }

    pub fn inactive(&self) -> &[NodeId] {
        &self.inactive
    }
}

pub fn ordered_sub_organizers(tree: &OrganizerTree, id: NodeId, order: ChildOrder) -> Vec<NodeId> {
    match order {
        ChildOrder::Declared => tree.sub_organizers(id).to_vec(),
        ChildOrder::ByRate(scope) => RateIndex::new(tree, tree.sub_organizers(id), scope)
            .iter()
            .collect(),
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TreeRow {
    Organizer { node: NodeId, level: usize },
    /// The direct contacts of an organizer, placed after all the subtrees
    /// of its sub-organizers.
    Voters { organizer: NodeId, level: usize },
}

impl TreeRow {
    pub fn level(&self) -> usize {
        match self {
            TreeRow::Organizer { level, .. } => *level,
            TreeRow::Voters { level, .. } => *level,
        }
    }

    /// The number of depth markers in front of the row.
    pub fn marker_len(&self) -> usize {
        self.level() * DEPTH_STEP
    }
}

/// Walks the subtree below `start`, depth first.
///
/// `start` is at level 0. When `prune` returns true for an organizer, that
/// organizer and everything below it is left out.
pub fn walk(
    tree: &OrganizerTree,
    start: NodeId,
    order: ChildOrder,
    include_voters: bool,
    prune: &dyn Fn(&OrganizerTree, NodeId) -> bool,
) -> Vec<TreeRow> {
    let mut rows: Vec<TreeRow> = Vec::new();
    walk_from(tree, start, 0, order, include_voters, prune, &mut rows);
    rows
}

fn walk_from(
    tree: &OrganizerTree,
    id: NodeId,
    level: usize,
    order: ChildOrder,
    include_voters: bool,
    prune: &dyn Fn(&OrganizerTree, NodeId) -> bool,
    rows: &mut Vec<TreeRow>,
) {
    if prune(tree, id) {
        return;
    }
    rows.push(TreeRow::Organizer { node: id, level });
    for child in ordered_sub_organizers(tree, id, order) {
        walk_from(tree, child, level + 1, order, include_voters, prune, rows);
    }
    if include_voters {
        rows.push(TreeRow::Voters {
            organizer: id,
            level: level + 1,
        });
    }
}

/// Never prunes.
pub fn keep_all(_: &OrganizerTree, _: NodeId) -> bool {
    false
}

/// True for the row of a deleted organizer. Filtering these rows out of a
/// walk keeps the organizers and the voters below a deleted organizer.
pub fn is_deleted_row(tree: &OrganizerTree, row: &TreeRow) -> bool {
    match row {
        TreeRow::Organizer { node, .. } => tree.get(*node).contact.role.is_deleted(),
        TreeRow::Voters { .. } => false,
    }
}
