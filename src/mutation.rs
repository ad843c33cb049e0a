use crate::build::BuildData;
use crate::node::NodeId;

/// A single legal step from one allocation to an adjacent one: add a node,
/// remove a node, or (for a swap) both at once. Cardinality of each set is 0
/// or 1 in this implementation, matching the MVP neighbor space the spec
/// defines; the fields are sets rather than `Option<NodeId>` so a future
/// multi-node mutation family is a additive change, not a breaking one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeMutation {
    pub nodes_added: im::HashSet<NodeId>,
    pub nodes_removed: im::HashSet<NodeId>,
}

impl TreeMutation {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn add(node_id: NodeId) -> Self {
        Self {
            nodes_added: im::HashSet::unit(node_id),
            nodes_removed: im::HashSet::new(),
        }
    }

    pub fn swap(added: NodeId, removed: NodeId) -> Self {
        Self {
            nodes_added: im::HashSet::unit(added),
            nodes_removed: im::HashSet::unit(removed),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.nodes_added.is_empty() && self.nodes_removed.is_empty()
    }

    pub fn is_swap(&self) -> bool {
        !self.nodes_added.is_empty() && !self.nodes_removed.is_empty()
    }

    /// Free points this mutation spends: a removal frees up the slot a
    /// same-step addition fills, so a swap's net cost on the free axis is
    /// zero (the spec's "either a free point available OR the add replaces
    /// a removed one" clause) while a pure add still consumes one.
    pub fn unallocated_cost(&self) -> u32 {
        (self.nodes_added.len().saturating_sub(self.nodes_removed.len())) as u32
    }

    /// Respec points this mutation spends.
    pub fn respec_cost(&self) -> u32 {
        self.nodes_removed.len() as u32
    }

    /// Applies the mutation to `build`, returning a derived snapshot. Debug
    /// builds assert the `added ∩ removed = ∅` invariant; a violation here
    /// is an algorithm bug in whatever produced the mutation, not a
    /// user-reachable error.
    pub fn apply(&self, build: &BuildData) -> BuildData {
        debug_assert!(
            self.nodes_added.iter().all(|id| !self.nodes_removed.contains(id)),
            "a mutation must not add and remove the same node"
        );
        let mut allocated = build.allocated.clone();
        for id in self.nodes_removed.iter() {
            allocated.remove(id);
        }
        for id in self.nodes_added.iter() {
            allocated.insert(*id);
        }
        build.with_allocation(allocated)
    }
}
