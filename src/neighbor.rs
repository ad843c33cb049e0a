use crate::budget::BudgetState;
use crate::build::BuildData;
use crate::class::CharacterClass;
use crate::error::Result;
use crate::mutation::TreeMutation;
use crate::node::NodeId;
use crate::node::NodeValue;
use crate::tree::PassiveTreeGraph;
use std::collections::HashMap;
use std::collections::HashSet;

/// Default ceiling on the number of mutations a single `generate` call
/// returns, within the 50-200 range the design calls for.
const DEFAULT_CANDIDATE_CAP: usize = 100;

/// Produces an ordered, size-capped list of legal single-step mutations from
/// the current allocation under the current budget.
///
/// Two mutation families are considered, in this fixed priority order:
/// add-node (always connectivity-safe, so never pays a BFS) then swap-node
/// (requires an articulation-point pre-pass, computed once per call and
/// shared across every candidate removal). Within each family, candidates
/// are stable-sorted by descending node value (Keystone > Notable > small)
/// then ascending node id, so the result is deterministic for a fixed
/// allocation and budget.
pub struct NeighborGenerator {
    cap: usize,
}

impl Default for NeighborGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_CAP)
    }
}

impl NeighborGenerator {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    pub fn generate(
        &self,
        build: &BuildData,
        tree: &PassiveTreeGraph,
        budget: &BudgetState,
    ) -> Result<Vec<TreeMutation>> {
        let class_start = tree.class_start(build.class)?;
        let allocated = &build.allocated;

        let mut adds = self.add_candidates(allocated, tree, budget);
        adds.truncate(self.cap);

        let remaining = self.cap.saturating_sub(adds.len());
        let mut swaps = Vec::new();
        if remaining > 0 {
            swaps = self.swap_candidates(allocated, tree, budget, class_start);
            swaps.truncate(remaining);
        }

        adds.extend(swaps);
        Ok(adds)
    }

    /// Add-only mutations are trivially connectivity-preserving: the new
    /// node is, by construction, adjacent to an already-allocated node.
    fn add_candidates(
        &self,
        allocated: &im::HashSet<NodeId>,
        tree: &PassiveTreeGraph,
        budget: &BudgetState,
    ) -> Vec<TreeMutation> {
        if budget.unallocated_remaining() == 0 {
            return Vec::new();
        }
        let mut targets: HashSet<NodeId> = HashSet::new();
        for &node in allocated.iter() {
            for neighbor in tree.neighbors(node) {
                if !allocated.contains(&neighbor) {
                    targets.insert(neighbor);
                }
            }
        }

        let mut scored: Vec<(NodeValue, NodeId)> = targets
            .into_iter()
            .map(|id| (value_of(tree, id), id))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        scored
            .into_iter()
            .map(|(_, id)| TreeMutation::add(id))
            .filter(|mutation| budget.can_apply(mutation))
            .collect()
    }

    /// Swap mutations: `r` ranges over allocated nodes that are not the
    /// class-start and not an articulation point of the induced subgraph
    /// (removing an articulation point could strand other allocated nodes
    /// from the class-start). `a` ranges over nodes adjacent to the
    /// allocation with `r` removed.
    fn swap_candidates(
        &self,
        allocated: &im::HashSet<NodeId>,
        tree: &PassiveTreeGraph,
        budget: &BudgetState,
        class_start: NodeId,
    ) -> Vec<TreeMutation> {
        // A swap's net cost on the unallocated axis is zero (the removed
        // node's slot is immediately refilled), so only the respec axis
        // can block it here.
        if matches!(budget.respec_remaining(), Some(0)) {
            return Vec::new();
        }

        let articulation_points = articulation_points(tree, allocated);
        let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
        let mut scored: Vec<(NodeValue, NodeId, NodeId)> = Vec::new();

        for &removable in allocated.iter() {
            if removable == class_start || articulation_points.contains(&removable) {
                continue;
            }
            let mut remaining = allocated.clone();
            remaining.remove(&removable);
            for &node in remaining.iter() {
                for neighbor in tree.neighbors(node) {
                    if neighbor == removable || remaining.contains(&neighbor) {
                        continue;
                    }
                    if !seen.insert((neighbor, removable)) {
                        continue;
                    }
                    scored.push((value_of(tree, neighbor), neighbor, removable));
                }
            }
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        scored
            .into_iter()
            .map(|(_, added, removed)| TreeMutation::swap(added, removed))
            .filter(|mutation| budget.can_apply(mutation))
            .collect()
    }
}

fn value_of(tree: &PassiveTreeGraph, id: NodeId) -> NodeValue {
    tree.node(id).map(|n| n.value()).unwrap_or(NodeValue::Small)
}

/// Tarjan's articulation-point algorithm over the subgraph induced by
/// `allocated`. Assumes that subgraph is connected, which every
/// optimizer-maintained allocation is by invariant.
fn articulation_points(tree: &PassiveTreeGraph, allocated: &im::HashSet<NodeId>) -> HashSet<NodeId> {
    struct Visitor<'a> {
        tree: &'a PassiveTreeGraph,
        allocated: &'a im::HashSet<NodeId>,
        disc: HashMap<NodeId, u32>,
        low: HashMap<NodeId, u32>,
        timer: u32,
        articulation: HashSet<NodeId>,
    }

    impl<'a> Visitor<'a> {
        fn visit(&mut self, u: NodeId, parent: Option<NodeId>) {
            self.disc.insert(u, self.timer);
            self.low.insert(u, self.timer);
            self.timer += 1;
            let mut children = 0u32;
            let mut skipped_parent = false;

            for v in self.tree.allocated_neighbors(u, self.allocated) {
                if Some(v) == parent && !skipped_parent {
                    // Skip exactly one edge back to the immediate parent, so a
                    // true multi-edge to the parent (if the data ever has one)
                    // is still treated as a back edge.
                    skipped_parent = true;
                    continue;
                }
                if let Some(&v_disc) = self.disc.get(&v) {
                    let low_u = self.low[&u].min(v_disc);
                    self.low.insert(u, low_u);
                } else {
                    children += 1;
                    self.visit(v, Some(u));
                    let low_u = self.low[&u].min(self.low[&v]);
                    self.low.insert(u, low_u);
                    if parent.is_some() && self.low[&v] >= self.disc[&u] {
                        self.articulation.insert(u);
                    }
                }
            }

            if parent.is_none() && children > 1 {
                self.articulation.insert(u);
            }
        }
    }

    let mut visitor = Visitor {
        tree,
        allocated,
        disc: HashMap::new(),
        low: HashMap::new(),
        timer: 0,
        articulation: HashSet::new(),
    };
    for &start in allocated.iter() {
        if !visitor.disc.contains_key(&start) {
            visitor.visit(start, None);
        }
    }
    visitor.articulation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::RespecBudget;

    fn alloc(ids: &[NodeId]) -> im::HashSet<NodeId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn add_candidates_are_adjacent_and_unallocated() {
        let tree = PassiveTreeGraph::fixture();
        let budget = BudgetState::new(5, RespecBudget::Limited(5));
        let generator = NeighborGenerator::default();
        let build = BuildData::new(CharacterClass::Witch, 10, [0, 1]);
        let mutations = generator.generate(&build, &tree, &budget).unwrap();
        assert!(mutations.iter().all(|m| !m.is_swap()));
        let added_ids: HashSet<NodeId> = mutations.iter().flat_map(|m| m.nodes_added.iter().copied()).collect();
        assert!(added_ids.contains(&2));
        assert!(!added_ids.contains(&0));
        assert!(!added_ids.contains(&1));
    }

    #[test]
    fn swaps_remain_available_with_zero_unallocated_budget() {
        // A swap's net cost on the unallocated axis is zero, so a
        // zero-free-point budget should still admit swap candidates as long
        // as respec room remains.
        let tree = PassiveTreeGraph::fixture();
        let budget = BudgetState::new(0, RespecBudget::Limited(5));
        let generator = NeighborGenerator::default();
        let build = BuildData::new(CharacterClass::Witch, 10, [0, 1, 2, 100]);
        let mutations = generator.generate(&build, &tree, &budget).unwrap();
        assert!(!mutations.is_empty());
        assert!(mutations.iter().all(|m| m.is_swap()));
    }

    #[test]
    fn articulation_points_protect_chain_connectivity() {
        let tree = PassiveTreeGraph::fixture();
        let allocated = alloc(&[0, 1, 2, 3]);
        let ap = articulation_points(&tree, &allocated);
        // 1 and 2 are both cut vertices of the chain 0-1-2-3.
        assert!(ap.contains(&1));
        assert!(ap.contains(&2));
        // endpoints of the chain are never cut vertices.
        assert!(!ap.contains(&0));
        assert!(!ap.contains(&3));
    }

    #[test]
    fn swap_never_proposes_removing_class_start() {
        let tree = PassiveTreeGraph::fixture();
        let budget = BudgetState::new(5, RespecBudget::Unlimited);
        let generator = NeighborGenerator::default();
        let build = BuildData::new(CharacterClass::Witch, 10, [0, 1]);
        let mutations = generator.generate(&build, &tree, &budget).unwrap();
        assert!(mutations
            .iter()
            .filter(|m| m.is_swap())
            .all(|m| !m.nodes_removed.contains(&0)));
    }

    #[test]
    fn every_proposed_swap_preserves_connectivity() {
        let tree = PassiveTreeGraph::fixture();
        let budget = BudgetState::new(5, RespecBudget::Unlimited);
        let generator = NeighborGenerator::default();
        let build = BuildData::new(CharacterClass::Witch, 10, [0, 1, 2, 100, 101]);
        let mutations = generator.generate(&build, &tree, &budget).unwrap();
        for mutation in mutations.iter().filter(|m| m.is_swap()) {
            let applied = mutation.apply(&build);
            assert!(tree
                .validate_tree_connectivity(&applied.allocated, build.class)
                .unwrap());
        }
    }

    #[test]
    fn swap_candidates_adjacent_to_multiple_remaining_nodes_are_not_duplicated() {
        // Diamond shape: 0 is class-start, 1 branches to 2 and 3, both of
        // which connect back to the unallocated node 4. 5 is a disposable
        // leaf off 0 so there is a removable, non-articulation-point `r`
        // that doesn't disturb the diamond. With {0,1,2,3,5} allocated,
        // removing 5 leaves both 2 and 3 remaining, so unallocated node 4 is
        // adjacent to two nodes of the post-removal allocation and must
        // still surface as exactly one swap candidate.
        let data = br#"{
            "tree_version": "test-1",
            "nodes": {
                "0": {"name": "start", "connections": [{"id": 1}, {"id": 5}]},
                "1": {"name": "hub", "connections": [{"id": 0}, {"id": 2}, {"id": 3}]},
                "2": {"name": "left", "connections": [{"id": 1}, {"id": 4}]},
                "3": {"name": "right", "connections": [{"id": 1}, {"id": 4}]},
                "4": {"name": "target", "connections": [{"id": 2}, {"id": 3}]},
                "5": {"name": "leaf", "connections": [{"id": 0}]}
            },
            "groups": [],
            "class_start_nodes": {"Witch": 0}
        }"#;
        let tree = PassiveTreeGraph::load(data).unwrap();
        let budget = BudgetState::new(5, RespecBudget::Unlimited);
        let generator = NeighborGenerator::default();
        let build = BuildData::new(CharacterClass::Witch, 10, [0, 1, 2, 3, 5]);
        let mutations = generator.generate(&build, &tree, &budget).unwrap();
        let swap_pairs: Vec<(NodeId, NodeId)> = mutations
            .iter()
            .filter(|m| m.is_swap())
            .map(|m| {
                let added = *m.nodes_added.iter().next().unwrap();
                let removed = *m.nodes_removed.iter().next().unwrap();
                (added, removed)
            })
            .collect();
        // Removing leaf 5 leaves both 2 and 3 allocated, so node 4 (adjacent
        // to both) is reachable from two different remaining nodes for that
        // one removal; it must still surface as a single (4, 5) pair.
        let distinct: HashSet<(NodeId, NodeId)> = swap_pairs.iter().copied().collect();
        assert_eq!(swap_pairs.len(), distinct.len(), "swap candidates must not contain duplicate (added, removed) pairs");
        assert_eq!(swap_pairs.iter().filter(|&&(a, r)| a == 4 && r == 5).count(), 1);
    }

    #[test]
    fn generate_is_capped() {
        let tree = PassiveTreeGraph::fixture();
        let budget = BudgetState::new(100, RespecBudget::Unlimited);
        let generator = NeighborGenerator::new(2);
        let build = BuildData::new(CharacterClass::Witch, 10, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 100, 101]);
        let mutations = generator.generate(&build, &tree, &budget).unwrap();
        assert!(mutations.len() <= 2);
    }

    #[test]
    fn results_are_deterministic_across_calls() {
        let tree = PassiveTreeGraph::fixture();
        let budget = BudgetState::new(5, RespecBudget::Unlimited);
        let generator = NeighborGenerator::default();
        let build = BuildData::new(CharacterClass::Witch, 10, [0, 1, 2]);
        let first = generator.generate(&build, &tree, &budget).unwrap();
        let second = generator.generate(&build, &tree, &budget).unwrap();
        assert_eq!(first, second);
    }
}
