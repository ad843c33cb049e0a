use crate::class::CharacterClass;
use crate::error::OptimizerError;
use crate::error::Result;
use crate::node::NodeId;
use crate::node::PassiveNode;
use fixedbitset::FixedBitSet;
use once_cell::sync::OnceCell;
use petgraph::graph::NodeIndex;
use petgraph::graph::UnGraph;
use serde::Deserialize;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;

/// A single entry in `connections`: the wire format nests the neighbor id
/// inside a small object (room for a per-edge radius/path hint the source
/// carries for rendering) rather than a bare integer.
#[derive(Debug, Deserialize)]
struct RawConnection {
    id: Option<NodeId>,
}

/// A visual group: `groups[group_id]` gives the `(x, y)` origin every node
/// in that group positions itself relative to. Entries can be absent
/// (`null`) for unused group slots.
#[derive(Debug, Deserialize, Default)]
struct RawGroup {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
}

/// Raw wire shape of a single node, as loaded from the tree data source.
/// `connections` only exists at load time; once the graph is built it is
/// represented as edges, not as a field on [`PassiveNode`].
#[derive(Debug, Deserialize)]
struct RawNode {
    name: String,
    #[serde(default)]
    stats: Vec<String>,
    #[serde(default)]
    is_keystone: bool,
    #[serde(default)]
    is_notable: bool,
    #[serde(default)]
    is_mastery: bool,
    #[serde(default)]
    orbit: u32,
    #[serde(default)]
    orbit_index: u32,
    #[serde(default)]
    group: Option<u32>,
    #[serde(default)]
    connections: Vec<RawConnection>,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    tree_version: String,
    nodes: HashMap<NodeId, RawNode>,
    /// Required: the source treats a tree document with no `groups` field
    /// as unparsable, even though individual slots within it may be absent.
    groups: Vec<Option<RawGroup>>,
    #[serde(default)]
    class_start_nodes: HashMap<String, NodeId>,
}

/// Resolves a node's rendering position from its group, mirroring the
/// source's defensive `group_id is not None and group_id < len(raw_groups)
/// and raw_groups[group_id]` guard: an absent group, an out-of-range index,
/// or a null slot all fall back to the origin rather than failing the load.
fn resolve_position(group_id: Option<u32>, groups: &[Option<RawGroup>]) -> (f32, f32) {
    match group_id.and_then(|id| groups.get(id as usize)).and_then(|g| g.as_ref()) {
        Some(group) => (group.x, group.y),
        None => (0.0, 0.0),
    }
}

/// Immutable, process-wide passive-tree topology.
///
/// Construct once (typically through [`PassiveTreeGraph::load`] or, for
/// tests and the bundled demo, [`PassiveTreeGraph::fixture`]) and share the
/// result by `Arc` across every optimizer invocation; nothing in this type
/// mutates after construction.
pub struct PassiveTreeGraph {
    graph: UnGraph<PassiveNode, ()>,
    index_of: HashMap<NodeId, NodeIndex>,
    class_start_nodes: HashMap<String, NodeId>,
    tree_version: String,
}

impl PassiveTreeGraph {
    /// Parses a JSON tree document into a graph.
    ///
    /// Fails with [`OptimizerError::DataUnavailable`] if the document cannot
    /// be parsed, if an edge references an unknown node, or if a class-start
    /// id has no corresponding node.
    pub fn load(data: &[u8]) -> Result<Self> {
        let raw: RawTree = serde_json::from_slice(data)
            .map_err(|e| OptimizerError::DataUnavailable(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTree) -> Result<Self> {
        let mut graph = UnGraph::<PassiveNode, ()>::with_capacity(raw.nodes.len(), raw.nodes.len());
        let mut index_of = HashMap::with_capacity(raw.nodes.len());
        let mut pending_edges = Vec::new();

        for (&id, raw_node) in raw.nodes.iter() {
            let node = PassiveNode {
                id,
                name: raw_node.name.clone(),
                stats: raw_node.stats.clone(),
                is_keystone: raw_node.is_keystone,
                is_notable: raw_node.is_notable,
                is_mastery: raw_node.is_mastery,
                orbit: raw_node.orbit,
                orbit_index: raw_node.orbit_index,
                group: raw_node.group.unwrap_or(0),
                position: resolve_position(raw_node.group, &raw.groups),
            };
            let idx = graph.add_node(node);
            index_of.insert(id, idx);
            for conn in &raw_node.connections {
                if let Some(target) = conn.id {
                    pending_edges.push((id, target));
                }
            }
        }

        for (from, to) in pending_edges {
            if from == to {
                continue;
            }
            let a = *index_of
                .get(&from)
                .ok_or_else(|| OptimizerError::DataUnavailable(format!("edge from unknown node {from}")))?;
            let b = *index_of
                .get(&to)
                .ok_or_else(|| OptimizerError::DataUnavailable(format!("edge to unknown node {to}")))?;
            if graph.find_edge(a, b).is_none() {
                graph.add_edge(a, b, ());
            }
        }

        for (class, &start) in raw.class_start_nodes.iter() {
            if !index_of.contains_key(&start) {
                return Err(OptimizerError::DataUnavailable(format!(
                    "class-start node {start} for {class} does not exist"
                )));
            }
        }

        Ok(Self {
            graph,
            index_of,
            class_start_nodes: raw.class_start_nodes,
            tree_version: raw.tree_version,
        })
    }

    /// A small deterministic tree used by unit tests, property tests, and
    /// the bundled demo. Not shipped as real game data.
    pub fn fixture() -> Self {
        let mut graph = UnGraph::<PassiveNode, ()>::new_undirected();
        let mut index_of = HashMap::new();
        let mut add = |graph: &mut UnGraph<PassiveNode, ()>, id: NodeId, name: &str, keystone: bool, notable: bool| {
            let node = PassiveNode {
                id,
                name: name.to_string(),
                stats: vec![format!("fixture stat for {name}")],
                is_keystone: keystone,
                is_notable: notable,
                is_mastery: false,
                orbit: 0,
                orbit_index: 0,
                group: 0,
                position: (id as f32, 0.0),
            };
            graph.add_node(node)
        };

        // A spine of travel nodes off the class start, with a couple of
        // notable/keystone branches hanging off the far end, and one
        // deliberate side-branch used by swap tests.
        index_of.insert(0, add(&mut graph, 0, "start", false, false));
        for id in 1..=9u32 {
            let notable = id == 5;
            let keystone = id == 9;
            index_of.insert(id, add(&mut graph, id, &format!("node-{id}"), keystone, notable));
        }
        index_of.insert(100, add(&mut graph, 100, "branch-a", false, false));
        index_of.insert(101, add(&mut graph, 101, "branch-b", false, true));

        let edges: &[(NodeId, NodeId)] = &[
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 4),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 8),
            (8, 9),
            (2, 100),
            (100, 101),
        ];
        for &(a, b) in edges {
            graph.add_edge(index_of[&a], index_of[&b], ());
        }

        let mut class_start_nodes = HashMap::new();
        class_start_nodes.insert("Witch".to_string(), 0);
        class_start_nodes.insert("Warrior".to_string(), 0);

        Self {
            graph,
            index_of,
            class_start_nodes,
            tree_version: "fixture-1".to_string(),
        }
    }

    pub fn tree_version(&self) -> &str {
        &self.tree_version
    }

    pub fn node(&self, node_id: NodeId) -> Option<&PassiveNode> {
        self.index_of.get(&node_id).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.index_of.contains_key(&node_id)
    }

    /// All nodes directly adjacent to `node_id`. Empty if the id is unknown;
    /// this never errors.
    pub fn neighbors(&self, node_id: NodeId) -> HashSet<NodeId> {
        match self.index_of.get(&node_id) {
            None => HashSet::new(),
            Some(&idx) => self
                .graph
                .neighbors(idx)
                .map(|n| self.graph[n].id)
                .collect(),
        }
    }

    /// Neighbors of `node_id` that are also present in `allocated`. This is
    /// the primitive the neighbor generator and the connectivity checks
    /// build on: it restricts adjacency to the induced subgraph.
    pub(crate) fn allocated_neighbors(&self, node_id: NodeId, allocated: &im::HashSet<NodeId>) -> Vec<NodeId> {
        match self.index_of.get(&node_id) {
            None => Vec::new(),
            Some(&idx) => self
                .graph
                .neighbors(idx)
                .map(|n| self.graph[n].id)
                .filter(|id| allocated.contains(id))
                .collect(),
        }
    }

    pub fn class_start(&self, class: CharacterClass) -> Result<NodeId> {
        self.class_start_nodes
            .get(class.as_str())
            .copied()
            .ok_or_else(|| OptimizerError::UnknownClass(class.as_str().to_string()))
    }

    /// Builds a bitset over internal petgraph indices with one bit set per
    /// id in `allocated` that the graph actually knows about. BFS over the
    /// induced subgraph tests membership against this instead of re-hashing
    /// `NodeId`s on every edge it walks.
    fn allocated_bitset(&self, allocated: &im::HashSet<NodeId>) -> FixedBitSet {
        let mut bits = FixedBitSet::with_capacity(self.graph.node_count());
        for id in allocated.iter() {
            if let Some(&idx) = self.index_of.get(id) {
                bits.insert(idx.index());
            }
        }
        bits
    }

    /// True iff there is a path from `from_id` to `to_id` using only edges
    /// whose endpoints both lie in `allocated`.
    pub fn is_connected(&self, from_id: NodeId, to_id: NodeId, allocated: &im::HashSet<NodeId>) -> bool {
        if !allocated.contains(&from_id) || !allocated.contains(&to_id) {
            return false;
        }
        if from_id == to_id {
            return true;
        }
        let (Some(&from_idx), Some(&to_idx)) = (self.index_of.get(&from_id), self.index_of.get(&to_id)) else {
            return false;
        };

        let in_allocation = self.allocated_bitset(allocated);
        let mut visited = FixedBitSet::with_capacity(self.graph.node_count());
        let mut queue = VecDeque::new();
        visited.insert(from_idx.index());
        queue.push_back(from_idx);
        while let Some(current) = queue.pop_front() {
            if current == to_idx {
                return true;
            }
            for next in self.graph.neighbors(current) {
                if in_allocation.contains(next.index()) && !visited.put(next.index()) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// True iff `class`'s start node is in `allocated` and every node in
    /// `allocated` is reachable from it through the induced subgraph.
    pub fn validate_tree_connectivity(&self, allocated: &im::HashSet<NodeId>, class: CharacterClass) -> Result<bool> {
        let start = self.class_start(class)?;
        if !allocated.contains(&start) {
            return Ok(false);
        }
        let reached = self.reachable_from(start, allocated);
        Ok(reached.len() == allocated.len())
    }

    /// BFS over the induced subgraph, returning every node reachable from
    /// `start`. `start` itself must be in `allocated` for the result to be
    /// meaningful; callers that already know this (the neighbor generator)
    /// can skip re-checking membership. Visited tracking uses a
    /// [`FixedBitSet`] over internal petgraph indices rather than a
    /// `HashSet<NodeId>`, matching the bitset acceleration the design notes
    /// call for once allocation sizes climb into the hundreds.
    pub(crate) fn reachable_from(&self, start: NodeId, allocated: &im::HashSet<NodeId>) -> HashSet<NodeId> {
        let mut result = HashSet::new();
        if !allocated.contains(&start) {
            return result;
        }
        let Some(&start_idx) = self.index_of.get(&start) else {
            return result;
        };

        let in_allocation = self.allocated_bitset(allocated);
        let mut visited = FixedBitSet::with_capacity(self.graph.node_count());
        let mut queue = VecDeque::new();
        visited.insert(start_idx.index());
        queue.push_back(start_idx);
        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors(current) {
                if in_allocation.contains(next.index()) && !visited.put(next.index()) {
                    queue.push_back(next);
                }
            }
        }
        result.extend(visited.ones().map(|i| self.graph[NodeIndex::new(i)].id));
        result
    }
}

/// Process-wide handle to the one [`PassiveTreeGraph`] a host process loads.
///
/// The design notes call for modeling the source's module-level tree cache
/// as an explicit handle constructed through a small once-initialized
/// factory rather than an implicit global. `init_global` is that factory:
/// call it once at process startup with the loaded graph, then every
/// subsequent [`global`] call hands out the same `Arc` cheaply. Tests that
/// need an isolated graph should construct one directly instead of going
/// through this cell.
static GLOBAL_TREE: OnceCell<Arc<PassiveTreeGraph>> = OnceCell::new();

/// Installs `tree` as the process-wide passive tree. Returns `true` if this
/// call performed the install, `false` if a tree was already installed (a
/// process only ever loads one tree; later calls are a no-op rather than a
/// silent overwrite).
pub fn init_global(tree: PassiveTreeGraph) -> bool {
    GLOBAL_TREE.set(Arc::new(tree)).is_ok()
}

/// The process-wide tree installed by [`init_global`], if any.
pub fn global() -> Option<Arc<PassiveTreeGraph>> {
    GLOBAL_TREE.get().cloned()
}
