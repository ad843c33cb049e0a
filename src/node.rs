use serde::Deserialize;
use serde::Serialize;

/// Stable integer identifier for a node in the passive tree. Identifiers are
/// assigned once at tree authoring time and never reused across tree
/// versions.
pub type NodeId = u32;

/// A single passive-tree node.
///
/// Stat text is opaque to the core: only the external build evaluator
/// interprets it. The core only ever inspects the kind flags (for neighbor
/// prioritization) and the identifier (for graph queries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub stats: Vec<String>,
    #[serde(default)]
    pub is_keystone: bool,
    #[serde(default)]
    pub is_notable: bool,
    #[serde(default)]
    pub is_mastery: bool,
    #[serde(default)]
    pub orbit: u32,
    #[serde(default)]
    pub orbit_index: u32,
    #[serde(default)]
    pub group: u32,
    #[serde(default)]
    pub position: (f32, f32),
}

/// Relative search value of a node, used only to order neighbor candidates.
/// Keystones outrank Notables outrank everything else; travel nodes carry no
/// special-cased rank above a plain small node (the spec draws the line at
/// "small/travel" as a single tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeValue {
    Small = 0,
    Notable = 1,
    Keystone = 2,
}

impl PassiveNode {
    pub fn value(&self) -> NodeValue {
        if self.is_keystone {
            NodeValue::Keystone
        } else if self.is_notable {
            NodeValue::Notable
        } else {
            NodeValue::Small
        }
    }
}
