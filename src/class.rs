use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// The closed set of playable character classes, carried through from the
/// source domain for concreteness. The core treats this as an opaque tag:
/// it never branches on a specific class beyond resolving its class-start
/// node in [`crate::tree::PassiveTreeGraph::class_start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Witch,
    Warrior,
    Ranger,
    Monk,
    Mercenary,
    Sorceress,
    Huntress,
}

impl CharacterClass {
    /// The canonical wire-format name, matching the key a loaded tree's
    /// `class_start_nodes` table uses for this class.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Witch => "Witch",
            Self::Warrior => "Warrior",
            Self::Ranger => "Ranger",
            Self::Monk => "Monk",
            Self::Mercenary => "Mercenary",
            Self::Sorceress => "Sorceress",
            Self::Huntress => "Huntress",
        }
    }

    /// All seven classes, in a fixed order. Useful for exhaustively
    /// registering fixtures or validating that a loaded tree has a
    /// class-start node for every class it claims to support.
    pub const ALL: [CharacterClass; 7] = [
        Self::Witch,
        Self::Warrior,
        Self::Ranger,
        Self::Monk,
        Self::Mercenary,
        Self::Sorceress,
        Self::Huntress,
    ];
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_round_trips_through_display() {
        for class in CharacterClass::ALL {
            assert_eq!(class.as_str(), class.to_string());
        }
    }

    #[test]
    fn all_covers_every_variant_once() {
        let mut seen = std::collections::HashSet::new();
        for class in CharacterClass::ALL {
            assert!(seen.insert(class.as_str()));
        }
        assert_eq!(seen.len(), 7);
    }
}
