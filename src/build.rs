use crate::class::CharacterClass;
use crate::error::OptimizerError;
use crate::error::Result;
use crate::node::NodeId;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// Quest reward points granted independent of level, folded into
/// [`BuildData::total_points_available`].
const QUEST_REWARD_POINTS: u32 = 24;

/// An equipped item. Opaque to the core: the evaluator is the only consumer
/// that interprets `affixes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Item {
    pub name: String,
    pub slot: String,
    #[serde(default)]
    pub affixes: Vec<String>,
}

/// An equipped or socketed skill. Opaque to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub supports: Vec<String>,
}

/// The mutable artifact the optimizer searches over.
///
/// Conceptually immutable: every mutation produces a new `BuildData` rather
/// than editing one in place. The allocated-node set is backed by
/// [`im::HashSet`] so deriving a sibling snapshot is O(log n) rather than a
/// full O(n) clone, which matters once a run is evaluating dozens of
/// candidate mutations per iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildData {
    pub class: CharacterClass,
    pub level: u32,
    #[serde(default)]
    pub ascendancy: Option<String>,
    pub allocated: im::HashSet<NodeId>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

impl BuildData {
    pub fn new(class: CharacterClass, level: u32, allocated: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            class,
            level,
            ascendancy: None,
            allocated: allocated.into_iter().collect(),
            items: Vec::new(),
            skills: Vec::new(),
            config: BTreeMap::new(),
        }
    }

    /// Leveling points (one per level past the first) plus the fixed quest
    /// reward.
    pub fn total_points_available(&self) -> u32 {
        self.level.saturating_sub(1) + QUEST_REWARD_POINTS
    }

    /// Points not yet spent on a node, clamped at zero (an over-allocated
    /// build, which should never occur from a legally-constructed mutation
    /// chain, is not allowed to underflow).
    pub fn unallocated_points(&self) -> u32 {
        self.total_points_available()
            .saturating_sub(self.allocated.len() as u32)
    }

    /// Returns a sibling snapshot with `allocated` replaced; everything else
    /// is cloned structurally via `im`/`Vec`/`BTreeMap` clone, which is cheap
    /// for the opaque payload fields since builds rarely carry large item or
    /// skill lists.
    pub fn with_allocation(&self, allocated: im::HashSet<NodeId>) -> Self {
        Self {
            allocated,
            ..self.clone()
        }
    }
}

/// Resistance percentages, keyed by the four elemental/chaos damage types
/// the evaluator always reports. Missing keys default to zero rather than
/// erroring, matching the evaluator contract in §3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resistances {
    #[serde(default)]
    pub fire: f64,
    #[serde(default)]
    pub cold: f64,
    #[serde(default)]
    pub lightning: f64,
    #[serde(default)]
    pub chaos: f64,
}

impl Default for Resistances {
    fn default() -> Self {
        Self {
            fire: 0.0,
            cold: 0.0,
            lightning: 0.0,
            chaos: 0.0,
        }
    }
}

/// Output of the external build evaluator. Every field must be finite;
/// [`BuildStats::new`] is the sole construction path and enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    pub total_dps: f64,
    pub life: f64,
    pub energy_shield: f64,
    pub mana: f64,
    pub effective_hp: f64,
    pub armour: f64,
    pub evasion: f64,
    pub block_pct: f64,
    pub spell_block_pct: f64,
    pub movement_speed_pct: f64,
    pub resistances: Resistances,
}

impl BuildStats {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        total_dps: f64,
        life: f64,
        energy_shield: f64,
        mana: f64,
        effective_hp: f64,
        armour: f64,
        evasion: f64,
        block_pct: f64,
        spell_block_pct: f64,
        movement_speed_pct: f64,
        resistances: Resistances,
    ) -> Result<Self> {
        let fields = [
            total_dps,
            life,
            energy_shield,
            mana,
            effective_hp,
            armour,
            evasion,
            block_pct,
            spell_block_pct,
            movement_speed_pct,
            resistances.fire,
            resistances.cold,
            resistances.lightning,
            resistances.chaos,
        ];
        if fields.iter().any(|f| !f.is_finite()) {
            return Err(OptimizerError::Evaluator(
                "build stats contained a non-finite value".to_string(),
            ));
        }
        Ok(Self {
            total_dps,
            life,
            energy_shield,
            mana,
            effective_hp,
            armour,
            evasion,
            block_pct,
            spell_block_pct,
            movement_speed_pct,
            resistances,
        })
    }

    /// Effective hit points under the core's MVP formula: life plus energy
    /// shield. Fuller mitigation (armour/resist-adjusted) is out of scope.
    pub fn ehp(&self) -> f64 {
        self.life + self.energy_shield
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_points_available_matches_level_plus_quest_reward() {
        let build = BuildData::new(CharacterClass::Witch, 1, []);
        assert_eq!(build.total_points_available(), 24);
        let build = BuildData::new(CharacterClass::Witch, 90, []);
        assert_eq!(build.total_points_available(), 89 + 24);
    }

    #[test]
    fn unallocated_points_clamps_at_zero() {
        let mut build = BuildData::new(CharacterClass::Witch, 1, 0..30);
        build.level = 1;
        assert_eq!(build.unallocated_points(), 0);
    }

    #[test]
    fn build_stats_rejects_non_finite() {
        let result = BuildStats::new(
            f64::NAN,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            Resistances::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn ehp_sums_life_and_energy_shield() {
        let stats = BuildStats::new(
            100.0,
            1000.0,
            500.0,
            0.0,
            1500.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            Resistances::default(),
        )
        .unwrap();
        assert_eq!(stats.ehp(), 1500.0);
    }
}
