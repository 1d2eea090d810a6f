/// Combat configuration constants and tunable parameters.
///
/// Distances are expressed in feet; one grid tile is [`CombatConfig::FEET_PER_TILE`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Maximum nesting of reaction chains (a reaction triggering a reaction...).
    pub max_reaction_depth: u32,

    /// Distance within which melee attacks, opportunity attacks and
    /// automatic-critical statuses apply.
    pub melee_reach: u32,

    /// Floor for the concentration save DC (`max(floor, damage / 2)`).
    pub concentration_min_dc: i32,

    /// Target number for death saving throws.
    pub death_save_dc: i32,

    /// Whether overflow damage at least equal to max HP kills outright.
    pub massive_damage: bool,

    /// Non-player combatants die at 0 HP instead of going down.
    pub npcs_die_at_zero: bool,

    /// Radius around a caster inside which spell-cast reactions are offered.
    pub spell_reaction_radius: u32,

    /// Round cap after which combat ends in a draw.
    pub max_rounds: u32,
}

impl CombatConfig {
    // ===== compile-time constants =====
    pub const FEET_PER_TILE: u32 = 5;
    pub const MAX_DEATH_SAVES: u8 = 3;
    pub const CRITICAL_THRESHOLD: u32 = 20;
    pub const MAX_STACKS: u32 = 16;
    /// Repeat-save DC for a status applied without one.
    pub const FALLBACK_SAVE_DC: i32 = 10;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_REACTION_DEPTH: u32 = 3;
    pub const DEFAULT_MELEE_REACH: u32 = 5;
    pub const DEFAULT_CONCENTRATION_MIN_DC: i32 = 10;
    pub const DEFAULT_DEATH_SAVE_DC: i32 = 10;
    pub const DEFAULT_SPELL_REACTION_RADIUS: u32 = 60;
    pub const DEFAULT_MAX_ROUNDS: u32 = 100;

    pub fn new() -> Self {
        Self {
            max_reaction_depth: Self::DEFAULT_MAX_REACTION_DEPTH,
            melee_reach: Self::DEFAULT_MELEE_REACH,
            concentration_min_dc: Self::DEFAULT_CONCENTRATION_MIN_DC,
            death_save_dc: Self::DEFAULT_DEATH_SAVE_DC,
            massive_damage: true,
            npcs_die_at_zero: true,
            spell_reaction_radius: Self::DEFAULT_SPELL_REACTION_RADIUS,
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_max_reaction_depth(mut self, depth: u32) -> Self {
        self.max_reaction_depth = depth;
        self
    }

    pub fn with_npcs_die_at_zero(mut self, enabled: bool) -> Self {
        self.npcs_die_at_zero = enabled;
        self
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
