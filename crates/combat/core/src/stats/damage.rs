//! Damage types and resistance arithmetic.

/// Damage type for resistances and damage calculation.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Lightning,
    Thunder,
    Acid,
    Poison,
    Necrotic,
    Radiant,
    Force,
    Psychic,
}

impl DamageType {
    pub const fn is_physical(self) -> bool {
        matches!(
            self,
            DamageType::Slashing | DamageType::Piercing | DamageType::Bludgeoning
        )
    }
}

/// Net resistance level of a combatant against one damage type.
///
/// Always the collapsed result of every active source; see
/// [`ResistanceLevel::collapse`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResistanceLevel {
    #[default]
    Normal,
    Resistant,
    Vulnerable,
    Immune,
}

impl ResistanceLevel {
    /// Collapse any number of same-type sources into one level.
    ///
    /// Immunity wins outright. Otherwise resistance and vulnerability are
    /// presence flags: duplicates do not compound and one of each cancels.
    pub fn collapse(levels: impl IntoIterator<Item = ResistanceLevel>) -> ResistanceLevel {
        let mut resistant = false;
        let mut vulnerable = false;
        for level in levels {
            match level {
                ResistanceLevel::Immune => return ResistanceLevel::Immune,
                ResistanceLevel::Resistant => resistant = true,
                ResistanceLevel::Vulnerable => vulnerable = true,
                ResistanceLevel::Normal => {}
            }
        }
        match (resistant, vulnerable) {
            (true, false) => ResistanceLevel::Resistant,
            (false, true) => ResistanceLevel::Vulnerable,
            _ => ResistanceLevel::Normal,
        }
    }

    /// Damage multiplier: one of 0, 0.5, 1, 2.
    pub const fn multiplier(self) -> f64 {
        match self {
            ResistanceLevel::Normal => 1.0,
            ResistanceLevel::Resistant => 0.5,
            ResistanceLevel::Vulnerable => 2.0,
            ResistanceLevel::Immune => 0.0,
        }
    }

    /// Apply the level to a damage amount (resistance rounds down).
    pub const fn apply(self, amount: u32) -> u32 {
        match self {
            ResistanceLevel::Normal => amount,
            ResistanceLevel::Resistant => amount / 2,
            ResistanceLevel::Vulnerable => amount.saturating_mul(2),
            ResistanceLevel::Immune => 0,
        }
    }
}
