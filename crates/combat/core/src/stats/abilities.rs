//! Ability scores, modifiers and the proficiency table.
//!
//! Every derived number (attack bonus, save DC, save bonus) goes through
//! [`ability_modifier`] and [`proficiency_bonus`]. Nothing downstream uses
//! flat constants in their place.

use bitflags::bitflags;

/// The six ability scores.
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
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ability {
    #[strum(to_string = "Strength", serialize = "STR")]
    Strength,
    #[strum(to_string = "Dexterity", serialize = "DEX")]
    Dexterity,
    #[strum(to_string = "Constitution", serialize = "CON")]
    Constitution,
    #[strum(to_string = "Intelligence", serialize = "INT")]
    Intelligence,
    #[strum(to_string = "Wisdom", serialize = "WIS")]
    Wisdom,
    #[strum(to_string = "Charisma", serialize = "CHA")]
    Charisma,
}

impl Ability {
    /// Three-letter abbreviation used by dice formulas.
    pub const fn short(self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub const fn flag(self) -> AbilitySet {
        match self {
            Ability::Strength => AbilitySet::STRENGTH,
            Ability::Dexterity => AbilitySet::DEXTERITY,
            Ability::Constitution => AbilitySet::CONSTITUTION,
            Ability::Intelligence => AbilitySet::INTELLIGENCE,
            Ability::Wisdom => AbilitySet::WISDOM,
            Ability::Charisma => AbilitySet::CHARISMA,
        }
    }
}

bitflags! {
    /// Set of abilities, used for saving-throw proficiencies.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AbilitySet: u8 {
        const STRENGTH = 1 << 0;
        const DEXTERITY = 1 << 1;
        const CONSTITUTION = 1 << 2;
        const INTELLIGENCE = 1 << 3;
        const WISDOM = 1 << 4;
        const CHARISMA = 1 << 5;
    }
}

impl AbilitySet {
    pub fn has(self, ability: Ability) -> bool {
        self.contains(ability.flag())
    }
}

impl FromIterator<Ability> for AbilitySet {
    fn from_iter<T: IntoIterator<Item = Ability>>(iter: T) -> Self {
        iter.into_iter()
            .fold(AbilitySet::empty(), |set, ability| set | ability.flag())
    }
}

/// Raw ability scores of a combatant sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityScores {
    pub const fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub const fn uniform(score: i32) -> Self {
        Self::new(score, score, score, score, score, score)
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, score: i32) {
        let slot = match ability {
            Ability::Strength => &mut self.strength,
            Ability::Dexterity => &mut self.dexterity,
            Ability::Constitution => &mut self.constitution,
            Ability::Intelligence => &mut self.intelligence,
            Ability::Wisdom => &mut self.wisdom,
            Ability::Charisma => &mut self.charisma,
        };
        *slot = score;
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::uniform(10)
    }
}

/// Ability modifier: `floor((score - 10) / 2)`.
pub const fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Proficiency bonus by character level (index 0 = level 1).
const PROFICIENCY_BY_LEVEL: [i32; 20] = [
    2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6,
];

/// Proficiency bonus for a level; levels outside 1..=20 clamp to the table ends.
pub fn proficiency_bonus(level: u32) -> i32 {
    let index = level.clamp(1, 20) as usize - 1;
    PROFICIENCY_BY_LEVEL[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_round_down() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(20), 5);
    }

    #[test]
    fn proficiency_scales_with_level() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(12), 4);
        assert_eq!(proficiency_bonus(17), 6);
        assert_eq!(proficiency_bonus(0), 2);
        assert_eq!(proficiency_bonus(40), 6);
    }

    #[test]
    fn ability_parse_accepts_long_and_short_names() {
        assert_eq!("Wisdom".parse::<Ability>().unwrap(), Ability::Wisdom);
        assert_eq!("dex".parse::<Ability>().unwrap(), Ability::Dexterity);
        let set: AbilitySet = [Ability::Strength, Ability::Constitution].into_iter().collect();
        assert!(set.has(Ability::Constitution));
        assert!(!set.has(Ability::Wisdom));
    }
}
