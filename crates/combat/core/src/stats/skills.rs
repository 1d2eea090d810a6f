use super::Ability;

/// Skills used by ability checks and contests.
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
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    /// Governing ability of the skill.
    pub const fn ability(self) -> Ability {
        use Skill::*;
        match self {
            Athletics => Ability::Strength,
            Acrobatics | SleightOfHand | Stealth => Ability::Dexterity,
            Arcana | History | Investigation | Nature | Religion => Ability::Intelligence,
            AnimalHandling | Insight | Medicine | Perception | Survival => Ability::Wisdom,
            Deception | Intimidation | Performance | Persuasion => Ability::Charisma,
        }
    }
}
