//! Character-sheet arithmetic: abilities, proficiency, skills, damage types.
//!
//! Pure tables and functions. The rules engine composes them with the boost
//! store; nothing here knows about combat state.

pub mod abilities;
pub mod damage;
pub mod skills;

pub use abilities::{Ability, AbilityScores, AbilitySet, ability_modifier, proficiency_bonus};
pub use damage::{DamageType, ResistanceLevel};
pub use skills::Skill;
