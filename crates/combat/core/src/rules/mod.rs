//! Rules engine: attack rolls, saving throws, checks and damage arithmetic.
//!
//! Composes the dice resolver with the boost store. Every bonus is derived
//! from the ability and proficiency tables at call time.

mod attack;
mod check;
mod damage;
mod save;

pub use attack::{
    AttackRequest, AttackResolution, attack_advantage, attack_bonus, critical_rules,
    resolve_attack,
};
pub use check::{
    CheckResolution, ContestResolution, check_bonus, resolve_check, resolve_contest, roll_check,
    roll_initiative,
};
pub use damage::{DamageBreakdown, concentration_dc, damage_breakdown, is_massive_damage};
pub use save::{
    DeathSaveOutcome, DeathSaveResolution, SaveRequest, SaveResolution, compute_save_dc,
    resolve_death_save, resolve_save, save_bonus,
};
