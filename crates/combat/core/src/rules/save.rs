//! Saving throws, save DCs and death saves.

use crate::action::ActionCategory;
use crate::boost::{QueryContext, RollType};
use crate::dice::{AdvantageSources, RollModifier, RollResult, RollStream, roll_d20};
use crate::state::Combatant;
use crate::stats::Ability;

/// `8 + proficiency + ability modifier`, plus `SpellSaveDC` boosts.
pub fn compute_save_dc(caster: &Combatant, ability: Ability) -> i32 {
    let bonus = caster.boosts.spell_save_dc_bonus(&QueryContext::of(caster));
    8 + caster.proficiency() + caster.ability_mod(ability) + bonus
}

pub fn save_bonus(target: &Combatant, ability: Ability) -> i32 {
    let proficiency = if target.save_proficient(ability) {
        target.proficiency()
    } else {
        0
    };
    target.ability_mod(ability) + proficiency
}

/// A saving throw to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveRequest {
    pub ability: Ability,
    pub dc: i32,
    /// Category of the action forcing the save, if any.
    pub action: Option<ActionCategory>,
    pub extra_advantage: AdvantageSources,
}

impl SaveRequest {
    pub fn new(ability: Ability, dc: i32) -> Self {
        Self {
            ability,
            dc,
            action: None,
            extra_advantage: AdvantageSources::NONE,
        }
    }

    pub fn against(mut self, action: ActionCategory) -> Self {
        self.action = Some(action);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaveResolution {
    pub ability: Ability,
    pub dc: i32,
    /// `None` when the save failed automatically without a roll.
    pub roll: Option<RollResult>,
    pub success: bool,
}

impl SaveResolution {
    pub fn auto_failed(&self) -> bool {
        self.roll.is_none()
    }
}

/// Roll a saving throw. Natural 1 and 20 have no special meaning here.
pub fn resolve_save(
    target: &Combatant,
    source: Option<&Combatant>,
    request: SaveRequest,
    rolls: &mut RollStream,
) -> SaveResolution {
    let ctx = QueryContext {
        subject: target,
        source,
        target: Some(target),
        action: request.action,
        critical: None,
    };

    if target.boosts.auto_fails(request.ability, &ctx) {
        tracing::debug!(target = %target.id, ability = %request.ability, "save auto-failed");
        return SaveResolution {
            ability: request.ability,
            dc: request.dc,
            roll: None,
            success: false,
        };
    }

    let advantage = target
        .boosts
        .advantage_sources(RollType::SavingThrow, Some(request.ability), &ctx)
        .merge(request.extra_advantage);
    let modifiers = vec![RollModifier::new(
        format!("{} save", request.ability.short()),
        save_bonus(target, request.ability),
    )];
    let mut roll = roll_d20(advantage.net(), modifiers, rolls);
    for formula in target.boosts.roll_bonuses(RollType::SavingThrow, &ctx) {
        let rolled = formula.roll(target, rolls, false);
        roll.push_modifier(RollModifier::new(formula.to_string(), rolled.total));
    }

    let success = roll.total >= request.dc;
    tracing::debug!(
        target = %target.id,
        ability = %request.ability,
        total = roll.total,
        dc = request.dc,
        success,
        "saving throw"
    );
    SaveResolution {
        ability: request.ability,
        dc: request.dc,
        roll: Some(roll),
        success,
    }
}

// ============================================================================
// Death saves
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeathSaveOutcome {
    /// Natural 20: back up with 1 HP.
    Revived,
    Success,
    /// One failure, or two on a natural 1.
    Failure(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeathSaveResolution {
    pub roll: RollResult,
    pub outcome: DeathSaveOutcome,
}

pub fn resolve_death_save(combatant: &Combatant, dc: i32, rolls: &mut RollStream) -> DeathSaveResolution {
    let ctx = QueryContext::of(combatant);
    let advantage = combatant
        .boosts
        .advantage_sources(RollType::DeathSave, None, &ctx);
    let mut roll = roll_d20(advantage.net(), Vec::new(), rolls);
    for formula in combatant.boosts.roll_bonuses(RollType::DeathSave, &ctx) {
        let rolled = formula.roll(combatant, rolls, false);
        roll.push_modifier(RollModifier::new(formula.to_string(), rolled.total));
    }

    let outcome = if roll.is_natural_20() {
        DeathSaveOutcome::Revived
    } else if roll.is_natural_1() {
        DeathSaveOutcome::Failure(2)
    } else if roll.total >= dc {
        DeathSaveOutcome::Success
    } else {
        DeathSaveOutcome::Failure(1)
    };
    DeathSaveResolution { roll, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boost::BoostSource;
    use crate::stats::{AbilityScores, AbilitySet};
    use crate::testing::CombatantBuilder;

    #[test]
    fn save_dc_scales_with_level() {
        let mut wizard = CombatantBuilder::new(1, "Wizard")
            .abilities(AbilityScores::new(8, 14, 12, 18, 10, 10))
            .build();
        assert_eq!(compute_save_dc(&wizard, Ability::Intelligence), 8 + 2 + 4);
        wizard.level = 9;
        assert_eq!(compute_save_dc(&wizard, Ability::Intelligence), 8 + 4 + 4);
        wizard.add_boost(
            "SpellSaveDC(1)".parse().unwrap(),
            BoostSource::Equipment {
                slot: "amulet".into(),
                item: "AMULET".into(),
            },
        );
        assert_eq!(compute_save_dc(&wizard, Ability::Intelligence), 8 + 4 + 4 + 1);
    }

    #[test]
    fn proficient_saves_add_proficiency() {
        let mut fighter = CombatantBuilder::new(1, "Fighter")
            .abilities(AbilityScores::new(16, 10, 14, 10, 10, 10))
            .build();
        fighter.save_proficiencies = AbilitySet::STRENGTH | AbilitySet::CONSTITUTION;
        assert_eq!(save_bonus(&fighter, Ability::Constitution), 4);
        assert_eq!(save_bonus(&fighter, Ability::Dexterity), 0);
    }

    #[test]
    fn natural_one_is_not_an_automatic_failure() {
        let target = CombatantBuilder::new(1, "Target").build();
        let mut rolls = RollStream::new(0).with_forced([1]);
        let request = SaveRequest::new(Ability::Wisdom, 0);
        assert!(resolve_save(&target, None, request, &mut rolls).success);
    }

    #[test]
    fn auto_fail_skips_the_roll() {
        let mut target = CombatantBuilder::new(1, "Target").build();
        target.add_boost(
            "AutoFail(Dexterity)".parse().unwrap(),
            BoostSource::Passive { id: "stunned".into() },
        );
        let mut rolls = RollStream::new(0).with_forced([20]);
        let result = resolve_save(&target, None, SaveRequest::new(Ability::Dexterity, 5), &mut rolls);
        assert!(!result.success);
        assert!(result.auto_failed());
        assert_eq!(rolls.forced_remaining(), 1);
    }

    #[test]
    fn death_save_outcomes() {
        let downed = CombatantBuilder::new(1, "Cleric").build();
        let mut rolls = RollStream::new(0).with_forced([20, 1, 10, 9]);
        let outcomes: Vec<_> = (0..4)
            .map(|_| resolve_death_save(&downed, 10, &mut rolls).outcome)
            .collect();
        assert_eq!(
            outcomes,
            vec![
                DeathSaveOutcome::Revived,
                DeathSaveOutcome::Failure(2),
                DeathSaveOutcome::Success,
                DeathSaveOutcome::Failure(1),
            ]
        );
    }
}
