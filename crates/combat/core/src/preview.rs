//! Read-only outcome estimates for scoring candidate actions.
//!
//! A preview validates the action exactly like execution does, then derives
//! probabilities from the d20 face distribution under the net advantage
//! state. Dice formulas and roll-bonus dice contribute their means. Nothing
//! is rolled and nothing is mutated.

use crate::action::{
    ActionCategory, ActionDefinition, ActionEffect, ActionError, ActionInput, ActionRoll,
    EffectKind, EffectScope, EffectWhen, Payment, SavePolicy, validate_action,
};
use crate::boost::{QueryContext, RollType};
use crate::dice::{AdvantageState, DiceFormula, chance_face_at_least};
use crate::env::CombatEnv;
use crate::rules::{attack_advantage, attack_bonus, check_bonus, critical_rules, save_bonus};
use crate::state::{CombatState, Combatant, CombatantId};
use crate::stats::{DamageType, Skill};

/// Expected outcome against one target.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetPreview {
    pub target: CombatantId,
    /// Chance the action's roll succeeds against this target: a hit, a failed
    /// save or a won contest. 1.0 when there is no roll.
    pub hit_chance: f64,
    pub critical_chance: f64,
    /// Present only for save-based actions.
    pub save_fail_chance: Option<f64>,
    pub expected_damage: f64,
    /// Capped at the target's missing HP.
    pub expected_healing: f64,
    /// Statuses the action would apply, with their probability of landing.
    pub statuses: Vec<(String, f64)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionPreview {
    pub actor: CombatantId,
    pub action: String,
    pub targets: Vec<TargetPreview>,
    /// Healing from effects scoped to the caster.
    pub self_healing: f64,
}

impl ActionPreview {
    pub fn expected_damage(&self) -> f64 {
        self.targets.iter().map(|t| t.expected_damage).sum()
    }

    pub fn expected_healing(&self) -> f64 {
        self.self_healing + self.targets.iter().map(|t| t.expected_healing).sum::<f64>()
    }
}

/// Probability of each way an effect can run against one target.
#[derive(Clone, Copy, Debug, Default)]
struct Weights {
    normal: f64,
    critical: f64,
    halved: f64,
}

impl Weights {
    fn total(self) -> f64 {
        self.normal + self.critical + self.halved
    }
}

/// Roll odds against one target.
#[derive(Clone, Copy, Debug)]
struct Odds {
    landed: f64,
    critical: f64,
    /// The target rolls a successful save.
    saved: f64,
}

impl Odds {
    const CERTAIN: Odds = Odds {
        landed: 1.0,
        critical: 0.0,
        saved: 0.0,
    };

    /// Mirrors the pipeline's effect gate.
    fn weights(self, effect: &ActionEffect) -> Weights {
        let halved = if effect.save == SavePolicy::Half {
            self.saved
        } else {
            0.0
        };
        match effect.when {
            EffectWhen::Always => Weights {
                normal: 1.0 - self.critical - halved,
                critical: self.critical,
                halved,
            },
            EffectWhen::OnFailure => Weights {
                normal: 1.0 - self.landed,
                ..Weights::default()
            },
            EffectWhen::OnSuccess => {
                let ignored = if effect.save == SavePolicy::Ignore {
                    self.saved
                } else {
                    0.0
                };
                Weights {
                    normal: self.landed - self.critical + ignored,
                    critical: self.critical,
                    halved,
                }
            }
        }
    }
}

/// Probability that the chosen d20 face is exactly `face`.
fn face_chance(face: i32, advantage: AdvantageState) -> f64 {
    chance_face_at_least(face, advantage) - chance_face_at_least(face + 1, advantage)
}

fn mean_of(formulas: &[DiceFormula], source: &Combatant) -> f64 {
    formulas.iter().map(|f| f.mean(source, false)).sum()
}

/// Expected outcome of `action` for `actor` with the given selection.
///
/// Fails with the same refusal `execute_action` would return.
pub fn preview_action(
    state: &CombatState,
    env: CombatEnv<'_>,
    actor: CombatantId,
    action: &ActionDefinition,
    input: &ActionInput,
) -> Result<ActionPreview, ActionError> {
    let caster = state
        .combatant(actor)
        .ok_or(ActionError::UnknownCombatant(actor))?;
    let targets = validate_action(state, env, caster, action, input, Payment::Turn)?;

    let mut preview = ActionPreview {
        actor,
        action: action.id.clone(),
        targets: Vec::with_capacity(targets.len()),
        self_healing: 0.0,
    };

    let mut all_missed = 1.0;
    for &id in &targets {
        let target = state
            .combatant(id)
            .ok_or(ActionError::UnknownCombatant(id))?;
        let odds = roll_odds(env, caster, target, action);
        all_missed *= 1.0 - odds.landed;

        let mut entry = TargetPreview {
            target: id,
            hit_chance: odds.landed,
            critical_chance: odds.critical,
            save_fail_chance: matches!(action.roll, ActionRoll::Save { .. }).then_some(odds.landed),
            ..TargetPreview::default()
        };
        for (index, effect) in action.effects.iter().enumerate() {
            if effect.scope == EffectScope::Targets {
                accumulate(&mut entry, caster, target, action, index, effect, odds.weights(effect));
            }
        }
        preview.targets.push(entry);
    }

    let caster_odds = if matches!(action.roll, ActionRoll::None) {
        Odds::CERTAIN
    } else {
        Odds {
            landed: 1.0 - all_missed,
            ..Odds::CERTAIN
        }
    };
    let missing = f64::from(caster.max_hp().saturating_sub(caster.hp));
    for effect in action.effects.iter().filter(|e| e.scope == EffectScope::Caster) {
        if let EffectKind::Heal(heal) = &effect.kind {
            let weight = caster_odds.weights(effect).total();
            preview.self_healing += weight * heal.formula.mean(caster, false).min(missing);
        }
    }

    tracing::trace!(
        actor = %actor,
        action = %action.id,
        damage = preview.expected_damage(),
        "action previewed"
    );
    Ok(preview)
}

// ============================================================================
// Roll odds
// ============================================================================

fn roll_odds(
    env: CombatEnv<'_>,
    caster: &Combatant,
    target: &Combatant,
    action: &ActionDefinition,
) -> Odds {
    let category = Some(action.category);
    match &action.roll {
        ActionRoll::None => Odds::CERTAIN,
        ActionRoll::Attack {
            ability,
            proficient,
            bonus,
        } => {
            let ctx = QueryContext::roll(caster, Some(target), category);
            let target_ctx = ctx.for_subject(target);
            let advantage = attack_advantage(caster, target, category, Default::default()).net();
            let modifier = f64::from(attack_bonus(caster, ability.resolve(caster), *proficient) + bonus)
                + mean_of(&caster.boosts.roll_bonuses(RollType::AttackRoll, &ctx), caster)
                + mean_of(
                    &target.boosts.roll_bonuses(RollType::AttackTarget, &target_ctx),
                    target,
                );
            let ac = f64::from(target.armor_class(&target_ctx));
            let (threshold, forced, blocked) = critical_rules(caster, target, category, env.config);

            let mut odds = Odds {
                landed: 0.0,
                critical: 0.0,
                saved: 0.0,
            };
            for face in 2..=20 {
                let chance = face_chance(face, advantage);
                let natural = face as u32 >= threshold;
                if natural || f64::from(face) + modifier >= ac {
                    odds.landed += chance;
                    if !blocked && (natural || forced) {
                        odds.critical += chance;
                    }
                }
            }
            odds
        }
        ActionRoll::Save { ability, dc } => {
            let ctx = QueryContext {
                subject: target,
                source: Some(caster),
                target: Some(target),
                action: category,
                critical: None,
            };
            if target.boosts.auto_fails(*ability, &ctx) {
                return Odds::CERTAIN;
            }
            let advantage = target
                .boosts
                .advantage_sources(RollType::SavingThrow, Some(*ability), &ctx)
                .net();
            let modifier = f64::from(save_bonus(target, *ability))
                + mean_of(&target.boosts.roll_bonuses(RollType::SavingThrow, &ctx), target);
            let dc = f64::from(dc.resolve(caster));
            let saved: f64 = (1..=20)
                .filter(|&face| f64::from(face) + modifier >= dc)
                .map(|face| face_chance(face, advantage))
                .sum();
            Odds {
                landed: 1.0 - saved,
                critical: 0.0,
                saved,
            }
        }
        ActionRoll::Contest { skill, against } => {
            let defender_skill = against
                .iter()
                .copied()
                .fold(None::<Skill>, |best, candidate| match best {
                    Some(current)
                        if check_bonus(target, current.ability(), Some(current))
                            >= check_bonus(target, candidate.ability(), Some(candidate)) =>
                    {
                        Some(current)
                    }
                    _ => Some(candidate),
                })
                .unwrap_or(*skill);
            let (attack_adv, attack_mod) = check_odds(caster, *skill);
            let (defend_adv, defend_mod) = check_odds(target, defender_skill);

            let mut landed = 0.0;
            for mine in 1..=20 {
                let p_mine = face_chance(mine, attack_adv);
                for theirs in 1..=20 {
                    if f64::from(mine) + attack_mod > f64::from(theirs) + defend_mod {
                        landed += p_mine * face_chance(theirs, defend_adv);
                    }
                }
            }
            Odds {
                landed,
                critical: 0.0,
                saved: 0.0,
            }
        }
    }
}

fn check_odds(combatant: &Combatant, skill: Skill) -> (AdvantageState, f64) {
    let ctx = QueryContext::of(combatant);
    let advantage = combatant
        .boosts
        .advantage_sources(RollType::SkillCheck, Some(skill.ability()), &ctx)
        .net();
    let modifier = f64::from(check_bonus(combatant, skill.ability(), Some(skill)))
        + mean_of(&combatant.boosts.roll_bonuses(RollType::SkillCheck, &ctx), combatant);
    (advantage, modifier)
}

// ============================================================================
// Effect expectations
// ============================================================================

fn accumulate(
    entry: &mut TargetPreview,
    caster: &Combatant,
    target: &Combatant,
    action: &ActionDefinition,
    index: usize,
    effect: &ActionEffect,
    weights: Weights,
) {
    let category = Some(action.category);
    match &effect.kind {
        EffectKind::DealDamage(damage) => {
            let primary = action.is_attack()
                && action
                    .effects
                    .iter()
                    .position(|e| matches!(e.kind, EffectKind::DealDamage(_)))
                    == Some(index);

            let expected = |critical: bool| -> f64 {
                let mut parts = vec![(damage.formula.mean(caster, critical), damage.damage_type)];
                if primary {
                    let query =
                        QueryContext::roll(caster, Some(target), category).with_critical(critical);
                    for (formula, damage_type) in caster.boosts.damage_bonuses(&query) {
                        parts.push((
                            formula.mean(caster, critical),
                            damage_type.unwrap_or(damage.damage_type),
                        ));
                    }
                }
                parts
                    .into_iter()
                    .map(|(mean, damage_type)| {
                        mean.max(0.0) * resistance(caster, target, category, critical, damage_type)
                    })
                    .sum()
            };

            let normal = expected(false);
            entry.expected_damage += weights.normal * normal
                + weights.critical * expected(true)
                + weights.halved * normal / 2.0;
        }
        EffectKind::Heal(heal) => {
            let missing = f64::from(target.max_hp().saturating_sub(target.hp));
            entry.expected_healing += weights.total() * heal.formula.mean(caster, false).min(missing);
        }
        EffectKind::ApplyStatus(apply) => {
            let ctx = QueryContext {
                subject: target,
                source: Some(caster),
                target: Some(target),
                action: category,
                critical: None,
            };
            let chance = if target.boosts.is_immune_to_status(&apply.status, &ctx) {
                0.0
            } else {
                weights.total()
            };
            entry.statuses.push((apply.status.clone(), chance));
        }
        _ => {}
    }
}

fn resistance(
    caster: &Combatant,
    target: &Combatant,
    category: Option<ActionCategory>,
    critical: bool,
    damage_type: DamageType,
) -> f64 {
    let ctx = QueryContext {
        subject: target,
        source: Some(caster),
        target: Some(target),
        action: category,
        critical: Some(critical),
    };
    target.boosts.resistance_level(damage_type, &ctx).multiplier()
}
