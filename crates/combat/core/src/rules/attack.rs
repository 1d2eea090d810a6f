//! Attack rolls against armor class.

use crate::action::ActionCategory;
use crate::boost::{CriticalPolicy, QueryContext, RollType};
use crate::config::CombatConfig;
use crate::dice::{AdvantageSources, RollModifier, RollResult, RollStream, roll_d20};
use crate::state::Combatant;
use crate::stats::Ability;

/// To-hit bonus from the ability/proficiency tables.
pub fn attack_bonus(attacker: &Combatant, ability: Ability, proficient: bool) -> i32 {
    let proficiency = if proficient { attacker.proficiency() } else { 0 };
    attacker.ability_mod(ability) + proficiency
}

/// Inputs of one attack roll beyond the two combatants.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackRequest {
    pub category: Option<ActionCategory>,
    pub attack_bonus: i32,
    pub extra_modifiers: Vec<RollModifier>,
    pub extra_advantage: AdvantageSources,
}

/// A rolled attack and its comparison against AC.
///
/// Reactions may raise the AC, penalise the roll or cancel the hit after the
/// roll; [`AttackResolution::recompute`] folds those back in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResolution {
    pub roll: RollResult,
    pub target_ac: i32,
    /// Natural face at or above which the attack is a critical.
    pub crit_threshold: u32,
    /// An automatic-critical boost applied within melee reach.
    pub forced_critical: bool,
    pub critical_blocked: bool,
    pub cancelled: bool,
    pub hit: bool,
    pub critical: bool,
}

impl AttackResolution {
    pub fn recompute(&mut self) {
        let natural = self.roll.chosen;
        self.hit = if self.cancelled || natural == 1 {
            false
        } else if natural >= self.crit_threshold {
            true
        } else {
            self.roll.total >= self.target_ac
        };
        self.critical = self.hit
            && !self.critical_blocked
            && (natural >= self.crit_threshold || self.forced_critical);
    }

    pub fn raise_ac(&mut self, bonus: i32) {
        self.target_ac += bonus;
        self.recompute();
    }

    pub fn penalise(&mut self, label: impl Into<String>, penalty: i32) {
        self.roll.push_modifier(RollModifier::new(label, -penalty));
        self.recompute();
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.recompute();
    }
}

/// Net advantage sources for an attack: the attacker's `AttackRoll` boosts and
/// the target's `AttackTarget` boosts, plus any extra sources.
pub fn attack_advantage(
    attacker: &Combatant,
    target: &Combatant,
    category: Option<ActionCategory>,
    extra: AdvantageSources,
) -> AdvantageSources {
    let ctx = QueryContext::roll(attacker, Some(target), category);
    let own = attacker
        .boosts
        .advantage_sources(RollType::AttackRoll, None, &ctx);
    let against = target
        .boosts
        .advantage_sources(RollType::AttackTarget, None, &ctx.for_subject(target));
    own.merge(against).merge(extra)
}

/// Critical threshold and automatic-critical policy for this pairing.
pub fn critical_rules(
    attacker: &Combatant,
    target: &Combatant,
    category: Option<ActionCategory>,
    config: &CombatConfig,
) -> (u32, bool, bool) {
    let ctx = QueryContext::roll(attacker, Some(target), category);
    let target_ctx = ctx.for_subject(target);

    let reduction = attacker.boosts.critical_threshold_reduction(&ctx);
    let threshold = CombatConfig::CRITICAL_THRESHOLD
        .saturating_sub(reduction)
        .max(2);

    let policies = [
        attacker.boosts.critical_policy(RollType::AttackRoll, &ctx),
        target.boosts.critical_policy(RollType::AttackTarget, &target_ctx),
    ];
    let blocked = policies.contains(&Some(CriticalPolicy::Never));
    let in_reach = attacker.position.distance_to(target.position) <= config.melee_reach;
    let forced = in_reach && policies.contains(&Some(CriticalPolicy::Always));
    (threshold, forced, blocked)
}

/// Roll an attack. Roll-bonus dice are rolled after the d20.
pub fn resolve_attack(
    attacker: &Combatant,
    target: &Combatant,
    request: &AttackRequest,
    config: &CombatConfig,
    rolls: &mut RollStream,
) -> AttackResolution {
    let ctx = QueryContext::roll(attacker, Some(target), request.category);
    let target_ctx = ctx.for_subject(target);

    let advantage = attack_advantage(attacker, target, request.category, request.extra_advantage);
    let mut modifiers = vec![RollModifier::new("attack bonus", request.attack_bonus)];
    modifiers.extend(request.extra_modifiers.iter().cloned());
    let mut roll = roll_d20(advantage.net(), modifiers, rolls);

    for formula in attacker.boosts.roll_bonuses(RollType::AttackRoll, &ctx) {
        let rolled = formula.roll(attacker, rolls, false);
        roll.push_modifier(RollModifier::new(formula.to_string(), rolled.total));
    }
    for formula in target.boosts.roll_bonuses(RollType::AttackTarget, &target_ctx) {
        let rolled = formula.roll(target, rolls, false);
        roll.push_modifier(RollModifier::new(formula.to_string(), rolled.total));
    }

    let (crit_threshold, forced_critical, critical_blocked) =
        critical_rules(attacker, target, request.category, config);
    let mut resolution = AttackResolution {
        roll,
        target_ac: target.armor_class(&target_ctx),
        crit_threshold,
        forced_critical,
        critical_blocked,
        cancelled: false,
        hit: false,
        critical: false,
    };
    resolution.recompute();
    tracing::debug!(
        attacker = %attacker.id,
        target = %target.id,
        total = resolution.roll.total,
        ac = resolution.target_ac,
        hit = resolution.hit,
        critical = resolution.critical,
        "attack roll"
    );
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boost::BoostSource;
    use crate::dice::AdvantageState;
    use crate::state::Position;
    use crate::testing::CombatantBuilder;

    fn pair() -> (Combatant, Combatant) {
        let attacker = CombatantBuilder::new(1, "Fighter")
            .at(Position::new(0, 0))
            .build();
        let target = CombatantBuilder::new(2, "Goblin")
            .hostile()
            .ac(15)
            .at(Position::new(1, 0))
            .build();
        (attacker, target)
    }

    fn request(bonus: i32) -> AttackRequest {
        AttackRequest {
            category: Some(ActionCategory::MeleeWeapon),
            attack_bonus: bonus,
            ..AttackRequest::default()
        }
    }

    #[test]
    fn natural_one_always_misses() {
        let (attacker, target) = pair();
        let mut rolls = RollStream::new(0).with_forced([1]);
        let result = resolve_attack(&attacker, &target, &request(30), &CombatConfig::default(), &mut rolls);
        assert!(!result.hit);
    }

    #[test]
    fn natural_twenty_hits_and_crits() {
        let (attacker, target) = pair();
        let mut rolls = RollStream::new(0).with_forced([20]);
        let result = resolve_attack(&attacker, &target, &request(-10), &CombatConfig::default(), &mut rolls);
        assert!(result.hit && result.critical);
    }

    #[test]
    fn total_meets_ac_to_hit() {
        let (attacker, target) = pair();
        let mut rolls = RollStream::new(0).with_forced([10, 9]);
        let config = CombatConfig::default();
        assert!(resolve_attack(&attacker, &target, &request(5), &config, &mut rolls).hit);
        assert!(!resolve_attack(&attacker, &target, &request(5), &config, &mut rolls).hit);
    }

    #[test]
    fn two_advantages_beat_one_disadvantage() {
        let (mut attacker, mut target) = pair();
        attacker.add_boost(
            "Advantage(AttackRoll)".parse().unwrap(),
            BoostSource::Passive { id: "a".into() },
        );
        attacker.add_boost(
            "Advantage(AttackRoll)".parse().unwrap(),
            BoostSource::Passive { id: "b".into() },
        );
        target.add_boost(
            "Disadvantage(AttackTarget)".parse().unwrap(),
            BoostSource::Passive { id: "c".into() },
        );
        let sources = attack_advantage(&attacker, &target, None, AdvantageSources::NONE);
        assert_eq!(sources, AdvantageSources::new(2, 1));
        assert_eq!(sources.net(), AdvantageState::Advantage);
    }

    #[test]
    fn autocrit_only_within_melee_reach() {
        let (attacker, mut target) = pair();
        target.add_boost(
            "CriticalHit(AttackTarget,Always)".parse().unwrap(),
            BoostSource::Passive { id: "paralyzed".into() },
        );
        let config = CombatConfig::default();

        let mut rolls = RollStream::new(0).with_forced([12]);
        let close = resolve_attack(&attacker, &target, &request(5), &config, &mut rolls);
        assert!(close.hit && close.critical);

        target.position = Position::new(4, 0);
        let mut rolls = RollStream::new(0).with_forced([12]);
        let far = resolve_attack(&attacker, &target, &request(5), &config, &mut rolls);
        assert!(far.hit && !far.critical);
    }

    #[test]
    fn reduced_threshold_widens_crit_range() {
        let (mut attacker, target) = pair();
        attacker.add_boost(
            "ReduceCriticalAttackThreshold(1)".parse().unwrap(),
            BoostSource::Passive { id: "champion".into() },
        );
        let mut rolls = RollStream::new(0).with_forced([19]);
        let result = resolve_attack(&attacker, &target, &request(0), &CombatConfig::default(), &mut rolls);
        assert_eq!(result.crit_threshold, 19);
        assert!(result.critical);
    }

    #[test]
    fn reaction_adjustments_recompute_the_hit() {
        let (attacker, target) = pair();
        let mut rolls = RollStream::new(0).with_forced([12]);
        let mut result = resolve_attack(&attacker, &target, &request(5), &CombatConfig::default(), &mut rolls);
        assert!(result.hit);
        result.raise_ac(5);
        assert!(!result.hit);
    }

    #[test]
    fn attack_bonus_is_table_driven() {
        let fighter = CombatantBuilder::new(1, "Fighter")
            .level(5)
            .abilities(crate::stats::AbilityScores::new(18, 10, 10, 10, 10, 10))
            .build();
        assert_eq!(attack_bonus(&fighter, Ability::Strength, true), 4 + 3);
        assert_eq!(attack_bonus(&fighter, Ability::Dexterity, false), 0);
    }
}
