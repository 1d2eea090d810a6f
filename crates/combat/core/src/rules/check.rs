//! Ability checks, contests and initiative.

use crate::boost::{QueryContext, RollType};
use crate::dice::{RollModifier, RollResult, RollStream, roll_d20};
use crate::state::Combatant;
use crate::stats::{Ability, Skill};

pub fn check_bonus(combatant: &Combatant, ability: Ability, skill: Option<Skill>) -> i32 {
    let proficiency = match skill {
        Some(skill) if combatant.skill_proficient(skill) => combatant.proficiency(),
        _ => 0,
    };
    combatant.ability_mod(ability) + proficiency
}

/// Roll an ability or skill check with no DC attached.
pub fn roll_check(
    combatant: &Combatant,
    ability: Ability,
    skill: Option<Skill>,
    rolls: &mut RollStream,
) -> RollResult {
    let ctx = QueryContext::of(combatant);
    let roll_type = if skill.is_some() {
        RollType::SkillCheck
    } else {
        RollType::AbilityCheck
    };
    let advantage = combatant
        .boosts
        .advantage_sources(roll_type, Some(ability), &ctx);
    let label = match skill {
        Some(skill) => skill.to_string(),
        None => format!("{} check", ability.short()),
    };
    let modifiers = vec![RollModifier::new(label, check_bonus(combatant, ability, skill))];
    let mut roll = roll_d20(advantage.net(), modifiers, rolls);
    for formula in combatant.boosts.roll_bonuses(roll_type, &ctx) {
        let rolled = formula.roll(combatant, rolls, false);
        roll.push_modifier(RollModifier::new(formula.to_string(), rolled.total));
    }
    roll
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckResolution {
    pub roll: RollResult,
    pub dc: i32,
    pub success: bool,
}

/// Check against a DC. A natural 1 is not an automatic failure.
pub fn resolve_check(
    combatant: &Combatant,
    ability: Ability,
    skill: Option<Skill>,
    dc: i32,
    rolls: &mut RollStream,
) -> CheckResolution {
    let roll = roll_check(combatant, ability, skill, rolls);
    let success = roll.total >= dc;
    CheckResolution { roll, dc, success }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContestResolution {
    pub initiator: RollResult,
    pub defender: RollResult,
    pub defender_skill: Skill,
    /// Ties go to the defender.
    pub initiator_wins: bool,
}

/// Opposed check. The defender picks whichever of `defender_skills` has the
/// higher bonus (first listed on a tie).
pub fn resolve_contest(
    initiator: &Combatant,
    initiator_skill: Skill,
    defender: &Combatant,
    defender_skills: &[Skill],
    rolls: &mut RollStream,
) -> ContestResolution {
    let defender_skill = defender_skills
        .iter()
        .copied()
        .fold(None::<Skill>, |best, skill| match best {
            Some(current)
                if check_bonus(defender, current.ability(), Some(current))
                    >= check_bonus(defender, skill.ability(), Some(skill)) =>
            {
                Some(current)
            }
            _ => Some(skill),
        })
        .unwrap_or(initiator_skill);

    let attack = roll_check(initiator, initiator_skill.ability(), Some(initiator_skill), rolls);
    let defend = roll_check(defender, defender_skill.ability(), Some(defender_skill), rolls);
    let initiator_wins = attack.total > defend.total;
    tracing::debug!(
        initiator = %initiator.id,
        defender = %defender.id,
        attack = attack.total,
        defend = defend.total,
        initiator_wins,
        "contest"
    );
    ContestResolution {
        initiator: attack,
        defender: defend,
        defender_skill,
        initiator_wins,
    }
}

/// d20 + DEX modifier + `Initiative` boosts.
pub fn roll_initiative(combatant: &Combatant, rolls: &mut RollStream) -> RollResult {
    let ctx = QueryContext::of(combatant);
    let advantage = combatant
        .boosts
        .advantage_sources(RollType::Initiative, None, &ctx);
    let modifiers = vec![
        RollModifier::new("DEX", combatant.ability_mod(Ability::Dexterity)),
        RollModifier::new("initiative", combatant.boosts.initiative_bonus(&ctx)),
    ];
    roll_d20(advantage.net(), modifiers, rolls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boost::BoostSource;
    use crate::stats::AbilityScores;
    use crate::testing::CombatantBuilder;

    #[test]
    fn skill_proficiency_adds_bonus() {
        let mut rogue = CombatantBuilder::new(1, "Rogue")
            .abilities(AbilityScores::new(10, 16, 10, 10, 10, 10))
            .build();
        rogue.skill_proficiencies.push(Skill::Acrobatics);
        assert_eq!(check_bonus(&rogue, Ability::Dexterity, Some(Skill::Acrobatics)), 5);
        assert_eq!(check_bonus(&rogue, Ability::Dexterity, Some(Skill::Stealth)), 3);
    }

    #[test]
    fn natural_one_can_still_pass_a_check() {
        let strong = CombatantBuilder::new(1, "Ogre")
            .abilities(AbilityScores::new(30, 10, 10, 10, 10, 10))
            .build();
        let mut rolls = RollStream::new(0).with_forced([1]);
        assert!(resolve_check(&strong, Ability::Strength, None, 10, &mut rolls).success);
    }

    #[test]
    fn contest_ties_go_to_the_defender() {
        let a = CombatantBuilder::new(1, "A").build();
        let b = CombatantBuilder::new(2, "B").build();
        let mut rolls = RollStream::new(0).with_forced([12, 12]);
        let contest = resolve_contest(&a, Skill::Athletics, &b, &[Skill::Athletics], &mut rolls);
        assert!(!contest.initiator_wins);
    }

    #[test]
    fn defender_uses_best_skill() {
        let a = CombatantBuilder::new(1, "A").build();
        let b = CombatantBuilder::new(2, "B")
            .abilities(AbilityScores::new(8, 16, 10, 10, 10, 10))
            .build();
        let mut rolls = RollStream::new(0).with_forced([10, 10]);
        let contest = resolve_contest(
            &a,
            Skill::Athletics,
            &b,
            &[Skill::Athletics, Skill::Acrobatics],
            &mut rolls,
        );
        assert_eq!(contest.defender_skill, Skill::Acrobatics);
        assert_eq!(contest.defender.total, 13);
    }

    #[test]
    fn initiative_includes_boosts() {
        let mut c = CombatantBuilder::new(1, "Bard")
            .abilities(AbilityScores::new(10, 14, 10, 10, 10, 10))
            .build();
        c.add_boost(
            "Initiative(5)".parse().unwrap(),
            BoostSource::Passive { id: "alert".into() },
        );
        let mut rolls = RollStream::new(0).with_forced([10]);
        assert_eq!(roll_initiative(&c, &mut rolls).total, 10 + 2 + 5);
    }
}
