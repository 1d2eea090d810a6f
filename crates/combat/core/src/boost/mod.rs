//! Boost store and evaluator.
//!
//! Boost strings are parsed once into [`BoostDefinition`] values (see
//! [`parse`]). A combatant's [`BoostStore`] holds them tagged with the
//! [`BoostSource`] that granted them and answers typed queries.
//!
//! Each kind has one fixed combination rule ([`BoostKind::stacking`]):
//!
//! | policy   | kinds |
//! |----------|-------|
//! | sum      | AC, Ability, RollBonus, DamageBonus, ActionResource, Speed, MaximumHP, Initiative, SpellSaveDC |
//! | count    | Advantage, Disadvantage |
//! | collapse | Resistance |
//! | any      | CriticalHit, ActionResourceBlock, StatusImmunity, AutoFail |
//! | max      | ReduceCriticalAttackThreshold, ActionResourceMultiplier |

mod kinds;
pub mod parse;
mod predicate;
mod store;

pub use kinds::{BoostDefinition, BoostKind, CriticalPolicy, RollType, StackingPolicy};
pub use parse::{ParseError, parse_boosts, parse_predicate};
pub use predicate::{Predicate, QueryContext};
pub use store::{ActiveBoost, BoostSource, BoostStore};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::AdvantageState;
    use crate::stats::{DamageType, ResistanceLevel};
    use crate::testing::CombatantBuilder;

    fn status_source(n: u64, id: &str) -> BoostSource {
        BoostSource::Status {
            instance: crate::state::StatusInstanceId(n),
            status: id.to_string(),
        }
    }

    #[test]
    fn remove_restores_every_query() {
        let mut fighter = CombatantBuilder::new(1, "Fighter").build();
        let before_ac = fighter.armor_class(&QueryContext::of(&fighter));
        let before_fire = fighter
            .boosts
            .resistance_level(DamageType::Fire, &QueryContext::of(&fighter));

        let source = status_source(7, "WARDED");
        for boost in parse_boosts("AC(2);Resistance(Fire,Resistant);Advantage(SavingThrow)").unwrap() {
            fighter.boosts.add(boost, source.clone());
        }
        assert_eq!(fighter.armor_class(&QueryContext::of(&fighter)), before_ac + 2);

        assert_eq!(fighter.boosts.remove_from(&source), 3);
        let ctx = QueryContext::of(&fighter);
        assert_eq!(fighter.armor_class(&ctx), before_ac);
        assert_eq!(fighter.boosts.resistance_level(DamageType::Fire, &ctx), before_fire);
        assert!(!fighter.boosts.has_advantage(RollType::SavingThrow, &ctx));
    }

    #[test]
    fn removal_only_touches_its_own_source() {
        let mut fighter = CombatantBuilder::new(1, "Fighter").build();
        let bless = status_source(1, "BLESS");
        let ring = BoostSource::Equipment {
            slot: "ring".into(),
            item: "RING_OF_PROTECTION".into(),
        };
        fighter.boosts.add("AC(1)".parse().unwrap(), ring.clone());
        fighter.boosts.add("RollBonus(AttackRoll,1d4)".parse().unwrap(), bless.clone());

        fighter.boosts.remove_from(&bless);
        assert!(fighter.boosts.has_source(&ring));
        assert_eq!(fighter.boosts.len(), 1);
    }

    #[test]
    fn duplicate_resistances_collapse() {
        let mut fighter = CombatantBuilder::new(1, "Fighter").build();
        fighter.boosts.add("Resistance(Fire,Resistant)".parse().unwrap(), status_source(1, "A"));
        fighter.boosts.add("Resistance(Fire,Resistant)".parse().unwrap(), status_source(2, "B"));
        let ctx = QueryContext::of(&fighter);
        assert_eq!(
            fighter.boosts.resistance_level(DamageType::Fire, &ctx),
            ResistanceLevel::Resistant
        );

        fighter.boosts.add("Resistance(Fire,Vulnerable)".parse().unwrap(), status_source(3, "C"));
        let ctx = QueryContext::of(&fighter);
        assert_eq!(
            fighter.boosts.resistance_level(DamageType::Fire, &ctx),
            ResistanceLevel::Normal
        );
    }

    #[test]
    fn false_condition_contributes_nothing() {
        let mut fighter = CombatantBuilder::new(1, "Fighter").build();
        fighter.boosts.add(
            "IF(HasStatus('RAGING')):Resistance(Slashing,Resistant)".parse().unwrap(),
            BoostSource::Passive { id: "rage".into() },
        );
        let ctx = QueryContext::of(&fighter);
        assert_eq!(
            fighter.boosts.resistance_level(DamageType::Slashing, &ctx),
            ResistanceLevel::Normal
        );
        assert_eq!(fighter.boosts.len(), 1);
    }

    #[test]
    fn unrecognized_condition_fails_open() {
        let mut fighter = CombatantBuilder::new(1, "Fighter").build();
        fighter.boosts.add(
            "IF(IsFlanking()):Advantage(AttackRoll)".parse().unwrap(),
            BoostSource::Passive { id: "pack".into() },
        );
        let ctx = QueryContext::of(&fighter);
        assert_eq!(
            fighter
                .boosts
                .advantage_sources(RollType::AttackRoll, None, &ctx)
                .net(),
            AdvantageState::Straight
        );
    }

    #[test]
    fn ability_scoped_advantage() {
        let mut rogue = CombatantBuilder::new(1, "Rogue").build();
        rogue.boosts.add(
            "Advantage(SavingThrow,Dexterity)".parse().unwrap(),
            BoostSource::Passive { id: "evasion".into() },
        );
        let ctx = QueryContext::of(&rogue);
        let dex = rogue.boosts.advantage_sources(
            RollType::SavingThrow,
            Some(crate::stats::Ability::Dexterity),
            &ctx,
        );
        let wis = rogue.boosts.advantage_sources(
            RollType::SavingThrow,
            Some(crate::stats::Ability::Wisdom),
            &ctx,
        );
        assert_eq!(dex.advantage, 1);
        assert_eq!(wis.advantage, 0);
    }

    #[test]
    fn max_policies_take_the_largest() {
        let mut monk = CombatantBuilder::new(1, "Monk").build();
        monk.boosts.add(
            "ActionResourceMultiplier(Movement,150)".parse().unwrap(),
            status_source(1, "A"),
        );
        monk.boosts.add(
            "ActionResourceMultiplier(Movement,200)".parse().unwrap(),
            status_source(2, "B"),
        );
        monk.boosts.add("ReduceCriticalAttackThreshold(1)".parse().unwrap(), status_source(3, "C"));
        monk.boosts.add("ReduceCriticalAttackThreshold(2)".parse().unwrap(), status_source(4, "D"));
        let ctx = QueryContext::of(&monk);
        assert_eq!(
            monk.boosts
                .resource_multiplier(crate::budget::ResourceKind::Movement, &ctx),
            200
        );
        assert_eq!(monk.boosts.critical_threshold_reduction(&ctx), 2);
    }

    #[test]
    fn stacking_policy_table() {
        let kind = |s: &str| s.parse::<BoostDefinition>().unwrap().kind.stacking();
        assert_eq!(kind("AC(1)"), StackingPolicy::Sum);
        assert_eq!(kind("Disadvantage(AttackRoll)"), StackingPolicy::Count);
        assert_eq!(kind("Resistance(Cold,Immune)"), StackingPolicy::Collapse);
        assert_eq!(kind("AutoFail(Strength)"), StackingPolicy::Any);
        assert_eq!(kind("ReduceCriticalAttackThreshold(1)"), StackingPolicy::Max);
    }
}
