use combat_core::action::{ApplyStatusEffect, DealDamageEffect, EffectKind};
use combat_core::status::RemovalReason;
use combat_core::testing::{CatalogBuilder, CombatantBuilder, ScriptedDecider};
use combat_core::{
    Ability, ActionCategory, ActionDefinition, ActionEffect, ActionInput, ActionRoll,
    AdvantageState, AttackAbility, BoostSource, Catalog, CombatConfig, CombatEngine, CombatEnv,
    CombatEvent, CombatState, CombatantId, DamageType, DiceFormula, Position, RollStream, SaveDc,
    StatusDefinition, TargetSpec,
};

const CLERIC: CombatantId = CombatantId(1);
const BANDIT: CombatantId = CombatantId(2);

fn catalog() -> Catalog {
    let hold = ActionDefinition::new("hold", ActionCategory::Spell)
        .with_targeting(TargetSpec::ranged(60))
        .with_roll(ActionRoll::Save {
            ability: Ability::Wisdom,
            dc: SaveDc::Fixed(15),
        })
        .with_effect(ActionEffect::new(EffectKind::ApplyStatus(ApplyStatusEffect::new(
            "HELD",
            Some(10),
        ))))
        .concentration();
    let maul = ActionDefinition::new("maul", ActionCategory::MeleeWeapon)
        .with_targeting(TargetSpec::melee())
        .with_effect(ActionEffect::new(EffectKind::DealDamage(DealDamageEffect::new(
            DiceFormula::flat(24),
            DamageType::Bludgeoning,
        ))));
    let stab = ActionDefinition::new("stab", ActionCategory::MeleeWeapon)
        .with_targeting(TargetSpec::melee())
        .with_roll(ActionRoll::Attack {
            ability: AttackAbility::Fixed(Ability::Strength),
            proficient: true,
            bonus: 0,
        });

    CatalogBuilder::new()
        .action(hold)
        .action(maul)
        .action(stab)
        .status(StatusDefinition::new("HELD"))
        .build()
        .unwrap()
}

fn state(forced: impl IntoIterator<Item = u32>) -> CombatState {
    let cleric = CombatantBuilder::new(1, "Cleric")
        .hp(40)
        .initiative(20)
        .actions(["hold", "stab"])
        .build();
    let bandit = CombatantBuilder::new(2, "Bandit")
        .hostile()
        .hp(30)
        .at(Position::new(1, 0))
        .initiative(10)
        .actions(["maul"])
        .build();
    let mut state = CombatState::with_combatants(17, [cleric, bandit]);
    state.rolls = RollStream::new(17).with_forced(forced);
    state
}

#[test]
fn failed_concentration_save_removes_linked_statuses() {
    let catalog = catalog();
    let config = CombatConfig::default();
    // Bandit's WIS save, then the cleric's CON save.
    let mut state = state([2, 3]);
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    let cast = engine
        .execute_action(CLERIC, "hold", &ActionInput::target(BANDIT), &mut decider)
        .unwrap();
    assert!(
        cast.events
            .iter()
            .any(|e| matches!(e, CombatEvent::StatusApplied { target, status, .. } if *target == BANDIT && status == "HELD"))
    );
    let cleric = engine.state().combatant(CLERIC).unwrap();
    let links = &cleric.concentration.as_ref().unwrap().links;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target, BANDIT);

    engine.end_turn(&mut decider).unwrap();
    let hit = engine
        .execute_action(BANDIT, "maul", &ActionInput::target(CLERIC), &mut decider)
        .unwrap();

    assert!(hit.events.contains(&CombatEvent::ConcentrationCheck {
        caster: CLERIC,
        dc: 12,
        maintained: false,
    }));
    assert!(hit.events.iter().any(|e| matches!(
        e,
        CombatEvent::StatusRemoved {
            target,
            reason: RemovalReason::ConcentrationEnded,
            ..
        } if *target == BANDIT
    )));
    assert!(!engine.state().combatant(BANDIT).unwrap().has_status("HELD"));
    assert!(engine.state().combatant(CLERIC).unwrap().concentration.is_none());
}

#[test]
fn successful_concentration_save_keeps_the_spell() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state([2, 19]);
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    engine
        .execute_action(CLERIC, "hold", &ActionInput::target(BANDIT), &mut decider)
        .unwrap();
    engine.end_turn(&mut decider).unwrap();
    let hit = engine
        .execute_action(BANDIT, "maul", &ActionInput::target(CLERIC), &mut decider)
        .unwrap();

    assert!(hit.events.contains(&CombatEvent::ConcentrationCheck {
        caster: CLERIC,
        dc: 12,
        maintained: true,
    }));
    assert!(engine.state().combatant(BANDIT).unwrap().has_status("HELD"));
}

#[test]
fn saved_spell_holds_nothing() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state([20]);
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    let cast = engine
        .execute_action(CLERIC, "hold", &ActionInput::target(BANDIT), &mut decider)
        .unwrap();
    assert!(cast.events.iter().any(|e| matches!(e, CombatEvent::ConcentrationEnded { .. })));
    assert!(engine.state().combatant(CLERIC).unwrap().concentration.is_none());
}

#[test]
fn two_advantage_sources_outweigh_one_disadvantage() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state([]);
    {
        let cleric = state.combatant_mut(CLERIC).unwrap();
        for id in ["blessed", "flanking"] {
            cleric.add_boost(
                "Advantage(AttackRoll)".parse().unwrap(),
                BoostSource::Passive { id: id.into() },
            );
        }
        let bandit = state.combatant_mut(BANDIT).unwrap();
        bandit.add_boost(
            "Disadvantage(AttackTarget)".parse().unwrap(),
            BoostSource::Passive { id: "blur".into() },
        );
    }
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    let result = engine
        .execute_action(CLERIC, "stab", &ActionInput::target(BANDIT), &mut decider)
        .unwrap();
    let attack = result.attacks().next().unwrap();
    assert_eq!(attack.roll.advantage, AdvantageState::Advantage);
    assert_eq!(attack.roll.values.len(), 2);
}
