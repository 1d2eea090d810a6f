use combat_core::action::{DealDamageEffect, EffectKind};
use combat_core::testing::{CatalogBuilder, CombatantBuilder, ScriptedDecider};
use combat_core::{
    ActionCategory, ActionDefinition, ActionEffect, ActionError, ActionInput, Catalog,
    CombatConfig, CombatEngine, CombatEnv, CombatEvent, CombatOutcome, CombatPhase, CombatState,
    CombatantId, DamageType, DiceFormula, EngineError, Faction, LifeState, Position, Recharge,
    ResourceKind, ResourcePool, TargetSpec,
};

const BRUTE: CombatantId = CombatantId(1);
const HERO: CombatantId = CombatantId(2);
const SQUIRE: CombatantId = CombatantId(3);

fn flat_hit(id: &str, damage: i32) -> ActionDefinition {
    ActionDefinition::new(id, ActionCategory::MeleeWeapon)
        .with_targeting(TargetSpec::melee())
        .with_effect(ActionEffect::new(EffectKind::DealDamage(DealDamageEffect::new(
            DiceFormula::flat(damage),
            DamageType::Bludgeoning,
        ))))
}

fn catalog() -> Catalog {
    CatalogBuilder::new()
        .action(flat_hit("crush", 35))
        .action(flat_hit("maul", 12))
        .action(flat_hit("jab", 2))
        .build()
        .unwrap()
}

/// Brute acts first; the hero stands next to it and a squire waits out of reach.
fn state() -> CombatState {
    let brute = CombatantBuilder::new(1, "Brute")
        .hostile()
        .hp(50)
        .initiative(20)
        .actions(["crush", "maul", "jab"])
        .build();
    let hero = CombatantBuilder::new(2, "Hero")
        .hp(20)
        .at(Position::new(1, 0))
        .initiative(15)
        .actions(["jab"])
        .pool("second_wind", ResourcePool::full(1, Recharge::ShortRest))
        .build();
    let squire = CombatantBuilder::new(3, "Squire")
        .faction(Faction::Ally)
        .hp(12)
        .at(Position::new(8, 0))
        .initiative(5)
        .build();
    CombatState::with_combatants(99, [brute, hero, squire])
}

#[test]
fn start_orders_by_initiative_and_opens_first_turn() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let events = engine.start_combat(&mut ScriptedDecider::always(false)).unwrap();

    assert!(events.contains(&CombatEvent::CombatStarted {
        order: vec![BRUTE, HERO, SQUIRE]
    }));
    assert!(events.contains(&CombatEvent::RoundStarted { round: 1 }));
    assert_eq!(engine.current(), Some(BRUTE));

    let again = engine.start_combat(&mut ScriptedDecider::always(false));
    assert!(matches!(again, Err(EngineError::AlreadyStarted)));
}

#[test]
fn damage_to_zero_downs_a_player() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    state.combatant_mut(HERO).unwrap().hp = 10;
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    // 12 damage against 10 HP left: two points spill over, far below max HP.
    let result = engine
        .execute_action(BRUTE, "maul", &ActionInput::target(HERO), &mut decider)
        .unwrap();
    assert_eq!(result.damage_to(HERO), 10);
    assert!(result.events.contains(&CombatEvent::Downed { combatant: HERO }));

    let hero = engine.state().combatant(HERO).unwrap();
    assert_eq!(hero.hp, 0);
    assert_eq!(hero.life, LifeState::downed());
    assert!(engine.outcome().is_none());
}

#[test]
fn full_hit_of_max_hp_kills_outright() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    // 35 against a 20 HP hero: only 15 spill past zero, but the whole hit counts.
    let result = engine
        .execute_action(BRUTE, "crush", &ActionInput::target(HERO), &mut decider)
        .unwrap();
    assert_eq!(result.damage_to(HERO), 20);
    assert!(result.events.contains(&CombatEvent::Died {
        combatant: HERO,
        massive_damage: true,
    }));
    assert!(!result.events.contains(&CombatEvent::Downed { combatant: HERO }));
    let hero = engine.state().combatant(HERO).unwrap();
    assert_eq!(hero.hp, 0);
    assert!(hero.is_dead());
}

#[test]
fn big_hit_on_a_downed_player_kills_outright() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    {
        let hero = state.combatant_mut(HERO).unwrap();
        hero.hp = 0;
        hero.life = LifeState::downed();
    }
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    let result = engine
        .execute_action(BRUTE, "crush", &ActionInput::target(HERO), &mut decider)
        .unwrap();
    assert!(result.events.contains(&CombatEvent::Died {
        combatant: HERO,
        massive_damage: true,
    }));
}

#[test]
fn massive_damage_can_be_disabled() {
    let catalog = catalog();
    let config = CombatConfig {
        massive_damage: false,
        ..CombatConfig::default()
    };
    let mut state = state();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    engine
        .execute_action(BRUTE, "crush", &ActionInput::target(HERO), &mut decider)
        .unwrap();
    assert!(engine.state().combatant(HERO).unwrap().is_downed());
}

#[test]
fn budget_is_spent_once_per_turn_and_returns_next_turn() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    engine
        .execute_action(BRUTE, "jab", &ActionInput::target(HERO), &mut decider)
        .unwrap();
    let second = engine
        .execute_action(BRUTE, "jab", &ActionInput::target(HERO), &mut decider)
        .unwrap_err();
    assert!(matches!(
        second.as_action(),
        Some(ActionError::InsufficientResource { .. })
    ));

    engine.end_turn(&mut decider).unwrap();
    assert_eq!(engine.current(), Some(HERO));
    engine.end_turn(&mut decider).unwrap();
    assert_eq!(engine.current(), Some(SQUIRE));
    let events = engine.end_turn(&mut decider).unwrap();
    assert!(events.contains(&CombatEvent::RoundStarted { round: 2 }));
    assert_eq!(engine.current(), Some(BRUTE));
    assert_eq!(
        engine
            .state()
            .combatant(BRUTE)
            .unwrap()
            .available(ResourceKind::Action),
        1
    );
}

#[test]
fn acting_out_of_turn_is_refused() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);

    let early = engine
        .execute_action(BRUTE, "jab", &ActionInput::target(HERO), &mut decider)
        .unwrap_err();
    assert!(matches!(early.as_action(), Some(ActionError::CombatNotActive)));

    engine.start_combat(&mut decider).unwrap();
    let err = engine
        .execute_action(HERO, "jab", &ActionInput::target(BRUTE), &mut decider)
        .unwrap_err();
    assert!(matches!(err.as_action(), Some(ActionError::NotActorsTurn(id)) if *id == BRUTE));
}

#[test]
fn refused_action_leaves_state_untouched() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();
    let before = engine.state().clone();

    // The squire stands far outside melee reach.
    assert!(
        engine
            .execute_action(BRUTE, "jab", &ActionInput::target(SQUIRE), &mut decider)
            .is_err()
    );
    assert!(
        engine
            .execute_action(BRUTE, "fireball", &ActionInput::none(), &mut decider)
            .is_err()
    );
    assert_eq!(engine.state(), &before);
    assert!(!engine.can_execute(BRUTE, "jab", &ActionInput::target(SQUIRE)));
    assert!(engine.can_execute(BRUTE, "jab", &ActionInput::target(HERO)));
}

#[test]
fn last_side_standing_wins() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    state.combatants.retain(|c| c.id != SQUIRE);
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    let result = engine
        .execute_action(BRUTE, "crush", &ActionInput::target(HERO), &mut decider)
        .unwrap();
    assert!(result.events.contains(&CombatEvent::CombatEnded {
        outcome: CombatOutcome::Victory(Faction::Hostile)
    }));
    assert_eq!(
        engine.state().turn.phase,
        CombatPhase::Finished(CombatOutcome::Victory(Faction::Hostile))
    );
    assert_eq!(engine.current(), None);
}

#[test]
fn rests_refill_pools_outside_combat_only() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = state();
    {
        let hero = state.combatant_mut(HERO).unwrap();
        hero.budget.adjust_pool("second_wind", -1).unwrap();
        hero.hp = 5;
    }
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));

    engine.short_rest().unwrap();
    let hero = engine.state().combatant(HERO).unwrap();
    assert_eq!(hero.budget.pool("second_wind").map(|p| p.current), Some(1));
    assert_eq!(hero.hp, 5);

    engine.long_rest().unwrap();
    assert_eq!(engine.state().combatant(HERO).unwrap().hp, 20);

    engine.start_combat(&mut ScriptedDecider::always(false)).unwrap();
    assert!(matches!(
        engine.short_rest(),
        Err(EngineError::CombatInProgress)
    ));
}
