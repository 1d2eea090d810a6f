use combat_core::action::{DealDamageEffect, EffectKind};
use combat_core::testing::{CatalogBuilder, CombatantBuilder, ScriptedDecider};
use combat_core::{
    ActionCategory, ActionCost, ActionDefinition, ActionEffect, ActionInput, Catalog,
    CombatConfig, CombatEngine, CombatEnv, CombatEvent, CombatState, CombatantId, DamageType,
    DiceFormula, Position, ReactionDefinition, ReactionResponse, ReactionTrigger, Recharge,
    ResourceKind, ResourcePool, TargetSpec,
};

fn dealing(
    id: &str,
    category: ActionCategory,
    amount: i32,
    damage_type: DamageType,
) -> ActionDefinition {
    ActionDefinition::new(id, category).with_effect(ActionEffect::new(EffectKind::DealDamage(
        DealDamageEffect::new(DiceFormula::flat(amount), damage_type),
    )))
}

fn catalog() -> Catalog {
    let swipe = dealing("swipe", ActionCategory::MeleeWeapon, 7, DamageType::Slashing)
        .with_cost(ActionCost::reaction())
        .with_targeting(TargetSpec::melee());
    let fire_bolt = dealing("fire_bolt", ActionCategory::RangedSpell, 6, DamageType::Fire)
        .with_cost(ActionCost::action().with_resource("spell_slot", 1))
        .with_targeting(TargetSpec::ranged(120));
    let strike = dealing("strike", ActionCategory::Ability, 2, DamageType::Slashing)
        .with_targeting(TargetSpec::melee());
    let zap = dealing("zap", ActionCategory::Ability, 1, DamageType::Force)
        .with_cost(ActionCost::reaction())
        .with_targeting(TargetSpec::ranged(60));

    CatalogBuilder::new()
        .action(swipe)
        .action(fire_bolt)
        .action(strike)
        .action(zap)
        .reaction(
            ReactionDefinition::new("opportunity_attack", ReactionTrigger::LeavesReach)
                .with_action("swipe"),
        )
        .reaction(
            ReactionDefinition::new("counterspell", ReactionTrigger::SpellCast)
                .with_response(ReactionResponse::CancelTrigger),
        )
        .reaction(
            ReactionDefinition::new("retaliate", ReactionTrigger::AllyDamaged)
                .with_action("zap")
                .with_range(60),
        )
        .build()
        .unwrap()
}

fn reactions_taken(events: &[CombatEvent]) -> Vec<(CombatantId, ReactionTrigger)> {
    events
        .iter()
        .filter_map(|event| match event {
            CombatEvent::ReactionTriggered {
                reactor, trigger, ..
            } => Some((*reactor, *trigger)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Leaving reach
// ============================================================================

const ROGUE: CombatantId = CombatantId(1);
const ORC: CombatantId = CombatantId(2);

/// A wounded rogue next to an orc, with a cleric out of the way so the fight
/// goes on when the rogue drops.
fn skirmish() -> CombatState {
    let rogue = CombatantBuilder::new(1, "Rogue")
        .hp(10)
        .initiative(20)
        .build();
    let orc = CombatantBuilder::new(2, "Orc")
        .hostile()
        .hp(15)
        .at(Position::new(1, 0))
        .initiative(10)
        .reactions(["opportunity_attack"])
        .build();
    let cleric = CombatantBuilder::new(3, "Cleric")
        .hp(12)
        .at(Position::new(8, 8))
        .initiative(5)
        .build();
    CombatState::with_combatants(17, [rogue, orc, cleric])
}

#[test]
fn stepping_within_reach_draws_no_attack() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = skirmish();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(true);
    engine.start_combat(&mut decider).unwrap();

    let events = engine
        .move_actor(ROGUE, Position::new(1, 1), &mut decider)
        .unwrap();
    assert!(decider.offers().is_empty());
    assert!(events.iter().any(|event| matches!(
        event,
        CombatEvent::Moved { combatant: ROGUE, feet: 5, .. }
    )));
}

#[test]
fn leaving_reach_provokes_an_opportunity_attack() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = skirmish();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(true);
    engine.start_combat(&mut decider).unwrap();

    let events = engine
        .move_actor(ROGUE, Position::new(-3, 0), &mut decider)
        .unwrap();
    // Only the first step leaves the orc's reach.
    assert_eq!(
        reactions_taken(&events),
        vec![(ORC, ReactionTrigger::LeavesReach)]
    );
    assert!(events.iter().any(|event| matches!(
        event,
        CombatEvent::Moved { combatant: ROGUE, feet: 15, .. }
    )));

    let state = engine.state();
    let rogue = state.combatant(ROGUE).unwrap();
    assert_eq!(rogue.position, Position::new(-3, 0));
    assert_eq!(rogue.hp, 3);
    assert_eq!(rogue.budget.movement, 15);
    assert_eq!(state.combatant(ORC).unwrap().available(ResourceKind::Reaction), 0);
}

#[test]
fn mover_downed_mid_walk_stops_with_the_step_paid() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = skirmish();
    state.combatant_mut(ROGUE).unwrap().hp = 4;
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(true);
    engine.start_combat(&mut decider).unwrap();

    let events = engine
        .move_actor(ROGUE, Position::new(-3, 0), &mut decider)
        .unwrap();
    assert!(events
        .iter()
        .any(|event| matches!(event, CombatEvent::Downed { combatant: ROGUE })));
    assert!(!events
        .iter()
        .any(|event| matches!(event, CombatEvent::Moved { .. })));

    let state = engine.state();
    let rogue = state.combatant(ROGUE).unwrap();
    assert!(rogue.is_downed());
    assert_eq!(rogue.position, Position::new(0, 0));
    assert_eq!(rogue.budget.movement, 25);
    // The fallen rogue's turn is over.
    assert_eq!(engine.current(), Some(ORC));
}

// ============================================================================
// Spell interruption
// ============================================================================

const WIZARD: CombatantId = CombatantId(1);
const MAGE: CombatantId = CombatantId(2);

/// A wizard with two spell slots facing a mage ready to counter.
fn duel() -> CombatState {
    let wizard = CombatantBuilder::new(1, "Wizard")
        .hp(20)
        .initiative(20)
        .actions(["fire_bolt"])
        .pool("spell_slot", ResourcePool::full(2, Recharge::LongRest))
        .build();
    let mage = CombatantBuilder::new(2, "Mage")
        .hostile()
        .hp(20)
        .at(Position::new(6, 0))
        .initiative(10)
        .reactions(["counterspell"])
        .build();
    CombatState::with_combatants(29, [wizard, mage])
}

#[test]
fn countered_spell_keeps_its_cost_and_does_nothing() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = duel();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(true);
    engine.start_combat(&mut decider).unwrap();

    let result = engine
        .execute_action(WIZARD, "fire_bolt", &ActionInput::target(MAGE), &mut decider)
        .unwrap();
    assert!(result.cancelled);
    assert_eq!(result.reactions().collect::<Vec<_>>(), vec![(&MAGE, "counterspell")]);
    assert!(result.events.iter().any(|event| matches!(
        event,
        CombatEvent::ActionCancelled { actor: WIZARD, by: MAGE, .. }
    )));
    assert_eq!(result.damage_to(MAGE), 0);
    assert_eq!(result.spent.resources.get("spell_slot"), Some(&1));

    let state = engine.state();
    let wizard = state.combatant(WIZARD).unwrap();
    assert_eq!(wizard.budget.pool("spell_slot").unwrap().current, 1);
    assert_eq!(wizard.available(ResourceKind::Action), 0);
    assert_eq!(state.combatant(MAGE).unwrap().hp, 20);
    assert_eq!(state.combatant(MAGE).unwrap().available(ResourceKind::Reaction), 0);
}

#[test]
fn declined_counter_lets_the_spell_land() {
    let catalog = catalog();
    let config = CombatConfig::default();
    let mut state = duel();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(false);
    engine.start_combat(&mut decider).unwrap();

    let result = engine
        .execute_action(WIZARD, "fire_bolt", &ActionInput::target(MAGE), &mut decider)
        .unwrap();
    assert!(!result.cancelled);
    assert_eq!(decider.offers().len(), 1);
    assert_eq!(result.damage_to(MAGE), 6);
}

// ============================================================================
// Allies answering damage, and the nesting limit
// ============================================================================

const KNIGHT: CombatantId = CombatantId(1);
const SQUIRE: CombatantId = CombatantId(2);
const ORC_A: CombatantId = CombatantId(3);
const ORC_B: CombatantId = CombatantId(4);

/// Two pairs, each member ready to answer when its partner is hurt.
fn melee_line() -> CombatState {
    let knight = CombatantBuilder::new(1, "Knight")
        .hp(30)
        .initiative(20)
        .actions(["strike"])
        .reactions(["retaliate"])
        .build();
    let squire = CombatantBuilder::new(2, "Squire")
        .hp(30)
        .at(Position::new(0, 2))
        .initiative(15)
        .reactions(["retaliate"])
        .build();
    let orc_a = CombatantBuilder::new(3, "Orc")
        .hostile()
        .hp(30)
        .at(Position::new(1, 0))
        .initiative(10)
        .reactions(["retaliate"])
        .build();
    let orc_b = CombatantBuilder::new(4, "Orc")
        .hostile()
        .hp(30)
        .at(Position::new(3, 0))
        .initiative(5)
        .reactions(["retaliate"])
        .build();
    CombatState::with_combatants(31, [knight, squire, orc_a, orc_b])
}

#[test]
fn ally_answers_damage_to_its_partner() {
    let catalog = catalog();
    let config = CombatConfig::default().with_max_reaction_depth(1);
    let mut state = melee_line();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    let mut decider = ScriptedDecider::always(true);
    engine.start_combat(&mut decider).unwrap();

    let result = engine
        .execute_action(KNIGHT, "strike", &ActionInput::target(ORC_A), &mut decider)
        .unwrap();
    assert_eq!(result.damage_to(ORC_A), 2);
    assert_eq!(
        reactions_taken(&result.events),
        vec![(ORC_B, ReactionTrigger::AllyDamaged)]
    );
    assert_eq!(result.damage_to(KNIGHT), 1);
}

#[test]
fn nested_reactions_stop_at_the_depth_limit() {
    let catalog = catalog();
    let mut decider = ScriptedDecider::always(true);

    // Orc B answers the strike, the squire answers Orc B, Orc A answers the
    // squire. The knight would answer next but the chain is three deep.
    let config = CombatConfig::default();
    let mut state = melee_line();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &config));
    engine.start_combat(&mut decider).unwrap();
    let result = engine
        .execute_action(KNIGHT, "strike", &ActionInput::target(ORC_A), &mut decider)
        .unwrap();
    let reactors: Vec<_> = reactions_taken(&result.events)
        .into_iter()
        .map(|(reactor, _)| reactor)
        .collect();
    assert_eq!(reactors, vec![ORC_B, SQUIRE, ORC_A]);
    assert_eq!(
        engine.state().combatant(KNIGHT).unwrap().available(ResourceKind::Reaction),
        1
    );

    let shallow = CombatConfig::default().with_max_reaction_depth(2);
    let mut state = melee_line();
    let mut engine = CombatEngine::new(&mut state, CombatEnv::open(&catalog, &shallow));
    engine.start_combat(&mut decider).unwrap();
    let result = engine
        .execute_action(KNIGHT, "strike", &ActionInput::target(ORC_A), &mut decider)
        .unwrap();
    let reactors: Vec<_> = reactions_taken(&result.events)
        .into_iter()
        .map(|(reactor, _)| reactor)
        .collect();
    assert_eq!(reactors, vec![ORC_B, SQUIRE]);
    assert_eq!(
        engine.state().combatant(ORC_A).unwrap().available(ResourceKind::Reaction),
        1
    );
}
