//! Drives one battle from start to outcome.

use combat_content::Scenario;
use combat_core::snapshot::state_hash;
use combat_core::{
    Catalog, CombatConfig, CombatEngine, CombatEnv, CombatOutcome, CombatState, CombatantId,
    EngineError, ReactionDecider,
};

use crate::ai::{Decision, TurnPolicy};
use crate::record::{Record, UnitRecord};

/// Steps a policy may take in one turn before the turn is closed for it.
pub const MAX_STEPS_PER_TURN: usize = 12;

/// A finished simulation.
#[derive(Debug)]
pub struct Battle {
    pub records: Vec<Record>,
    pub outcome: Option<CombatOutcome>,
    pub rounds: u32,
    pub state: CombatState,
}

/// Run `state` to termination with `policy` choosing every step.
pub fn simulate(
    scenario: &Scenario,
    mut state: CombatState,
    catalog: &Catalog,
    config: &CombatConfig,
    policy: &mut dyn TurnPolicy,
    decider: &mut dyn ReactionDecider,
) -> anyhow::Result<Battle> {
    let mut records = Vec::new();
    let (outcome, rounds) = {
        let mut engine = CombatEngine::new(&mut state, CombatEnv::open(catalog, config));
        let events = engine.start_combat(decider)?;
        records.push(Record::Started {
            scenario: scenario.id.clone(),
            seed: engine.state().rolls.seed(),
            units: UnitRecord::all(scenario, engine.state()),
            events,
        });

        while engine.outcome().is_none() {
            let Some(actor) = engine.current() else {
                break;
            };
            play_turn(&mut engine, actor, policy, decider, &mut records)?;
            if engine.outcome().is_none() && engine.current() == Some(actor) {
                let round = engine.state().round();
                let events = engine.end_turn(decider)?;
                records.push(Record::TurnEnded {
                    round,
                    actor,
                    events,
                });
            }
        }
        (engine.outcome(), engine.state().round())
    };

    let hash = state_hash(&state)?;
    tracing::info!(scenario = %scenario.id, ?outcome, rounds, "battle finished");
    records.push(Record::Finished {
        outcome,
        rounds,
        state_hash: hex::encode(hash),
        units: UnitRecord::all(scenario, &state),
    });

    Ok(Battle {
        records,
        outcome,
        rounds,
        state,
    })
}

/// Let the policy act until it ends the turn, the turn passes on, or the
/// engine refuses a step.
fn play_turn(
    engine: &mut CombatEngine<'_>,
    actor: CombatantId,
    policy: &mut dyn TurnPolicy,
    decider: &mut dyn ReactionDecider,
    records: &mut Vec<Record>,
) -> anyhow::Result<()> {
    for _ in 0..MAX_STEPS_PER_TURN {
        if engine.outcome().is_some() || engine.current() != Some(actor) {
            return Ok(());
        }
        let round = engine.state().round();
        let decision = policy.decide(engine, actor);
        let (step, outcome) = match decision {
            Decision::EndTurn => return Ok(()),
            Decision::Act { action, input } => {
                let outcome = engine
                    .execute_action(actor, &action, &input, decider)
                    .map(|result| Record::Action { round, result });
                (action, outcome)
            }
            Decision::Move(destination) => {
                let outcome = engine
                    .move_actor(actor, destination, decider)
                    .map(|events| Record::Moved {
                        round,
                        actor,
                        events,
                    });
                (format!("move to {}", destination), outcome)
            }
        };

        match outcome {
            Ok(record) => records.push(record),
            Err(EngineError::Action(error)) => {
                tracing::warn!(actor = %actor, step = %step, %error, "step refused");
                records.push(Record::Refused {
                    round,
                    actor,
                    step,
                    reason: error.to_string(),
                });
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        }
    }
    tracing::debug!(actor = %actor, "step limit reached");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GreedyPolicy, PassPolicy};
    use crate::generator::generate_scenario;
    use combat_content::pack;
    use combat_core::{AlwaysReact, NeverReact};

    fn run(seed: u64) -> Battle {
        let scenario = generate_scenario(seed);
        let catalog = pack::catalog().unwrap();
        let config = pack::config().unwrap();
        let state = scenario.build(&catalog, &pack::resources().unwrap()).unwrap();
        simulate(
            &scenario,
            state,
            &catalog,
            &config,
            &mut GreedyPolicy::default(),
            &mut AlwaysReact,
        )
        .unwrap()
    }

    #[test]
    fn greedy_battles_finish() {
        for seed in [1, 2, 3] {
            let battle = run(seed);
            assert!(battle.outcome.is_some());
            assert!(matches!(battle.records.first(), Some(Record::Started { .. })));
            assert!(matches!(battle.records.last(), Some(Record::Finished { .. })));
            assert!(battle.records.iter().any(|r| matches!(r, Record::Action { .. })));
        }
    }

    #[test]
    fn same_seed_same_battle() {
        let first = run(11);
        let second = run(11);
        assert_eq!(first.records, second.records);
        assert_eq!(first.state, second.state);
    }

    #[test]
    fn passive_sides_draw_at_the_round_cap() {
        let scenario = generate_scenario(5);
        let catalog = pack::catalog().unwrap();
        let config = CombatConfig::default().with_max_rounds(2);
        let state = scenario.build(&catalog, &pack::resources().unwrap()).unwrap();
        let battle = simulate(
            &scenario,
            state,
            &catalog,
            &config,
            &mut PassPolicy,
            &mut NeverReact,
        )
        .unwrap();

        assert_eq!(battle.outcome, Some(CombatOutcome::Draw));
        let turns = battle
            .records
            .iter()
            .filter(|r| matches!(r, Record::TurnEnded { .. }))
            .count();
        assert_eq!(turns, 8);
    }
}
