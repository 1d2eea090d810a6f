//! Random 2v2 scenario generation.
//!
//! The same seed always yields the same scenario.

use combat_content::{Scenario, ScenarioUnit};
use combat_core::Faction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Every unit knows this action.
pub const BASE_ABILITY: &str = "main_hand_attack";

/// Pool the 1-3 extra abilities are drawn from.
pub const ADDITIONAL_ABILITIES: [&str; 10] = [
    "ranged_attack",
    "offhand_attack",
    "shove",
    "dash",
    "dodge_action",
    "hide",
    "second_wind",
    "bardic_inspiration",
    "cure_wounds",
    "Target_PoisonSpray",
];

const PLAYER_NAMES: [&str; 10] = [
    "Aldric", "Brienne", "Cedric", "Delara", "Eldrin", "Fiona", "Gareth", "Helena", "Isadora",
    "Jareth",
];

const HOSTILE_NAMES: [&str; 10] = [
    "Grimfang",
    "Vex",
    "Kragnar",
    "Shadowblade",
    "Malakar",
    "Dreadmaw",
    "Skorn",
    "Nightshade",
    "Razorclaw",
    "Hexbane",
];

const PLAYER_X: (f64, f64) = (-5.0, -3.0);
const HOSTILE_X: (f64, f64) = (3.0, 5.0);
const Z: (f64, f64) = (-2.0, 2.0);

/// Build a random 2v2 scenario.
pub fn generate_scenario(seed: u64) -> Scenario {
    let mut rng = StdRng::seed_from_u64(seed);

    let players: Vec<&str> = PLAYER_NAMES.choose_multiple(&mut rng, 2).copied().collect();
    let hostiles: Vec<&str> = HOSTILE_NAMES.choose_multiple(&mut rng, 2).copied().collect();

    let mut units = Vec::with_capacity(4);
    for (i, name) in players.into_iter().enumerate() {
        let id = format!("player_{}", i + 1);
        units.push(generate_unit(id, name, Faction::Player, PLAYER_X, &mut rng));
    }
    for (i, name) in hostiles.into_iter().enumerate() {
        let id = format!("hostile_{}", i + 1);
        units.push(generate_unit(id, name, Faction::Hostile, HOSTILE_X, &mut rng));
    }

    tracing::debug!(seed, "scenario generated");
    Scenario {
        id: format!("random_2v2_seed_{}", seed),
        name: format!("Random 2v2 (Seed {})", seed),
        seed,
        units,
    }
}

fn generate_unit(
    id: String,
    name: &str,
    faction: Faction,
    x_range: (f64, f64),
    rng: &mut StdRng,
) -> ScenarioUnit {
    let mut abilities = vec![BASE_ABILITY.to_string()];
    let extra = rng.gen_range(1..=3);
    abilities.extend(
        ADDITIONAL_ABILITIES
            .choose_multiple(rng, extra)
            .map(|ability| ability.to_string()),
    );

    let hp = rng.gen_range(35..=80);
    let initiative = rng.gen_range(8..=18);
    let x = rng.gen_range(x_range.0..=x_range.1);
    let z = rng.gen_range(Z.0..=Z.1);
    let tags = assign_tags(&abilities);

    let mut unit = ScenarioUnit::new(id, name, faction, hp);
    unit.initiative = Some(initiative);
    unit.initiative_tiebreaker = rng.gen_range(1..=100);
    unit.x = round2(x);
    unit.z = round2(z);
    unit.abilities = abilities;
    unit.tags = tags;
    unit
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Role tags derived from a unit's abilities, without duplicates.
pub fn assign_tags(abilities: &[String]) -> Vec<String> {
    let has = |id: &str| abilities.iter().any(|a| a == id);
    let mut tags: Vec<&str> = Vec::new();
    let mut add = |tag: &'static str| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    if has("Target_PoisonSpray") {
        add("melee");
        add("debuffer");
    }
    if has("cure_wounds") {
        add("healer");
        add("support");
    }
    if has("ranged_attack") {
        add("ranged");
    }
    if has("offhand_attack") {
        add("melee");
    }
    if has("bardic_inspiration") {
        add("support");
    }

    tags.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_content::pack;
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_scenario() {
        assert_eq!(generate_scenario(42), generate_scenario(42));
        assert_ne!(generate_scenario(42), generate_scenario(43));
    }

    #[test]
    fn generates_two_units_per_side() {
        let scenario = generate_scenario(7);
        assert_eq!(scenario.id, "random_2v2_seed_7");
        assert_eq!(scenario.seed, 7);

        let ids: Vec<&str> = scenario.units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["player_1", "player_2", "hostile_1", "hostile_2"]);

        for unit in &scenario.units {
            let (low, high) = match unit.faction {
                Faction::Player => PLAYER_X,
                _ => HOSTILE_X,
            };
            assert!((low..=high).contains(&unit.x));
            assert!((Z.0..=Z.1).contains(&unit.z));
            assert!((35..=80).contains(&unit.hp));
            assert_eq!(unit.max_hp, Some(unit.hp));
            assert!(unit.initiative.is_some_and(|i| (8..=18).contains(&i)));
            assert!((1..=100).contains(&unit.initiative_tiebreaker));

            assert_eq!(unit.abilities[0], BASE_ABILITY);
            assert!((2..=4).contains(&unit.abilities.len()));
            let unique: BTreeSet<&String> = unit.abilities.iter().collect();
            assert_eq!(unique.len(), unit.abilities.len());
        }
    }

    #[test]
    fn generated_scenarios_build_against_the_pack() {
        let catalog = pack::catalog().unwrap();
        let resources = pack::resources().unwrap();
        for ability in ADDITIONAL_ABILITIES.iter().chain([&BASE_ABILITY]) {
            assert!(catalog.action(ability).is_some(), "{ability} missing");
        }
        for seed in 0..20 {
            let state = generate_scenario(seed).build(&catalog, &resources).unwrap();
            assert_eq!(state.combatants.len(), 4);
        }
    }

    #[test]
    fn tags_follow_abilities() {
        fn abilities(ids: &[&str]) -> Vec<String> {
            ids.iter().map(|s| s.to_string()).collect()
        }
        assert_eq!(
            assign_tags(&abilities(&["Target_PoisonSpray", "offhand_attack", "cure_wounds"])),
            ["melee", "debuffer", "healer", "support"]
        );
        assert_eq!(
            assign_tags(&abilities(&["ranged_attack", "bardic_inspiration"])),
            ["ranged", "support"]
        );
        assert!(assign_tags(&abilities(&["main_hand_attack", "dash"])).is_empty());
    }
}
