use std::fs;
use std::io::BufWriter;

use combat_content::{ScenarioLoader, pack};
use combat_core::NeverReact;
use combat_sim::{GreedyPolicy, Record, generate_scenario, simulate, write_records};
use tempfile::TempDir;

#[test]
fn generated_file_round_trips_through_the_loader() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("random.json");
    let scenario = generate_scenario(99);
    fs::write(&path, serde_json::to_string_pretty(&scenario).unwrap()).unwrap();

    let loaded = ScenarioLoader::load(&path).unwrap();
    assert_eq!(loaded, scenario);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"maxHp\""));
    assert!(text.contains("\"initiativeTiebreaker\""));
    assert!(!text.contains("\"abilityScores\""));
}

#[test]
fn battle_records_stream_to_a_file() {
    let dir = TempDir::new().unwrap();
    let scenario = generate_scenario(3);
    let catalog = pack::catalog().unwrap();
    let config = pack::config().unwrap();
    let state = scenario.build(&catalog, &pack::resources().unwrap()).unwrap();
    let battle = simulate(
        &scenario,
        state,
        &catalog,
        &config,
        &mut GreedyPolicy::default(),
        &mut NeverReact,
    )
    .unwrap();

    let path = dir.path().join("battle.jsonl");
    let file = fs::File::create(&path).unwrap();
    write_records(&mut BufWriter::new(file), &battle.records).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let parsed: Vec<Record> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed, battle.records);

    let Some(Record::Finished { state_hash, units, .. }) = parsed.last() else {
        panic!("last record is not the result");
    };
    assert_eq!(state_hash.len(), 64);
    assert_eq!(units.len(), 4);
    assert_eq!(units[0].unit, "player_1");
}
