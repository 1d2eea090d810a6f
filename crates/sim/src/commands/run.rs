//! Run a scenario to its outcome and print the result records.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use combat_content::{ContentFactory, ScenarioLoader, pack};
use combat_core::{AlwaysReact, NeverReact, ReactionDecider};

use combat_sim::{GreedyPolicy, simulate, write_records};

/// Run a battle scenario with the greedy AI on every side
#[derive(Parser)]
pub struct Run {
    /// Scenario JSON file
    #[arg(short, long, value_name = "FILE")]
    scenario: PathBuf,

    /// Override the scenario's seed
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Content directory (defaults to the bundled content pack)
    #[arg(short, long, value_name = "DIR")]
    data: Option<PathBuf>,

    /// Write records to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Decline every reaction offer
    #[arg(long)]
    no_reactions: bool,
}

impl Run {
    pub fn execute(self) -> Result<()> {
        let mut scenario = ScenarioLoader::load(&self.scenario)?;
        if let Some(seed) = self.seed {
            scenario.seed = seed;
        }

        let (catalog, config, resources) = match &self.data {
            Some(dir) => {
                let factory = ContentFactory::new(dir);
                (
                    factory.load_catalog()?,
                    factory.load_config()?,
                    factory.load_resources()?,
                )
            }
            None => (pack::catalog()?, pack::config()?, pack::resources()?),
        };
        let state = scenario.build(&catalog, &resources)?;

        let mut decider: Box<dyn ReactionDecider> = if self.no_reactions {
            Box::new(NeverReact)
        } else {
            Box::new(AlwaysReact)
        };
        let battle = simulate(
            &scenario,
            state,
            &catalog,
            &config,
            &mut GreedyPolicy::default(),
            decider.as_mut(),
        )?;

        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                write_records(&mut BufWriter::new(file), &battle.records)?;
                eprintln!("Results saved to: {}", path.display());
            }
            None => write_records(&mut io::stdout().lock(), &battle.records)?,
        }
        Ok(())
    }
}
