//! Generate a random 2v2 scenario.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use combat_sim::generate_scenario;

/// Generate a randomized 2v2 scenario as JSON
#[derive(Parser)]
pub struct Generate {
    /// Random seed for deterministic generation
    #[arg(long, value_name = "N")]
    seed: u64,

    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Generate {
    pub fn execute(self) -> Result<()> {
        let scenario = generate_scenario(self.seed);
        let json = serde_json::to_string_pretty(&scenario)?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, format!("{json}\n"))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Generated scenario saved to: {}", path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}
