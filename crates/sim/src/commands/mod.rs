//! Command implementations for combat-sim
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod generate;
mod run;

pub use generate::Generate;
pub use run::Run;
