//! Headless battle simulation on top of the combat kernel.
//!
//! - [`ai`]: turn policies that score candidates through action previews
//! - [`generator`]: seeded random 2v2 scenarios
//! - [`runner`]: runs a scenario to its outcome
//! - [`record`]: JSON-lines result records

pub mod ai;
pub mod generator;
pub mod record;
pub mod runner;

pub use ai::{Decision, GreedyPolicy, PassPolicy, TurnPolicy};
pub use generator::generate_scenario;
pub use record::{Record, UnitRecord, write_records};
pub use runner::{Battle, simulate};
