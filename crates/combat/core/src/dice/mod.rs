//! Dice & modifier resolver.
//!
//! Pure functions over explicit inputs: a [`RollStream`] supplies every random
//! value, so identical seed, roll index and inputs reproduce identical output.

mod advantage;
mod formula;
mod rng;
mod roll;

pub use advantage::{AdvantageSources, AdvantageState};
pub use formula::{DiceFormula, FormulaError, FormulaPart, FormulaRoll, FormulaSource, FormulaTerm};
pub use rng::{PcgRng, RngOracle, RollStream, compute_seed};
pub use roll::{RollModifier, RollResult, chance_face_at_least, chance_total_at_least, roll_d20};
