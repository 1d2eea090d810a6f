//! Advantage and disadvantage bookkeeping.

/// Net advantage state of a single d20 roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdvantageState {
    #[default]
    Straight,
    Advantage,
    Disadvantage,
}

/// Counted advantage and disadvantage sources for one roll.
///
/// Sources are counted rather than OR-ed: two advantage sources against one
/// disadvantage source still leave advantage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvantageSources {
    pub advantage: u32,
    pub disadvantage: u32,
}

impl AdvantageSources {
    pub const NONE: Self = Self {
        advantage: 0,
        disadvantage: 0,
    };

    pub const fn new(advantage: u32, disadvantage: u32) -> Self {
        Self {
            advantage,
            disadvantage,
        }
    }

    pub fn add_advantage(&mut self, count: u32) {
        self.advantage += count;
    }

    pub fn add_disadvantage(&mut self, count: u32) {
        self.disadvantage += count;
    }

    pub fn merge(self, other: AdvantageSources) -> Self {
        Self {
            advantage: self.advantage + other.advantage,
            disadvantage: self.disadvantage + other.disadvantage,
        }
    }

    pub fn net(self) -> AdvantageState {
        use std::cmp::Ordering::*;
        match self.advantage.cmp(&self.disadvantage) {
            Equal => AdvantageState::Straight,
            Greater => AdvantageState::Advantage,
            Less => AdvantageState::Disadvantage,
        }
    }
}
