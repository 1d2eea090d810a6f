use std::fmt;

use crate::config::CombatConfig;

/// Unique identifier for a combatant tracked in the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a runtime status instance, allocated monotonically per combat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusInstanceId(pub u64);

impl fmt::Display for StatusInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status#{}", self.0)
    }
}

/// Discrete grid position expressed in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance in tiles (diagonals cost the same as orthogonals).
    pub fn tiles_to(self, other: Position) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    /// Distance in feet.
    pub fn distance_to(self, other: Position) -> u32 {
        self.tiles_to(other) * CombatConfig::FEET_PER_TILE
    }

    /// One tile step from `self` towards `other` (or away when `away` is set).
    pub fn step_relative_to(self, other: Position, away: bool) -> Position {
        let sign = if away { -1 } else { 1 };
        let dx = (other.x - self.x).signum() * sign;
        let dy = (other.y - self.y).signum() * sign;
        if dx == 0 && dy == 0 && away {
            return Position::new(self.x + 1, self.y);
        }
        Position::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Allegiance of a combatant. Combat ends when one faction remains standing.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Faction {
    Player,
    Ally,
    Neutral,
    Hostile,
}

impl Faction {
    /// Player and Ally fight on the same side; Neutral is hostile to no one.
    pub fn is_hostile_to(self, other: Faction) -> bool {
        use Faction::*;
        match (self, other) {
            (Neutral, _) | (_, Neutral) => false,
            (Hostile, Hostile) => false,
            (Hostile, _) | (_, Hostile) => true,
            _ => false,
        }
    }

    /// Side used to decide combat termination.
    pub fn side(self) -> Faction {
        match self {
            Faction::Ally => Faction::Player,
            other => other,
        }
    }
}
