use std::collections::BTreeSet;

use crate::state::Position;

/// Line-of-sight oracle over the battlefield grid.
pub trait SightOracle: Send + Sync {
    fn has_line_of_sight(&self, from: Position, to: Position) -> bool;

    /// Whether a combatant may stand on the tile.
    fn is_passable(&self, _position: Position) -> bool {
        true
    }
}

/// Open ground: everything is visible and walkable.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenField;

impl SightOracle for OpenField {
    fn has_line_of_sight(&self, _from: Position, _to: Position) -> bool {
        true
    }
}

/// Grid with opaque, impassable tiles. Sight is traced with Bresenham's
/// line; the endpoints themselves never block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockedTiles {
    blocked: BTreeSet<Position>,
}

impl BlockedTiles {
    pub fn new(blocked: impl IntoIterator<Item = Position>) -> Self {
        Self {
            blocked: blocked.into_iter().collect(),
        }
    }

    pub fn is_blocked(&self, position: Position) -> bool {
        self.blocked.contains(&position)
    }
}

impl SightOracle for BlockedTiles {
    fn has_line_of_sight(&self, from: Position, to: Position) -> bool {
        line(from, to)
            .into_iter()
            .filter(|p| *p != from && *p != to)
            .all(|p| !self.is_blocked(p))
    }

    fn is_passable(&self, position: Position) -> bool {
        !self.is_blocked(position)
    }
}

fn line(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);
    let mut points = Vec::new();
    loop {
        points.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_blocks_sight() {
        let grid = BlockedTiles::new([Position::new(2, 0)]);
        assert!(!grid.has_line_of_sight(Position::new(0, 0), Position::new(4, 0)));
        assert!(grid.has_line_of_sight(Position::new(0, 0), Position::new(0, 4)));
        assert!(!grid.is_passable(Position::new(2, 0)));
    }

    #[test]
    fn line_includes_both_endpoints() {
        let points = line(Position::new(0, 0), Position::new(3, 1));
        assert_eq!(points.first(), Some(&Position::new(0, 0)));
        assert_eq!(points.last(), Some(&Position::new(3, 1)));
    }
}
