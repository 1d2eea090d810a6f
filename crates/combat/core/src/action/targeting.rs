//! Target specifications and their resolution against the current state.
//!
//! Shapes:
//! - `SelfOnly`: the actor
//! - `Single`: one explicit combatant within range
//! - `Multiple`: up to `max` distinct explicit combatants within range
//! - `Circle`: everyone matching the filter around a point within range
//! - `Aura`: everyone matching the filter around the actor

use crate::env::SightOracle;
use crate::state::{CombatState, Combatant, CombatantId, Position};

use super::error::ActionError;
use super::types::ActionInput;

// ============================================================================
// Target Specification
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetShape {
    SelfOnly,
    #[default]
    Single,
    Multiple {
        max: u32,
    },
    /// Radius in feet around `ActionInput::point`.
    Circle {
        radius: u32,
    },
    /// Radius in feet around the actor.
    Aura {
        radius: u32,
    },
}

/// Which combatants a target may be, relative to the actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetFilter {
    #[default]
    Any,
    /// Anyone but the actor.
    Others,
    Enemy,
    /// Same side, excluding the actor.
    Ally,
    /// Same side, including the actor.
    AllyOrSelf,
}

impl TargetFilter {
    pub fn accepts(self, actor: &Combatant, target: &Combatant) -> bool {
        let same = actor.id == target.id;
        let same_side = actor.faction.side() == target.faction.side();
        match self {
            TargetFilter::Any => true,
            TargetFilter::Others => !same,
            TargetFilter::Enemy => actor.faction.is_hostile_to(target.faction),
            TargetFilter::Ally => same_side && !same,
            TargetFilter::AllyOrSelf => same_side,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetSpec {
    pub shape: TargetShape,
    pub filter: TargetFilter,
    /// Range in feet from the actor to a target (or to the area's centre).
    pub range: u32,
    pub requires_sight: bool,
    /// Dead combatants may be targeted (revival).
    pub allow_dead: bool,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self::melee()
    }
}

impl TargetSpec {
    pub fn melee() -> Self {
        Self {
            shape: TargetShape::Single,
            filter: TargetFilter::Others,
            range: 5,
            requires_sight: false,
            allow_dead: false,
        }
    }

    pub fn ranged(range: u32) -> Self {
        Self {
            range,
            requires_sight: true,
            ..Self::melee()
        }
    }

    pub fn self_only() -> Self {
        Self {
            shape: TargetShape::SelfOnly,
            filter: TargetFilter::Any,
            range: 0,
            requires_sight: false,
            allow_dead: false,
        }
    }

    pub fn with_shape(mut self, shape: TargetShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_filter(mut self, filter: TargetFilter) -> Self {
        self.filter = filter;
        self
    }
}

// ============================================================================
// Target Resolution
// ============================================================================

/// Resolve the input against the spec. Explicit targets keep input order;
/// area targets follow combatant order. Dead combatants are skipped by areas.
pub fn resolve_targets(
    state: &CombatState,
    sight: &dyn SightOracle,
    actor: &Combatant,
    spec: &TargetSpec,
    input: &ActionInput,
) -> Result<Vec<CombatantId>, ActionError> {
    match spec.shape {
        TargetShape::SelfOnly => Ok(vec![actor.id]),
        TargetShape::Single => {
            let [target] = input.targets.as_slice() else {
                return Err(ActionError::InvalidTarget {
                    reason: "exactly one target required",
                });
            };
            check_explicit(state, sight, actor, spec, *target)?;
            Ok(vec![*target])
        }
        TargetShape::Multiple { max } => {
            if input.targets.is_empty() || input.targets.len() > max as usize {
                return Err(ActionError::InvalidTarget {
                    reason: "target count outside the allowed range",
                });
            }
            let mut seen = Vec::with_capacity(input.targets.len());
            for &target in &input.targets {
                if seen.contains(&target) {
                    return Err(ActionError::InvalidTarget {
                        reason: "duplicate target",
                    });
                }
                check_explicit(state, sight, actor, spec, target)?;
                seen.push(target);
            }
            Ok(seen)
        }
        TargetShape::Circle { radius } => {
            let centre = input.point.ok_or(ActionError::InvalidTarget {
                reason: "area requires a point",
            })?;
            if actor.position.distance_to(centre) > spec.range {
                return Err(ActionError::OutOfRange {
                    distance: actor.position.distance_to(centre),
                    range: spec.range,
                });
            }
            if spec.requires_sight && !sight.has_line_of_sight(actor.position, centre) {
                return Err(ActionError::NoLineOfSight);
            }
            Ok(area(state, sight, actor, spec, centre, radius))
        }
        TargetShape::Aura { radius } => Ok(area(state, sight, actor, spec, actor.position, radius)),
    }
}

fn check_explicit(
    state: &CombatState,
    sight: &dyn SightOracle,
    actor: &Combatant,
    spec: &TargetSpec,
    id: CombatantId,
) -> Result<(), ActionError> {
    let target = state
        .combatant(id)
        .ok_or(ActionError::UnknownCombatant(id))?;
    if target.is_dead() && !spec.allow_dead {
        return Err(ActionError::InvalidTarget {
            reason: "target is dead",
        });
    }
    if !spec.filter.accepts(actor, target) {
        return Err(ActionError::InvalidTarget {
            reason: "target does not match the filter",
        });
    }
    let distance = actor.position.distance_to(target.position);
    if distance > spec.range {
        return Err(ActionError::OutOfRange {
            distance,
            range: spec.range,
        });
    }
    if spec.requires_sight && !sight.has_line_of_sight(actor.position, target.position) {
        return Err(ActionError::NoLineOfSight);
    }
    Ok(())
}

fn area(
    state: &CombatState,
    sight: &dyn SightOracle,
    actor: &Combatant,
    spec: &TargetSpec,
    centre: Position,
    radius: u32,
) -> Vec<CombatantId> {
    state
        .combatants
        .iter()
        .filter(|c| !c.is_dead() || spec.allow_dead)
        .filter(|c| spec.filter.accepts(actor, c))
        .filter(|c| c.position.distance_to(centre) <= radius)
        .filter(|c| !spec.requires_sight || sight.has_line_of_sight(centre, c.position))
        .map(|c| c.id)
        .collect()
}
