//! Action inputs and the structured records the pipeline emits.

use crate::budget::ActionCost;
use crate::passive::PassiveWindow;
use crate::reaction::ReactionTrigger;
use crate::rules::{
    AttackResolution, ContestResolution, DamageBreakdown, DeathSaveResolution, SaveResolution,
};
use crate::state::{CombatOutcome, CombatantId, Position, StatusInstanceId};
use crate::stats::DamageType;
use crate::status::{RemovalReason, StatusApplication};

// ============================================================================
// Action Input
// ============================================================================

/// Player/AI selection for an action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionInput {
    #[cfg_attr(feature = "serde", serde(default))]
    pub targets: Vec<CombatantId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub point: Option<Position>,
}

impl ActionInput {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn target(id: CombatantId) -> Self {
        Self {
            targets: vec![id],
            point: None,
        }
    }

    pub fn targets(ids: impl IntoIterator<Item = CombatantId>) -> Self {
        Self {
            targets: ids.into_iter().collect(),
            point: None,
        }
    }

    pub fn at(point: Position) -> Self {
        Self {
            targets: Vec::new(),
            point: Some(point),
        }
    }
}

// ============================================================================
// Applied Value
// ============================================================================

/// What a single effect handler did to its target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AppliedValue {
    Damage { planned: u32, actual: u32 },
    Healing { planned: u32, actual: u32 },
    TemporaryHp { granted: u32 },
    Status { applied: bool },
    StatusRemoved { count: usize },
    Movement { from: Position, to: Position },
    ResourceChange { resource: String, delta: i32 },
    Stabilized,
    Revived { hp: u32 },
    /// The handler had nothing to do (e.g. healing the dead).
    None,
}

// ============================================================================
// Combat Events
// ============================================================================

/// Structured result record emitted at every pipeline step.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatEvent {
    CombatStarted {
        order: Vec<CombatantId>,
    },
    Initiative {
        combatant: CombatantId,
        value: i32,
        rolled: bool,
    },
    RoundStarted {
        round: u32,
    },
    TurnStarted {
        combatant: CombatantId,
        round: u32,
    },
    TurnEnded {
        combatant: CombatantId,
    },
    ActionDeclared {
        actor: CombatantId,
        action: String,
        targets: Vec<CombatantId>,
        spent: ActionCost,
    },
    ActionCancelled {
        actor: CombatantId,
        action: String,
        by: CombatantId,
    },
    AttackRolled {
        attacker: CombatantId,
        target: CombatantId,
        attack: AttackResolution,
    },
    SavingThrow {
        combatant: CombatantId,
        source: Option<CombatantId>,
        save: SaveResolution,
    },
    Contest {
        initiator: CombatantId,
        defender: CombatantId,
        contest: ContestResolution,
    },
    Damage {
        source: Option<CombatantId>,
        target: CombatantId,
        damage_type: DamageType,
        critical: bool,
        breakdown: DamageBreakdown,
        hp_after: u32,
    },
    Healed {
        source: Option<CombatantId>,
        target: CombatantId,
        amount: u32,
        hp_after: u32,
    },
    TemporaryHp {
        target: CombatantId,
        amount: u32,
    },
    StatusApplied {
        target: CombatantId,
        status: String,
        application: StatusApplication,
    },
    StatusRemoved {
        target: CombatantId,
        status: String,
        instance: StatusInstanceId,
        reason: RemovalReason,
    },
    ForcedMove {
        target: CombatantId,
        from: Position,
        to: Position,
    },
    Moved {
        combatant: CombatantId,
        from: Position,
        to: Position,
        feet: u32,
    },
    ResourceChanged {
        combatant: CombatantId,
        resource: String,
        delta: i32,
    },
    Downed {
        combatant: CombatantId,
    },
    Died {
        combatant: CombatantId,
        massive_damage: bool,
    },
    Revived {
        combatant: CombatantId,
        hp: u32,
    },
    Stabilized {
        combatant: CombatantId,
    },
    DeathSave {
        combatant: CombatantId,
        resolution: DeathSaveResolution,
        successes: u8,
        failures: u8,
    },
    ConcentrationStarted {
        caster: CombatantId,
        action: String,
    },
    ConcentrationCheck {
        caster: CombatantId,
        dc: i32,
        maintained: bool,
    },
    ConcentrationEnded {
        caster: CombatantId,
        action: String,
    },
    ReactionTriggered {
        reactor: CombatantId,
        reaction: String,
        trigger: ReactionTrigger,
        source: CombatantId,
    },
    PassiveTriggered {
        owner: CombatantId,
        passive: String,
        window: PassiveWindow,
    },
    CombatEnded {
        outcome: CombatOutcome,
    },
}

// ============================================================================
// Action Result
// ============================================================================

/// Everything that happened while executing one action, reactions included.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionResult {
    pub actor: CombatantId,
    pub action: String,
    pub spent: ActionCost,
    /// A reaction cancelled the action after its cost was paid.
    pub cancelled: bool,
    pub events: Vec<CombatEvent>,
}

impl ActionResult {
    pub fn attacks(&self) -> impl Iterator<Item = &AttackResolution> {
        self.events.iter().filter_map(|event| match event {
            CombatEvent::AttackRolled { attack, .. } => Some(attack),
            _ => None,
        })
    }

    /// HP lost by `target` across the whole result.
    pub fn damage_to(&self, target: CombatantId) -> u32 {
        self.events
            .iter()
            .filter_map(|event| match event {
                CombatEvent::Damage {
                    target: t,
                    breakdown,
                    ..
                } if *t == target => Some(breakdown.hp_loss + breakdown.absorbed_by_temp_hp),
                _ => None,
            })
            .sum()
    }

    pub fn reactions(&self) -> impl Iterator<Item = (&CombatantId, &str)> {
        self.events.iter().filter_map(|event| match event {
            CombatEvent::ReactionTriggered {
                reactor, reaction, ..
            } => Some((reactor, reaction.as_str())),
            _ => None,
        })
    }
}
