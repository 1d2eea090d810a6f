//! Action budget: the per-combatant resource ledger.
//!
//! Action, bonus action and movement reset every turn. The reaction resets
//! every round. Named pools (spell slots, per-rest charges) only recharge on
//! rests.
//!
//! Every spend is validated in full before any counter changes, so a refused
//! spend leaves the budget untouched.

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::error::{CombatError, ErrorSeverity};

/// Per-turn economy counters that boosts and statuses can block or scale.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    Action,
    BonusAction,
    Reaction,
    Movement,
}

impl ResourceKind {
    pub const fn flag(self) -> ResourceSet {
        match self {
            ResourceKind::Action => ResourceSet::ACTION,
            ResourceKind::BonusAction => ResourceSet::BONUS_ACTION,
            ResourceKind::Reaction => ResourceSet::REACTION,
            ResourceKind::Movement => ResourceSet::MOVEMENT,
        }
    }
}

bitflags! {
    /// Set of blocked economy counters.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ResourceSet: u8 {
        const ACTION = 1 << 0;
        const BONUS_ACTION = 1 << 1;
        const REACTION = 1 << 2;
        const MOVEMENT = 1 << 3;
    }
}

impl ResourceSet {
    pub fn has(self, kind: ResourceKind) -> bool {
        self.contains(kind.flag())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Recharge {
    ShortRest,
    LongRest,
    Never,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RestKind {
    Short,
    Long,
}

/// A named numeric resource with a maximum.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcePool {
    pub current: u32,
    pub max: u32,
    pub recharge: Recharge,
}

impl ResourcePool {
    pub fn full(max: u32, recharge: Recharge) -> Self {
        Self {
            current: max,
            max,
            recharge,
        }
    }

    fn rest(&mut self, kind: RestKind) {
        let restores = match (self.recharge, kind) {
            (Recharge::Never, _) => false,
            (Recharge::ShortRest, _) => true,
            (Recharge::LongRest, RestKind::Long) => true,
            (Recharge::LongRest, RestKind::Short) => false,
        };
        if restores {
            self.current = self.max;
        }
    }
}

/// Resource requirements of an action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActionCost {
    pub action: u32,
    pub bonus_action: u32,
    pub reaction: u32,
    /// Feet of movement.
    pub movement: u32,
    /// Named pool amounts, e.g. `spell_slot_1: 1`.
    pub resources: BTreeMap<String, u32>,
}

impl ActionCost {
    pub fn action() -> Self {
        Self {
            action: 1,
            ..Self::default()
        }
    }

    pub fn bonus_action() -> Self {
        Self {
            bonus_action: 1,
            ..Self::default()
        }
    }

    pub fn reaction() -> Self {
        Self {
            reaction: 1,
            ..Self::default()
        }
    }

    pub fn free() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, name: impl Into<String>, amount: u32) -> Self {
        self.resources.insert(name.into(), amount);
        self
    }

    /// Same cost with the action requirement lifted (paid by an attack charge).
    pub fn without_action(&self) -> Self {
        Self {
            action: 0,
            ..self.clone()
        }
    }

    pub fn is_free(&self) -> bool {
        self.action == 0
            && self.bonus_action == 0
            && self.reaction == 0
            && self.movement == 0
            && self.resources.values().all(|amount| *amount == 0)
    }

    fn counters(&self) -> [(ResourceKind, u32); 4] {
        [
            (ResourceKind::Action, self.action),
            (ResourceKind::BonusAction, self.bonus_action),
            (ResourceKind::Reaction, self.reaction),
            (ResourceKind::Movement, self.movement),
        ]
    }
}

/// Maximum counters granted at the start of a turn (or round for reactions).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnAllowance {
    pub action: u32,
    pub bonus_action: u32,
    pub reaction: u32,
    pub movement: u32,
}

impl Default for TurnAllowance {
    fn default() -> Self {
        Self {
            action: 1,
            bonus_action: 1,
            reaction: 1,
            movement: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BudgetError {
    #[error("insufficient {resource}: requires {required}, has {available}")]
    InsufficientResource {
        resource: String,
        required: u32,
        available: u32,
    },

    #[error("{resource} is blocked")]
    Blocked { resource: ResourceKind },

    #[error("unknown resource pool '{name}'")]
    UnknownResource { name: String },
}

impl CombatError for BudgetError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InsufficientResource { .. } | Self::Blocked { .. } => ErrorSeverity::Recoverable,
            Self::UnknownResource { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientResource { .. } => "BUDGET_INSUFFICIENT",
            Self::Blocked { .. } => "BUDGET_BLOCKED",
            Self::UnknownResource { .. } => "BUDGET_UNKNOWN_RESOURCE",
        }
    }
}

/// Per-combatant resource ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionBudget {
    pub action: u32,
    pub bonus_action: u32,
    pub reaction: u32,
    /// Feet of movement left this turn.
    pub movement: u32,
    /// Extra-attack charges left from the current Attack action.
    pub attack_charges: u32,
    pub resources: BTreeMap<String, ResourcePool>,
}

impl ActionBudget {
    pub fn new(allowance: TurnAllowance) -> Self {
        Self {
            action: allowance.action,
            bonus_action: allowance.bonus_action,
            reaction: allowance.reaction,
            movement: allowance.movement,
            attack_charges: 0,
            resources: BTreeMap::new(),
        }
    }

    pub fn with_pool(mut self, name: impl Into<String>, pool: ResourcePool) -> Self {
        self.resources.insert(name.into(), pool);
        self
    }

    fn counter(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Action => self.action,
            ResourceKind::BonusAction => self.bonus_action,
            ResourceKind::Reaction => self.reaction,
            ResourceKind::Movement => self.movement,
        }
    }

    fn counter_mut(&mut self, kind: ResourceKind) -> &mut u32 {
        match kind {
            ResourceKind::Action => &mut self.action,
            ResourceKind::BonusAction => &mut self.bonus_action,
            ResourceKind::Reaction => &mut self.reaction,
            ResourceKind::Movement => &mut self.movement,
        }
    }

    /// Amount available to spend. Blocked counters report zero.
    pub fn available(&self, kind: ResourceKind, blocked: ResourceSet) -> u32 {
        if blocked.has(kind) {
            0
        } else {
            self.counter(kind)
        }
    }

    pub fn pool(&self, name: &str) -> Option<&ResourcePool> {
        self.resources.get(name)
    }

    /// Validate a cost without mutating anything.
    pub fn check(&self, cost: &ActionCost, blocked: ResourceSet) -> Result<(), BudgetError> {
        for (kind, required) in cost.counters() {
            if required == 0 {
                continue;
            }
            if blocked.has(kind) {
                return Err(BudgetError::Blocked { resource: kind });
            }
            let available = self.counter(kind);
            if available < required {
                return Err(BudgetError::InsufficientResource {
                    resource: kind.to_string(),
                    required,
                    available,
                });
            }
        }
        for (name, &required) in &cost.resources {
            if required == 0 {
                continue;
            }
            let pool = self
                .resources
                .get(name)
                .ok_or_else(|| BudgetError::UnknownResource { name: name.clone() })?;
            if pool.current < required {
                return Err(BudgetError::InsufficientResource {
                    resource: name.clone(),
                    required,
                    available: pool.current,
                });
            }
        }
        Ok(())
    }

    pub fn can_afford(&self, cost: &ActionCost, blocked: ResourceSet) -> bool {
        self.check(cost, blocked).is_ok()
    }

    /// Spend a cost. Validates first; on error nothing changes.
    pub fn spend(&mut self, cost: &ActionCost, blocked: ResourceSet) -> Result<(), BudgetError> {
        self.check(cost, blocked)?;
        for (kind, amount) in cost.counters() {
            *self.counter_mut(kind) -= amount;
        }
        for (name, amount) in &cost.resources {
            if let Some(pool) = self.resources.get_mut(name) {
                pool.current -= amount;
            }
        }
        Ok(())
    }

    /// Whether a weapon attack with this cost would be paid by an attack
    /// charge instead of an Action.
    pub fn covers_with_charge(&self, cost: &ActionCost, weapon_attack: bool) -> bool {
        weapon_attack && cost.action > 0 && self.attack_charges > 0
    }

    /// Spend the cost of an action use, drawing on extra-attack charges for
    /// weapon attacks. Spending an Action on a weapon attack grants
    /// `extra_attacks` charges. Returns the cost actually paid.
    pub fn spend_for_action(
        &mut self,
        cost: &ActionCost,
        weapon_attack: bool,
        extra_attacks: u32,
        blocked: ResourceSet,
    ) -> Result<ActionCost, BudgetError> {
        if self.covers_with_charge(cost, weapon_attack) {
            let paid = cost.without_action();
            self.spend(&paid, blocked)?;
            self.attack_charges -= 1;
            return Ok(paid);
        }
        self.spend(cost, blocked)?;
        if weapon_attack && cost.action > 0 {
            self.attack_charges = extra_attacks;
        }
        Ok(cost.clone())
    }

    /// Spend movement in feet.
    pub fn spend_movement(&mut self, feet: u32, blocked: ResourceSet) -> Result<(), BudgetError> {
        self.spend(
            &ActionCost {
                movement: feet,
                ..ActionCost::default()
            },
            blocked,
        )
    }

    /// Add to an economy counter (Action Surge, Dash).
    pub fn grant(&mut self, kind: ResourceKind, amount: u32) {
        let counter = self.counter_mut(kind);
        *counter = counter.saturating_add(amount);
    }

    /// Take up to `amount` from an economy counter. Returns what was taken.
    pub fn drain(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let counter = self.counter_mut(kind);
        let taken = amount.min(*counter);
        *counter -= taken;
        taken
    }

    /// Change a named pool by `delta`, clamped to `[0, max]`. Returns the
    /// applied change.
    pub fn adjust_pool(&mut self, name: &str, delta: i32) -> Result<i32, BudgetError> {
        let pool = self
            .resources
            .get_mut(name)
            .ok_or_else(|| BudgetError::UnknownResource {
                name: name.to_string(),
            })?;
        let before = pool.current as i64;
        let after = (before + delta as i64).clamp(0, pool.max as i64);
        pool.current = after as u32;
        Ok((after - before) as i32)
    }

    /// Start of the owner's turn: action, bonus action and movement return.
    /// The reaction does not.
    pub fn reset_for_turn(&mut self, allowance: TurnAllowance) {
        self.action = allowance.action;
        self.bonus_action = allowance.bonus_action;
        self.movement = allowance.movement;
        self.attack_charges = 0;
    }

    /// Start of a new round: the reaction returns.
    pub fn reset_for_round(&mut self, allowance: TurnAllowance) {
        self.reaction = allowance.reaction;
    }

    pub fn rest(&mut self, kind: RestKind) {
        for pool in self.resources.values_mut() {
            pool.rest(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> ActionBudget {
        ActionBudget::new(TurnAllowance::default())
            .with_pool("spell_slot_1", ResourcePool::full(2, Recharge::LongRest))
            .with_pool("second_wind", ResourcePool::full(1, Recharge::ShortRest))
    }

    #[test]
    fn spend_never_goes_negative() {
        let mut budget = budget();
        budget.spend(&ActionCost::action(), ResourceSet::empty()).unwrap();
        let err = budget
            .spend(&ActionCost::action(), ResourceSet::empty())
            .unwrap_err();
        assert!(matches!(
            err,
            BudgetError::InsufficientResource {
                required: 1,
                available: 0,
                ..
            }
        ));
        assert_eq!(budget.action, 0);
    }

    #[test]
    fn refused_spend_changes_nothing() {
        let mut budget = budget();
        let cost = ActionCost::action().with_resource("spell_slot_1", 3);
        let before = budget.clone();
        assert!(budget.spend(&cost, ResourceSet::empty()).is_err());
        assert_eq!(budget, before);
    }

    #[test]
    fn turn_reset_skips_reaction() {
        let mut budget = budget();
        let all = ActionCost {
            action: 1,
            bonus_action: 1,
            reaction: 1,
            movement: 30,
            ..ActionCost::default()
        };
        budget.spend(&all, ResourceSet::empty()).unwrap();

        budget.reset_for_turn(TurnAllowance::default());
        assert_eq!(
            (budget.action, budget.bonus_action, budget.movement),
            (1, 1, 30)
        );
        assert_eq!(budget.reaction, 0);

        budget.reset_for_round(TurnAllowance::default());
        assert_eq!(budget.reaction, 1);
    }

    #[test]
    fn blocked_resource_reports_zero() {
        let mut budget = budget();
        let blocked = ResourceSet::MOVEMENT;
        assert_eq!(budget.available(ResourceKind::Movement, blocked), 0);
        assert_eq!(budget.available(ResourceKind::Movement, ResourceSet::empty()), 30);
        assert_eq!(
            budget.spend_movement(5, blocked),
            Err(BudgetError::Blocked {
                resource: ResourceKind::Movement
            })
        );
        assert_eq!(budget.movement, 30);
    }

    #[test]
    fn extra_attack_charges_are_per_attack() {
        let mut budget = budget();
        let attack = ActionCost::action();

        let paid = budget
            .spend_for_action(&attack, true, 1, ResourceSet::empty())
            .unwrap();
        assert_eq!(paid.action, 1);
        assert_eq!(budget.attack_charges, 1);

        let paid = budget
            .spend_for_action(&attack, true, 1, ResourceSet::empty())
            .unwrap();
        assert_eq!(paid.action, 0);
        assert_eq!(budget.attack_charges, 0);
        assert_eq!(budget.action, 0);

        assert!(
            budget
                .spend_for_action(&attack, true, 1, ResourceSet::empty())
                .is_err()
        );
    }

    #[test]
    fn rests_recharge_by_kind() {
        let mut budget = budget();
        let cost = ActionCost::free()
            .with_resource("spell_slot_1", 2)
            .with_resource("second_wind", 1);
        budget.spend(&cost, ResourceSet::empty()).unwrap();

        budget.rest(RestKind::Short);
        assert_eq!(budget.pool("second_wind").unwrap().current, 1);
        assert_eq!(budget.pool("spell_slot_1").unwrap().current, 0);

        budget.rest(RestKind::Long);
        assert_eq!(budget.pool("spell_slot_1").unwrap().current, 2);
    }

    #[test]
    fn pool_adjustment_is_clamped() {
        let mut budget = budget();
        assert_eq!(budget.adjust_pool("spell_slot_1", 5).unwrap(), 0);
        assert_eq!(budget.adjust_pool("spell_slot_1", -5).unwrap(), -2);
        assert!(budget.adjust_pool("ki", 1).is_err());
    }
}
