//! Always-on features: permanent boosts plus effects fired at fixed windows.

use crate::action::{ActionError, ActionEffect, CombatEvent, Pipeline};
use crate::boost::{BoostDefinition, BoostSource, Predicate, QueryContext};
use crate::env::Catalog;
use crate::state::{Combatant, CombatantId};

/// Points in the flow where passive triggers are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PassiveWindow {
    /// The owner landed an attack.
    OnHit,
    /// The owner landed a critical hit. Fires after `OnHit`.
    OnCriticalHit,
    /// The owner took damage; the counterpart is the damage source.
    OnDamageTaken,
    TurnStart,
    TurnEnd,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassiveTrigger {
    pub window: PassiveWindow,
    #[cfg_attr(feature = "serde", serde(default))]
    pub condition: Option<Predicate>,
    /// Run with the owner as caster and the counterpart (or the owner) as target.
    pub effects: Vec<ActionEffect>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub once_per_turn: bool,
}

impl PassiveTrigger {
    pub fn new(window: PassiveWindow, effects: impl IntoIterator<Item = ActionEffect>) -> Self {
        Self {
            window,
            condition: None,
            effects: effects.into_iter().collect(),
            once_per_turn: false,
        }
    }

    pub fn when(mut self, condition: Predicate) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn once_per_turn(mut self) -> Self {
        self.once_per_turn = true;
        self
    }
}

/// Catalog entry for a passive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassiveDefinition {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub boosts: Vec<BoostDefinition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub triggers: Vec<PassiveTrigger>,
}

impl PassiveDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            boosts: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub fn with_boost(mut self, boost: BoostDefinition) -> Self {
        self.boosts.push(boost);
        self
    }

    pub fn with_trigger(mut self, trigger: PassiveTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn source(&self) -> BoostSource {
        BoostSource::Passive {
            id: self.id.clone(),
        }
    }
}

/// Install the permanent boosts of every passive the combatant knows.
///
/// Safe to call repeatedly: a passive whose source is already present is skipped.
pub fn install_passives(combatant: &mut Combatant, catalog: &Catalog) {
    for id in combatant.passives.clone() {
        let Some(passive) = catalog.passive(&id) else {
            tracing::warn!(combatant = %combatant.id, passive = %id, "unknown passive skipped");
            continue;
        };
        let source = passive.source();
        if combatant.boosts.has_source(&source) {
            continue;
        }
        combatant.boosts.add_all(&passive.boosts, &source);
    }
}

impl<'a> Pipeline<'a> {
    /// Fire the owner's passive triggers registered for `window`.
    pub(crate) fn run_passives(
        &mut self,
        owner: CombatantId,
        window: PassiveWindow,
        counterpart: Option<CombatantId>,
    ) -> Result<(), ActionError> {
        let catalog = self.env.catalog;
        let Some(sheet) = self.state.combatant(owner) else {
            return Ok(());
        };
        if !sheet.is_conscious() {
            return Ok(());
        }

        let mut fired = Vec::new();
        for passive in sheet.passives.iter().filter_map(|id| catalog.passive(id)) {
            for (index, trigger) in passive.triggers.iter().enumerate() {
                if trigger.window != window {
                    continue;
                }
                let key = format!("{}#{index}", passive.id);
                if trigger.once_per_turn && sheet.passive_uses.contains(&key) {
                    continue;
                }
                let other = counterpart.and_then(|id| self.state.combatant(id));
                let ctx = QueryContext {
                    subject: sheet,
                    source: Some(sheet),
                    target: other,
                    action: None,
                    critical: Some(window == PassiveWindow::OnCriticalHit),
                };
                if trigger
                    .condition
                    .as_ref()
                    .is_some_and(|condition| !condition.evaluate(&ctx))
                {
                    continue;
                }
                fired.push((passive, trigger, key));
            }
        }

        for (passive, trigger, key) in fired {
            if !self.is_conscious(owner) {
                break;
            }
            if trigger.once_per_turn
                && let Some(sheet) = self.state.combatant_mut(owner)
            {
                sheet.passive_uses.push(key);
            }
            tracing::debug!(owner = %owner, passive = %passive.id, %window, "passive triggered");
            self.push(CombatEvent::PassiveTriggered {
                owner,
                passive: passive.id.clone(),
                window,
            });
            let save_dc = self.caster_dc(owner);
            self.run_side_effects(
                owner,
                counterpart.unwrap_or(owner),
                &trigger.effects,
                window == PassiveWindow::OnCriticalHit,
                save_dc,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CatalogBuilder, CombatantBuilder};

    #[test]
    fn install_is_idempotent() {
        let catalog = CatalogBuilder::new()
            .passive(PassiveDefinition::new("tough").with_boost("MaximumHP(10)".parse().unwrap()))
            .build()
            .unwrap();
        let mut fighter = CombatantBuilder::new(1, "Fighter")
            .hp(20)
            .passives(["tough"])
            .build();

        install_passives(&mut fighter, &catalog);
        install_passives(&mut fighter, &catalog);
        assert_eq!(fighter.max_hp(), 30);
        assert!(fighter.boosts.has_source(&BoostSource::Passive { id: "tough".into() }));
    }

    #[test]
    fn builder_collects_triggers() {
        let passive = PassiveDefinition::new("savage").with_trigger(
            PassiveTrigger::new(PassiveWindow::OnCriticalHit, []).once_per_turn(),
        );
        assert_eq!(passive.name, "savage");
        assert!(passive.triggers[0].once_per_turn);
        assert_eq!(passive.triggers[0].window.to_string(), "OnCriticalHit");
    }
}
