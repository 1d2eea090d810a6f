//! State commits shared by effects, ticks and the turn machine.
//!
//! Every HP, life-state, status and concentration change goes through these
//! helpers so each one emits its event and fires its follow-up triggers in a
//! single place.

use crate::action::definition::ActionCategory;
use crate::action::error::ActionError;
use crate::action::types::CombatEvent;
use crate::boost::QueryContext;
use crate::config::CombatConfig;
use crate::passive::PassiveWindow;
use crate::reaction::{ReactionTrigger, TriggerEvent};
use crate::rules::{
    DamageBreakdown, DeathSaveOutcome, SaveRequest, SaveResolution, concentration_dc,
    damage_breakdown, is_massive_damage, resolve_death_save, resolve_save,
};
use crate::state::{CombatantId, Concentration, ConcentrationLink, LifeState, StatusInstanceId};
use crate::stats::{Ability, DamageType};
use crate::status::{
    self, NewStatus, RemovalReason, RemovalTrigger, StatusApplication, StatusFlags, TickOutcome,
    TickTiming,
};

use super::pipeline::Pipeline;

/// One damage instance ready to commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageHit {
    pub source: Option<CombatantId>,
    pub target: CombatantId,
    pub raw: u32,
    pub damage_type: DamageType,
    pub critical: bool,
    /// Halved by a successful save.
    pub halved: bool,
    pub category: Option<ActionCategory>,
}

/// One status application ready to commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusRequest<'r> {
    pub source: Option<CombatantId>,
    pub target: CombatantId,
    pub status: &'r str,
    pub duration: Option<u32>,
    pub save_dc: Option<i32>,
    /// Action id whose concentration holds the instance.
    pub concentration: Option<String>,
}

impl Pipeline<'_> {
    // ========================================================================
    // Hit Points
    // ========================================================================

    /// Commit one damage instance and run everything it sets off.
    ///
    /// After the HP change: downed/death transition, concentration check,
    /// `OnDamageTaken` removals and break-on-damage saves, `OnDamageTaken`
    /// passives, then ally-damaged reactions.
    pub(crate) fn commit_damage(&mut self, hit: &DamageHit) -> Result<DamageBreakdown, ActionError> {
        let config = self.env.config;
        let breakdown = {
            let target = self
                .state
                .combatant(hit.target)
                .ok_or(ActionError::UnknownCombatant(hit.target))?;
            if target.is_dead() {
                return Ok(DamageBreakdown::default());
            }
            let source = hit.source.and_then(|id| self.state.combatant(id));
            let ctx = QueryContext {
                subject: target,
                source,
                target: Some(target),
                action: hit.category,
                critical: Some(hit.critical),
            };
            let resistance = target.boosts.resistance_level(hit.damage_type, &ctx);
            damage_breakdown(hit.raw, hit.halved, resistance, target.temp_hp, target.hp)
        };

        let target = self
            .state
            .combatant_mut(hit.target)
            .ok_or(ActionError::UnknownCombatant(hit.target))?;
        target.temp_hp -= breakdown.absorbed_by_temp_hp;
        target.hp -= breakdown.hp_loss;
        let hp_after = target.hp;
        let max_hp = target.max_hp();
        let life = target.life;
        let player_side = target.is_player_side();

        tracing::debug!(
            target = %hit.target,
            damage_type = %hit.damage_type,
            raw = breakdown.raw,
            taken = breakdown.taken,
            hp_after,
            "damage"
        );
        self.push(CombatEvent::Damage {
            source: hit.source,
            target: hit.target,
            damage_type: hit.damage_type,
            critical: hit.critical,
            breakdown,
            hp_after,
        });
        if breakdown.taken == 0 {
            return Ok(breakdown);
        }

        match life {
            LifeState::Downed {
                successes,
                failures,
                ..
            } => {
                if config.massive_damage && is_massive_damage(&breakdown, max_hp) {
                    self.die(hit.target, true);
                } else {
                    let failures = failures + if hit.critical { 2 } else { 1 };
                    if failures >= CombatConfig::MAX_DEATH_SAVES {
                        self.die(hit.target, false);
                    } else if let Some(target) = self.state.combatant_mut(hit.target) {
                        target.life = LifeState::Downed {
                            successes,
                            failures,
                            stable: false,
                        };
                    }
                }
            }
            LifeState::Conscious if hp_after == 0 => {
                let massive = config.massive_damage && is_massive_damage(&breakdown, max_hp);
                if massive || (config.npcs_die_at_zero && !player_side) {
                    self.die(hit.target, massive);
                } else {
                    self.down(hit.target);
                }
            }
            _ => {}
        }

        self.concentration_check(hit.target, breakdown.taken)?;
        self.trigger_removal(hit.target, RemovalTrigger::OnDamageTaken);
        let breaking: Vec<StatusInstanceId> = self
            .state
            .combatant(hit.target)
            .map(|c| {
                c.statuses
                    .iter()
                    .filter(|s| s.flags.contains(StatusFlags::BREAKS_ON_DAMAGE_SAVE))
                    .map(|s| s.id)
                    .collect()
            })
            .unwrap_or_default();
        for instance in breaking {
            self.repeat_save(hit.target, instance)?;
        }

        self.run_passives(hit.target, PassiveWindow::OnDamageTaken, hit.source)?;
        if let Some(source) = hit.source {
            self.offer_reactions(TriggerEvent::new(
                ReactionTrigger::AllyDamaged,
                source,
                hit.target,
                hit.category,
            ));
        }
        Ok(breakdown)
    }

    /// Heal up to maximum HP. A downed target comes back up; the dead stay dead.
    pub(crate) fn heal(
        &mut self,
        source: Option<CombatantId>,
        target: CombatantId,
        amount: u32,
    ) -> Result<u32, ActionError> {
        let combatant = self
            .state
            .combatant_mut(target)
            .ok_or(ActionError::UnknownCombatant(target))?;
        if combatant.is_dead() || amount == 0 {
            return Ok(0);
        }
        let revived = combatant.is_downed();
        let before = combatant.hp;
        combatant.hp = (combatant.hp + amount).min(combatant.max_hp());
        combatant.life = LifeState::Conscious;
        let healed = combatant.hp - before;
        let hp_after = combatant.hp;

        self.push(CombatEvent::Healed {
            source,
            target,
            amount: healed,
            hp_after,
        });
        if revived {
            tracing::info!(combatant = %target, hp = hp_after, "back on their feet");
            self.push(CombatEvent::Revived {
                combatant: target,
                hp: hp_after,
            });
        }
        self.trigger_removal(target, RemovalTrigger::OnHeal);
        Ok(healed)
    }

    // ========================================================================
    // Life State
    // ========================================================================

    pub(crate) fn down(&mut self, id: CombatantId) {
        let Some(combatant) = self.state.combatant_mut(id) else {
            return;
        };
        combatant.hp = 0;
        combatant.temp_hp = 0;
        combatant.life = LifeState::downed();
        tracing::info!(combatant = %id, "downed");
        self.push(CombatEvent::Downed { combatant: id });
        self.end_concentration(id);
    }

    pub(crate) fn die(&mut self, id: CombatantId, massive_damage: bool) {
        let Some(combatant) = self.state.combatant_mut(id) else {
            return;
        };
        combatant.hp = 0;
        combatant.temp_hp = 0;
        combatant.life = LifeState::Dead;
        tracing::info!(combatant = %id, massive_damage, "died");
        self.push(CombatEvent::Died {
            combatant: id,
            massive_damage,
        });
        self.end_concentration(id);
        let instances: Vec<StatusInstanceId> = self
            .state
            .combatant(id)
            .map(|c| c.statuses.iter().map(|s| s.id).collect())
            .unwrap_or_default();
        for instance in instances {
            self.remove_status_instance(id, instance, RemovalReason::Death);
        }
    }

    /// Roll a death save for a downed, unstable combatant.
    pub(crate) fn death_save(&mut self, id: CombatantId) {
        let dc = self.env.config.death_save_dc;
        let Some((combatant, rolls)) = self.state.with_rolls(id) else {
            return;
        };
        let LifeState::Downed {
            successes,
            failures,
            stable: false,
        } = combatant.life
        else {
            return;
        };
        let resolution = resolve_death_save(combatant, dc, rolls);

        let (successes, failures) = match resolution.outcome {
            DeathSaveOutcome::Revived => (0, 0),
            DeathSaveOutcome::Success => (successes + 1, failures),
            DeathSaveOutcome::Failure(n) => (successes, failures + n),
        };
        self.push(CombatEvent::DeathSave {
            combatant: id,
            resolution: resolution.clone(),
            successes,
            failures,
        });

        match resolution.outcome {
            DeathSaveOutcome::Revived => {
                if let Some(combatant) = self.state.combatant_mut(id) {
                    combatant.life = LifeState::Conscious;
                    combatant.hp = 1;
                }
                tracing::info!(combatant = %id, "natural 20 on a death save");
                self.push(CombatEvent::Revived {
                    combatant: id,
                    hp: 1,
                });
            }
            _ if failures >= CombatConfig::MAX_DEATH_SAVES => self.die(id, false),
            _ => {
                let stable = successes >= CombatConfig::MAX_DEATH_SAVES;
                if let Some(combatant) = self.state.combatant_mut(id) {
                    combatant.life = LifeState::Downed {
                        successes,
                        failures,
                        stable,
                    };
                }
                if stable {
                    self.push(CombatEvent::Stabilized { combatant: id });
                }
            }
        }
    }

    // ========================================================================
    // Saving Throws
    // ========================================================================

    /// Roll a save, record it, and fire `OnSaveSuccess` removals on a success.
    pub(crate) fn roll_save(
        &mut self,
        target: CombatantId,
        source: Option<CombatantId>,
        request: SaveRequest,
    ) -> Result<SaveResolution, ActionError> {
        let save = {
            let (subject, applier, rolls) = match source {
                Some(source) => {
                    let (subject, applier, rolls) = self
                        .state
                        .pair_with_rolls(target, source)
                        .ok_or(ActionError::UnknownCombatant(source))?;
                    (subject, Some(applier), rolls)
                }
                None => {
                    let (subject, rolls) = self
                        .state
                        .with_rolls(target)
                        .ok_or(ActionError::UnknownCombatant(target))?;
                    (subject, None, rolls)
                }
            };
            resolve_save(subject, applier, request, rolls)
        };
        self.push(CombatEvent::SavingThrow {
            combatant: target,
            source,
            save: save.clone(),
        });
        if save.success {
            self.trigger_removal(target, RemovalTrigger::OnSaveSuccess);
        }
        Ok(save)
    }

    /// Repeat save against one status instance; a success removes it.
    pub(crate) fn repeat_save(
        &mut self,
        owner: CombatantId,
        instance: StatusInstanceId,
    ) -> Result<(), ActionError> {
        let catalog = self.env.catalog;
        let Some(held) = self
            .state
            .combatant(owner)
            .and_then(|c| c.status_instance(instance))
        else {
            return Ok(());
        };
        let Some(repeat) = catalog
            .status(&held.status_id)
            .and_then(|def| def.repeat_save)
        else {
            return Ok(());
        };
        let dc = held.save_dc.unwrap_or(CombatConfig::FALLBACK_SAVE_DC);
        let source = held
            .source
            .filter(|id| self.state.combatant(*id).is_some());

        let save = self.roll_save(owner, source, SaveRequest::new(repeat.ability, dc))?;
        if save.success {
            self.remove_status_instance(owner, instance, RemovalReason::SaveSucceeded);
        }
        Ok(())
    }

    /// Repeat saves due at `timing` for every status the owner carries.
    pub(crate) fn repeat_saves(
        &mut self,
        owner: CombatantId,
        timing: TickTiming,
    ) -> Result<(), ActionError> {
        let catalog = self.env.catalog;
        let due: Vec<StatusInstanceId> = self
            .state
            .combatant(owner)
            .map(|c| {
                c.statuses
                    .iter()
                    .filter(|s| {
                        catalog
                            .status(&s.status_id)
                            .and_then(|def| def.repeat_save)
                            .is_some_and(|r| r.timing == timing)
                    })
                    .map(|s| s.id)
                    .collect()
            })
            .unwrap_or_default();
        for instance in due {
            self.repeat_save(owner, instance)?;
        }
        Ok(())
    }

    // ========================================================================
    // Statuses
    // ========================================================================

    pub(crate) fn apply_status(
        &mut self,
        request: StatusRequest<'_>,
    ) -> Result<StatusApplication, ActionError> {
        let catalog = self.env.catalog;
        let definition = catalog
            .status(request.status)
            .ok_or(ActionError::EffectFailed("unknown status"))?;
        let id = self.state.allocate_status_instance();
        let target = self
            .state
            .combatant_mut(request.target)
            .ok_or(ActionError::UnknownCombatant(request.target))?;
        let application = status::apply_status(
            target,
            definition,
            NewStatus {
                id,
                source: request.source,
                duration: request.duration,
                save_dc: request.save_dc,
            },
        );

        self.push(CombatEvent::StatusApplied {
            target: request.target,
            status: definition.id.clone(),
            application: application.clone(),
        });
        let mut replaced = None;
        match &application {
            StatusApplication::Applied { instance } => {
                tracing::debug!(target = %request.target, status = %definition.id, %instance, "status applied");
            }
            StatusApplication::Replaced { removed, instance } => {
                tracing::debug!(target = %request.target, status = %definition.id, %instance, replaced = %removed.status_id, "status replaced");
                self.push(CombatEvent::StatusRemoved {
                    target: request.target,
                    status: removed.status_id.clone(),
                    instance: removed.id,
                    reason: RemovalReason::Replaced,
                });
                replaced = Some(removed.id);
            }
            StatusApplication::Rejected(reason) => {
                tracing::warn!(target = %request.target, status = %definition.id, %reason, "status rejected");
            }
            StatusApplication::Refreshed { .. } | StatusApplication::Stacked { .. } => {}
        }

        // Link before unlinking: an emptied record ends concentration.
        if let (Some(action), Some(caster)) = (&request.concentration, request.source)
            && let StatusApplication::Applied { instance }
            | StatusApplication::Replaced { instance, .. } = &application
        {
            self.link_concentration(caster, action, request.target, *instance);
        }
        if let Some(old) = replaced {
            self.unlink_concentration(request.target, old);
        }

        if definition.flags.contains(StatusFlags::INCAPACITATED)
            && application.instance().is_some()
        {
            self.end_concentration(request.target);
        }
        Ok(application)
    }

    /// Remove every instance of `status_id`; returns how many were removed.
    pub(crate) fn remove_status(
        &mut self,
        target: CombatantId,
        status_id: &str,
        reason: RemovalReason,
    ) -> usize {
        let instances: Vec<StatusInstanceId> = self
            .state
            .combatant(target)
            .map(|c| {
                c.statuses
                    .iter()
                    .filter(|s| s.status_id == status_id)
                    .map(|s| s.id)
                    .collect()
            })
            .unwrap_or_default();
        instances
            .into_iter()
            .filter(|instance| self.remove_status_instance(target, *instance, reason))
            .count()
    }

    pub(crate) fn remove_status_instance(
        &mut self,
        target: CombatantId,
        instance: StatusInstanceId,
        reason: RemovalReason,
    ) -> bool {
        let Some(combatant) = self.state.combatant_mut(target) else {
            return false;
        };
        let Some(removed) = status::remove_instance(combatant, instance) else {
            return false;
        };
        tracing::debug!(target = %target, status = %removed.status_id, %reason, "status removed");
        self.push(CombatEvent::StatusRemoved {
            target,
            status: removed.status_id,
            instance,
            reason,
        });
        if reason != RemovalReason::ConcentrationEnded {
            self.unlink_concentration(target, instance);
        }
        true
    }

    /// Remove the owner's statuses that list `trigger`.
    pub(crate) fn trigger_removal(&mut self, owner: CombatantId, trigger: RemovalTrigger) {
        let catalog = self.env.catalog;
        let Some(combatant) = self.state.combatant(owner) else {
            return;
        };
        for instance in status::removed_by(combatant, catalog, trigger) {
            self.remove_status_instance(owner, instance, RemovalReason::Trigger(trigger));
        }
    }

    /// Decrement an instance's duration. Expiry emits its removal.
    pub(crate) fn tick_status(&mut self, owner: CombatantId, instance: StatusInstanceId) {
        let Some(combatant) = self.state.combatant_mut(owner) else {
            return;
        };
        if let TickOutcome::Expired(expired) = status::tick_duration(combatant, instance) {
            tracing::debug!(target = %owner, status = %expired.status_id, "status expired");
            self.push(CombatEvent::StatusRemoved {
                target: owner,
                status: expired.status_id,
                instance,
                reason: RemovalReason::Expired,
            });
            self.unlink_concentration(owner, instance);
        }
    }

    // ========================================================================
    // Concentration
    // ========================================================================

    /// Begin concentrating on `action`, dropping any previous concentration.
    pub(crate) fn start_concentration(&mut self, caster: CombatantId, action: &str) {
        self.end_concentration(caster);
        let Some(combatant) = self.state.combatant_mut(caster) else {
            return;
        };
        combatant.concentration = Some(Concentration {
            action: action.to_string(),
            links: Vec::new(),
        });
        self.push(CombatEvent::ConcentrationStarted {
            caster,
            action: action.to_string(),
        });
    }

    /// Drop concentration and every status instance it holds.
    pub(crate) fn end_concentration(&mut self, caster: CombatantId) {
        let Some(record) = self
            .state
            .combatant_mut(caster)
            .and_then(|c| c.concentration.take())
        else {
            return;
        };
        for link in &record.links {
            self.remove_status_instance(link.target, link.instance, RemovalReason::ConcentrationEnded);
        }
        tracing::debug!(caster = %caster, action = %record.action, "concentration ended");
        self.push(CombatEvent::ConcentrationEnded {
            caster,
            action: record.action,
        });
    }

    fn link_concentration(
        &mut self,
        caster: CombatantId,
        action: &str,
        target: CombatantId,
        instance: StatusInstanceId,
    ) {
        if let Some(record) = self
            .state
            .combatant_mut(caster)
            .and_then(|c| c.concentration.as_mut())
            .filter(|record| record.action == action)
        {
            record.links.push(ConcentrationLink { target, instance });
        }
    }

    /// Forget a removed instance; concentration with nothing left ends.
    fn unlink_concentration(&mut self, target: CombatantId, instance: StatusInstanceId) {
        let mut emptied = Vec::new();
        for combatant in &mut self.state.combatants {
            let Some(record) = combatant.concentration.as_mut() else {
                continue;
            };
            let before = record.links.len();
            record
                .links
                .retain(|link| !(link.target == target && link.instance == instance));
            if before != record.links.len() && record.links.is_empty() {
                emptied.push(combatant.id);
            }
        }
        for caster in emptied {
            self.end_concentration(caster);
        }
    }

    /// Constitution save to hold concentration after taking damage.
    fn concentration_check(&mut self, caster: CombatantId, damage: u32) -> Result<(), ActionError> {
        let concentrating = self
            .state
            .combatant(caster)
            .is_some_and(|c| c.is_conscious() && c.concentration.is_some());
        if !concentrating {
            return Ok(());
        }
        let dc = concentration_dc(damage, self.env.config.concentration_min_dc);
        let save = self.roll_save(caster, None, SaveRequest::new(Ability::Constitution, dc))?;
        self.push(CombatEvent::ConcentrationCheck {
            caster,
            dc,
            maintained: save.success,
        });
        if !save.success {
            self.end_concentration(caster);
        }
        Ok(())
    }
}
