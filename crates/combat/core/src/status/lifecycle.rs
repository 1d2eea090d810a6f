//! Status application, removal and ticking on a single combatant.
//!
//! Application and removal are the only places that touch a combatant's
//! boosts on behalf of a status, so every boost added here is removed by the
//! matching removal.

use crate::boost::QueryContext;
use crate::env::Catalog;
use crate::state::{Combatant, CombatantId, StatusInstanceId};

use super::definition::{RemovalTrigger, StackPolicy, StatusDefinition, TickTiming};
use super::instance::StatusInstance;

/// Parameters of an incoming status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewStatus {
    pub id: StatusInstanceId,
    pub source: Option<CombatantId>,
    pub duration: Option<u32>,
    pub save_dc: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectReason {
    Immune,
    GroupOccupied { by: String },
    TargetDead,
}

/// What happened to an incoming status.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusApplication {
    Applied {
        instance: StatusInstanceId,
    },
    Refreshed {
        instance: StatusInstanceId,
        remaining: Option<u32>,
    },
    Stacked {
        instance: StatusInstanceId,
        stacks: u32,
    },
    Replaced {
        removed: StatusInstance,
        instance: StatusInstanceId,
    },
    Rejected(RejectReason),
}

impl StatusApplication {
    /// Instance now holding the status, if it landed.
    pub fn instance(&self) -> Option<StatusInstanceId> {
        match self {
            StatusApplication::Applied { instance }
            | StatusApplication::Refreshed { instance, .. }
            | StatusApplication::Stacked { instance, .. }
            | StatusApplication::Replaced { instance, .. } => Some(*instance),
            StatusApplication::Rejected(_) => None,
        }
    }
}

fn longer(current: Option<u32>, incoming: Option<u32>) -> Option<u32> {
    match (current, incoming) {
        (None, _) | (_, None) => None,
        (Some(a), Some(b)) => Some(a.max(b)),
    }
}

fn attach(combatant: &mut Combatant, definition: &StatusDefinition, incoming: NewStatus) {
    let instance = StatusInstance {
        id: incoming.id,
        status_id: definition.id.clone(),
        group: definition.group().to_string(),
        source: incoming.source,
        remaining: incoming.duration.or(definition.default_duration),
        stacks: 1,
        save_dc: incoming.save_dc,
        flags: definition.flags,
    };
    combatant
        .boosts
        .add_all(&definition.boosts, &instance.boost_source());
    combatant.statuses.push(instance);
}

/// Apply a status following its definition's stacking policy.
///
/// The group is free: attach. Occupied: `Reject` refuses; `Refresh` keeps
/// the longer duration for the same status and replaces a different one;
/// `Stack` adds a stack (and one more copy of the boosts) for the same status
/// and replaces a different one.
pub fn apply_status(
    combatant: &mut Combatant,
    definition: &StatusDefinition,
    incoming: NewStatus,
) -> StatusApplication {
    if combatant.is_dead() {
        return StatusApplication::Rejected(RejectReason::TargetDead);
    }
    if combatant
        .boosts
        .is_immune_to_status(&definition.id, &QueryContext::of(combatant))
    {
        return StatusApplication::Rejected(RejectReason::Immune);
    }

    let group = definition.group();
    let Some(index) = combatant.statuses.iter().position(|s| s.group == group) else {
        attach(combatant, definition, incoming);
        return StatusApplication::Applied {
            instance: incoming.id,
        };
    };

    let same_status = combatant.statuses[index].status_id == definition.id;
    let duration = incoming.duration.or(definition.default_duration);
    match (definition.stack_policy, same_status) {
        (StackPolicy::Reject, _) => StatusApplication::Rejected(RejectReason::GroupOccupied {
            by: combatant.statuses[index].status_id.clone(),
        }),
        (StackPolicy::Refresh, true) => {
            let existing = &mut combatant.statuses[index];
            existing.remaining = longer(existing.remaining, duration);
            existing.source = incoming.source.or(existing.source);
            existing.save_dc = incoming.save_dc.or(existing.save_dc);
            StatusApplication::Refreshed {
                instance: existing.id,
                remaining: existing.remaining,
            }
        }
        (StackPolicy::Stack { max }, true) => {
            let existing = &mut combatant.statuses[index];
            existing.remaining = duration;
            let grew = existing.stacks < max;
            if grew {
                existing.stacks += 1;
            }
            let instance = existing.id;
            let stacks = existing.stacks;
            let source = existing.boost_source();
            if grew {
                combatant.boosts.add_all(&definition.boosts, &source);
            }
            StatusApplication::Stacked { instance, stacks }
        }
        (StackPolicy::Refresh | StackPolicy::Stack { .. }, false) => {
            let old = combatant.statuses[index].id;
            let removed = remove_instance(combatant, old);
            attach(combatant, definition, incoming);
            match removed {
                Some(removed) => StatusApplication::Replaced {
                    removed,
                    instance: incoming.id,
                },
                None => StatusApplication::Applied {
                    instance: incoming.id,
                },
            }
        }
    }
}

/// Remove one instance and every boost it added.
pub fn remove_instance(combatant: &mut Combatant, id: StatusInstanceId) -> Option<StatusInstance> {
    let index = combatant.statuses.iter().position(|s| s.id == id)?;
    let instance = combatant.statuses.remove(index);
    combatant.remove_boosts_from(&instance.boost_source());
    Some(instance)
}

/// Instances on `combatant` ticking at `timing`, in attachment order.
pub fn ticking(combatant: &Combatant, catalog: &Catalog, timing: TickTiming) -> Vec<StatusInstanceId> {
    combatant
        .statuses
        .iter()
        .filter(|s| {
            catalog
                .status(&s.status_id)
                .is_some_and(|def| def.tick_timing == timing)
        })
        .map(|s| s.id)
        .collect()
}

/// Outcome of decrementing an instance's duration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still attached with this many ticks left (`None` for permanent).
    Continues(Option<u32>),
    Expired(StatusInstance),
    /// The instance was already gone.
    Missing,
}

/// Decrement the instance's remaining duration, removing it at zero.
pub fn tick_duration(combatant: &mut Combatant, id: StatusInstanceId) -> TickOutcome {
    let Some(instance) = combatant.statuses.iter_mut().find(|s| s.id == id) else {
        return TickOutcome::Missing;
    };
    match instance.remaining {
        None => TickOutcome::Continues(None),
        Some(remaining) if remaining > 1 => {
            instance.remaining = Some(remaining - 1);
            TickOutcome::Continues(instance.remaining)
        }
        Some(_) => match remove_instance(combatant, id) {
            Some(removed) => TickOutcome::Expired(removed),
            None => TickOutcome::Missing,
        },
    }
}

/// Instances whose definition lists `trigger` as a removal trigger.
pub fn removed_by(combatant: &Combatant, catalog: &Catalog, trigger: RemovalTrigger) -> Vec<StatusInstanceId> {
    combatant
        .statuses
        .iter()
        .filter(|s| {
            catalog
                .status(&s.status_id)
                .is_some_and(|def| def.removed_by(trigger))
        })
        .map(|s| s.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boost::{BoostSource, parse_boosts};
    use crate::testing::CombatantBuilder;

    fn incoming(id: u64, duration: u32) -> NewStatus {
        NewStatus {
            id: StatusInstanceId(id),
            source: None,
            duration: Some(duration),
            save_dc: None,
        }
    }

    fn ac_status(id: &str, policy: StackPolicy) -> StatusDefinition {
        let mut def = StatusDefinition::new(id);
        def.boosts = parse_boosts("AC(1)").unwrap();
        def.stack_policy = policy;
        def.stack_group = Some("WARD".into());
        def
    }

    fn ac(c: &Combatant) -> i32 {
        c.armor_class(&QueryContext::of(c))
    }

    #[test]
    fn refresh_keeps_longer_duration() {
        let mut c = CombatantBuilder::new(1, "Fighter").ac(10).build();
        let def = ac_status("WARD", StackPolicy::Refresh);
        apply_status(&mut c, &def, incoming(1, 3));
        let result = apply_status(&mut c, &def, incoming(2, 2));
        assert_eq!(
            result,
            StatusApplication::Refreshed {
                instance: StatusInstanceId(1),
                remaining: Some(3)
            }
        );
        assert_eq!(ac(&c), 11);
        assert_eq!(c.statuses.len(), 1);
    }

    #[test]
    fn stack_adds_boost_copies_up_to_max() {
        let mut c = CombatantBuilder::new(1, "Fighter").ac(10).build();
        let def = ac_status("WARD", StackPolicy::Stack { max: 2 });
        apply_status(&mut c, &def, incoming(1, 3));
        apply_status(&mut c, &def, incoming(2, 3));
        let third = apply_status(&mut c, &def, incoming(3, 3));
        assert_eq!(
            third,
            StatusApplication::Stacked {
                instance: StatusInstanceId(1),
                stacks: 2
            }
        );
        assert_eq!(ac(&c), 12);

        remove_instance(&mut c, StatusInstanceId(1));
        assert_eq!(ac(&c), 10);
        assert!(c.boosts.is_empty());
    }

    #[test]
    fn reject_keeps_the_incumbent() {
        let mut c = CombatantBuilder::new(1, "Fighter").build();
        let first = ac_status("WARD", StackPolicy::Reject);
        let second = ac_status("GREATER_WARD", StackPolicy::Reject);
        apply_status(&mut c, &first, incoming(1, 3));
        let result = apply_status(&mut c, &second, incoming(2, 3));
        assert!(matches!(
            result,
            StatusApplication::Rejected(RejectReason::GroupOccupied { .. })
        ));
        assert!(c.has_status("WARD"));
    }

    #[test]
    fn different_status_in_group_replaces() {
        let mut c = CombatantBuilder::new(1, "Fighter").ac(10).build();
        let first = ac_status("WARD", StackPolicy::Refresh);
        let mut second = ac_status("GREATER_WARD", StackPolicy::Refresh);
        second.boosts = parse_boosts("AC(3)").unwrap();
        apply_status(&mut c, &first, incoming(1, 3));
        let result = apply_status(&mut c, &second, incoming(2, 3));
        assert!(matches!(result, StatusApplication::Replaced { .. }));
        assert_eq!(ac(&c), 13);
        assert!(!c.has_status("WARD"));
    }

    #[test]
    fn immunity_rejects() {
        let mut c = CombatantBuilder::new(1, "Paladin").build();
        c.add_boost(
            "StatusImmunity(FRIGHTENED)".parse().unwrap(),
            BoostSource::Passive { id: "aura".into() },
        );
        let def = StatusDefinition::new("FRIGHTENED");
        assert_eq!(
            apply_status(&mut c, &def, incoming(1, 2)),
            StatusApplication::Rejected(RejectReason::Immune)
        );
    }

    #[test]
    fn duration_strictly_decreases_until_expiry() {
        let mut c = CombatantBuilder::new(1, "Fighter").ac(10).build();
        let def = ac_status("WARD", StackPolicy::Refresh);
        apply_status(&mut c, &def, incoming(1, 3));

        let mut seen = Vec::new();
        loop {
            match tick_duration(&mut c, StatusInstanceId(1)) {
                TickOutcome::Continues(Some(n)) => seen.push(n),
                TickOutcome::Expired(_) => break,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(seen, vec![2, 1]);
        assert_eq!(ac(&c), 10);
        assert_eq!(tick_duration(&mut c, StatusInstanceId(1)), TickOutcome::Missing);
    }
}
