use crate::boost::BoostSource;
use crate::state::{CombatantId, StatusInstanceId};

use super::definition::StatusFlags;

/// A status attached to a combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusInstance {
    pub id: StatusInstanceId,
    pub status_id: String,
    /// Resolved stack group at application time.
    pub group: String,
    /// Combatant that applied it, if any.
    pub source: Option<CombatantId>,
    /// Remaining ticks; `None` lasts until removed.
    pub remaining: Option<u32>,
    pub stacks: u32,
    /// Save DC for repeat saves, recorded from the applier.
    pub save_dc: Option<i32>,
    /// Copy of the definition flags, so sheet queries need no catalog.
    pub flags: StatusFlags,
}

impl StatusInstance {
    pub fn boost_source(&self) -> BoostSource {
        BoostSource::Status {
            instance: self.id,
            status: self.status_id.clone(),
        }
    }

    pub fn is_incapacitating(&self) -> bool {
        self.flags.contains(StatusFlags::INCAPACITATED)
    }
}

/// Why a status instance left its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemovalReason {
    Expired,
    Trigger(super::definition::RemovalTrigger),
    SaveSucceeded,
    Replaced,
    ConcentrationEnded,
    Explicit,
    Death,
}
