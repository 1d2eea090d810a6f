//! Bit-exact state snapshots for save/load and replay verification.
//!
//! A snapshot is the bincode encoding of [`CombatState`]: combatants with
//! statuses, boosts and budgets, turn counters, the roll stream position and
//! the status-instance allocator. Catalogs are not included.

use sha2::{Digest, Sha256};

use crate::error::{CombatError, ErrorSeverity};
use crate::state::CombatState;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("snapshot decoding failed: {0}")]
    Decode(String),
}

impl CombatError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "SNAPSHOT_ENCODE",
            Self::Decode(_) => "SNAPSHOT_DECODE",
        }
    }
}

pub fn encode(state: &CombatState) -> Result<Vec<u8>, SnapshotError> {
    bincode::serialize(state).map_err(|e| SnapshotError::Encode(e.to_string()))
}

pub fn decode(bytes: &[u8]) -> Result<CombatState, SnapshotError> {
    bincode::deserialize(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))
}

/// SHA-256 of the snapshot encoding.
pub fn state_hash(state: &CombatState) -> Result<[u8; 32], SnapshotError> {
    let bytes = encode(state)?;
    Ok(Sha256::digest(&bytes).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boost::BoostSource;
    use crate::budget::{Recharge, ResourcePool};
    use crate::state::Position;
    use crate::testing::CombatantBuilder;

    fn sample() -> CombatState {
        let mut fighter = CombatantBuilder::new(1, "Fighter")
            .pool("second_wind", ResourcePool::full(1, Recharge::ShortRest))
            .passives(["rage"])
            .build();
        fighter.add_boost(
            "IF(HasStatus('RAGING')):Resistance(Slashing,Resistant)"
                .parse()
                .unwrap(),
            BoostSource::Passive { id: "rage".into() },
        );
        let goblin = CombatantBuilder::new(2, "Goblin")
            .hostile()
            .at(Position::new(3, 1))
            .build();
        let mut state = CombatState::with_combatants(42, [fighter, goblin]);
        state.rolls.roll_d20();
        state.rolls.roll_d20();
        state
    }

    #[test]
    fn snapshot_restores_bit_for_bit() {
        let state = sample();
        let bytes = encode(&state).unwrap();
        let restored = decode(&bytes).unwrap();
        assert_eq!(restored, state);
        assert_eq!(encode(&restored).unwrap(), bytes);
    }

    #[test]
    fn restored_stream_continues_identically() {
        let mut state = sample();
        let mut restored = decode(&encode(&state).unwrap()).unwrap();
        let original: Vec<u32> = (0..5).map(|_| state.rolls.roll_d20()).collect();
        let replayed: Vec<u32> = (0..5).map(|_| restored.rolls.roll_d20()).collect();
        assert_eq!(original, replayed);
    }

    #[test]
    fn hash_tracks_state() {
        let state = sample();
        let first = state_hash(&state).unwrap();
        assert_eq!(hex::encode(first).len(), 64);
        assert_eq!(first, state_hash(&state.clone()).unwrap());

        let mut changed = state;
        changed.combatants[1].hp -= 1;
        assert_ne!(first, state_hash(&changed).unwrap());
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = decode(&[0xff, 0x01]).unwrap_err();
        assert_eq!(err.error_code(), "SNAPSHOT_DECODE");
    }
}
