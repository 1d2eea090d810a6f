//! Damage arithmetic: save halving, resistance, temporary HP, overflow.

use crate::stats::ResistanceLevel;

/// Every intermediate value of one damage instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageBreakdown {
    pub raw: u32,
    /// Halved by a successful save.
    pub halved: bool,
    pub resistance: ResistanceLevel,
    /// Damage after save and resistance; what the creature "takes".
    pub taken: u32,
    pub absorbed_by_temp_hp: u32,
    pub hp_loss: u32,
    /// Damage left over after HP reached 0.
    pub overflow: u32,
}

/// Order: save half, collapsed resistance level, temporary HP, then HP.
pub fn damage_breakdown(
    raw: u32,
    halved: bool,
    resistance: ResistanceLevel,
    temp_hp: u32,
    hp: u32,
) -> DamageBreakdown {
    let after_save = if halved { raw / 2 } else { raw };
    let taken = resistance.apply(after_save);
    let absorbed_by_temp_hp = taken.min(temp_hp);
    let remaining = taken - absorbed_by_temp_hp;
    let hp_loss = remaining.min(hp);
    DamageBreakdown {
        raw,
        halved,
        resistance,
        taken,
        absorbed_by_temp_hp,
        hp_loss,
        overflow: remaining - hp_loss,
    }
}

/// Instant death: the whole instance, after save and resistance, is at least
/// max HP. The HP the target happened to have left does not reduce it.
pub fn is_massive_damage(breakdown: &DamageBreakdown, max_hp: u32) -> bool {
    breakdown.taken >= max_hp
}

/// Concentration save DC: `max(floor, damage / 2)`.
pub fn concentration_dc(damage: u32, floor: i32) -> i32 {
    floor.max((damage / 2) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_hp_absorbs_before_hp() {
        let b = damage_breakdown(12, false, ResistanceLevel::Normal, 5, 20);
        assert_eq!(b.absorbed_by_temp_hp, 5);
        assert_eq!(b.hp_loss, 7);
        assert_eq!(b.overflow, 0);
    }

    #[test]
    fn resistance_applies_once_after_save_half() {
        let b = damage_breakdown(21, true, ResistanceLevel::Resistant, 0, 50);
        assert_eq!(b.taken, 5);
        assert_eq!(b.hp_loss, 5);
    }

    #[test]
    fn massive_damage_compares_the_full_amount() {
        let b = damage_breakdown(35, false, ResistanceLevel::Normal, 0, 20);
        assert_eq!(b.hp_loss, 20);
        assert_eq!(b.overflow, 15);
        assert!(is_massive_damage(&b, 20));

        // Wounded to 5 HP, a 19 point hit drops the target without killing it.
        let b = damage_breakdown(19, false, ResistanceLevel::Normal, 0, 5);
        assert_eq!(b.overflow, 14);
        assert!(!is_massive_damage(&b, 20));

        // Resistance halves 35 to 17, under the threshold.
        let b = damage_breakdown(35, false, ResistanceLevel::Resistant, 0, 20);
        assert!(!is_massive_damage(&b, 20));
    }

    #[test]
    fn concentration_dc_floor() {
        assert_eq!(concentration_dc(7, 10), 10);
        assert_eq!(concentration_dc(35, 10), 17);
    }
}
