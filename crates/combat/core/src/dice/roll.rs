//! The d20 roll and its exact probability model.

use arrayvec::ArrayVec;

use super::advantage::AdvantageState;
use super::rng::RollStream;

/// A labelled flat modifier folded into a d20 total.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollModifier {
    pub label: String,
    pub value: i32,
}

impl RollModifier {
    pub fn new(label: impl Into<String>, value: i32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Result of a d20 roll.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollResult {
    /// Faces rolled: one for a straight roll, two under (dis)advantage.
    pub values: ArrayVec<u32, 2>,
    /// The face that counts.
    pub chosen: u32,
    pub advantage: AdvantageState,
    pub modifiers: Vec<RollModifier>,
    pub total: i32,
}

impl RollResult {
    pub fn modifier_total(&self) -> i32 {
        self.modifiers.iter().map(|m| m.value).sum()
    }

    pub fn is_natural_20(&self) -> bool {
        self.chosen == 20
    }

    pub fn is_natural_1(&self) -> bool {
        self.chosen == 1
    }

    /// Fold a late modifier (e.g. a reaction penalty) into the total.
    pub fn push_modifier(&mut self, modifier: RollModifier) {
        self.total += modifier.value;
        self.modifiers.push(modifier);
    }
}

/// Roll a d20 under the given advantage state and add the modifiers.
pub fn roll_d20(
    advantage: AdvantageState,
    modifiers: Vec<RollModifier>,
    rolls: &mut RollStream,
) -> RollResult {
    let mut values = ArrayVec::new();
    values.push(rolls.roll_d20());
    if advantage != AdvantageState::Straight {
        values.push(rolls.roll_d20());
    }

    let chosen = match advantage {
        AdvantageState::Straight => values[0],
        AdvantageState::Advantage => values[0].max(values[1]),
        AdvantageState::Disadvantage => values[0].min(values[1]),
    };

    let total = chosen as i32 + modifiers.iter().map(|m| m.value).sum::<i32>();
    tracing::debug!(?values, chosen, total, %advantage, "d20");

    RollResult {
        values,
        chosen,
        advantage,
        modifiers,
        total,
    }
}

/// Probability that the chosen d20 face is at least `face`.
pub fn chance_face_at_least(face: i32, advantage: AdvantageState) -> f64 {
    let single = ((21 - face.clamp(1, 21)) as f64 / 20.0).clamp(0.0, 1.0);
    match advantage {
        AdvantageState::Straight => single,
        AdvantageState::Advantage => 1.0 - (1.0 - single).powi(2),
        AdvantageState::Disadvantage => single * single,
    }
}

/// Probability that `d20 + modifier >= target` for a roll with no automatic
/// results.
pub fn chance_total_at_least(target: i32, modifier: i32, advantage: AdvantageState) -> f64 {
    chance_face_at_least(target - modifier, advantage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advantage_takes_the_higher_face() {
        let mut rolls = RollStream::new(0).with_forced([4, 17]);
        let roll = roll_d20(
            AdvantageState::Advantage,
            vec![RollModifier::new("bonus", 3)],
            &mut rolls,
        );
        assert_eq!(roll.values.as_slice(), &[4, 17]);
        assert_eq!(roll.chosen, 17);
        assert_eq!(roll.total, 20);
    }

    #[test]
    fn disadvantage_takes_the_lower_face() {
        let mut rolls = RollStream::new(0).with_forced([4, 17]);
        let roll = roll_d20(AdvantageState::Disadvantage, Vec::new(), &mut rolls);
        assert_eq!(roll.chosen, 4);
        assert_eq!(rolls.index(), 2);
    }

    #[test]
    fn straight_roll_uses_one_die() {
        let mut rolls = RollStream::new(9);
        let roll = roll_d20(AdvantageState::Straight, Vec::new(), &mut rolls);
        assert_eq!(roll.values.len(), 1);
        assert_eq!(rolls.index(), 1);
    }

    #[test]
    fn probabilities_match_the_d20_distribution() {
        assert_eq!(chance_face_at_least(11, AdvantageState::Straight), 0.5);
        assert_eq!(chance_face_at_least(11, AdvantageState::Advantage), 0.75);
        assert_eq!(chance_face_at_least(11, AdvantageState::Disadvantage), 0.25);
        assert_eq!(chance_face_at_least(1, AdvantageState::Straight), 1.0);
        assert_eq!(chance_face_at_least(25, AdvantageState::Straight), 0.0);
        assert_eq!(chance_total_at_least(15, 4, AdvantageState::Straight), 0.5);
    }
}
