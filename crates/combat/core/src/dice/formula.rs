//! Dice formulas: `1d8 + STR`, `2d6 + 3`, `1d4 + SPELL - 1`.
//!
//! Formulas are parsed once when content is loaded. Evaluation walks the AST
//! against a [`FormulaSource`] (usually the acting combatant) and a
//! [`RollStream`].

use std::fmt;
use std::str::FromStr;

use crate::stats::Ability;

use super::rng::RollStream;

/// Values a formula can reference besides literal numbers and dice.
pub trait FormulaSource {
    fn ability_modifier(&self, ability: Ability) -> i32;
    fn proficiency_bonus(&self) -> i32;
    fn level(&self) -> u32;
    /// Modifier of the spellcasting ability, 0 for non-casters.
    fn spellcasting_modifier(&self) -> i32;
}

/// Source with every reference resolving to zero (useless for sheets, handy
/// for literal formulas).
impl FormulaSource for () {
    fn ability_modifier(&self, _ability: Ability) -> i32 {
        0
    }
    fn proficiency_bonus(&self) -> i32 {
        0
    }
    fn level(&self) -> u32 {
        0
    }
    fn spellcasting_modifier(&self) -> i32 {
        0
    }
}

/// A single term of a formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormulaTerm {
    /// `NdM`
    Dice { count: u32, sides: u32 },
    /// Non-negative literal; the sign lives on the [`FormulaPart`].
    Flat(u32),
    /// Ability modifier of the source.
    Ability(Ability),
    /// `PB`
    Proficiency,
    /// `LEVEL`
    Level,
    /// `SPELL`
    SpellModifier,
}

impl fmt::Display for FormulaTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaTerm::Dice { count, sides } => write!(f, "{count}d{sides}"),
            FormulaTerm::Flat(value) => write!(f, "{value}"),
            FormulaTerm::Ability(ability) => f.write_str(ability.short()),
            FormulaTerm::Proficiency => f.write_str("PB"),
            FormulaTerm::Level => f.write_str("LEVEL"),
            FormulaTerm::SpellModifier => f.write_str("SPELL"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormulaPart {
    pub negative: bool,
    pub term: FormulaTerm,
}

/// Parsed dice formula.
///
/// Always holds at least one part. Serialized as its display string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct DiceFormula {
    parts: Vec<FormulaPart>,
}

/// Outcome of rolling a formula.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormulaRoll {
    pub total: i32,
    /// Every individual die face, in roll order.
    pub dice: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("empty dice formula")]
    Empty,

    #[error("invalid term '{term}' in dice formula '{formula}'")]
    InvalidTerm { formula: String, term: String },

    #[error("dice term '{term}' must have at least one die with at least one side")]
    ZeroDice { term: String },
}

impl DiceFormula {
    pub fn new(parts: Vec<FormulaPart>) -> Result<Self, FormulaError> {
        if parts.is_empty() {
            return Err(FormulaError::Empty);
        }
        Ok(Self { parts })
    }

    pub fn zero() -> Self {
        Self::flat(0)
    }

    pub fn flat(value: i32) -> Self {
        Self {
            parts: vec![FormulaPart {
                negative: value < 0,
                term: FormulaTerm::Flat(value.unsigned_abs()),
            }],
        }
    }

    pub fn dice(count: u32, sides: u32) -> Self {
        Self {
            parts: vec![FormulaPart {
                negative: false,
                term: FormulaTerm::Dice { count, sides },
            }],
        }
    }

    /// Append a term (builder pattern).
    pub fn plus(mut self, term: FormulaTerm) -> Self {
        self.parts.push(FormulaPart {
            negative: false,
            term,
        });
        self
    }

    pub fn minus(mut self, term: FormulaTerm) -> Self {
        self.parts.push(FormulaPart {
            negative: true,
            term,
        });
        self
    }

    pub fn parts(&self) -> &[FormulaPart] {
        &self.parts
    }

    /// True when the formula contains no dice.
    pub fn is_fixed(&self) -> bool {
        !self
            .parts
            .iter()
            .any(|p| matches!(p.term, FormulaTerm::Dice { .. }))
    }

    fn flat_value(term: FormulaTerm, source: &dyn FormulaSource) -> i32 {
        match term {
            FormulaTerm::Dice { .. } => 0,
            FormulaTerm::Flat(value) => value as i32,
            FormulaTerm::Ability(ability) => source.ability_modifier(ability),
            FormulaTerm::Proficiency => source.proficiency_bonus(),
            FormulaTerm::Level => source.level() as i32,
            FormulaTerm::SpellModifier => source.spellcasting_modifier(),
        }
    }

    /// Roll the formula. A critical doubles the number of dice in every dice
    /// term; flat terms are unaffected.
    pub fn roll(
        &self,
        source: &dyn FormulaSource,
        rolls: &mut RollStream,
        critical: bool,
    ) -> FormulaRoll {
        let mut result = FormulaRoll::default();
        for part in &self.parts {
            let value = match part.term {
                FormulaTerm::Dice { count, sides } => {
                    let count = if critical { count * 2 } else { count };
                    let mut sum = 0i32;
                    for _ in 0..count {
                        let face = rolls.roll_die(sides);
                        result.dice.push(face);
                        sum += face as i32;
                    }
                    sum
                }
                term => Self::flat_value(term, source),
            };
            result.total += if part.negative { -value } else { value };
        }
        result
    }

    /// Expected value of a roll.
    pub fn mean(&self, source: &dyn FormulaSource, critical: bool) -> f64 {
        self.parts
            .iter()
            .map(|part| {
                let value = match part.term {
                    FormulaTerm::Dice { count, sides } => {
                        let count = if critical { count * 2 } else { count };
                        count as f64 * (sides as f64 + 1.0) / 2.0
                    }
                    term => Self::flat_value(term, source) as f64,
                };
                if part.negative { -value } else { value }
            })
            .sum()
    }
}

impl Default for DiceFormula {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            match (i, part.negative) {
                (0, false) => {}
                (0, true) => f.write_str("-")?,
                (_, false) => f.write_str(" + ")?,
                (_, true) => f.write_str(" - ")?,
            }
            write!(f, "{}", part.term)?;
        }
        Ok(())
    }
}

fn parse_term(formula: &str, raw: &str) -> Result<FormulaTerm, FormulaError> {
    let invalid = || FormulaError::InvalidTerm {
        formula: formula.to_string(),
        term: raw.to_string(),
    };
    let upper = raw.to_ascii_uppercase();

    if let Some((count, sides)) = upper.split_once('D')
        && sides.chars().all(|c| c.is_ascii_digit())
        && count.chars().all(|c| c.is_ascii_digit())
        && !sides.is_empty()
    {
        let count = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid())?
        };
        let sides: u32 = sides.parse().map_err(|_| invalid())?;
        if count == 0 || sides == 0 {
            return Err(FormulaError::ZeroDice {
                term: raw.to_string(),
            });
        }
        return Ok(FormulaTerm::Dice { count, sides });
    }

    if upper.chars().all(|c| c.is_ascii_digit()) {
        return upper.parse().map(FormulaTerm::Flat).map_err(|_| invalid());
    }

    match upper.as_str() {
        "PB" => Ok(FormulaTerm::Proficiency),
        "LEVEL" => Ok(FormulaTerm::Level),
        "SPELL" => Ok(FormulaTerm::SpellModifier),
        "STR" => Ok(FormulaTerm::Ability(Ability::Strength)),
        "DEX" => Ok(FormulaTerm::Ability(Ability::Dexterity)),
        "CON" => Ok(FormulaTerm::Ability(Ability::Constitution)),
        "INT" => Ok(FormulaTerm::Ability(Ability::Intelligence)),
        "WIS" => Ok(FormulaTerm::Ability(Ability::Wisdom)),
        "CHA" => Ok(FormulaTerm::Ability(Ability::Charisma)),
        _ => Err(invalid()),
    }
}

impl FromStr for DiceFormula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut parts = Vec::new();
        let mut negative = false;
        let mut current = String::new();
        let mut chars = compact.chars().peekable();

        // A leading sign applies to the first term.
        if let Some(&sign) = chars.peek()
            && (sign == '-' || sign == '+')
        {
            negative = sign == '-';
            chars.next();
        }

        for c in chars {
            if c == '+' || c == '-' {
                if current.is_empty() {
                    return Err(FormulaError::InvalidTerm {
                        formula: s.to_string(),
                        term: c.to_string(),
                    });
                }
                parts.push(FormulaPart {
                    negative,
                    term: parse_term(s, &current)?,
                });
                current.clear();
                negative = c == '-';
            } else {
                current.push(c);
            }
        }
        if current.is_empty() {
            return Err(FormulaError::InvalidTerm {
                formula: s.to_string(),
                term: String::new(),
            });
        }
        parts.push(FormulaPart {
            negative,
            term: parse_term(s, &current)?,
        });

        Self::new(parts)
    }
}

impl TryFrom<String> for DiceFormula {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceFormula> for String {
    fn from(value: DiceFormula) -> Self {
        value.to_string()
    }
}
