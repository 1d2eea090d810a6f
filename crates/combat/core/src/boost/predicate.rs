//! Boost conditions and the query context they are evaluated against.

use std::fmt;

use crate::action::ActionCategory;
use crate::state::Combatant;

/// Everything a conditional boost may look at.
///
/// `subject` is the combatant whose boosts are being queried. `source` is the
/// combatant making the roll or taking the action, `target` the one it is
/// aimed at. The subject is usually one of the two.
#[derive(Clone, Copy, Debug)]
pub struct QueryContext<'a> {
    pub subject: &'a Combatant,
    pub source: Option<&'a Combatant>,
    pub target: Option<&'a Combatant>,
    pub action: Option<ActionCategory>,
    pub critical: Option<bool>,
}

impl<'a> QueryContext<'a> {
    /// Context for a query with no counterpart (AC on the sheet, speed, ...).
    pub fn of(subject: &'a Combatant) -> Self {
        Self {
            subject,
            source: None,
            target: None,
            action: None,
            critical: None,
        }
    }

    /// Context for a roll made by `source` against `target`; the subject is the source.
    pub fn roll(
        source: &'a Combatant,
        target: Option<&'a Combatant>,
        action: Option<ActionCategory>,
    ) -> Self {
        Self {
            subject: source,
            source: Some(source),
            target,
            action,
            critical: None,
        }
    }

    /// Same roll, seen from another combatant's boosts.
    pub fn for_subject(self, subject: &'a Combatant) -> Self {
        Self { subject, ..self }
    }

    pub fn with_critical(self, critical: bool) -> Self {
        Self {
            critical: Some(critical),
            ..self
        }
    }
}

/// Parsed boost condition. Serialized as its DSL text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Predicate {
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    IsMeleeAttack,
    IsRangedAttack,
    IsSpell,
    IsWeaponAttack,
    /// The subject carries the status.
    HasStatus(String),
    TargetHasStatus(String),
    SourceHasStatus(String),
    IsConcentrating,
    /// Subject HP strictly below the given percentage of its maximum.
    HpBelowPercent(u32),
    /// Source and target are at most this many feet apart.
    WithinDistance(u32),
    IsCritical,
    /// A call this kernel does not know. Always false.
    Unrecognized(String),
}

impl Predicate {
    pub fn evaluate(&self, ctx: &QueryContext<'_>) -> bool {
        match self {
            Predicate::Not(inner) => !inner.evaluate(ctx),
            Predicate::And(lhs, rhs) => lhs.evaluate(ctx) && rhs.evaluate(ctx),
            Predicate::Or(lhs, rhs) => lhs.evaluate(ctx) || rhs.evaluate(ctx),
            Predicate::IsMeleeAttack => ctx.action.is_some_and(|a| a.is_melee()),
            Predicate::IsRangedAttack => ctx.action.is_some_and(|a| a.is_ranged()),
            Predicate::IsSpell => ctx.action.is_some_and(|a| a.is_spell()),
            Predicate::IsWeaponAttack => ctx.action.is_some_and(|a| a.is_weapon()),
            Predicate::HasStatus(id) => ctx.subject.has_status(id),
            Predicate::TargetHasStatus(id) => ctx.target.is_some_and(|t| t.has_status(id)),
            Predicate::SourceHasStatus(id) => ctx.source.is_some_and(|s| s.has_status(id)),
            Predicate::IsConcentrating => ctx.subject.concentration.is_some(),
            Predicate::HpBelowPercent(percent) => {
                let max = ctx.subject.max_hp();
                max > 0 && (ctx.subject.hp as u64) * 100 < (max as u64) * (*percent as u64)
            }
            Predicate::WithinDistance(feet) => match (ctx.source, ctx.target) {
                (Some(source), Some(target)) => {
                    source.position.distance_to(target.position) <= *feet
                }
                _ => false,
            },
            Predicate::IsCritical => ctx.critical.unwrap_or(false),
            Predicate::Unrecognized(call) => {
                tracing::warn!(predicate = %call, "unrecognized predicate evaluated as false");
                false
            }
        }
    }

    /// Every unrecognized call in this tree.
    pub fn unrecognized(&self) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_unrecognized(&mut found);
        found
    }

    fn collect_unrecognized<'a>(&'a self, found: &mut Vec<&'a str>) {
        match self {
            Predicate::Not(inner) => inner.collect_unrecognized(found),
            Predicate::And(lhs, rhs) | Predicate::Or(lhs, rhs) => {
                lhs.collect_unrecognized(found);
                rhs.collect_unrecognized(found);
            }
            Predicate::Unrecognized(call) => found.push(call),
            _ => {}
        }
    }

    fn is_binary(&self) -> bool {
        matches!(self, Predicate::And(..) | Predicate::Or(..))
    }
}

struct Operand<'a>(&'a Predicate);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_binary() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Not(inner) => write!(f, "not {}", Operand(inner)),
            Predicate::And(lhs, rhs) => write!(f, "{} and {}", Operand(lhs), Operand(rhs)),
            Predicate::Or(lhs, rhs) => write!(f, "{} or {}", Operand(lhs), Operand(rhs)),
            Predicate::IsMeleeAttack => f.write_str("IsMeleeAttack()"),
            Predicate::IsRangedAttack => f.write_str("IsRangedAttack()"),
            Predicate::IsSpell => f.write_str("IsSpell()"),
            Predicate::IsWeaponAttack => f.write_str("IsWeaponAttack()"),
            Predicate::HasStatus(id) => write!(f, "HasStatus('{id}')"),
            Predicate::TargetHasStatus(id) => write!(f, "TargetHasStatus('{id}')"),
            Predicate::SourceHasStatus(id) => write!(f, "SourceHasStatus('{id}')"),
            Predicate::IsConcentrating => f.write_str("IsConcentrating()"),
            Predicate::HpBelowPercent(n) => write!(f, "HpBelowPercent({n})"),
            Predicate::WithinDistance(n) => write!(f, "WithinDistance({n})"),
            Predicate::IsCritical => f.write_str("IsCritical()"),
            Predicate::Unrecognized(call) => f.write_str(call),
        }
    }
}

impl From<Predicate> for String {
    fn from(value: Predicate) -> Self {
        value.to_string()
    }
}
