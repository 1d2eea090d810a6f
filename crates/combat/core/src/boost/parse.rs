//! Boost DSL parser.
//!
//! ```text
//! boosts    := boost (';' boost)*
//! boost     := ['IF(' predicate '):'] Name '(' [arg (',' arg)*] ')'
//! predicate := or
//! or        := and ('or' and)*
//! and       := unary ('and' unary)*
//! unary     := 'not' unary | '(' predicate ')' | Call '(' [arg (',' arg)*] ')'
//! ```
//!
//! Unknown boost names are errors. Unknown predicate calls parse to
//! [`Predicate::Unrecognized`] and are logged.

use std::str::FromStr;

use crate::dice::{DiceFormula, FormulaError};
use crate::error::{CombatError, ErrorSeverity};

use super::kinds::{BoostDefinition, BoostKind, CriticalPolicy, RollType};
use super::predicate::Predicate;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown boost kind '{name}'")]
    UnknownBoost { name: String },

    #[error("{name} expects {expected} argument(s), found {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("invalid argument '{argument}' for {name}")]
    InvalidArgument { name: String, argument: String },

    #[error("malformed boost text '{input}': {reason}")]
    Syntax { input: String, reason: &'static str },

    #[error(transparent)]
    Formula(#[from] FormulaError),
}

impl CombatError for ParseError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownBoost { .. } => "BOOST_UNKNOWN_KIND",
            Self::Arity { .. } => "BOOST_ARITY",
            Self::InvalidArgument { .. } => "BOOST_INVALID_ARGUMENT",
            Self::Syntax { .. } => "BOOST_SYNTAX",
            Self::Formula(_) => "BOOST_FORMULA",
        }
    }
}

/// Parse a `;`-separated list of boosts. Empty segments are skipped.
pub fn parse_boosts(input: &str) -> Result<Vec<BoostDefinition>, ParseError> {
    input
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::parse)
        .collect()
}

pub fn parse_predicate(input: &str) -> Result<Predicate, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = PredicateParser {
        input,
        tokens,
        pos: 0,
    };
    let predicate = parser.or()?;
    if parser.pos != parser.tokens.len() {
        return Err(syntax(input, "trailing tokens after condition"));
    }
    for call in predicate.unrecognized() {
        tracing::warn!(predicate = %call, condition = %input, "unrecognized predicate function");
    }
    Ok(predicate)
}

fn syntax(input: &str, reason: &'static str) -> ParseError {
    ParseError::Syntax {
        input: input.to_string(),
        reason,
    }
}

// ============================================================================
// Boost Parsing
// ============================================================================

impl FromStr for BoostDefinition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (condition, body) = match strip_prefix_ci(text, "IF(") {
            Some(rest) => {
                let close = matching_paren(rest).ok_or_else(|| syntax(s, "unclosed IF("))?;
                let condition = parse_predicate(&rest[..close])?;
                let after = rest[close + 1..].trim_start();
                let body = after
                    .strip_prefix(':')
                    .ok_or_else(|| syntax(s, "expected ':' after IF(...)"))?;
                (Some(condition), body.trim())
            }
            None => (None, text),
        };

        let open = body.find('(').ok_or_else(|| syntax(s, "expected '('"))?;
        let inner = body[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| syntax(s, "expected ')' at end of boost"))?;
        let name = body[..open].trim();
        let args: Vec<&str> = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::trim).collect()
        };

        Ok(BoostDefinition {
            condition,
            kind: parse_kind(name, &args)?,
        })
    }
}

impl TryFrom<String> for BoostDefinition {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Predicate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_predicate(s)
    }
}

impl TryFrom<String> for Predicate {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_predicate(&value)
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// Index of the `)` closing an already-opened parenthesis.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_kind(name: &str, args: &[&str]) -> Result<BoostKind, ParseError> {
    let arity = |expected: &'static str, ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(ParseError::Arity {
                name: name.to_string(),
                expected,
                found: args.len(),
            })
        }
    };
    let arg = |index: usize| Arg { name, raw: args[index] };

    let kind = match name {
        "AC" => {
            arity("1", args.len() == 1)?;
            BoostKind::ArmorClass(arg(0).int()?)
        }
        "Ability" => {
            arity("2", args.len() == 2)?;
            BoostKind::Ability {
                ability: arg(0).parsed()?,
                amount: arg(1).int()?,
            }
        }
        "RollBonus" => {
            arity("2", args.len() == 2)?;
            BoostKind::RollBonus {
                roll: arg(0).parsed()?,
                formula: args[1].parse::<DiceFormula>()?,
            }
        }
        "Advantage" | "Disadvantage" => {
            arity("1 or 2", matches!(args.len(), 1 | 2))?;
            let roll: RollType = arg(0).parsed()?;
            let ability = match args.get(1) {
                Some(_) => Some(arg(1).parsed()?),
                None => None,
            };
            if name == "Advantage" {
                BoostKind::Advantage { roll, ability }
            } else {
                BoostKind::Disadvantage { roll, ability }
            }
        }
        "Resistance" => {
            arity("2", args.len() == 2)?;
            BoostKind::Resistance {
                damage_type: arg(0).parsed()?,
                level: arg(1).parsed()?,
            }
        }
        "DamageBonus" => {
            arity("1 or 2", matches!(args.len(), 1 | 2))?;
            let damage_type = match args.get(1) {
                Some(_) => Some(arg(1).parsed()?),
                None => None,
            };
            BoostKind::DamageBonus {
                formula: args[0].parse::<DiceFormula>()?,
                damage_type,
            }
        }
        "CriticalHit" => {
            arity("2", args.len() == 2)?;
            BoostKind::CriticalHit {
                roll: arg(0).parsed()?,
                policy: arg(1).parsed::<CriticalPolicy>()?,
            }
        }
        "ReduceCriticalAttackThreshold" => {
            arity("1", args.len() == 1)?;
            BoostKind::ReduceCriticalAttackThreshold(arg(0).parsed()?)
        }
        "ActionResourceBlock" => {
            arity("1", args.len() == 1)?;
            BoostKind::ActionResourceBlock(arg(0).parsed()?)
        }
        "ActionResourceMultiplier" => {
            arity("2", args.len() == 2)?;
            BoostKind::ActionResourceMultiplier {
                resource: arg(0).parsed()?,
                percent: arg(1).parsed()?,
            }
        }
        "ActionResource" => {
            arity("2", args.len() == 2)?;
            BoostKind::ActionResource {
                resource: arg(0).parsed()?,
                amount: arg(1).int()?,
            }
        }
        "Speed" => {
            arity("1", args.len() == 1)?;
            BoostKind::Speed(arg(0).int()?)
        }
        "MaximumHP" => {
            arity("1", args.len() == 1)?;
            BoostKind::MaximumHp(arg(0).int()?)
        }
        "Initiative" => {
            arity("1", args.len() == 1)?;
            BoostKind::Initiative(arg(0).int()?)
        }
        "SpellSaveDC" => {
            arity("1", args.len() == 1)?;
            BoostKind::SpellSaveDc(arg(0).int()?)
        }
        "StatusImmunity" => {
            arity("1", args.len() == 1)?;
            BoostKind::StatusImmunity(unquote(args[0]).to_string())
        }
        "AutoFail" => {
            arity("1", args.len() == 1)?;
            BoostKind::AutoFail(arg(0).parsed()?)
        }
        _ => {
            return Err(ParseError::UnknownBoost {
                name: name.to_string(),
            });
        }
    };
    Ok(kind)
}

struct Arg<'a> {
    name: &'a str,
    raw: &'a str,
}

impl Arg<'_> {
    fn invalid(&self) -> ParseError {
        ParseError::InvalidArgument {
            name: self.name.to_string(),
            argument: self.raw.to_string(),
        }
    }

    fn int(&self) -> Result<i32, ParseError> {
        self.raw.parse().map_err(|_| self.invalid())
    }

    fn parsed<T: FromStr>(&self) -> Result<T, ParseError> {
        unquote(self.raw).parse().map_err(|_| self.invalid())
    }
}

fn unquote(raw: &str) -> &str {
    raw.trim_matches(|c| c == '\'' || c == '"')
}

// ============================================================================
// Predicate Parsing
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Number(u32),
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            ',' => tokens.push(Token::Comma),
            '\'' | '"' => {
                let mut value = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == c {
                        closed = true;
                        break;
                    }
                    value.push(next);
                }
                if !closed {
                    return Err(syntax(input, "unterminated string"));
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !next.is_ascii_digit() {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let number = input[start..end]
                    .parse()
                    .map_err(|_| syntax(input, "number out of range"))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_') {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Ident(input[start..end].to_string()));
            }
            _ => return Err(syntax(input, "unexpected character in condition")),
        }
    }
    Ok(tokens)
}

struct PredicateParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl PredicateParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case(word))
    }

    fn or(&mut self) -> Result<Predicate, ParseError> {
        let mut lhs = self.and()?;
        while self.keyword("or") {
            self.pos += 1;
            let rhs = self.and()?;
            lhs = Predicate::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Predicate, ParseError> {
        let mut lhs = self.unary()?;
        while self.keyword("and") {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Predicate::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Predicate, ParseError> {
        if self.keyword("not") {
            self.pos += 1;
            return Ok(Predicate::Not(Box::new(self.unary()?)));
        }
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(syntax(self.input, "expected ')'")),
                }
            }
            Some(Token::Ident(name)) => self.call(name),
            _ => Err(syntax(self.input, "expected a condition")),
        }
    }

    fn call(&mut self, name: String) -> Result<Predicate, ParseError> {
        if self.next() != Some(Token::LParen) {
            return Err(syntax(self.input, "expected '(' after function name"));
        }
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
        } else {
            loop {
                match self.next() {
                    Some(token @ (Token::Str(_) | Token::Number(_) | Token::Ident(_))) => {
                        args.push(token)
                    }
                    _ => return Err(syntax(self.input, "expected an argument")),
                }
                match self.next() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    _ => return Err(syntax(self.input, "expected ',' or ')'")),
                }
            }
        }
        build_call(name, args)
    }
}

fn build_call(name: String, args: Vec<Token>) -> Result<Predicate, ParseError> {
    let arity = |expected: &'static str, ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(ParseError::Arity {
                name: name.clone(),
                expected,
                found: args.len(),
            })
        }
    };
    let text_arg = || match &args[0] {
        Token::Str(value) | Token::Ident(value) => Ok(value.clone()),
        other => Err(ParseError::InvalidArgument {
            name: name.clone(),
            argument: format!("{other:?}"),
        }),
    };
    let number_arg = || match &args[0] {
        Token::Number(value) => Ok(*value),
        other => Err(ParseError::InvalidArgument {
            name: name.clone(),
            argument: format!("{other:?}"),
        }),
    };

    let predicate = match name.as_str() {
        "IsMeleeAttack" | "IsRangedAttack" | "IsSpell" | "IsWeaponAttack" | "IsConcentrating"
        | "IsCritical" => {
            arity("0", args.is_empty())?;
            match name.as_str() {
                "IsMeleeAttack" => Predicate::IsMeleeAttack,
                "IsRangedAttack" => Predicate::IsRangedAttack,
                "IsSpell" => Predicate::IsSpell,
                "IsWeaponAttack" => Predicate::IsWeaponAttack,
                "IsConcentrating" => Predicate::IsConcentrating,
                _ => Predicate::IsCritical,
            }
        }
        "HasStatus" | "TargetHasStatus" | "SourceHasStatus" => {
            arity("1", args.len() == 1)?;
            let id = text_arg()?;
            match name.as_str() {
                "HasStatus" => Predicate::HasStatus(id),
                "TargetHasStatus" => Predicate::TargetHasStatus(id),
                _ => Predicate::SourceHasStatus(id),
            }
        }
        "HpBelowPercent" => {
            arity("1", args.len() == 1)?;
            Predicate::HpBelowPercent(number_arg()?)
        }
        "WithinDistance" => {
            arity("1", args.len() == 1)?;
            Predicate::WithinDistance(number_arg()?)
        }
        _ => {
            let rendered: Vec<String> = args
                .iter()
                .map(|token| match token {
                    Token::Str(value) => format!("'{value}'"),
                    Token::Ident(value) => value.clone(),
                    Token::Number(value) => value.to_string(),
                    _ => String::new(),
                })
                .collect();
            Predicate::Unrecognized(format!("{name}({})", rendered.join(",")))
        }
    };
    Ok(predicate)
}
