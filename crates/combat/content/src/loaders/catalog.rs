//! Action, status, reaction and passive catalog loader.

use std::path::Path;

use anyhow::Context;
use combat_core::{
    ActionDefinition, Catalog, PassiveDefinition, ReactionDefinition, StatusDefinition,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// `actions.ron` structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionFile {
    pub actions: Vec<ActionDefinition>,
}

/// `statuses.ron` structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFile {
    pub statuses: Vec<StatusDefinition>,
}

/// `reactions.ron` structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionFile {
    pub reactions: Vec<ReactionDefinition>,
}

/// `passives.ron` structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassiveFile {
    pub passives: Vec<PassiveDefinition>,
}

/// Raw catalog texts, one RON document per definition kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogSources<'a> {
    pub actions: &'a str,
    pub statuses: Option<&'a str>,
    pub reactions: Option<&'a str>,
    pub passives: Option<&'a str>,
}

/// Loader for the content catalog from RON files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Parse and cross-validate a catalog.
    ///
    /// Dice formulas and boost strings are parsed while deserializing; ids
    /// are checked for duplicates and dangling references afterwards.
    pub fn from_sources(sources: CatalogSources<'_>) -> LoadResult<Catalog> {
        let actions: ActionFile = parse_ron(sources.actions, "action catalog")?;
        let statuses = match sources.statuses {
            Some(text) => parse_ron::<StatusFile>(text, "status catalog")?.statuses,
            None => Vec::new(),
        };
        let reactions = match sources.reactions {
            Some(text) => parse_ron::<ReactionFile>(text, "reaction catalog")?.reactions,
            None => Vec::new(),
        };
        let passives = match sources.passives {
            Some(text) => parse_ron::<PassiveFile>(text, "passive catalog")?.passives,
            None => Vec::new(),
        };

        let catalog = Catalog::new(actions.actions, statuses, reactions, passives)
            .context("Invalid combat catalog")?;
        tracing::debug!(
            actions = catalog.actions().count(),
            statuses = catalog.statuses().count(),
            reactions = catalog.reactions().count(),
            passives = catalog.passives().count(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Load a catalog from a directory.
    ///
    /// `actions.ron` is required. `statuses.ron`, `reactions.ron` and
    /// `passives.ron` are optional and count as empty when absent.
    pub fn load_dir(dir: &Path) -> LoadResult<Catalog> {
        let actions = read_file(&dir.join("actions.ron"))?;
        let statuses = read_optional(&dir.join("statuses.ron"))?;
        let reactions = read_optional(&dir.join("reactions.ron"))?;
        let passives = read_optional(&dir.join("passives.ron"))?;

        Self::from_sources(CatalogSources {
            actions: &actions,
            statuses: statuses.as_deref(),
            reactions: reactions.as_deref(),
            passives: passives.as_deref(),
        })
        .with_context(|| format!("Failed to load catalog from {}", dir.display()))
    }
}

pub(crate) fn parse_ron<T: DeserializeOwned>(text: &str, what: &str) -> LoadResult<T> {
    ron::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse {} RON: {}", what, e))
}

fn read_optional(path: &Path) -> LoadResult<Option<String>> {
    if path.exists() {
        read_file(path).map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{ActionCategory, ActionRoll, EffectKind};

    const ACTIONS: &str = r#"(
        actions: [
            (
                id: "slash",
                category: MeleeWeapon,
                cost: (action: 1),
                roll: Attack(ability: Fixed(Strength), bonus: 1),
                effects: [(kind: DealDamage((formula: "1d6+STR", damage_type: Slashing)))],
            ),
            (
                id: "taunt",
                category: Ability,
                cost: (bonus_action: 1),
                effects: [(kind: ApplyStatus((status: "TAUNTED", duration: Some(1))))],
            ),
        ],
    )"#;

    const STATUSES: &str = r#"(
        statuses: [
            (id: "TAUNTED", flags: "DEBUFF", boosts: ["Disadvantage(AttackRoll)"]),
        ],
    )"#;

    #[test]
    fn parses_definitions_with_defaults() {
        let catalog = CatalogLoader::from_sources(CatalogSources {
            actions: ACTIONS,
            statuses: Some(STATUSES),
            ..CatalogSources::default()
        })
        .unwrap();

        let slash = catalog.action("slash").unwrap();
        assert_eq!(slash.category, ActionCategory::MeleeWeapon);
        assert!(matches!(
            slash.roll,
            ActionRoll::Attack {
                proficient: true,
                bonus: 1,
                ..
            }
        ));
        assert!(matches!(slash.effects[0].kind, EffectKind::DealDamage(_)));
        assert_eq!(slash.targeting.range, 5);

        let taunted = catalog.status("TAUNTED").unwrap();
        assert_eq!(taunted.boosts.len(), 1);
    }

    #[test]
    fn dangling_status_is_rejected() {
        let err = CatalogLoader::from_sources(CatalogSources {
            actions: ACTIONS,
            ..CatalogSources::default()
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("TAUNTED"));
    }

    #[test]
    fn bad_formula_fails_to_parse() {
        let text = r#"(actions: [(id: "x", category: Ability,
            effects: [(kind: Heal((formula: "2d")))])])"#;
        let err = CatalogLoader::from_sources(CatalogSources {
            actions: text,
            ..CatalogSources::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("action catalog"));
    }
}
