//! Combat configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse a `CombatConfig` from TOML text. Missing keys keep their defaults.
    pub fn parse(text: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }

    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = ConfigLoader::parse("max_rounds = 20\nmassive_damage = false\n").unwrap();
        assert_eq!(config.max_rounds, 20);
        assert!(!config.massive_damage);
        assert_eq!(config.melee_reach, CombatConfig::DEFAULT_MELEE_REACH);
        assert_eq!(config.max_reaction_depth, CombatConfig::DEFAULT_MAX_REACTION_DEPTH);
    }

    #[test]
    fn wrong_type_is_reported() {
        let err = ConfigLoader::parse("max_rounds = \"many\"").unwrap_err();
        assert!(err.to_string().contains("config TOML"));
    }
}
