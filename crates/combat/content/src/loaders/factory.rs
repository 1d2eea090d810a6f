//! Content factory for loading combat content from data files.

use std::path::{Path, PathBuf};

use combat_core::{Catalog, CombatConfig, CombatState};

use crate::loaders::{
    CatalogLoader, ConfigLoader, LoadResult, ResourceTable, Scenario, ScenarioLoader,
};

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── resources.ron
/// ├── actions.ron
/// ├── statuses.ron
/// ├── reactions.ron
/// ├── passives.ron
/// └── scenarios/
///     └── duel.json
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load combat configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("config.toml");
        ConfigLoader::load(&path)
    }

    /// Load the definition catalog from the RON files of the data directory.
    pub fn load_catalog(&self) -> LoadResult<Catalog> {
        CatalogLoader::load_dir(&self.data_dir)
    }

    /// Load pool defaults from `resources.ron`, empty when the file is absent.
    pub fn load_resources(&self) -> LoadResult<ResourceTable> {
        let path = self.data_dir.join("resources.ron");
        if !path.exists() {
            return Ok(ResourceTable::default());
        }
        ResourceTable::load(&path)
    }

    /// Load `scenarios/{name}.json`.
    pub fn load_scenario(&self, name: &str) -> LoadResult<Scenario> {
        let path = self.data_dir.join("scenarios").join(format!("{}.json", name));
        ScenarioLoader::load(&path)
    }

    /// Build the initial state of a scenario against this directory's catalog.
    pub fn build_scenario(&self, scenario: &Scenario) -> LoadResult<CombatState> {
        let catalog = self.load_catalog()?;
        let resources = self.load_resources()?;
        scenario.build(&catalog, &resources)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
