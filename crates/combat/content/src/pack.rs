//! Default content pack compiled into the binary.
//!
//! The same files live under `data/` and can be loaded from disk with
//! [`ContentFactory`](crate::ContentFactory); this module saves callers from
//! shipping a data directory.

use combat_core::{Catalog, CombatConfig};

use crate::loaders::{CatalogLoader, CatalogSources, ConfigLoader, LoadResult, ResourceTable};

const ACTIONS: &str = include_str!("../data/actions.ron");
const STATUSES: &str = include_str!("../data/statuses.ron");
const REACTIONS: &str = include_str!("../data/reactions.ron");
const PASSIVES: &str = include_str!("../data/passives.ron");
const RESOURCES: &str = include_str!("../data/resources.ron");
const CONFIG: &str = include_str!("../data/config.toml");

/// The bundled definition catalog.
pub fn catalog() -> LoadResult<Catalog> {
    CatalogLoader::from_sources(CatalogSources {
        actions: ACTIONS,
        statuses: Some(STATUSES),
        reactions: Some(REACTIONS),
        passives: Some(PASSIVES),
    })
}

/// The bundled pool defaults.
pub fn resources() -> LoadResult<ResourceTable> {
    ResourceTable::parse(RESOURCES)
}

pub fn config() -> LoadResult<CombatConfig> {
    ConfigLoader::parse(CONFIG)
}
