//! Read-only collaborators of the kernel.
//!
//! The [`CombatEnv`] aggregate bundles the content catalog, the tunable
//! configuration and the sight oracle so the pipeline can reach everything it
//! needs without owning any of it.

mod catalog;
mod sight;

pub use catalog::{Catalog, CatalogError};
pub use sight::{BlockedTiles, OpenField, SightOracle};

use crate::config::CombatConfig;

#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a CombatConfig,
    pub sight: &'a dyn SightOracle,
}

impl<'a> CombatEnv<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a CombatConfig, sight: &'a dyn SightOracle) -> Self {
        Self {
            catalog,
            config,
            sight,
        }
    }

    /// Open-field environment.
    pub fn open(catalog: &'a Catalog, config: &'a CombatConfig) -> Self {
        Self::new(catalog, config, &OpenField)
    }
}
