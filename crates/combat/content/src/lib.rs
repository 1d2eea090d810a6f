//! Data-driven combat content and loaders.
//!
//! This crate houses the default content pack and loaders for data files:
//! - Action, status, reaction and passive catalogs (RON)
//! - Resource pool defaults (RON)
//! - Combat configuration (TOML)
//! - Battle scenarios (JSON)
//!
//! Content is resolved into a [`combat_core::Catalog`] once and never appears
//! in combat state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub mod pack;

#[cfg(feature = "loaders")]
pub use loaders::{
    CatalogLoader, CatalogSources, ConfigLoader, ContentFactory, LoadResult, PoolTemplate, ResourceTable,
    Scenario, ScenarioLoader, ScenarioUnit,
};
