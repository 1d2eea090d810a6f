//! Content loaders for reading combat data from files.
//!
//! Every loader parses text first (`parse`) and has a thin `load(path)`
//! wrapper, so the embedded pack and on-disk data share one code path.

pub mod catalog;
pub mod config;
pub mod factory;
pub mod resources;
pub mod scenario;

pub use catalog::{CatalogLoader, CatalogSources};
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use resources::{PoolTemplate, ResourceTable};
pub use scenario::{Scenario, ScenarioLoader, ScenarioUnit};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
