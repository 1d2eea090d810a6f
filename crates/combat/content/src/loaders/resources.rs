//! Default resource pool table.

use std::collections::BTreeMap;
use std::path::Path;

use combat_core::{Recharge, ResourcePool};
use serde::{Deserialize, Serialize};

use crate::loaders::catalog::parse_ron;
use crate::loaders::{LoadResult, read_file};

/// Size and recharge of a named pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTemplate {
    pub max: u32,
    pub recharge: Recharge,
}

impl PoolTemplate {
    pub fn full(self) -> ResourcePool {
        ResourcePool::full(self.max, self.recharge)
    }
}

/// `resources.ron` structure: pool name to template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTable {
    #[serde(default)]
    pub pools: BTreeMap<String, PoolTemplate>,
}

impl ResourceTable {
    pub fn parse(text: &str) -> LoadResult<Self> {
        parse_ron(text, "resource table")
    }

    pub fn load(path: &Path) -> LoadResult<Self> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn get(&self, name: &str) -> Option<PoolTemplate> {
        self.pools.get(name).copied()
    }
}
