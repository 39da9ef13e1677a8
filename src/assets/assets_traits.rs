use async_trait::async_trait;
use std::collections::HashSet;

use crate::assets::assets_errors::Result;
use crate::assets::assets_model::{Asset, AssetProfile};

pub trait AssetRepositoryTrait: Send + Sync {
    fn get_asset(&self, symbol: &str) -> Result<Asset>;
    fn get_registered_symbols(&self) -> Result<HashSet<String>>;
    fn insert_assets(&self, assets: &[Asset]) -> Result<usize>;
    fn apply_profile(&self, profile: &AssetProfile) -> Result<()>;
    /// Re-applies user sector overrides over a freshly synced sector.
    fn restore_sector_overrides(&self) -> Result<usize>;
}

#[async_trait]
pub trait AssetServiceTrait: Send + Sync {
    /// Registers every symbol in `symbols` that has no asset row yet.
    /// Returns the newly registered symbols.
    async fn ensure_assets_registered(&self, symbols: &HashSet<String>) -> Result<Vec<String>>;

    /// Writes synced company profiles onto the registry.
    async fn apply_profiles(&self, profiles: &[AssetProfile]) -> Result<()>;

    /// Restores user-assigned sector tags clobbered by a metadata sync.
    async fn restore_category_tags(&self) -> Result<usize>;
}
