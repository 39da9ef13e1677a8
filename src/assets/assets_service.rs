use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;

use crate::assets::assets_errors::Result;
use crate::assets::assets_model::{Asset, AssetProfile};
use crate::assets::assets_traits::{AssetRepositoryTrait, AssetServiceTrait};

#[derive(Clone)]
pub struct AssetService {
    repository: Arc<dyn AssetRepositoryTrait>,
}

impl AssetService {
    pub fn new(repository: Arc<dyn AssetRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl AssetServiceTrait for AssetService {
    async fn ensure_assets_registered(&self, symbols: &HashSet<String>) -> Result<Vec<String>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let registered = self.repository.get_registered_symbols()?;
        let mut missing: Vec<String> = symbols.difference(&registered).cloned().collect();
        missing.sort();

        if missing.is_empty() {
            debug!("Symbol universe already complete ({} symbols)", symbols.len());
            return Ok(Vec::new());
        }

        let new_assets: Vec<Asset> = missing
            .iter()
            .map(|sym| Asset::new_registration(sym))
            .collect();
        self.repository.insert_assets(&new_assets)?;
        info!("Registered {} new symbols: {:?}", missing.len(), missing);

        Ok(missing)
    }

    async fn apply_profiles(&self, profiles: &[AssetProfile]) -> Result<()> {
        for profile in profiles {
            self.repository.apply_profile(profile)?;
        }
        debug!("Applied {} company profiles", profiles.len());
        Ok(())
    }

    async fn restore_category_tags(&self) -> Result<usize> {
        let restored = self.repository.restore_sector_overrides()?;
        if restored > 0 {
            debug!("Restored sector tags on {} assets", restored);
        }
        Ok(restored)
    }
}
