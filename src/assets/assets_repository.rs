use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::collections::HashSet;
use std::sync::Arc;

use crate::assets::assets_errors::Result;
use crate::assets::assets_model::{Asset, AssetDb, AssetProfile};
use crate::assets::assets_traits::AssetRepositoryTrait;
use crate::schema::assets;
use crate::schema::assets::dsl::*;

pub struct AssetRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AssetRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl AssetRepositoryTrait for AssetRepository {
    fn get_asset(&self, input_symbol: &str) -> Result<Asset> {
        let mut conn = self.pool.get()?;
        let row = assets
            .filter(symbol.eq(input_symbol))
            .first::<AssetDb>(&mut conn)?;
        Ok(Asset::from(row))
    }

    fn get_registered_symbols(&self) -> Result<HashSet<String>> {
        let mut conn = self.pool.get()?;
        let rows = assets.select(symbol).load::<String>(&mut conn)?;
        Ok(rows.into_iter().collect())
    }

    fn insert_assets(&self, new_assets: &[Asset]) -> Result<usize> {
        if new_assets.is_empty() {
            return Ok(0);
        }
        let mut conn = self.pool.get()?;
        let db_models: Vec<AssetDb> = new_assets.iter().cloned().map(AssetDb::from).collect();
        let inserted = diesel::insert_or_ignore_into(assets::table)
            .values(&db_models)
            .execute(&mut conn)?;
        Ok(inserted)
    }

    fn apply_profile(&self, profile: &AssetProfile) -> Result<()> {
        let mut conn = self.pool.get()?;
        diesel::update(assets.filter(symbol.eq(&profile.symbol)))
            .set((
                name.eq(&profile.name),
                sector.eq(&profile.sector),
                profile_synced_at.eq(Some(Utc::now().to_rfc3339())),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn restore_sector_overrides(&self) -> Result<usize> {
        let mut conn = self.pool.get()?;
        let restored = diesel::sql_query(
            "UPDATE assets SET sector = sector_override \
             WHERE sector_override IS NOT NULL AND (sector IS NULL OR sector != sector_override)",
        )
        .execute(&mut conn)?;
        Ok(restored)
    }
}
