use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::catalog::{REGIONS, VARIABLES};
use crate::db::{DbError, RegionRow, VariableDefinition};

/// Regions and variable definitions: seeded from the catalog, read-only to ingest
#[derive(Clone)]
pub struct ReferenceRepository {
    pool: SqlitePool,
}

impl ReferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Seed regions and variable definitions; safe to repeat
    #[instrument(skip(self))]
    pub async fn seed(&self) -> Result<(), DbError> {
        let regions = self.seed_regions().await?;
        let variables = self.seed_variables().await?;
        info!(
            "Reference data ready: {} regions, {} variable definitions",
            regions, variables
        );
        Ok(())
    }

    async fn seed_regions(&self) -> Result<usize, DbError> {
        let mut tx = self.pool.begin().await?;
        for region in REGIONS {
            sqlx::query(
                "INSERT INTO regions (region_code, region_name) VALUES (?, ?) \
                 ON CONFLICT (region_code) DO NOTHING",
            )
            .bind(region.code)
            .bind(region.name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        debug!("Seeded {} regions", REGIONS.len());
        Ok(REGIONS.len())
    }

    /// Definitions are refreshed from the catalog on every seed
    async fn seed_variables(&self) -> Result<usize, DbError> {
        let mut tx = self.pool.begin().await?;
        for variable in VARIABLES {
            sqlx::query(
                r#"
                INSERT INTO variable_definitions
                    (variable_id, category, variable_name, unit, description)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (variable_id) DO UPDATE SET
                    category = excluded.category,
                    variable_name = excluded.variable_name,
                    unit = excluded.unit,
                    description = excluded.description
                "#,
            )
            .bind(variable.id)
            .bind(variable.category)
            .bind(variable.name)
            .bind(variable.unit)
            .bind(variable.description)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        debug!("Seeded {} variable definitions", VARIABLES.len());
        Ok(VARIABLES.len())
    }

    pub async fn variables(&self) -> Result<Vec<VariableDefinition>, DbError> {
        let variables = sqlx::query_as::<_, VariableDefinition>(
            "SELECT variable_id, category, variable_name, unit, description \
             FROM variable_definitions ORDER BY category, variable_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(variables)
    }

    pub async fn regions(&self) -> Result<Vec<RegionRow>, DbError> {
        let regions = sqlx::query_as::<_, RegionRow>(
            "SELECT region_code, region_name FROM regions ORDER BY region_code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(regions)
    }
}
