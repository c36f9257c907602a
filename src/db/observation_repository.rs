use chrono::NaiveDate;
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::SourceDescriptor;
use crate::db::{
    DbError, ExportFormat, ExportRow, GroupCount, Observation, ObservationFilter, ProvenanceEntry,
    StoreSummary, UpsertReport,
};
use crate::observation::ObservationRecord;

const UPSERT_OBSERVATION: &str = r#"
    INSERT INTO observations
        (variable_id, region_code, year, period_kind, value,
         original_value, original_unit, confidence, notes)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (variable_id, region_code, year, period_kind) DO UPDATE SET
        value = excluded.value,
        confidence = excluded.confidence,
        notes = excluded.notes
    RETURNING id
"#;

const INSERT_PROVENANCE: &str = r#"
    INSERT INTO provenance
        (observation_id, source_name, source_type, source_url, source_page,
         extraction_method, extraction_date, notes)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const OBSERVATION_COLUMNS: &str = "SELECT id, variable_id, region_code, year, period_kind, value, \
     original_value, original_unit, confidence, notes FROM observations WHERE 1 = 1";

/// Where a batch of records came from, recorded once per written record
#[derive(Debug, Clone)]
pub struct ProvenanceContext {
    pub source: SourceDescriptor,
    pub extraction_method: String,
    pub extraction_date: NaiveDate,
    pub notes: Option<String>,
}

impl ProvenanceContext {
    pub fn scrape(source: SourceDescriptor, extraction_date: NaiveDate) -> Self {
        Self {
            source,
            extraction_method: "scrape".to_string(),
            extraction_date,
            notes: None,
        }
    }
}

#[derive(Clone)]
pub struct ObservationRepository {
    pool: SqlitePool,
}

impl ObservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update one observation by natural key and append a provenance row
    ///
    /// Returns the observation id.
    #[instrument(skip(self, record, provenance), fields(key = %record.key()))]
    pub async fn upsert(
        &self,
        record: &ObservationRecord,
        provenance: &ProvenanceContext,
    ) -> Result<i64, DbError> {
        let mut tx = self.pool.begin().await?;
        let id = upsert_in(&mut tx, record, provenance).await.map_err(|e| {
            error!(
                variable_id = %record.variable_id,
                region = %record.region,
                year = record.year,
                error = %e,
                "Failed to upsert observation"
            );
            e
        })?;
        tx.commit().await?;
        Ok(id)
    }

    /// Upsert many records in one transaction
    ///
    /// Each record runs inside its own savepoint. A record that fails is rolled
    /// back, logged with its natural key, and counted; the rest still commit.
    #[instrument(skip(self, records, provenance), fields(count = records.len(), source = provenance.source.name))]
    pub async fn upsert_batch(
        &self,
        records: &[ObservationRecord],
        provenance: &ProvenanceContext,
    ) -> Result<UpsertReport, DbError> {
        debug!("Beginning transaction to upsert {} records", records.len());
        let mut tx = self.pool.begin().await?;
        let mut report = UpsertReport::default();

        for record in records {
            let mut savepoint = Connection::begin(&mut *tx).await?;
            match upsert_in(&mut savepoint, record, provenance).await {
                Ok(_) => {
                    savepoint.commit().await?;
                    report.written += 1;
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    report.failed += 1;
                    warn!(
                        variable_id = %record.variable_id,
                        region = %record.region,
                        year = record.year,
                        period_kind = %record.period_kind,
                        error = %e,
                        "Skipping observation that failed to store"
                    );
                }
            }
        }

        tx.commit().await?;
        info!(
            "Upserted {} observations, {} failed",
            report.written, report.failed
        );
        Ok(report)
    }

    /// Observations matching `filter`, ordered by year then region
    #[instrument(skip(self))]
    pub async fn query(&self, filter: &ObservationFilter) -> Result<Vec<Observation>, DbError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(OBSERVATION_COLUMNS);

        if let Some(variable_id) = &filter.variable_id {
            qb.push(" AND variable_id = ").push_bind(variable_id.clone());
        }
        if let Some(region) = &filter.region {
            qb.push(" AND region_code = ").push_bind(region.clone());
        }
        if let Some(period_kind) = filter.period_kind {
            qb.push(" AND period_kind = ").push_bind(period_kind.as_str());
        }
        if let Some(from_year) = filter.from_year {
            qb.push(" AND year >= ").push_bind(from_year);
        }
        if let Some(to_year) = filter.to_year {
            qb.push(" AND year <= ").push_bind(to_year);
        }
        qb.push(" ORDER BY year, region_code, period_kind");

        let observations = qb
            .build_query_as::<Observation>()
            .fetch_all(&self.pool)
            .await?;

        debug!("Found {} observations", observations.len());
        Ok(observations)
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM observations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Every provenance row recorded for an observation, oldest first
    pub async fn provenance_for(&self, observation_id: i64) -> Result<Vec<ProvenanceEntry>, DbError> {
        let entries = sqlx::query_as::<_, ProvenanceEntry>(
            r#"
            SELECT id, observation_id, source_name, source_type, source_url, source_page,
                   extraction_method, extraction_date, notes
            FROM provenance
            WHERE observation_id = ?
            ORDER BY id
            "#,
        )
        .bind(observation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// The joined observation/variable/region view, sorted by year, region, category, variable
    #[instrument(skip(self))]
    pub async fn export_rows(&self) -> Result<Vec<ExportRow>, DbError> {
        let rows = sqlx::query_as::<_, ExportRow>(
            r#"
            SELECT o.year, o.period_kind AS year_type, r.region_name, o.region_code,
                   v.category, o.variable_id, v.variable_name, o.value, v.unit,
                   o.confidence, o.original_value, o.original_unit, o.notes
            FROM observations o
            JOIN variable_definitions v ON o.variable_id = v.variable_id
            JOIN regions r ON o.region_code = r.region_code
            ORDER BY o.year, o.region_code, v.category, o.variable_id, o.period_kind
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Write the flat export to `path`, creating parent directories
    ///
    /// Returns the number of rows written.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn export(&self, format: ExportFormat, path: &Path) -> Result<usize, DbError> {
        let rows = self.export_rows().await?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match format {
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)?;
                for row in &rows {
                    writer.serialize(row)?;
                }
                writer.flush()?;
            }
            ExportFormat::Json => {
                let writer = BufWriter::new(File::create(path)?);
                serde_json::to_writer_pretty(writer, &rows)?;
            }
        }

        info!("Exported {} observations to {}", rows.len(), path.display());
        Ok(rows.len())
    }

    /// Counts and year spans by category, variable, region and confidence
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<StoreSummary, DbError> {
        let total = self.count().await?;
        let by_category = self.group_counts("v.category").await?;
        let by_variable = self.group_counts("o.variable_id").await?;
        let by_region = self.group_counts("o.region_code").await?;
        let by_confidence = self.group_counts("o.confidence").await?;

        Ok(StoreSummary {
            total,
            by_category,
            by_variable,
            by_region,
            by_confidence,
        })
    }

    async fn group_counts(&self, column: &'static str) -> Result<Vec<GroupCount>, DbError> {
        let sql = format!(
            r#"
            SELECT {column} AS key, COUNT(*) AS count,
                   MIN(o.year) AS min_year, MAX(o.year) AS max_year
            FROM observations o
            JOIN variable_definitions v ON o.variable_id = v.variable_id
            GROUP BY {column}
            ORDER BY {column}
            "#
        );
        let groups = sqlx::query_as::<_, GroupCount>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(groups)
    }
}

/// Reject records the schema would store wrongly or not at all
fn validate(record: &ObservationRecord) -> Result<f64, DbError> {
    let invalid = |reason: &str| DbError::InvalidRecord {
        key: record.key().to_string(),
        reason: reason.to_string(),
    };

    if record.variable_id.trim().is_empty() {
        return Err(invalid("empty variable id"));
    }
    if record.region.trim().is_empty() {
        return Err(invalid("empty region"));
    }
    match record.value {
        None => Err(invalid("missing value")),
        Some(value) if !value.is_finite() => Err(invalid("non-finite value")),
        Some(value) => Ok(value),
    }
}

async fn upsert_in(
    conn: &mut SqliteConnection,
    record: &ObservationRecord,
    provenance: &ProvenanceContext,
) -> Result<i64, DbError> {
    let value = validate(record)?;

    let id: i64 = sqlx::query_scalar(UPSERT_OBSERVATION)
        .bind(&record.variable_id)
        .bind(&record.region)
        .bind(record.year)
        .bind(record.period_kind.as_str())
        .bind(value)
        .bind(record.original_value)
        .bind(record.original_unit.as_deref())
        .bind(record.confidence.as_str())
        .bind(record.notes.as_deref())
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query(INSERT_PROVENANCE)
        .bind(id)
        .bind(provenance.source.name)
        .bind(provenance.source.source_type)
        .bind(provenance.source.url)
        .bind(record.source_page.as_deref())
        .bind(&provenance.extraction_method)
        .bind(provenance.extraction_date.format("%Y-%m-%d").to_string())
        .bind(provenance.notes.as_deref())
        .execute(&mut *conn)
        .await?;

    Ok(id)
}
