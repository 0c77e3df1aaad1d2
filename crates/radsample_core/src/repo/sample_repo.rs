//! SQLite-backed sample repository.
//!
//! # Responsibility
//! - Keep SQL for the `samples` table inside the persistence boundary.
//! - Assign record ids through `AUTOINCREMENT` so deleted ids are never reused.
//!
//! # Invariants
//! - Construction fails unless the connection is migrated to the latest schema.
//! - Read paths reject rows that violate `Record` invariants (`CorruptRecord`).
//! - `create_batch` runs each batch in one transaction; a failing insert only
//!   rolls back its own statement.

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::record::{Record, RecordFields};
use crate::model::stored::{RecordId, StoredRecord};
use crate::repo::{
    BatchFailure, BatchOutcome, FilterField, ListQuery, RecordRepository, RepoError, RepoResult,
};
use log::{info, warn};
use rusqlite::types::{FromSql, Value};
use rusqlite::{params, params_from_iter, Connection, Row};

const SAMPLES_TABLE: &str = "samples";

const SAMPLE_COLUMNS: [&str; 12] = [
    "id",
    "sample_category",
    "sample_subtype",
    "period_start",
    "period_end",
    "station_name",
    "region",
    "activity",
    "activity_error",
    "activity_per_calcium",
    "created_at",
    "updated_at",
];

const SAMPLE_SELECT_SQL: &str = "SELECT
    id,
    sample_category,
    sample_subtype,
    period_start,
    period_end,
    station_name,
    region,
    activity,
    activity_error,
    activity_per_calcium,
    created_at,
    updated_at
FROM samples";

const SAMPLE_INSERT_SQL: &str = "INSERT INTO samples (
    sample_category,
    sample_subtype,
    period_start,
    period_end,
    station_name,
    region,
    activity,
    activity_error,
    activity_per_calcium
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);";

/// Relational record store over a caller-owned connection.
pub struct SqliteSampleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSampleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_samples(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut samples = Vec::new();
        while let Some(row) = rows.next()? {
            samples.push(parse_sample_row(row)?);
        }
        Ok(samples)
    }
}

impl RecordRepository for SqliteSampleRepository<'_> {
    fn create(&mut self, record: &Record) -> RepoResult<RecordId> {
        insert_sample(self.conn, record)
    }

    fn create_batch(&mut self, records: &[Record]) -> RepoResult<BatchOutcome> {
        let tx = self.conn.unchecked_transaction()?;
        let mut outcome = BatchOutcome::default();

        for (index, record) in records.iter().enumerate() {
            match insert_sample(&tx, record) {
                Ok(id) => outcome.created.push(id),
                Err(error) => {
                    warn!(
                        "event=sample_insert module=repo status=error batch_index={} error={}",
                        index, error
                    );
                    outcome.failures.push(BatchFailure { index, error });
                }
            }
        }

        tx.commit()?;
        Ok(outcome)
    }

    fn read_by_id(&self, id: RecordId) -> RepoResult<Option<StoredRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SAMPLE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_sample_row(row)?));
        }
        Ok(None)
    }

    fn read_all(&self, query: &ListQuery) -> RepoResult<Vec<StoredRecord>> {
        let mut sql = format!("{SAMPLE_SELECT_SQL} ORDER BY id ASC");
        let mut bind_values = Vec::new();

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.query_samples(&sql, bind_values)
    }

    fn read_by_field(&self, field: FilterField, value: &str) -> RepoResult<Vec<StoredRecord>> {
        let sql = format!(
            "{SAMPLE_SELECT_SQL} WHERE {} = ? ORDER BY id ASC",
            filter_column(field)
        );
        self.query_samples(&sql, vec![Value::Text(value.to_string())])
    }

    fn update(&mut self, id: RecordId, record: &Record) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE samples
             SET
                sample_category = ?1,
                sample_subtype = ?2,
                period_start = ?3,
                period_end = ?4,
                station_name = ?5,
                region = ?6,
                activity = ?7,
                activity_error = ?8,
                activity_per_calcium = ?9,
                updated_at = (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             WHERE id = ?10;",
            params![
                record.sample_category(),
                record.sample_subtype(),
                record.period_start(),
                record.period_end(),
                record.station_name(),
                record.region(),
                record.activity(),
                record.activity_error(),
                record.activity_per_calcium(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete(&mut self, id: RecordId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM samples WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn distinct_values(&self, field: FilterField) -> RepoResult<Vec<String>> {
        let column = filter_column(field);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT {column} FROM samples ORDER BY {column} ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push(row.get(0)?);
        }
        Ok(values)
    }

    fn count(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM samples;", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| RepoError::CorruptRecord {
            id: None,
            message: format!("negative row count {count}"),
        })
    }

    fn clear(&mut self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM samples;", [])?;
        info!("event=samples_clear module=repo status=ok removed={removed}");
        Ok(removed)
    }
}

fn insert_sample(conn: &Connection, record: &Record) -> RepoResult<RecordId> {
    conn.execute(
        SAMPLE_INSERT_SQL,
        params![
            record.sample_category(),
            record.sample_subtype(),
            record.period_start(),
            record.period_end(),
            record.station_name(),
            record.region(),
            record.activity(),
            record.activity_error(),
            record.activity_per_calcium(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn filter_column(field: FilterField) -> &'static str {
    field.record_field().as_str()
}

fn parse_sample_row(row: &Row<'_>) -> RepoResult<StoredRecord> {
    let id: RecordId = row.get("id")?;
    let fields = RecordFields {
        sample_category: column(row, id, "sample_category")?,
        sample_subtype: column(row, id, "sample_subtype")?,
        period_start: column(row, id, "period_start")?,
        period_end: column(row, id, "period_end")?,
        station_name: column(row, id, "station_name")?,
        region: column(row, id, "region")?,
        activity: column(row, id, "activity")?,
        activity_error: column(row, id, "activity_error")?,
        activity_per_calcium: column(row, id, "activity_per_calcium")?,
    };
    let record = Record::try_from_fields(fields).map_err(|err| RepoError::CorruptRecord {
        id: Some(id),
        message: err.to_string(),
    })?;

    Ok(StoredRecord {
        id,
        record,
        created_at: column(row, id, "created_at")?,
        updated_at: column(row, id, "updated_at")?,
    })
}

fn column<T: FromSql>(row: &Row<'_>, id: RecordId, name: &'static str) -> RepoResult<T> {
    row.get(name).map_err(|err| match err {
        rusqlite::Error::InvalidColumnType(..) | rusqlite::Error::FromSqlConversionFailure(..) => {
            RepoError::CorruptRecord {
                id: Some(id),
                message: format!("invalid value in samples.{name}: {err}"),
            }
        }
        other => RepoError::from(other),
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, SAMPLES_TABLE)? {
        return Err(RepoError::MissingRequiredTable(SAMPLES_TABLE));
    }

    for column in SAMPLE_COLUMNS {
        if !table_has_column(conn, SAMPLES_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: SAMPLES_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
