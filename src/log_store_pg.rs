use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::config::AppConfig;
use crate::cursor::Cursor;
use crate::errors::StoreError;
use crate::log_record::LogRecord;
use crate::log_store::{LogStore, StoreResult};
use crate::query_builder::{Projection, RangeQuery, SqlStatement, SqlValue};
use crate::sort::SortField;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS logs (
        id serial PRIMARY KEY,
        type SMALLINT NOT NULL,
        message TEXT NOT NULL,
        ts TIMESTAMP DEFAULT clock_timestamp()
    )",
    "CREATE INDEX IF NOT EXISTS ts_index ON logs (ts)",
    "CREATE INDEX IF NOT EXISTS ts_type_index ON logs (ts, type)",
];

/// A Postgres-backed implementation of LogStore over a shared connection pool.
#[derive(Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &AppConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the logs table and its indexes if they are missing.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("logs schema is in place");
        Ok(())
    }

    pub async fn insert(&self, log_type: u16, message: &str) -> StoreResult<u64> {
        let log_type = i16::try_from(log_type)
            .map_err(|_| StoreError::decode("type", format!("{log_type} exceeds smallint")))?;
        let id: i32 = sqlx::query_scalar("INSERT INTO logs (type, message) VALUES ($1, $2) RETURNING id")
            .bind(log_type)
            .bind(message)
            .fetch_one(&self.pool)
            .await?;
        to_unsigned("id", i64::from(id))
    }

    async fn fetch_optional_row(&self, query: &RangeQuery) -> StoreResult<Option<PgRow>> {
        let statement = query.to_sql();
        trace_statement(&statement);
        Ok(bind_values(sqlx::query(&statement.sql), &statement.binds)
            .fetch_optional(&self.pool)
            .await?)
    }
}

fn trace_statement(statement: &SqlStatement) {
    tracing::debug!(sql = %statement.sql, binds = statement.binds.len(), "executing log query");
}

fn bind_values<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    binds: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for value in binds {
        query = match value {
            SqlValue::Integer(n) => query.bind(*n),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Timestamp(ts) => query.bind(ts.naive_utc()),
        };
    }
    query
}

fn to_unsigned(column: &str, value: i64) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::decode(column, format!("negative value {value}")))
}

fn map_row(row: &PgRow) -> StoreResult<LogRecord> {
    let id: i32 = row.try_get("id")?;
    let log_type: i16 = row.try_get("type")?;
    let message: String = row.try_get("message")?;
    let ts: Option<NaiveDateTime> = row.try_get("ts")?;
    let ts = ts.ok_or_else(|| StoreError::decode("ts", "null timestamp"))?;

    let created_at = match row.try_get::<Option<NaiveDateTime>, _>("created_at") {
        Ok(value) => value.map(|v| v.and_utc()),
        Err(sqlx::Error::ColumnNotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(LogRecord {
        id: to_unsigned("id", i64::from(id))?,
        ts: ts.and_utc(),
        log_type: u16::try_from(log_type)
            .map_err(|_| StoreError::decode("type", format!("negative value {log_type}")))?,
        message,
        created_at,
    })
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn fetch_records(&self, query: &RangeQuery) -> StoreResult<Vec<LogRecord>> {
        let statement = query.to_sql();
        trace_statement(&statement);
        let rows = bind_values(sqlx::query(&statement.sql), &statement.binds)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_row).collect()
    }

    async fn fetch_count(&self, query: &RangeQuery) -> StoreResult<Option<u64>> {
        match self.fetch_optional_row(query).await? {
            Some(row) => {
                let count: i64 = row.try_get(0)?;
                Ok(Some(to_unsigned("count", count)?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_sort_value(&self, query: &RangeQuery) -> StoreResult<Option<Cursor>> {
        let Projection::Column(field) = query.projection else {
            return Err(StoreError::decode("projection", "expected a single sort column"));
        };
        let Some(row) = self.fetch_optional_row(query).await? else {
            return Ok(None);
        };
        let cursor = match field {
            SortField::Id => {
                let id: i32 = row.try_get(0)?;
                Cursor::Integer(to_unsigned("id", i64::from(id))?)
            }
            SortField::Ts => {
                let ts: Option<NaiveDateTime> = row.try_get(0)?;
                let ts = ts.ok_or_else(|| StoreError::decode("ts", "null timestamp"))?;
                Cursor::Timestamp(ts.and_utc())
            }
        };
        Ok(Some(cursor))
    }
}
