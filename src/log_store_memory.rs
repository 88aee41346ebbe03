//! In-process `LogStore` that evaluates range plans directly against a
//! vector of rows. Backs the test suites and embedders that want paging over
//! rows they already hold; the CLI always talks to Postgres.
//!
//! Rows with equal sort values are ordered by `id` here, while the rendered
//! SQL has no tiebreak and Postgres may return ties in any order.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::RwLock;

use crate::cursor::Cursor;
use crate::log_record::LogRecord;
use crate::log_store::{LogStore, StoreResult};
use crate::query_builder::{Column, Comparison, Operand, Projection, RangeQuery};

#[derive(Default)]
pub struct MemoryLogStore {
    rows: RwLock<Vec<LogRecord>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, assigning the next id. `ts` defaults to now. Timestamps
    /// are kept at microsecond precision, the resolution of a Postgres
    /// `timestamp` and of the cursor text form.
    pub async fn append(
        &self,
        log_type: u16,
        message: impl Into<String>,
        ts: Option<DateTime<Utc>>,
    ) -> LogRecord {
        let mut rows = self.rows.write().await;
        let now = Utc::now().trunc_subsecs(6);
        let record = LogRecord {
            id: rows.last().map_or(1, |r| r.id + 1),
            ts: ts.map_or(now, |ts| ts.trunc_subsecs(6)),
            log_type,
            message: message.into(),
            created_at: Some(now),
        };
        rows.push(record.clone());
        record
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn select(&self, query: &RangeQuery) -> Vec<LogRecord> {
        let rows = self.rows.read().await;
        let mut selected: Vec<LogRecord> = rows
            .iter()
            .filter(|row| query.predicates.iter().all(|p| satisfies(row, p)))
            .cloned()
            .collect();

        if let Some((field, direction)) = query.order {
            let column: Column = field.into();
            selected.sort_by(|a, b| {
                let ord = a
                    .column_value(column)
                    .compare(&b.column_value(column))
                    .unwrap_or(Ordering::Equal)
                    .then(a.id.cmp(&b.id));
                if direction.is_desc() { ord.reverse() } else { ord }
            });
        }

        let offset = query
            .offset
            .map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX));
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        let mut page: Vec<LogRecord> = selected.into_iter().skip(offset).take(limit).collect();

        if query.reorder_ascending {
            page.sort_by_key(|r| r.id);
        }
        page
    }
}

fn satisfies(row: &LogRecord, predicate: &Comparison) -> bool {
    let lhs = row.column_value(predicate.column);
    let ordering = match &predicate.operand {
        Operand::Value(rhs) => match lhs.compare(rhs) {
            Some(ordering) => ordering,
            None => return false,
        },
        Operand::NegInfinity => Ordering::Greater,
        Operand::PosInfinity => Ordering::Less,
    };
    predicate.op.holds(ordering)
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn fetch_records(&self, query: &RangeQuery) -> StoreResult<Vec<LogRecord>> {
        Ok(self.select(query).await)
    }

    async fn fetch_count(&self, query: &RangeQuery) -> StoreResult<Option<u64>> {
        let count = self.select(query).await.len();
        Ok(Some(count as u64))
    }

    async fn fetch_sort_value(&self, query: &RangeQuery) -> StoreResult<Option<Cursor>> {
        let Projection::Column(field) = query.projection else {
            return Ok(None);
        };
        Ok(self
            .select(query)
            .await
            .first()
            .map(|row| row.boundary_cursor(field)))
    }
}
