use async_trait::async_trait;

use crate::cursor::Cursor;
use crate::errors::StoreError;
use crate::log_record::LogRecord;
use crate::query_builder::RangeQuery;

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to the `logs` table.
///
/// Implementations borrow their connection per call and never hold state
/// between calls; each query sees its own snapshot of the table.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Rows selected by a `Projection::Rows` query, in the query's order.
    async fn fetch_records(&self, query: &RangeQuery) -> StoreResult<Vec<LogRecord>>;

    /// Result of a `Projection::Count` query; `None` when the scan yields no row.
    async fn fetch_count(&self, query: &RangeQuery) -> StoreResult<Option<u64>>;

    /// Single sort-field value of a `Projection::Column` query.
    async fn fetch_sort_value(&self, query: &RangeQuery) -> StoreResult<Option<Cursor>>;
}
