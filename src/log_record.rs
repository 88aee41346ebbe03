use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::query_builder::{Column, SqlValue};
use crate::sort::SortField;

/// One row of the `logs` table.
///
/// `id` is assigned by the store and is the only strictly monotonic key;
/// `ts` defaults to the store's insertion clock and may tie under
/// concurrent writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: u64,
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub log_type: u16,
    pub message: String,
    /// Audit timestamp, present only where the table carries the column.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LogRecord {
    /// The cursor that resumes a scan right after this row.
    pub fn boundary_cursor(&self, field: SortField) -> Cursor {
        match field {
            SortField::Id => Cursor::Integer(self.id),
            SortField::Ts => Cursor::Timestamp(self.ts),
        }
    }

    pub fn column_value(&self, column: Column) -> SqlValue {
        match column {
            Column::Id => SqlValue::Integer(i64::try_from(self.id).unwrap_or(i64::MAX)),
            Column::Type => SqlValue::Integer(i64::from(self.log_type)),
            Column::Message => SqlValue::Text(self.message.clone()),
            Column::Ts => SqlValue::Timestamp(self.ts),
        }
    }
}

/// First/last boundary values of a page, for building previous/next links.
pub fn page_bounds(rows: &[LogRecord], field: SortField) -> Option<(Cursor, Cursor)> {
    let first = rows.first()?;
    let last = rows.last()?;
    Some((first.boundary_cursor(field), last.boundary_cursor(field)))
}
