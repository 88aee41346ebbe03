//! Keyset cursors.
//!
//! A cursor is the sort-field value of the last row of the previous page.
//! Which variant is valid depends on the active sort field; the text form is
//! what travels through links and query strings.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::{PageError, PageResult};
use crate::query_builder::{Column, CompareOp, Comparison, Operand, SqlValue};
use crate::sort::{SortDirection, SortField, SortSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Start of range: the field/direction default boundary applies.
    #[default]
    Unset,
    Integer(u64),
    Timestamp(DateTime<Utc>),
}

impl Cursor {
    /// Decode the text form under the given sort field. Empty text is `Unset`.
    pub fn decode(raw: &str, field: SortField) -> PageResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Cursor::Unset);
        }
        match field {
            SortField::Id => raw
                .parse::<u64>()
                .map(Cursor::Integer)
                .map_err(|e| PageError::invalid_cursor(raw, e.to_string())),
            SortField::Ts => DateTime::parse_from_rfc3339(raw)
                .map(|ts| Cursor::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| PageError::invalid_cursor(raw, e.to_string())),
        }
    }

    /// Integers as decimal, timestamps as RFC 3339 UTC with microseconds.
    pub fn encode(&self) -> String {
        match self {
            Cursor::Unset => String::new(),
            Cursor::Integer(n) => n.to_string(),
            Cursor::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// The explicit boundary value, checked against the sort field.
    pub(crate) fn bound_value(&self, field: SortField) -> PageResult<Option<SqlValue>> {
        match (self, field) {
            (Cursor::Unset, _) => Ok(None),
            (Cursor::Integer(n), SortField::Id) => i64::try_from(*n)
                .map(|n| Some(SqlValue::Integer(n)))
                .map_err(|_| PageError::invalid_cursor(n.to_string(), "id out of range")),
            (Cursor::Timestamp(ts), SortField::Ts) => Ok(Some(SqlValue::Timestamp(*ts))),
            (cursor, field) => Err(PageError::invalid_cursor(
                cursor.encode(),
                format!("cursor does not match sort field '{field}'"),
            )),
        }
    }

    /// Boundary predicate for a scan in `sort` order: `>` ascending, `<`
    /// descending. An unset cursor falls back to the default boundary; there
    /// is no default for `id` descending, so the predicate is omitted.
    pub fn predicate(&self, sort: &SortSpec) -> PageResult<Option<Comparison>> {
        let op = match sort.direction {
            SortDirection::Asc => CompareOp::Gt,
            SortDirection::Desc => CompareOp::Lt,
        };
        let operand = match self.bound_value(sort.field)? {
            Some(value) => Operand::Value(value),
            None => match Self::default_boundary(sort) {
                Some(operand) => operand,
                None => return Ok(None),
            },
        };
        Ok(Some(Comparison::new(Column::from(sort.field), op, operand)))
    }

    fn default_boundary(sort: &SortSpec) -> Option<Operand> {
        match (sort.field, sort.direction) {
            (SortField::Id, SortDirection::Asc) => Some(Operand::Value(SqlValue::Integer(0))),
            (SortField::Id, SortDirection::Desc) => None,
            (SortField::Ts, SortDirection::Asc) => Some(Operand::NegInfinity),
            (SortField::Ts, SortDirection::Desc) => Some(Operand::PosInfinity),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
