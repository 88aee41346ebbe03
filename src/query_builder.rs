//! Range query plans over the `logs` table.
//!
//! Every listing operation is expressed as a [`RangeQuery`]: a projection, a
//! conjunction of [`Comparison`]s, an optional order, offset and limit, and the
//! descending-scan fix-up that re-sorts a page by `id` ascending. Plans are
//! plain data; `to_sql` renders them for Postgres with `$n` placeholders and
//! the in-memory store evaluates them directly.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::cursor::Cursor;
use crate::errors::PageResult;
use crate::filter::FilterSpec;
use crate::sort::{SortDirection, SortField, SortSpec};

pub const LOGS_TABLE: &str = "logs";

/// Columns of the `logs` table that may appear in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Type,
    Message,
    Ts,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Type => "type",
            Column::Message => "message",
            Column::Ts => "ts",
        }
    }
}

impl From<SortField> for Column {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Id => Column::Id,
            SortField::Ts => Column::Ts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Whether `lhs <op> rhs` holds given `lhs.cmp(rhs)`.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A value bound to a placeholder at execution time.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Ordering between values of the same kind; `None` across kinds.
    pub fn compare(&self, other: &SqlValue) -> Option<Ordering> {
        match (self, other) {
            (SqlValue::Integer(a), SqlValue::Integer(b)) => Some(a.cmp(b)),
            (SqlValue::Text(a), SqlValue::Text(b)) => Some(a.cmp(b)),
            (SqlValue::Timestamp(a), SqlValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Right-hand side of a comparison. The infinities only arise as default
/// timestamp boundaries and render as fixed literals.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(SqlValue),
    NegInfinity,
    PosInfinity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: Column,
    pub op: CompareOp,
    pub operand: Operand,
}

impl Comparison {
    pub fn new(column: Column, op: CompareOp, operand: Operand) -> Self {
        Self {
            column,
            op,
            operand,
        }
    }

    pub fn value(column: Column, op: CompareOp, value: SqlValue) -> Self {
        Self::new(column, op, Operand::Value(value))
    }

    /// Render as `<column> <op> <placeholder>`, pushing the bound value.
    pub fn render(&self, binds: &mut Vec<SqlValue>) -> String {
        let rhs = match &self.operand {
            Operand::Value(v) => {
                binds.push(v.clone());
                format!("${}", binds.len())
            }
            Operand::NegInfinity => "'-infinity'::timestamp".to_string(),
            Operand::PosInfinity => "'infinity'::timestamp".to_string(),
        };
        format!("{} {} {}", self.column.name(), self.op.symbol(), rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Rows,
    Count,
    Column(SortField),
}

/// Rendered SQL text plus the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub projection: Projection,
    pub predicates: Vec<Comparison>,
    pub order: Option<(SortField, SortDirection)>,
    pub offset: Option<u64>,
    pub limit: Option<u32>,
    /// Wrap the query and re-sort its rows by `id` ascending.
    pub reorder_ascending: bool,
}

impl RangeQuery {
    fn new(projection: Projection) -> Self {
        Self {
            projection,
            predicates: Vec::new(),
            order: None,
            offset: None,
            limit: None,
            reorder_ascending: false,
        }
    }

    pub fn to_sql(&self) -> SqlStatement {
        let mut binds = Vec::new();

        let select = match self.projection {
            Projection::Rows => "SELECT *".to_string(),
            Projection::Count => "SELECT count(*)".to_string(),
            Projection::Column(field) => format!("SELECT {}", field.column()),
        };
        let mut sql = format!("{select} FROM {LOGS_TABLE}");

        if !self.predicates.is_empty() {
            let clauses: Vec<String> = self
                .predicates
                .iter()
                .map(|p| p.render(&mut binds))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some((field, direction)) = self.order {
            sql.push(' ');
            sql.push_str(&SortSpec::new(field, direction, None).order_clause());
        }

        if let Some(offset) = self.offset {
            binds.push(SqlValue::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
            sql.push_str(&format!(" OFFSET ${}", binds.len()));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if self.reorder_ascending {
            sql = format!("SELECT * FROM ({sql}) AS page ORDER BY id ASC");
        }

        SqlStatement { sql, binds }
    }
}

/// Composes cursors, filters and sorts into range queries.
pub struct QueryBuilder;

impl QueryBuilder {
    /// One page of rows after `cursor` in `sort` order.
    ///
    /// A descending page selects the `limit` rows below the boundary in
    /// descending order, then flips them back to ascending `id` order so
    /// callers always see oldest-first batches.
    pub fn page(cursor: &Cursor, sort: &SortSpec, filters: &[FilterSpec]) -> PageResult<RangeQuery> {
        let mut query = RangeQuery::new(Projection::Rows);
        if let Some(boundary) = cursor.predicate(sort)? {
            query.predicates.push(boundary);
        }
        query
            .predicates
            .extend(filters.iter().map(FilterSpec::predicate));
        query.order = Some((sort.field, sort.direction));
        query.limit = sort.limit;
        query.reorder_ascending = sort.direction.is_desc();
        Ok(query)
    }

    /// Unfiltered count of every row.
    pub fn total() -> RangeQuery {
        RangeQuery::new(Projection::Count)
    }

    /// Count of filtered rows at or before `cursor` in `sort` order.
    /// Returns `None` for an unset cursor: nothing precedes the start.
    pub fn position(
        cursor: &Cursor,
        sort: &SortSpec,
        filters: &[FilterSpec],
    ) -> PageResult<Option<RangeQuery>> {
        let Some(value) = cursor.bound_value(sort.field)? else {
            return Ok(None);
        };
        let op = match sort.direction {
            SortDirection::Asc => CompareOp::Le,
            SortDirection::Desc => CompareOp::Ge,
        };
        let mut query = RangeQuery::new(Projection::Count);
        query
            .predicates
            .push(Comparison::value(sort.field.into(), op, value));
        query
            .predicates
            .extend(filters.iter().map(FilterSpec::predicate));
        Ok(Some(query))
    }

    /// The sort-field value of the row at `offset` in `sort` order.
    pub fn sort_value_at(offset: u64, sort: &SortSpec, filters: &[FilterSpec]) -> RangeQuery {
        let mut query = RangeQuery::new(Projection::Column(sort.field));
        query
            .predicates
            .extend(filters.iter().map(FilterSpec::predicate));
        query.order = Some((sort.field, sort.direction));
        query.offset = Some(offset);
        query.limit = Some(1);
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSpec;
    use chrono::TimeZone;

    fn sort(field: SortField, direction: SortDirection, limit: u32) -> SortSpec {
        SortSpec::new(field, direction, Some(limit))
    }

    #[test]
    fn ascending_id_page_from_start() {
        let q = QueryBuilder::page(&Cursor::Unset, &sort(SortField::Id, SortDirection::Asc, 100), &[])
            .unwrap()
            .to_sql();
        assert_eq!(q.sql, "SELECT * FROM logs WHERE id > $1 ORDER BY id ASC LIMIT 100");
        assert_eq!(q.binds, vec![SqlValue::Integer(0)]);
    }

    #[test]
    fn descending_id_page_without_cursor_omits_boundary() {
        let q = QueryBuilder::page(&Cursor::Unset, &sort(SortField::Id, SortDirection::Desc, 100), &[])
            .unwrap()
            .to_sql();
        assert_eq!(
            q.sql,
            "SELECT * FROM (SELECT * FROM logs ORDER BY id DESC LIMIT 100) AS page ORDER BY id ASC"
        );
        assert!(q.binds.is_empty());
    }

    #[test]
    fn descending_page_with_cursor_and_filter() {
        let filter = FilterSpec::parse("type", "=", "3").unwrap().unwrap();
        let q = QueryBuilder::page(
            &Cursor::Integer(151),
            &sort(SortField::Id, SortDirection::Desc, 100),
            &[filter],
        )
        .unwrap()
        .to_sql();
        assert_eq!(
            q.sql,
            "SELECT * FROM (SELECT * FROM logs WHERE id < $1 AND type = $2 ORDER BY id DESC LIMIT 100) AS page ORDER BY id ASC"
        );
        assert_eq!(q.binds, vec![SqlValue::Integer(151), SqlValue::Integer(3)]);
    }

    #[test]
    fn timestamp_defaults_render_infinity_literals() {
        let q = QueryBuilder::page(&Cursor::Unset, &sort(SortField::Ts, SortDirection::Asc, 10), &[])
            .unwrap()
            .to_sql();
        assert_eq!(
            q.sql,
            "SELECT * FROM logs WHERE ts > '-infinity'::timestamp ORDER BY ts ASC LIMIT 10"
        );

        let q = QueryBuilder::page(&Cursor::Unset, &sort(SortField::Ts, SortDirection::Desc, 10), &[])
            .unwrap()
            .to_sql();
        assert!(q.sql.contains("ts < 'infinity'::timestamp"));
    }

    #[test]
    fn timestamp_cursor_is_bound_not_inlined() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let q = QueryBuilder::page(&Cursor::Timestamp(ts), &sort(SortField::Ts, SortDirection::Asc, 10), &[])
            .unwrap()
            .to_sql();
        assert_eq!(q.sql, "SELECT * FROM logs WHERE ts > $1 ORDER BY ts ASC LIMIT 10");
        assert_eq!(q.binds, vec![SqlValue::Timestamp(ts)]);
    }

    #[test]
    fn page_without_limit_has_no_limit_clause() {
        let q = QueryBuilder::page(&Cursor::Integer(5), &SortSpec::default(), &[])
            .unwrap()
            .to_sql();
        assert_eq!(q.sql, "SELECT * FROM logs WHERE id > $1 ORDER BY id ASC");
    }

    #[test]
    fn mismatched_cursor_is_rejected() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let err = QueryBuilder::page(&Cursor::Timestamp(ts), &SortSpec::default(), &[]).unwrap_err();
        assert!(matches!(err, crate::errors::PageError::InvalidCursor { .. }));
    }

    #[test]
    fn total_is_a_bare_count() {
        assert_eq!(QueryBuilder::total().to_sql().sql, "SELECT count(*) FROM logs");
    }

    #[test]
    fn position_applies_filters_and_direction() {
        let filter = FilterSpec::parse("type", "=", "2").unwrap().unwrap();
        let q = QueryBuilder::position(
            &Cursor::Integer(40),
            &sort(SortField::Id, SortDirection::Desc, 10),
            &[filter],
        )
        .unwrap()
        .unwrap()
        .to_sql();
        assert_eq!(q.sql, "SELECT count(*) FROM logs WHERE id >= $1 AND type = $2");

        let none = QueryBuilder::position(&Cursor::Unset, &SortSpec::default(), &[]).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn sort_value_at_binds_offset() {
        let filter = FilterSpec::parse("type", "=", "1").unwrap().unwrap();
        let q = QueryBuilder::sort_value_at(199, &sort(SortField::Ts, SortDirection::Desc, 100), &[filter])
            .to_sql();
        assert_eq!(
            q.sql,
            "SELECT ts FROM logs WHERE type = $1 ORDER BY ts DESC OFFSET $2 LIMIT 1"
        );
        assert_eq!(q.binds, vec![SqlValue::Integer(1), SqlValue::Integer(199)]);
    }

    #[test]
    fn compare_op_semantics() {
        assert!(CompareOp::Le.holds(Ordering::Equal));
        assert!(!CompareOp::Lt.holds(Ordering::Equal));
        assert!(CompareOp::Ne.holds(Ordering::Greater));
        assert_eq!(SqlValue::Integer(1).compare(&SqlValue::Text("1".into())), None);
    }
}
