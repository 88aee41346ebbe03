//! Equality-style filters on log columns.
//!
//! A filter arrives as a `(field, operator, value)` triple of strings. Any
//! empty part makes the filter inert. Fields and operators are allow-listed
//! and the value is typed by its field, so nothing the caller sends is ever
//! spliced into SQL text.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::errors::{PageError, PageResult};
use crate::query_builder::{Column, CompareOp, Comparison, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Id,
    Type,
    Message,
    Ts,
}

impl FilterField {
    pub fn column(self) -> Column {
        match self {
            FilterField::Id => Column::Id,
            FilterField::Type => Column::Type,
            FilterField::Message => Column::Message,
            FilterField::Ts => Column::Ts,
        }
    }

    fn parse_value(self, raw: &str) -> PageResult<SqlValue> {
        let invalid = |e: String| {
            PageError::invalid_filter(self.to_string(), format!("bad value '{raw}': {e}"))
        };
        match self {
            FilterField::Id => raw
                .parse::<u64>()
                .map_err(|e| e.to_string())
                .and_then(|n| i64::try_from(n).map_err(|e| e.to_string()))
                .map(SqlValue::Integer)
                .map_err(invalid),
            FilterField::Type => raw
                .parse::<u16>()
                .map(|n| SqlValue::Integer(i64::from(n)))
                .map_err(|e| invalid(e.to_string())),
            FilterField::Message => Ok(SqlValue::Text(raw.to_string())),
            FilterField::Ts => DateTime::parse_from_rfc3339(raw)
                .map(|ts| SqlValue::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column().name())
    }
}

impl FromStr for FilterField {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(FilterField::Id),
            "type" => Ok(FilterField::Type),
            "message" => Ok(FilterField::Message),
            "ts" => Ok(FilterField::Ts),
            other => Err(PageError::invalid_filter(other, "unknown field")),
        }
    }
}

fn parse_op(field: &str, raw: &str) -> PageResult<CompareOp> {
    match raw {
        "=" => Ok(CompareOp::Eq),
        "!=" | "<>" => Ok(CompareOp::Ne),
        "<" => Ok(CompareOp::Lt),
        "<=" => Ok(CompareOp::Le),
        ">" => Ok(CompareOp::Gt),
        ">=" => Ok(CompareOp::Ge),
        other => Err(PageError::invalid_filter(
            field,
            format!("unsupported operator '{other}'"),
        )),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub field: FilterField,
    pub op: CompareOp,
    pub value: SqlValue,
}

impl FilterSpec {
    /// Parse a raw triple. `Ok(None)` when any part is empty.
    pub fn parse(field: &str, op: &str, value: &str) -> PageResult<Option<Self>> {
        if field.is_empty() || op.is_empty() || value.is_empty() {
            return Ok(None);
        }
        let parsed_field: FilterField = field.parse()?;
        Ok(Some(Self {
            field: parsed_field,
            op: parse_op(field, op)?,
            value: parsed_field.parse_value(value)?,
        }))
    }

    /// Parse a list of triples, dropping the inert ones.
    pub fn parse_all<'a, I>(triples: I) -> PageResult<Vec<Self>>
    where
        I: IntoIterator<Item = [&'a str; 3]>,
    {
        let mut filters = Vec::new();
        for [field, op, value] in triples {
            if let Some(filter) = Self::parse(field, op, value)? {
                filters.push(filter);
            }
        }
        Ok(filters)
    }

    pub fn type_equals(code: u16) -> Self {
        Self {
            field: FilterField::Type,
            op: CompareOp::Eq,
            value: SqlValue::Integer(i64::from(code)),
        }
    }

    pub fn predicate(&self) -> Comparison {
        Comparison::value(self.field.column(), self.op, self.value.clone())
    }
}
