//! Ordering for a log listing: which field, which way, how many rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{PageError, PageResult};

/// Columns a listing may be ordered by. `id` is the only strictly monotonic
/// key; `ts` may tie or invert slightly under concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Id,
    Ts,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Ts => "ts",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortField {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "ts" => Ok(SortField::Ts),
            other => Err(PageError::invalid_sort(format!(
                "unknown sort field '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn is_desc(self) -> bool {
        matches!(self, SortDirection::Desc)
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(PageError::invalid_sort(format!("unknown sort direction '{s}'")))
        }
    }
}

/// Field, direction and page size of a listing.
///
/// `limit: None` means the query carries no `LIMIT`; a zero limit is folded
/// into `None` on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
    pub limit: Option<u32>,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            direction: SortDirection::Asc,
            limit: None,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection, limit: Option<u32>) -> Self {
        Self {
            field,
            direction,
            limit: limit.filter(|n| *n > 0),
        }
    }

    /// Lenient parse: an empty field yields `id asc` with no limit, and a
    /// direction other than asc/desc is normalised to asc. Unknown fields are
    /// still rejected since the field is rendered into SQL.
    pub fn lenient(field: &str, direction: &str, limit: Option<u32>) -> PageResult<Self> {
        if field.is_empty() {
            return Ok(Self::default());
        }
        let direction = direction.parse().unwrap_or(SortDirection::Asc);
        Ok(Self::new(field.parse()?, direction, limit))
    }

    pub fn order_clause(&self) -> String {
        format!(
            "ORDER BY {} {}",
            self.field.column(),
            self.direction.keyword()
        )
    }

    /// Page size, required wherever page numbers are converted to offsets.
    pub fn page_size(&self) -> PageResult<u32> {
        self.limit
            .ok_or_else(|| PageError::invalid_sort("a page size is required for page arithmetic"))
    }
}
