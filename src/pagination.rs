//! Keyset pagination over the `logs` table.
//!
//! Every operation is a stateless read. Nothing is shared between calls, so
//! concurrent inserts between `get_cursor` and `get_logs` can shift page
//! boundaries; no snapshot is held across round trips.

use std::sync::Arc;

use serde::Serialize;

use crate::cursor::Cursor;
use crate::errors::{PageError, PageResult};
use crate::filter::FilterSpec;
use crate::log_record::{page_bounds, LogRecord};
use crate::log_store::LogStore;
use crate::query_builder::QueryBuilder;
use crate::sort::SortSpec;

/// A page of rows with the boundary cursors of its first and last row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub from_cursor: String,
    pub to_cursor: String,
    pub rows: Vec<LogRecord>,
}

impl ListPage {
    pub fn empty() -> Self {
        Self {
            from_cursor: String::new(),
            to_cursor: String::new(),
            rows: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct PaginationService {
    store: Arc<dyn LogStore>,
    default_sort: SortSpec,
}

impl PaginationService {
    pub fn new(store: Arc<dyn LogStore>, default_sort: SortSpec) -> Self {
        Self {
            store,
            default_sort,
        }
    }

    pub fn default_sort(&self) -> SortSpec {
        self.default_sort
    }

    /// Rows after `cursor` in `sort` order, at most `sort.limit` of them,
    /// always returned in ascending `id` order. An empty result is not an
    /// error here.
    pub async fn get_logs(
        &self,
        cursor: &Cursor,
        sort: &SortSpec,
        filters: &[FilterSpec],
    ) -> PageResult<Vec<LogRecord>> {
        let query = QueryBuilder::page(cursor, sort, filters)?;
        self.store
            .fetch_records(&query)
            .await
            .map_err(|e| PageError::query_failed("get_logs", e))
    }

    /// Unfiltered count of every row. An empty table yields 0.
    pub async fn get_total_rows(&self) -> PageResult<u64> {
        let count = self
            .store
            .fetch_count(&QueryBuilder::total())
            .await
            .map_err(|e| PageError::query_failed("get_total_rows", e))?;
        Ok(count.unwrap_or(0))
    }

    /// Number of filtered rows at or before `cursor` in `sort` order, i.e.
    /// how many rows a scan has passed when it resumes from `cursor`.
    ///
    /// The row holding the cursor value is counted, so this is one more than
    /// the count of rows strictly preceding the boundary. `page_number`
    /// relies on that to stay exact for a page size of 1.
    pub async fn get_cursor_position(
        &self,
        cursor: &Cursor,
        sort: &SortSpec,
        filters: &[FilterSpec],
    ) -> PageResult<u64> {
        let Some(query) = QueryBuilder::position(cursor, sort, filters)? else {
            return Ok(0);
        };
        self.store
            .fetch_count(&query)
            .await
            .map_err(|e| PageError::query_failed("get_cursor_position", e))?
            .ok_or_else(|| PageError::not_found(format!("position of cursor '{cursor}'")))
    }

    /// Cursor that begins 1-based `page`: the sort value of the last row of
    /// the previous page, or the default boundary for page 1.
    pub async fn get_cursor(
        &self,
        page: u64,
        sort: &SortSpec,
        filters: &[FilterSpec],
    ) -> PageResult<Cursor> {
        let limit = u64::from(sort.page_size()?);
        if page == 0 {
            return Err(PageError::not_found("page 0"));
        }
        if page == 1 {
            return Ok(Cursor::Unset);
        }
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| PageError::not_found(format!("page {page}")))?
            - 1;

        let query = QueryBuilder::sort_value_at(offset, sort, filters);
        self.store
            .fetch_sort_value(&query)
            .await
            .map_err(|e| PageError::query_failed("get_cursor", e))?
            .ok_or_else(|| PageError::not_found(format!("page {page}")))
    }

    /// `get_logs` plus boundary cursors; an empty page is `NotFound`.
    pub async fn list_page(
        &self,
        cursor: &Cursor,
        sort: &SortSpec,
        filters: &[FilterSpec],
    ) -> PageResult<ListPage> {
        let rows = self.get_logs(cursor, sort, filters).await?;
        let Some((from, to)) = page_bounds(&rows, sort.field) else {
            return Err(PageError::not_found("logs"));
        };
        Ok(ListPage {
            from_cursor: from.encode(),
            to_cursor: to.encode(),
            rows,
        })
    }

    /// Resolve `page` to its cursor and list it.
    pub async fn show_page(
        &self,
        page: u64,
        sort: &SortSpec,
        filters: &[FilterSpec],
    ) -> PageResult<ListPage> {
        let cursor = self.get_cursor(page, sort, filters).await?;
        self.list_page(&cursor, sort, filters).await
    }

    /// 1-based number of the page that a scan resuming at `cursor` shows.
    pub async fn page_number(
        &self,
        cursor: &Cursor,
        sort: &SortSpec,
        filters: &[FilterSpec],
    ) -> PageResult<u64> {
        let limit = u64::from(sort.page_size()?);
        let position = self.get_cursor_position(cursor, sort, filters).await?;
        Ok(position / limit + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_store_memory::MemoryLogStore;
    use crate::sort::{SortDirection, SortField};

    async fn service_with(rows: u16) -> PaginationService {
        let store = MemoryLogStore::new();
        for i in 0..rows {
            store.append(i % 4, format!("entry {i}"), None).await;
        }
        PaginationService::new(Arc::new(store), SortSpec::default())
    }

    #[tokio::test]
    async fn page_arithmetic_requires_a_limit() {
        let service = service_with(5).await;
        let unlimited = SortSpec::new(SortField::Id, SortDirection::Asc, None);
        assert!(matches!(
            service.get_cursor(2, &unlimited, &[]).await,
            Err(PageError::InvalidSort { .. })
        ));
        assert!(matches!(
            service.page_number(&Cursor::Integer(3), &unlimited, &[]).await,
            Err(PageError::InvalidSort { .. })
        ));
    }

    #[tokio::test]
    async fn page_zero_and_past_the_end_are_not_found() {
        let service = service_with(5).await;
        let sort = SortSpec::new(SortField::Id, SortDirection::Asc, Some(2));
        assert!(service.get_cursor(0, &sort, &[]).await.unwrap_err().is_not_found());
        assert!(service.get_cursor(4, &sort, &[]).await.unwrap_err().is_not_found());
        assert_eq!(service.get_cursor(3, &sort, &[]).await.unwrap(), Cursor::Integer(4));
    }

    #[tokio::test]
    async fn unset_cursor_sits_at_position_zero() {
        let service = service_with(5).await;
        let sort = SortSpec::new(SortField::Id, SortDirection::Desc, Some(2));
        assert_eq!(service.get_cursor_position(&Cursor::Unset, &sort, &[]).await.unwrap(), 0);
        assert_eq!(service.page_number(&Cursor::Unset, &sort, &[]).await.unwrap(), 1);
    }
}
