//! HTTP surface of the log viewer.
//!
//! Handlers only parse request parameters into sorts, filters and cursors and
//! shape the pagination results as JSON; all paging logic lives in
//! `PaginationService`.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::cursor::Cursor;
use crate::filter::FilterSpec;
use crate::log_record::LogRecord;
use crate::pagination::ListPage;
use crate::sort::SortSpec;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub cursor: Option<String>,
    #[serde(alias = "Limit")]
    pub limit: Option<u32>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
    pub type_filter: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRequest {
    pub field: Option<String>,
    pub direction: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNumberRequest {
    #[serde(default)]
    pub sort: SortRequest,
    #[serde(default)]
    pub cursor: String,
    pub type_filter: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    #[serde(flatten)]
    pub record: LogRecord,
    pub ts_pretty: String,
}

impl From<LogRecord> for LogView {
    fn from(record: LogRecord) -> Self {
        let ts_pretty = record.ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        Self { record, ts_pretty }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub from_cursor: String,
    pub to_cursor: String,
    pub logs: Vec<LogView>,
}

impl From<ListPage> for PageView {
    fn from(page: ListPage) -> Self {
        Self {
            from_cursor: page.from_cursor,
            to_cursor: page.to_cursor,
            logs: page.rows.into_iter().map(LogView::from).collect(),
        }
    }
}

/// Merge request overrides onto the configured default sort. Limits are
/// checked against the server bounds before the sort normalises them.
fn resolve_sort(
    state: &AppState,
    field: Option<&str>,
    direction: Option<&str>,
    limit: Option<u32>,
) -> Result<SortSpec, AppError> {
    let base = state.pagination.default_sort();
    let limit = limit.or(base.limit);
    match limit {
        Some(0) => return Err(AppError::bad_request("limit must be positive")),
        Some(n) if n > state.max_page_size => {
            return Err(AppError::bad_request(format!(
                "limit {n} exceeds the maximum page size {}",
                state.max_page_size
            )));
        }
        _ => {}
    }

    let field = field
        .filter(|f| !f.is_empty())
        .unwrap_or(base.field.column());
    let base_direction = base.direction.to_string();
    let direction = direction
        .filter(|d| !d.is_empty())
        .unwrap_or(base_direction.as_str());
    Ok(SortSpec::lenient(field, direction, limit)?)
}

fn resolve_filters(type_filter: Option<&str>) -> Result<Vec<FilterSpec>, AppError> {
    let type_filter = type_filter.unwrap_or_default();
    Ok(FilterSpec::parse_all([["type", "=", type_filter]])?)
}

impl ListParams {
    fn resolve(&self, state: &AppState) -> Result<(SortSpec, Vec<FilterSpec>), AppError> {
        let sort = resolve_sort(
            state,
            self.sort_field.as_deref(),
            self.sort_direction.as_deref(),
            self.limit,
        )?;
        let filters = resolve_filters(self.type_filter.as_deref())?;
        Ok((sort, filters))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/showPage", get(show_page))
        .route("/totalRows", get(total_rows))
        .route("/pageNumber", post(page_number))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageView>, AppError> {
    let (sort, filters) = params.resolve(&state)?;
    let cursor = Cursor::decode(params.cursor.as_deref().unwrap_or_default(), sort.field)?;

    match state.pagination.list_page(&cursor, &sort, &filters).await {
        Ok(page) => Ok(Json(page.into())),
        Err(e) if e.is_not_found() => {
            tracing::debug!(cursor = %cursor, "no logs for listing, rendering empty page");
            Ok(Json(ListPage::empty().into()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn show_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let (sort, filters) = params.resolve(&state)?;
    let page = params.page.unwrap_or(1);

    match state.pagination.show_page(page, &sort, &filters).await {
        Ok(listing) => Ok(Json(PageView::from(listing)).into_response()),
        Err(e) if e.is_not_found() => {
            tracing::warn!(page, error = %e, "page out of range, redirecting to first page");
            Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/")]).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn total_rows(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    let total = state.pagination.get_total_rows().await?;
    Ok(Json(serde_json::json!({ "totalRows": total })))
}

async fn page_number(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PageNumberRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let sort = resolve_sort(
        &state,
        req.sort.field.as_deref(),
        req.sort.direction.as_deref(),
        req.sort.limit,
    )?;
    let filters = resolve_filters(req.type_filter.as_deref())?;
    let cursor = Cursor::decode(&req.cursor, sort.field)?;

    let page = state.pagination.page_number(&cursor, &sort, &filters).await?;
    Ok(Json(serde_json::json!({ "page": page })))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
