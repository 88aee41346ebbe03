//! Paginated browsing of an append-only Postgres `logs` table.

pub mod api_errors;
pub mod app_state;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod filter;
pub mod log_record;
pub mod log_store;
pub mod log_store_memory;
pub mod log_store_pg;
pub mod pagination;
pub mod query_builder;
pub mod sort;
pub mod web;

pub use cursor::Cursor;
pub use errors::{PageError, PageResult};
pub use filter::FilterSpec;
pub use log_record::LogRecord;
pub use pagination::{ListPage, PaginationService};
pub use sort::{SortDirection, SortField, SortSpec};
