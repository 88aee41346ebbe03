use std::sync::Arc;

use crate::config::AppConfig;
use crate::log_store::LogStore;
use crate::pagination::PaginationService;
use crate::sort::SortSpec;

pub struct AppState {
    pub pagination: PaginationService,
    pub max_page_size: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn LogStore>, default_sort: SortSpec, max_page_size: u32) -> Self {
        Self {
            pagination: PaginationService::new(store, default_sort),
            max_page_size,
        }
    }

    pub fn from_config(store: Arc<dyn LogStore>, config: &AppConfig) -> Self {
        Self::new(store, config.default_sort.to_sort(), config.max_page_size)
    }
}
