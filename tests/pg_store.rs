//! Runs against a live Postgres when `LOGPAGE_TEST_DATABASE_URL` is set:
//! `cargo test --test pg_store -- --ignored`.

use std::sync::Arc;

use logpage::log_store_pg::PgLogStore;
use logpage::{Cursor, FilterSpec, PaginationService, SortDirection, SortField, SortSpec};
use sqlx::PgPool;

async fn connect() -> Option<PgLogStore> {
    let url = std::env::var("LOGPAGE_TEST_DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.expect("database should accept connections");
    let store = PgLogStore::new(pool);
    store.migrate().await.expect("schema should apply");
    Some(store)
}

#[tokio::test]
#[ignore]
async fn postgres_rows_decode_and_page() {
    let Some(store) = connect().await else {
        eprintln!("LOGPAGE_TEST_DATABASE_URL not set, skipping");
        return;
    };

    let mut inserted = Vec::new();
    for i in 0..5u16 {
        inserted.push(store.insert(i % 2, &format!("pg row {i}")).await.unwrap());
    }
    let first = inserted[0];
    // rows written by earlier runs sit below `first`
    let filters = vec![FilterSpec::parse("id", ">=", &first.to_string()).unwrap().unwrap()];
    let service = PaginationService::new(Arc::new(store), SortSpec::default());

    let asc = SortSpec::new(SortField::Id, SortDirection::Asc, Some(5));
    let page = service.list_page(&Cursor::Unset, &asc, &filters).await.unwrap();
    assert_eq!(page.rows.iter().map(|r| r.id).collect::<Vec<_>>(), inserted);
    assert_eq!(page.rows[1].log_type, 1);
    assert_eq!(page.rows[1].message, "pg row 1");
    assert!(page.rows.windows(2).all(|w| w[0].ts <= w[1].ts));

    let pairs = SortSpec::new(SortField::Id, SortDirection::Asc, Some(2));
    let cursor = service.get_cursor(2, &pairs, &filters).await.unwrap();
    assert_eq!(cursor, Cursor::Integer(inserted[1]));
    assert_eq!(service.page_number(&cursor, &pairs, &filters).await.unwrap(), 2);

    let newest = SortSpec::new(SortField::Id, SortDirection::Desc, Some(2));
    let page = service.list_page(&Cursor::Unset, &newest, &filters).await.unwrap();
    assert_eq!(page.rows.iter().map(|r| r.id).collect::<Vec<_>>(), inserted[3..].to_vec());

    let by_ts = SortSpec::new(SortField::Ts, SortDirection::Asc, Some(2));
    let cursor = service.get_cursor(2, &by_ts, &filters).await.unwrap();
    assert!(matches!(cursor, Cursor::Timestamp(_)));

    assert!(service.get_total_rows().await.unwrap() >= 5);
}
