//! Integration tests for the SQL source against an in-memory SQLite database
//!
//! The full pipeline runs against SQLite on the extract side and a recording
//! loader on the destination side.

use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::Result;
use pos_ecl::clean::Cleaner;
use pos_ecl::etl::{AllowList, Catalog, EmptyTablePolicy, Extractor, Loader, Pipeline, RunOutcome};
use pos_ecl::store::SqlSource;
use pos_ecl::table::{Table, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::{Arc, Mutex};

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

async fn seed(pool: &SqlitePool) {
    for statement in [
        "CREATE TABLE VENTATICKETS (ID INTEGER PRIMARY KEY AUTOINCREMENT, NOMBRE TEXT, FECHA TEXT, TOTAL REAL)",
        "INSERT INTO VENTATICKETS (NOMBRE, FECHA, TOTAL) VALUES ('  JUAN perez ', '2024-01-01 10:15:30.500', 19.995)",
        "INSERT INTO VENTATICKETS (NOMBRE, FECHA, TOTAL) VALUES ('123', 'not-a-date', 5.0)",
        "CREATE TABLE DEPARTAMENTOS (ID INTEGER, NOMBRE TEXT, FOTO BLOB)",
        "INSERT INTO DEPARTAMENTOS VALUES (1, 'abarrotes', X'CAFE'), (2, NULL, NULL)",
        "CREATE TABLE VACIA (ID INTEGER)",
        "CREATE VIEW VENTAS_VISTA AS SELECT * FROM VENTATICKETS",
    ] {
        sqlx::query(statement).execute(pool).await.unwrap();
    }
}

#[derive(Default)]
struct RecordingLoader {
    loaded: Arc<Mutex<Vec<(String, Table)>>>,
}

#[async_trait]
impl Loader for RecordingLoader {
    type Item = Table;

    async fn load(&self, table: &str, item: Self::Item) -> Result<usize> {
        let rows = item.row_count();
        self.loaded.lock().unwrap().push((table.to_string(), item));
        Ok(rows)
    }
}

#[tokio::test]
async fn test_lists_only_user_tables() {
    let pool = memory_pool().await;
    seed(&pool).await;
    let source = SqlSource::from_sqlite_pool(pool);

    let tables = source.list_tables().await.unwrap();

    assert_eq!(tables, vec!["DEPARTAMENTOS", "VACIA", "VENTATICKETS"]);
    source.close().await;
}

#[tokio::test]
async fn test_extract_decodes_storage_classes() {
    let pool = memory_pool().await;
    seed(&pool).await;
    let source = SqlSource::from_sqlite_pool(pool);

    let table = source.extract("DEPARTAMENTOS").await.unwrap();

    let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["ID", "NOMBRE", "FOTO"]);
    assert_eq!(
        table.rows()[0],
        vec![
            Value::Int(1),
            Value::from("abarrotes"),
            Value::Bytes(vec![0xca, 0xfe])
        ]
    );
    assert_eq!(table.rows()[1], vec![Value::Int(2), Value::Null, Value::Null]);
}

#[tokio::test]
async fn test_extract_missing_table_fails() {
    let pool = memory_pool().await;
    let source = SqlSource::from_sqlite_pool(pool);

    let err = source.extract("NO_EXISTE").await.unwrap_err();
    assert!(format!("{err:#}").contains("NO_EXISTE"));
}

#[tokio::test]
async fn test_pipeline_over_sqlite() {
    let pool = memory_pool().await;
    seed(&pool).await;
    let source = SqlSource::from_sqlite_pool(pool.clone());
    let loader = RecordingLoader::default();
    let loaded = loader.loaded.clone();

    let summary = Pipeline::new(source, Cleaner::default(), loader)
        .run()
        .await
        .unwrap();

    assert_eq!(
        summary.get("VENTATICKETS"),
        Some(&RunOutcome::Loaded {
            rows_before: 2,
            rows_after: 1
        })
    );
    assert_eq!(summary.get("VACIA"), Some(&RunOutcome::SkippedEmpty));
    assert_eq!(summary.loaded(), 2);

    let loaded = loaded.lock().unwrap();
    let (_, ventas) = loaded
        .iter()
        .find(|(name, _)| name == "ventatickets_clean")
        .unwrap();

    let expected_ts = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(10, 15, 30)
        .unwrap();
    assert_eq!(
        ventas.rows()[0],
        vec![
            Value::Int(1),
            Value::from("Juan Perez"),
            Value::Timestamp(expected_ts),
            Value::Float(20.0),
        ]
    );

    // The pipeline closed the source pool
    assert!(pool.is_closed());
}

#[tokio::test]
async fn test_allow_list_and_empty_table_drop() {
    let pool = memory_pool().await;
    seed(&pool).await;
    let source = SqlSource::from_sqlite_pool(pool.clone());
    let loader = RecordingLoader::default();
    let loaded = loader.loaded.clone();

    let summary = Pipeline::new(source, Cleaner::default(), loader)
        .with_allow_list(AllowList::new(["vacia"]))
        .with_empty_table_policy(EmptyTablePolicy::DropSource)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.get("VACIA"), Some(&RunOutcome::SkippedEmpty));
    assert_eq!(
        summary.get("VENTATICKETS"),
        Some(&RunOutcome::SkippedNotAllowed)
    );
    assert!(loaded.lock().unwrap().is_empty());
    assert!(pool.is_closed());
}

#[tokio::test]
async fn test_drop_table_removes_from_catalog() {
    let pool = memory_pool().await;
    seed(&pool).await;
    let source = SqlSource::from_sqlite_pool(pool);

    source.drop_table("VACIA").await.unwrap();

    let tables = source.list_tables().await.unwrap();
    assert!(!tables.contains(&"VACIA".to_string()));
}
