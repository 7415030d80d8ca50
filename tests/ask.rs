//! End-to-end tests: the full router over a seeded DuckDB file, with the
//! LLM backend replaced by canned generators.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tariff_ask::config::AppConfig;
use tariff_ask::db::db_pool::{build_pool, DuckDBConnectionManager};
use tariff_ask::llm::providers::mock::MockSqlGenerator;
use tariff_ask::llm::{LlmError, LlmManager, SqlGenerator};
use tariff_ask::web::{build_router, state::AppState};

struct FailingGenerator;

#[async_trait::async_trait]
impl SqlGenerator for FailingGenerator {
    async fn generate_sql(&self, _question: &str, _schema: &str) -> Result<String, LlmError> {
        Err(LlmError::ConnectionError("connection refused".to_string()))
    }
}

/// Creates a DuckDB file seeded with the tariff table and returns its path.
fn seed_database(dir: &tempfile::TempDir) -> String {
    let db_path = dir.path().join("tariff.duckdb");
    let db_path = db_path.to_str().expect("utf-8 path").to_string();

    let conn = duckdb::Connection::open(&db_path).expect("open seed database");
    conn.execute_batch(
        r#"
        CREATE TABLE "ARANCELES EC-EEUU" (
            "ReportingCo" VARCHAR,
            "PartnerCountry" VARCHAR,
            "Year" INTEGER,
            "Revision" VARCHAR,
            "ProductCode" VARCHAR,
            "ProductDescription" VARCHAR,
            "AVE" DOUBLE
        );
        INSERT INTO "ARANCELES EC-EEUU" VALUES
            ('Ecuador', 'USA', 2023, 'R1', '1801', 'Cacao en grano, entero o partido', 15.0),
            ('Ecuador', 'USA', 2023, 'R1', '1803', 'Pasta de cacao', 12.5),
            ('Ecuador', 'USA', 2023, 'R1', '1001', 'Trigo duro', 9.8);
        "#,
    )
    .expect("seed tariff table");

    db_path
}

fn router_with(db_path: String, generator: Box<dyn SqlGenerator>) -> Router {
    let mut config = AppConfig::default();
    config.database.connection_string = db_path;
    config.database.pool_size = 1;
    config.llm.backend = "mock".to_string();

    let pool = build_pool(&config.database).expect("connection pool");
    let manager = LlmManager::from_generator(generator);
    build_router(Arc::new(AppState::new(config, pool, manager)))
}

fn ask_request(question: &str) -> Request<Body> {
    let body = serde_json::to_vec(&json!({ "pregunta": question })).unwrap();
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ask_returns_question_sql_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let router = router_with(seed_database(&dir), Box::new(MockSqlGenerator::new()));

    let response = router
        .oneshot(ask_request("¿Qué arancel paga el cacao?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["pregunta_original"], "¿Qué arancel paga el cacao?");
    // The fenced completion must reach the database unfenced
    let executed = body["sql_ejecutado"].as_str().unwrap();
    assert!(executed.starts_with("SELECT"));
    assert!(!executed.contains("```"));

    let rows = body["datos"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert!(row.get("ProductDescription").is_some());
    }
    assert_eq!(rows[0]["ProductDescription"], "Cacao en grano, entero o partido");
    assert_eq!(rows[0]["AVE"], json!(15.0));
}

#[tokio::test]
async fn vague_question_is_rejected_before_the_database() {
    let dir = tempfile::tempdir().unwrap();
    // The mock returns the sentinel for anything it does not recognize
    let router = router_with(seed_database(&dir), Box::new(MockSqlGenerator::new()));

    let response = router
        .oneshot(ask_request("cuéntame algo bonito"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("too vague"));
}

#[tokio::test]
async fn non_select_completion_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockSqlGenerator::new()
        .with_response("borra", r#"DROP TABLE "ARANCELES EC-EEUU""#);
    let router = router_with(seed_database(&dir), Box::new(generator));

    let response = router
        .oneshot(ask_request("borra todos los aranceles"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = response_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("SELECT"));
}

#[tokio::test]
async fn database_rejected_query_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockSqlGenerator::new().with_response(
        "revision",
        r#"SELECT "NoSuchColumn" FROM "ARANCELES EC-EEUU""#,
    );
    let router = router_with(seed_database(&dir), Box::new(generator));

    let response = router
        .oneshot(ask_request("dame la revision"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("generated query is invalid"));
}

#[tokio::test]
async fn llm_failure_maps_to_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let router = router_with(seed_database(&dir), Box::new(FailingGenerator));

    let response = router
        .oneshot(ask_request("¿Qué arancel paga el cacao?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("AI service"));
}

#[tokio::test]
async fn welcome_works_without_any_backing_service() {
    // Lazily-checked pool on an unreachable path: the welcome endpoint must
    // not care.
    let mut config = AppConfig::default();
    config.database.connection_string = "/nonexistent-dir/tariff.duckdb".to_string();
    config.llm.backend = "mock".to_string();

    let manager = DuckDBConnectionManager::new(config.database.connection_string.clone());
    let pool = r2d2::Pool::builder()
        .connection_timeout(Duration::from_millis(200))
        .build_unchecked(manager);
    let llm = LlmManager::from_generator(Box::new(MockSqlGenerator::new()));
    let router = build_router(Arc::new(AppState::new(config, pool, llm)));

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert!(body["mensaje"].as_str().unwrap().contains("/ask"));
}

#[tokio::test]
async fn status_reports_backend_and_table() {
    let dir = tempfile::tempdir().unwrap();
    let router = router_with(seed_database(&dir), Box::new(MockSqlGenerator::new()));

    let response = router
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["llm_backend"], "mock");
    assert_eq!(body["table"], r#""ARANCELES EC-EEUU""#);
    assert!(body["uptime_seconds"].as_i64().is_some());
}
