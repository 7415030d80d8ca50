use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::query;
use crate::query::executor::{self, ExecuteError};
use crate::query::guard::{guard_completion, GuardError};
use crate::query::ResultRow;
use crate::web::error::ApiError;
use crate::web::state::AppState;

// Wire field names stay in Spanish: this service replaces an existing
// deployment and its clients.

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(rename = "pregunta")]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    #[serde(rename = "pregunta_original")]
    pub original_question: String,
    #[serde(rename = "sql_ejecutado")]
    pub executed_sql: String,
    #[serde(rename = "datos")]
    pub rows: Vec<ResultRow>,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub llm_backend: String,
    pub table: String,
}

pub async fn welcome() -> Json<serde_json::Value> {
    Json(json!({
        "mensaje": "Tariff query API is live. POST {\"pregunta\": ...} to /ask."
    }))
}

/// The resolve pipeline: translate the question to SQL, guard the
/// completion, execute it, map the rows.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    info!("Received question: {}", payload.question);

    // Stage 1: generate SQL with the configured model
    let schema = query::prompt_context();
    let raw_completion = {
        let manager = state.llm_manager.lock().await;
        manager
            .generate_sql(&payload.question, &schema)
            .await
            .map_err(|e| {
                error!("LLM request failed: {}", e);
                ApiError::LlmUnavailable
            })?
    };

    // Stage 2: sanitize and guard the completion
    let sql = guard_completion(&raw_completion).map_err(|e| match e {
        GuardError::TooVague => ApiError::QuestionTooVague,
        GuardError::NotSelect => {
            error!("Guard rejected completion: {}", raw_completion);
            ApiError::NotSelect
        }
    })?;
    info!("Generated SQL: {}", sql);

    // Stage 3: execute against the tariff database
    let output = executor::execute(&state.db_pool, sql.clone())
        .await
        .map_err(|e| match e {
            ExecuteError::Connection(detail) => {
                error!("Database connection failed: {}", detail);
                ApiError::DatabaseUnavailable
            }
            ExecuteError::Rejected(detail) => {
                error!("Database rejected generated query: {}", detail);
                ApiError::QueryRejected(detail)
            }
            ExecuteError::Task(detail) => {
                error!("Database task failed: {}", detail);
                ApiError::Internal(detail)
            }
        })?;

    info!(
        "Query returned {} row(s) in {}ms",
        output.row_count, output.execution_time_ms
    );

    Ok(Json(AskResponse {
        original_question: payload.question,
        executed_sql: sql,
        rows: output.rows,
    }))
}

pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        llm_backend: state.config.llm.backend.clone(),
        table: query::TARIFF_TABLE.to_string(),
    })
}
