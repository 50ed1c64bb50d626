// src/handlers/pl_summary.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState};

/// Resumo de P&L do orçamento. Se ainda não existe linha no cache, a
/// primeira leitura dispara o recálculo antes de responder.
#[utoipa::path(
    get,
    path = "/api/quotes/{quote_id}/pl-summary",
    responses(
        (status = 200, body = crate::models::pl_summary::PlSummary),
        (status = 404, description = "Orçamento não encontrado")
    ),
    tag = "pl-summary"
)]
pub async fn get_quote_summary(
    State(app_state): State<AppState>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state
        .rollup_service
        .get_summary_for_quote(&app_state.db_pool, quote_id)
        .await?;

    Ok((StatusCode::OK, Json(summary)))
}

/// Recálculo manual: relê todos os registros contribuintes e regrava o
/// resumo. Idempotente: sem mutação no meio, o resultado não muda.
#[utoipa::path(
    post,
    path = "/api/quotes/{quote_id}/pl-summary/recalculate",
    responses(
        (status = 200, body = crate::models::pl_summary::PlSummary),
        (status = 404, description = "Orçamento não encontrado")
    ),
    tag = "pl-summary"
)]
pub async fn recalculate_quote_summary(
    State(app_state): State<AppState>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state
        .rollup_service
        .recalculate(&app_state.db_pool, quote_id)
        .await?;

    Ok((StatusCode::OK, Json(summary)))
}

/// O job herda o resumo do orçamento que o originou.
#[utoipa::path(
    get,
    path = "/api/jobs/{job_id}/pl-summary",
    responses(
        (status = 200, body = crate::models::pl_summary::PlSummary),
        (status = 404, description = "Job não encontrado")
    ),
    tag = "pl-summary"
)]
pub async fn get_job_summary(
    State(app_state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state
        .rollup_service
        .get_summary_for_job(&app_state.db_pool, job_id)
        .await?;

    Ok((StatusCode::OK, Json(summary)))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{job_id}/pl-summary/recalculate",
    responses(
        (status = 200, body = crate::models::pl_summary::PlSummary),
        (status = 404, description = "Job não encontrado")
    ),
    tag = "pl-summary"
)]
pub async fn recalculate_job_summary(
    State(app_state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state
        .rollup_service
        .recalculate_for_job(&app_state.db_pool, job_id)
        .await?;

    Ok((StatusCode::OK, Json(summary)))
}
