// src/handlers/costing.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    models::costing::{CostCategory, CostUnit},
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// Filtro das listagens: por orçamento OU por job (registros ficam ligados
// aos dois, porque o job nasce do orçamento aceito).
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CostRecordFilter {
    pub quote_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
}

impl CostRecordFilter {
    fn require_one(&self) -> Result<(), AppError> {
        if self.quote_id.is_none() && self.job_id.is_none() {
            let mut errors = validator::ValidationErrors::new();
            let mut err = ValidationError::new("required");
            err.message = Some("Informe quoteId ou jobId.".into());
            errors.add("quoteId", err);
            return Err(AppError::ValidationError(errors));
        }
        Ok(())
    }
}

// ---
// Payloads: Componentes de Custo
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCostComponentPayload {
    pub quote_id: Uuid,

    pub category: CostCategory,

    // A unidade explícita por categoria: HOURS para mão de obra,
    // COUNT/LENGTH para materiais.
    pub unit: CostUnit,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_cost: Decimal,

    // O valor de registro. A UI pode sugerir quantity * unit_cost (ou o
    // custo vindo do rate card), mas o que chega aqui é o que vale.
    #[validate(custom(function = "validate_not_negative"))]
    pub total_cost: Decimal,

    // TODO: trocar por extrator de usuário autenticado quando o guard de
    // auth for plugado neste router.
    pub created_by: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCostComponentPayload {
    pub unit: CostUnit,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_cost: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub total_cost: Decimal,
}

// ---
// Handlers: Componentes de Custo
// ---

/// Cria um componente de custo e recalcula o resumo de P&L do orçamento.
#[utoipa::path(
    post,
    path = "/api/costing/components",
    request_body = CreateCostComponentPayload,
    responses((status = 201, body = crate::models::costing::CostComponent)),
    tag = "costing"
)]
pub async fn create_component(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCostComponentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let component = app_state
        .costing_service
        .create_component(
            &app_state.db_pool,
            payload.quote_id,
            payload.category,
            payload.unit,
            payload.quantity,
            payload.unit_cost,
            payload.total_cost,
            payload.created_by,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(component)))
}

#[utoipa::path(
    get,
    path = "/api/costing/components",
    params(CostRecordFilter),
    responses((status = 200, body = [crate::models::costing::CostComponent])),
    tag = "costing"
)]
pub async fn list_components(
    State(app_state): State<AppState>,
    Query(filter): Query<CostRecordFilter>,
) -> Result<impl IntoResponse, AppError> {
    filter.require_one()?;

    let components = match (filter.quote_id, filter.job_id) {
        (Some(quote_id), _) => {
            app_state
                .costing_service
                .list_components_for_quote(&app_state.db_pool, quote_id)
                .await?
        }
        (None, Some(job_id)) => {
            app_state
                .costing_service
                .list_components_for_job(&app_state.db_pool, job_id)
                .await?
        }
        (None, None) => unreachable!(),
    };

    Ok((StatusCode::OK, Json(components)))
}

#[utoipa::path(
    put,
    path = "/api/costing/components/{id}",
    request_body = UpdateCostComponentPayload,
    responses((status = 200, body = crate::models::costing::CostComponent)),
    tag = "costing"
)]
pub async fn update_component(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCostComponentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let component = app_state
        .costing_service
        .update_component(
            &app_state.db_pool,
            id,
            payload.unit,
            payload.quantity,
            payload.unit_cost,
            payload.total_cost,
        )
        .await?;

    Ok((StatusCode::OK, Json(component)))
}

#[utoipa::path(
    delete,
    path = "/api/costing/components/{id}",
    responses((status = 204)),
    tag = "costing"
)]
pub async fn delete_component(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .costing_service
        .delete_component(&app_state.db_pool, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Payloads: Viagens
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripPayload {
    pub quote_id: Uuid,
    pub staff_id: Uuid,

    #[schema(value_type = String, format = Date, example = "2026-03-14")]
    pub scheduled_date: NaiveDate,

    #[validate(range(min = 0, message = "A duração não pode ser negativa."))]
    pub duration_minutes: i32,

    #[validate(custom(function = "validate_not_negative"))]
    pub distance_km: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub travel_cost_total: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripPayload {
    #[schema(value_type = String, format = Date, example = "2026-03-14")]
    pub scheduled_date: NaiveDate,

    #[validate(range(min = 0, message = "A duração não pode ser negativa."))]
    pub duration_minutes: i32,

    #[validate(custom(function = "validate_not_negative"))]
    pub distance_km: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub travel_cost_total: Decimal,
}

// ---
// Handlers: Viagens
// ---

#[utoipa::path(
    post,
    path = "/api/costing/trips",
    request_body = CreateTripPayload,
    responses((status = 201, body = crate::models::costing::Trip)),
    tag = "costing"
)]
pub async fn create_trip(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateTripPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let trip = app_state
        .costing_service
        .create_trip(
            &app_state.db_pool,
            payload.quote_id,
            payload.staff_id,
            payload.scheduled_date,
            payload.duration_minutes,
            payload.distance_km,
            payload.travel_cost_total,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(trip)))
}

#[utoipa::path(
    get,
    path = "/api/costing/trips",
    params(CostRecordFilter),
    responses((status = 200, body = [crate::models::costing::Trip])),
    tag = "costing"
)]
pub async fn list_trips(
    State(app_state): State<AppState>,
    Query(filter): Query<CostRecordFilter>,
) -> Result<impl IntoResponse, AppError> {
    filter.require_one()?;

    let trips = match (filter.quote_id, filter.job_id) {
        (Some(quote_id), _) => {
            app_state
                .costing_service
                .list_trips_for_quote(&app_state.db_pool, quote_id)
                .await?
        }
        (None, Some(job_id)) => {
            app_state
                .costing_service
                .list_trips_for_job(&app_state.db_pool, job_id)
                .await?
        }
        (None, None) => unreachable!(),
    };

    Ok((StatusCode::OK, Json(trips)))
}

#[utoipa::path(
    put,
    path = "/api/costing/trips/{id}",
    request_body = UpdateTripPayload,
    responses((status = 200, body = crate::models::costing::Trip)),
    tag = "costing"
)]
pub async fn update_trip(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTripPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let trip = app_state
        .costing_service
        .update_trip(
            &app_state.db_pool,
            id,
            payload.scheduled_date,
            payload.duration_minutes,
            payload.distance_km,
            payload.travel_cost_total,
        )
        .await?;

    Ok((StatusCode::OK, Json(trip)))
}

#[utoipa::path(
    delete,
    path = "/api/costing/trips/{id}",
    responses((status = 204)),
    tag = "costing"
)]
pub async fn delete_trip(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.costing_service.delete_trip(&app_state.db_pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Payloads: Tempo Administrativo
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminTimePayload {
    pub quote_id: Uuid,
    pub staff_id: Uuid,

    #[validate(range(min = 0, message = "A duração não pode ser negativa."))]
    pub duration_minutes: i32,

    #[validate(custom(function = "validate_not_negative"))]
    pub total_cost: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminTimePayload {
    #[validate(range(min = 0, message = "A duração não pode ser negativa."))]
    pub duration_minutes: i32,

    #[validate(custom(function = "validate_not_negative"))]
    pub total_cost: Decimal,
}

// ---
// Handlers: Tempo Administrativo
// ---

#[utoipa::path(
    post,
    path = "/api/costing/admin-time",
    request_body = CreateAdminTimePayload,
    responses((status = 201, body = crate::models::costing::AdminTimeEntry)),
    tag = "costing"
)]
pub async fn create_admin_time(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateAdminTimePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state
        .costing_service
        .create_admin_time(
            &app_state.db_pool,
            payload.quote_id,
            payload.staff_id,
            payload.duration_minutes,
            payload.total_cost,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/costing/admin-time",
    params(CostRecordFilter),
    responses((status = 200, body = [crate::models::costing::AdminTimeEntry])),
    tag = "costing"
)]
pub async fn list_admin_time(
    State(app_state): State<AppState>,
    Query(filter): Query<CostRecordFilter>,
) -> Result<impl IntoResponse, AppError> {
    filter.require_one()?;

    // Tempo administrativo só é lançado na visão do orçamento.
    let quote_id = filter.quote_id.ok_or_else(|| {
        let mut errors = validator::ValidationErrors::new();
        let mut err = ValidationError::new("required");
        err.message = Some("Informe quoteId.".into());
        errors.add("quoteId", err);
        AppError::ValidationError(errors)
    })?;

    let entries = app_state
        .costing_service
        .list_admin_time_for_quote(&app_state.db_pool, quote_id)
        .await?;

    Ok((StatusCode::OK, Json(entries)))
}

#[utoipa::path(
    put,
    path = "/api/costing/admin-time/{id}",
    request_body = UpdateAdminTimePayload,
    responses((status = 200, body = crate::models::costing::AdminTimeEntry)),
    tag = "costing"
)]
pub async fn update_admin_time(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdminTimePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state
        .costing_service
        .update_admin_time(&app_state.db_pool, id, payload.duration_minutes, payload.total_cost)
        .await?;

    Ok((StatusCode::OK, Json(entry)))
}

#[utoipa::path(
    delete,
    path = "/api/costing/admin-time/{id}",
    responses((status = 204)),
    tag = "costing"
)]
pub async fn delete_admin_time(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .costing_service
        .delete_admin_time(&app_state.db_pool, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Payloads: Condições de Terreno
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroundConditionPayload {
    pub quote_id: Uuid,

    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub additional_cost: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroundConditionPayload {
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub additional_cost: Decimal,
}

// ---
// Handlers: Condições de Terreno
// ---

#[utoipa::path(
    post,
    path = "/api/costing/ground-conditions",
    request_body = CreateGroundConditionPayload,
    responses((status = 201, body = crate::models::costing::GroundCondition)),
    tag = "costing"
)]
pub async fn create_ground_condition(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateGroundConditionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let condition = app_state
        .costing_service
        .create_ground_condition(
            &app_state.db_pool,
            payload.quote_id,
            &payload.description,
            payload.additional_cost,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(condition)))
}

#[utoipa::path(
    get,
    path = "/api/costing/ground-conditions",
    params(CostRecordFilter),
    responses((status = 200, body = [crate::models::costing::GroundCondition])),
    tag = "costing"
)]
pub async fn list_ground_conditions(
    State(app_state): State<AppState>,
    Query(filter): Query<CostRecordFilter>,
) -> Result<impl IntoResponse, AppError> {
    filter.require_one()?;

    // Condições de terreno pertencem ao orçamento (avaliação do local).
    let quote_id = filter.quote_id.ok_or_else(|| {
        let mut errors = validator::ValidationErrors::new();
        let mut err = ValidationError::new("required");
        err.message = Some("Informe quoteId.".into());
        errors.add("quoteId", err);
        AppError::ValidationError(errors)
    })?;

    let conditions = app_state
        .costing_service
        .list_ground_conditions_for_quote(&app_state.db_pool, quote_id)
        .await?;

    Ok((StatusCode::OK, Json(conditions)))
}

#[utoipa::path(
    put,
    path = "/api/costing/ground-conditions/{id}",
    request_body = UpdateGroundConditionPayload,
    responses((status = 200, body = crate::models::costing::GroundCondition)),
    tag = "costing"
)]
pub async fn update_ground_condition(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGroundConditionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let condition = app_state
        .costing_service
        .update_ground_condition(
            &app_state.db_pool,
            id,
            &payload.description,
            payload.additional_cost,
        )
        .await?;

    Ok((StatusCode::OK, Json(condition)))
}

#[utoipa::path(
    delete,
    path = "/api/costing/ground-conditions/{id}",
    responses((status = 204)),
    tag = "costing"
)]
pub async fn delete_ground_condition(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .costing_service
        .delete_ground_condition(&app_state.db_pool, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
