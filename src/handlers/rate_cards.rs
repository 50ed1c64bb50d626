// src/handlers/rate_cards.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError, config::AppState, models::rates::RateType,
    services::RateCardService,
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRateCardPayload {
    pub user_id: Uuid,
    pub rate_type: RateType,

    #[validate(custom(function = "validate_not_negative"))]
    pub hourly_rate: Decimal,

    pub effective_from: DateTime<Utc>,
    pub effective_until: Option<DateTime<Utc>>,
}

impl CreateRateCardPayload {
    // Janela vazia ou invertida não faz sentido; sobreposição com outros
    // cartões é permitida (o resolver desempata).
    fn validate_window(&self) -> Result<(), ValidationError> {
        if let Some(until) = self.effective_until {
            if until <= self.effective_from {
                return Err(ValidationError::new("EmptyEffectiveWindow"));
            }
        }
        Ok(())
    }
}

#[utoipa::path(
    post,
    path = "/api/rate-cards",
    request_body = CreateRateCardPayload,
    responses((status = 201, body = crate::models::rates::RateCard)),
    tag = "rate-cards"
)]
pub async fn create_rate_card(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateRateCardPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    payload.validate_window().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("effectiveUntil", e);
        AppError::ValidationError(errors)
    })?;

    let card = app_state
        .rate_card_service
        .create_card(
            &app_state.db_pool,
            payload.user_id,
            payload.rate_type,
            payload.hourly_rate,
            payload.effective_from,
            payload.effective_until,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListRateCardsParams {
    pub user_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/api/rate-cards",
    params(ListRateCardsParams),
    responses((status = 200, body = [crate::models::rates::RateCard])),
    tag = "rate-cards"
)]
pub async fn list_rate_cards(
    State(app_state): State<AppState>,
    Query(params): Query<ListRateCardsParams>,
) -> Result<impl IntoResponse, AppError> {
    let cards = app_state
        .rate_card_service
        .list_for_user(&app_state.db_pool, params.user_id)
        .await?;

    Ok((StatusCode::OK, Json(cards)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRateParams {
    pub user_id: Uuid,
    pub rate_type: RateType,
    // Default: agora. A UI manda a data agendada do registro em edição.
    pub at: Option<DateTime<Utc>>,
    // Se vier, a resposta inclui o custo sugerido para essa duração.
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRateResponse {
    pub rate_card: Option<crate::models::rates::RateCard>,
    pub suggested_cost: Option<Decimal>,
}

/// Sugestão de custo na entrada de dados. Cartão ausente NÃO é erro:
/// ambos os campos voltam nulos e a UI deixa o usuário digitar o valor.
#[utoipa::path(
    get,
    path = "/api/rate-cards/resolve",
    params(ResolveRateParams),
    responses((status = 200, body = ResolvedRateResponse)),
    tag = "rate-cards"
)]
pub async fn resolve_rate(
    State(app_state): State<AppState>,
    Query(params): Query<ResolveRateParams>,
) -> Result<impl IntoResponse, AppError> {
    let at_time = params.at.unwrap_or_else(Utc::now);

    let rate_card = app_state
        .rate_card_service
        .resolve(&app_state.db_pool, params.user_id, params.rate_type, at_time)
        .await?;

    let suggested_cost = match (&rate_card, params.duration_minutes) {
        (Some(card), Some(minutes)) => Some(RateCardService::cost_for_duration(card, minutes)),
        _ => None,
    };

    Ok((StatusCode::OK, Json(ResolvedRateResponse { rate_card, suggested_cost })))
}
