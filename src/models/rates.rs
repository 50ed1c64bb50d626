// src/models/rates.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "rate_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateType {
    Manufacturing,
    Installation,
    Travel,
    Admin,
}

// Tarifa horária com janela de vigência. Janelas podem se sobrepor;
// o resolver escolhe uma de forma determinística (ver RateCardService).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateCard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rate_type: RateType,

    #[schema(example = "65.00")]
    pub hourly_rate: Decimal,

    pub effective_from: DateTime<Utc>,
    pub effective_until: Option<DateTime<Utc>>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
