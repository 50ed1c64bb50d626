// src/db/rate_card_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::rates::{RateCard, RateType},
};

const RATE_CARD_COLUMNS: &str =
    "id, user_id, rate_type, hourly_rate, effective_from, effective_until, is_active, created_at";

#[derive(Clone)]
pub struct RateCardRepository;

impl RateCardRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        rate_type: RateType,
        hourly_rate: Decimal,
        effective_from: DateTime<Utc>,
        effective_until: Option<DateTime<Utc>>,
    ) -> Result<RateCard, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let card = sqlx::query_as::<_, RateCard>(&format!(
            r#"
            INSERT INTO rate_cards (user_id, rate_type, hourly_rate, effective_from, effective_until)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RATE_CARD_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(rate_type)
        .bind(hourly_rate)
        .bind(effective_from)
        .bind(effective_until)
        .fetch_one(executor)
        .await?;

        Ok(card)
    }

    /// Todos os cartões ativos de um usuário para um tipo de tarifa.
    /// A escolha do cartão vigente (janelas podem se sobrepor!) é regra de
    /// negócio e mora no RateCardService, não aqui.
    pub async fn get_active_cards<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        rate_type: RateType,
    ) -> Result<Vec<RateCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cards = sqlx::query_as::<_, RateCard>(&format!(
            r#"
            SELECT {RATE_CARD_COLUMNS}
            FROM rate_cards
            WHERE user_id = $1 AND rate_type = $2 AND is_active = TRUE
            ORDER BY effective_from DESC
            "#
        ))
        .bind(user_id)
        .bind(rate_type)
        .fetch_all(executor)
        .await?;

        Ok(cards)
    }

    pub async fn list_by_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<RateCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cards = sqlx::query_as::<_, RateCard>(&format!(
            r#"
            SELECT {RATE_CARD_COLUMNS}
            FROM rate_cards
            WHERE user_id = $1
            ORDER BY rate_type, effective_from DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(cards)
    }
}
