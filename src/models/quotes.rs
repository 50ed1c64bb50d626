// src/models/quotes.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Visão somente-leitura do orçamento. O CRUD de orçamentos pertence ao
// módulo de vendas; o rollup só precisa destes campos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,

    #[schema(example = "10000.00")]
    pub total_amount: Decimal,

    // Nulo ou zero => orçamento "só fornecimento" (sem instalação).
    #[schema(example = "2500.00")]
    pub labour_estimate: Option<Decimal>,

    pub job_id: Option<Uuid>,

    pub archived_at: Option<DateTime<Utc>>,
}

impl Quote {
    pub fn is_supply_only(&self) -> bool {
        match self.labour_estimate {
            Some(estimate) => estimate.is_zero(),
            None => true,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}
