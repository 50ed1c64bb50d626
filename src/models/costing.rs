// src/models/costing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cost_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostCategory {
    Materials,           // Materiais (telas, postes, portões...)
    ManufacturingLabour, // Mão de obra de fabricação
    InstallLabour,       // Mão de obra de instalação
    SupplierFees,        // Fretes / taxas de fornecedor
    ThirdParty,          // Serviços de terceiros
}

impl CostCategory {
    /// Só as categorias de mão de obra contribuem para os minutos do resumo.
    pub fn is_labour(&self) -> bool {
        matches!(self, Self::ManufacturingLabour | Self::InstallLabour)
    }
}

// A unidade explícita resolve a ambiguidade antiga de `quantity`:
// horas para mão de obra, contagem ou metragem para materiais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cost_unit", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostUnit {
    Hours,
    Count,
    Length,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostComponent {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub job_id: Option<Uuid>,

    pub category: CostCategory,
    pub unit: CostUnit,

    #[schema(example = "12.5")]
    pub quantity: Decimal,

    #[schema(example = "45.00")]
    pub unit_cost: Decimal,

    // Valor de registro: o último valor salvo pelo usuário, editável à mão.
    // NULL significa linha malformada; o rollup trata como zero e avisa no log.
    #[schema(example = "562.50")]
    pub total_cost: Option<Decimal>,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub job_id: Option<Uuid>,
    pub staff_id: Uuid,

    #[schema(value_type = String, format = Date, example = "2026-03-14")]
    pub scheduled_date: NaiveDate,

    #[schema(example = 90)]
    pub duration_minutes: i32,

    #[schema(example = "42.3")]
    pub distance_km: Decimal,

    #[schema(example = "80.00")]
    pub travel_cost_total: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminTimeEntry {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub job_id: Option<Uuid>,
    pub staff_id: Uuid,

    #[schema(example = 30)]
    pub duration_minutes: i32,

    #[schema(example = "40.00")]
    pub total_cost: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroundCondition {
    pub id: Uuid,
    pub quote_id: Uuid,

    #[schema(example = "Solo rochoso no fundo do terreno")]
    pub description: String,

    #[schema(example = "350.00")]
    pub additional_cost: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
