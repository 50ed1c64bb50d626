// src/models/pl_summary.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Resumo de lucro/prejuízo por orçamento. É um cache derivado: cada linha
// é 100% recomputável a partir dos registros contribuintes, então pode ser
// descartada e reconstruída a qualquer momento.
//
// Invariantes (mantidas pelo RollupService, testadas lá):
//   total_cost == soma dos oito campos de categoria
//   profit_amount == total_revenue - total_cost
//   profit_margin_percent == 0 quando total_revenue <= 0 (nunca NaN/Inf)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlSummary {
    pub quote_id: Uuid,
    pub job_id: Option<Uuid>,

    #[schema(example = "10000.00")]
    pub total_revenue: Decimal,

    #[schema(example = "4000.00")]
    pub materials_cost: Decimal,
    pub manufacturing_labour_cost: Decimal,
    pub installation_labour_cost: Decimal,
    pub travel_cost: Decimal,
    pub admin_cost: Decimal,
    pub supplier_delivery_fees: Decimal,
    pub third_party_cost: Decimal,
    pub ground_conditions_cost: Decimal,

    #[schema(example = "4220.00")]
    pub total_cost: Decimal,

    #[schema(example = "5780.00")]
    pub profit_amount: Decimal,

    #[schema(example = "57.80")]
    pub profit_margin_percent: Decimal,

    pub is_supply_only: bool,

    pub total_manufacturing_minutes: i32,
    pub total_install_minutes: i32,
    pub total_admin_minutes: i32,
    pub total_travel_minutes: i32,
    pub actual_trip_count: i32,

    pub last_calculated_at: DateTime<Utc>,
}
