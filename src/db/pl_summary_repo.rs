// src/db/pl_summary_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::pl_summary::PlSummary};

const SUMMARY_COLUMNS: &str = "quote_id, job_id, total_revenue, materials_cost, \
     manufacturing_labour_cost, installation_labour_cost, travel_cost, admin_cost, \
     supplier_delivery_fees, third_party_cost, ground_conditions_cost, total_cost, \
     profit_amount, profit_margin_percent, is_supply_only, total_manufacturing_minutes, \
     total_install_minutes, total_admin_minutes, total_travel_minutes, actual_trip_count, \
     last_calculated_at";

// Cache do resumo de P&L. Uma linha por orçamento; o job herda a mesma
// linha via `job_id`. Sem ciclo de vida próprio: só o RollupService escreve.
#[derive(Clone)]
pub struct PlSummaryRepository;

impl PlSummaryRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_by_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Option<PlSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let summary = sqlx::query_as::<_, PlSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM pl_summaries WHERE quote_id = $1"
        ))
        .bind(quote_id)
        .fetch_optional(executor)
        .await?;

        Ok(summary)
    }

    pub async fn get_by_job<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
    ) -> Result<Option<PlSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let summary = sqlx::query_as::<_, PlSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM pl_summaries WHERE job_id = $1"
        ))
        .bind(job_id)
        .fetch_optional(executor)
        .await?;

        Ok(summary)
    }

    /// Upsert atômico: ou a linha inteira entra, ou nada entra. Nunca
    /// persistimos um resumo parcial.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        summary: &PlSummary,
    ) -> Result<PlSummary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, PlSummary>(&format!(
            r#"
            INSERT INTO pl_summaries (
                quote_id, job_id, total_revenue, materials_cost,
                manufacturing_labour_cost, installation_labour_cost, travel_cost,
                admin_cost, supplier_delivery_fees, third_party_cost,
                ground_conditions_cost, total_cost, profit_amount,
                profit_margin_percent, is_supply_only, total_manufacturing_minutes,
                total_install_minutes, total_admin_minutes, total_travel_minutes,
                actual_trip_count, last_calculated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            ON CONFLICT (quote_id) DO UPDATE SET
                job_id = EXCLUDED.job_id,
                total_revenue = EXCLUDED.total_revenue,
                materials_cost = EXCLUDED.materials_cost,
                manufacturing_labour_cost = EXCLUDED.manufacturing_labour_cost,
                installation_labour_cost = EXCLUDED.installation_labour_cost,
                travel_cost = EXCLUDED.travel_cost,
                admin_cost = EXCLUDED.admin_cost,
                supplier_delivery_fees = EXCLUDED.supplier_delivery_fees,
                third_party_cost = EXCLUDED.third_party_cost,
                ground_conditions_cost = EXCLUDED.ground_conditions_cost,
                total_cost = EXCLUDED.total_cost,
                profit_amount = EXCLUDED.profit_amount,
                profit_margin_percent = EXCLUDED.profit_margin_percent,
                is_supply_only = EXCLUDED.is_supply_only,
                total_manufacturing_minutes = EXCLUDED.total_manufacturing_minutes,
                total_install_minutes = EXCLUDED.total_install_minutes,
                total_admin_minutes = EXCLUDED.total_admin_minutes,
                total_travel_minutes = EXCLUDED.total_travel_minutes,
                actual_trip_count = EXCLUDED.actual_trip_count,
                last_calculated_at = EXCLUDED.last_calculated_at
            RETURNING {SUMMARY_COLUMNS}
            "#
        ))
        .bind(summary.quote_id)
        .bind(summary.job_id)
        .bind(summary.total_revenue)
        .bind(summary.materials_cost)
        .bind(summary.manufacturing_labour_cost)
        .bind(summary.installation_labour_cost)
        .bind(summary.travel_cost)
        .bind(summary.admin_cost)
        .bind(summary.supplier_delivery_fees)
        .bind(summary.third_party_cost)
        .bind(summary.ground_conditions_cost)
        .bind(summary.total_cost)
        .bind(summary.profit_amount)
        .bind(summary.profit_margin_percent)
        .bind(summary.is_supply_only)
        .bind(summary.total_manufacturing_minutes)
        .bind(summary.total_install_minutes)
        .bind(summary.total_admin_minutes)
        .bind(summary.total_travel_minutes)
        .bind(summary.actual_trip_count)
        .bind(summary.last_calculated_at)
        .fetch_one(executor)
        .await?;

        Ok(saved)
    }
}
