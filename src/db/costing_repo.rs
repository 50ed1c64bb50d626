// src/db/costing_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::costing::{AdminTimeEntry, CostCategory, CostComponent, CostUnit, GroundCondition, Trip},
};

const COMPONENT_COLUMNS: &str = "id, quote_id, job_id, category, unit, quantity, unit_cost, \
     total_cost, created_by, created_at, updated_at";

const TRIP_COLUMNS: &str = "id, quote_id, job_id, staff_id, scheduled_date, duration_minutes, \
     distance_km, travel_cost_total, created_at, updated_at";

const ADMIN_TIME_COLUMNS: &str =
    "id, quote_id, job_id, staff_id, duration_minutes, total_cost, created_at, updated_at";

const GROUND_CONDITION_COLUMNS: &str =
    "id, quote_id, description, additional_cost, created_at, updated_at";

// Repositório dos quatro tipos de registro contribuinte. CRUD puro:
// nenhum método aqui deriva totais: `total_cost` entra e sai como o
// usuário salvou. Quem agrega é o RollupService.
//
// Um registro pode estar ligado a um orçamento, a um job, ou aos dois,
// porque jobs nascem de orçamentos aceitos e o histórico de custo precisa
// continuar visível nas duas telas.
#[derive(Clone)]
pub struct CostingRepository;

impl CostingRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  COMPONENTES DE CUSTO
    // =========================================================================

    pub async fn create_component<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        job_id: Option<Uuid>,
        category: CostCategory,
        unit: CostUnit,
        quantity: Decimal,
        unit_cost: Decimal,
        total_cost: Decimal,
        created_by: Uuid,
    ) -> Result<CostComponent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let component = sqlx::query_as::<_, CostComponent>(&format!(
            r#"
            INSERT INTO cost_components
                (quote_id, job_id, category, unit, quantity, unit_cost, total_cost, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COMPONENT_COLUMNS}
            "#
        ))
        .bind(quote_id)
        .bind(job_id)
        .bind(category)
        .bind(unit)
        .bind(quantity)
        .bind(unit_cost)
        .bind(total_cost)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(component)
    }

    pub async fn get_component<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<CostComponent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let component = sqlx::query_as::<_, CostComponent>(&format!(
            "SELECT {COMPONENT_COLUMNS} FROM cost_components WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(component)
    }

    pub async fn update_component<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        unit: CostUnit,
        quantity: Decimal,
        unit_cost: Decimal,
        total_cost: Decimal,
    ) -> Result<CostComponent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let component = sqlx::query_as::<_, CostComponent>(&format!(
            r#"
            UPDATE cost_components
            SET unit = $2, quantity = $3, unit_cost = $4, total_cost = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {COMPONENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(unit)
        .bind(quantity)
        .bind(unit_cost)
        .bind(total_cost)
        .fetch_optional(executor)
        .await?;

        component.ok_or(AppError::CostRecordNotFound)
    }

    pub async fn delete_component<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM cost_components WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::CostRecordNotFound);
        }
        Ok(())
    }

    pub async fn list_components_by_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<CostComponent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let components = sqlx::query_as::<_, CostComponent>(&format!(
            "SELECT {COMPONENT_COLUMNS} FROM cost_components WHERE quote_id = $1 ORDER BY created_at ASC"
        ))
        .bind(quote_id)
        .fetch_all(executor)
        .await?;

        Ok(components)
    }

    pub async fn list_components_by_job<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
    ) -> Result<Vec<CostComponent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let components = sqlx::query_as::<_, CostComponent>(&format!(
            "SELECT {COMPONENT_COLUMNS} FROM cost_components WHERE job_id = $1 ORDER BY created_at ASC"
        ))
        .bind(job_id)
        .fetch_all(executor)
        .await?;

        Ok(components)
    }

    // =========================================================================
    //  VIAGENS (deslocamento de equipe)
    // =========================================================================

    pub async fn create_trip<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        job_id: Option<Uuid>,
        staff_id: Uuid,
        scheduled_date: NaiveDate,
        duration_minutes: i32,
        distance_km: Decimal,
        travel_cost_total: Decimal,
    ) -> Result<Trip, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trip = sqlx::query_as::<_, Trip>(&format!(
            r#"
            INSERT INTO trips
                (quote_id, job_id, staff_id, scheduled_date, duration_minutes, distance_km, travel_cost_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TRIP_COLUMNS}
            "#
        ))
        .bind(quote_id)
        .bind(job_id)
        .bind(staff_id)
        .bind(scheduled_date)
        .bind(duration_minutes)
        .bind(distance_km)
        .bind(travel_cost_total)
        .fetch_one(executor)
        .await?;

        Ok(trip)
    }

    pub async fn get_trip<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Trip>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trip = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(trip)
    }

    pub async fn update_trip<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scheduled_date: NaiveDate,
        duration_minutes: i32,
        distance_km: Decimal,
        travel_cost_total: Decimal,
    ) -> Result<Trip, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trip = sqlx::query_as::<_, Trip>(&format!(
            r#"
            UPDATE trips
            SET scheduled_date = $2, duration_minutes = $3, distance_km = $4,
                travel_cost_total = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {TRIP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scheduled_date)
        .bind(duration_minutes)
        .bind(distance_km)
        .bind(travel_cost_total)
        .fetch_optional(executor)
        .await?;

        trip.ok_or(AppError::CostRecordNotFound)
    }

    pub async fn delete_trip<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::CostRecordNotFound);
        }
        Ok(())
    }

    pub async fn list_trips_by_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<Trip>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trips = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE quote_id = $1 ORDER BY scheduled_date ASC"
        ))
        .bind(quote_id)
        .fetch_all(executor)
        .await?;

        Ok(trips)
    }

    pub async fn list_trips_by_job<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
    ) -> Result<Vec<Trip>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trips = sqlx::query_as::<_, Trip>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE job_id = $1 ORDER BY scheduled_date ASC"
        ))
        .bind(job_id)
        .fetch_all(executor)
        .await?;

        Ok(trips)
    }

    // =========================================================================
    //  TEMPO ADMINISTRATIVO
    // =========================================================================

    pub async fn create_admin_time<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        job_id: Option<Uuid>,
        staff_id: Uuid,
        duration_minutes: i32,
        total_cost: Decimal,
    ) -> Result<AdminTimeEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, AdminTimeEntry>(&format!(
            r#"
            INSERT INTO admin_time_entries
                (quote_id, job_id, staff_id, duration_minutes, total_cost)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ADMIN_TIME_COLUMNS}
            "#
        ))
        .bind(quote_id)
        .bind(job_id)
        .bind(staff_id)
        .bind(duration_minutes)
        .bind(total_cost)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    pub async fn get_admin_time<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<AdminTimeEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, AdminTimeEntry>(&format!(
            "SELECT {ADMIN_TIME_COLUMNS} FROM admin_time_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(entry)
    }

    pub async fn update_admin_time<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        duration_minutes: i32,
        total_cost: Decimal,
    ) -> Result<AdminTimeEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, AdminTimeEntry>(&format!(
            r#"
            UPDATE admin_time_entries
            SET duration_minutes = $2, total_cost = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {ADMIN_TIME_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(duration_minutes)
        .bind(total_cost)
        .fetch_optional(executor)
        .await?;

        entry.ok_or(AppError::CostRecordNotFound)
    }

    pub async fn delete_admin_time<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM admin_time_entries WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::CostRecordNotFound);
        }
        Ok(())
    }

    pub async fn list_admin_time_by_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<AdminTimeEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, AdminTimeEntry>(&format!(
            "SELECT {ADMIN_TIME_COLUMNS} FROM admin_time_entries WHERE quote_id = $1 ORDER BY created_at ASC"
        ))
        .bind(quote_id)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }

    // =========================================================================
    //  CONDIÇÕES DE TERRENO
    // =========================================================================

    pub async fn create_ground_condition<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        description: &str,
        additional_cost: Decimal,
    ) -> Result<GroundCondition, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let condition = sqlx::query_as::<_, GroundCondition>(&format!(
            r#"
            INSERT INTO ground_conditions (quote_id, description, additional_cost)
            VALUES ($1, $2, $3)
            RETURNING {GROUND_CONDITION_COLUMNS}
            "#
        ))
        .bind(quote_id)
        .bind(description)
        .bind(additional_cost)
        .fetch_one(executor)
        .await?;

        Ok(condition)
    }

    pub async fn get_ground_condition<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<GroundCondition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let condition = sqlx::query_as::<_, GroundCondition>(&format!(
            "SELECT {GROUND_CONDITION_COLUMNS} FROM ground_conditions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(condition)
    }

    pub async fn update_ground_condition<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        description: &str,
        additional_cost: Decimal,
    ) -> Result<GroundCondition, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let condition = sqlx::query_as::<_, GroundCondition>(&format!(
            r#"
            UPDATE ground_conditions
            SET description = $2, additional_cost = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {GROUND_CONDITION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(description)
        .bind(additional_cost)
        .fetch_optional(executor)
        .await?;

        condition.ok_or(AppError::CostRecordNotFound)
    }

    pub async fn delete_ground_condition<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM ground_conditions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::CostRecordNotFound);
        }
        Ok(())
    }

    pub async fn list_ground_conditions_by_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<GroundCondition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let conditions = sqlx::query_as::<_, GroundCondition>(&format!(
            "SELECT {GROUND_CONDITION_COLUMNS} FROM ground_conditions WHERE quote_id = $1 ORDER BY created_at ASC"
        ))
        .bind(quote_id)
        .fetch_all(executor)
        .await?;

        Ok(conditions)
    }
}
