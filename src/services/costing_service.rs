// src/services/costing_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CostingRepository, QuoteRepository},
    models::costing::{AdminTimeEntry, CostCategory, CostComponent, CostUnit, GroundCondition, Trip},
    models::quotes::Quote,
    services::RollupService,
};

// Orçamento arquivado é somente-leitura: nenhum registro contribuinte
// aceita mutação depois do arquivamento. Em caso de sucesso, devolve o
// job vinculado para carimbar nos registros novos.
fn ensure_mutable(quote: &Quote) -> Result<Option<Uuid>, AppError> {
    if quote.is_archived() {
        return Err(AppError::QuoteArchived);
    }
    Ok(quote.job_id)
}

// Ponto único de mutação dos registros contribuintes. Toda criação, edição
// e remoção de componente, viagem, tempo administrativo ou condição de
// terreno passa por aqui e termina em `recalculate` ANTES do commit: é
// impossível alterar um custo e esquecer o resumo desatualizado.
#[derive(Clone)]
pub struct CostingService {
    costing_repo: CostingRepository,
    quote_repo: QuoteRepository,
    rollup: RollupService,
}

impl CostingService {
    pub fn new(
        costing_repo: CostingRepository,
        quote_repo: QuoteRepository,
        rollup: RollupService,
    ) -> Self {
        Self {
            costing_repo,
            quote_repo,
            rollup,
        }
    }

    // Guarda comum: o orçamento precisa existir e não pode estar arquivado.
    // Devolve o job vinculado para carimbar nos registros novos.
    async fn check_mutable_quote(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        quote_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        let quote = self
            .quote_repo
            .get_quote(&mut **tx, quote_id)
            .await?
            .ok_or(AppError::QuoteNotFound)?;

        ensure_mutable(&quote)
    }

    // O despacho único: recalcula dentro da MESMA transação da mutação.
    // Ou a mutação e o resumo novo entram juntos, ou nenhum dos dois entra.
    async fn recalculate_after_mutation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        quote_id: Uuid,
    ) -> Result<(), AppError> {
        self.rollup.recalculate(&mut **tx, quote_id).await?;
        Ok(())
    }

    // =========================================================================
    //  COMPONENTES DE CUSTO
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_component<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        category: CostCategory,
        unit: CostUnit,
        quantity: Decimal,
        unit_cost: Decimal,
        total_cost: Decimal,
        created_by: Uuid,
    ) -> Result<CostComponent, AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Jobs nascem de orçamentos aceitos: o registro novo herda o vínculo
        // para continuar visível na tela do job.
        let job_id = self.check_mutable_quote(&mut tx, quote_id).await?;

        let component = self
            .costing_repo
            .create_component(
                &mut *tx, quote_id, job_id, category, unit, quantity, unit_cost, total_cost,
                created_by,
            )
            .await?;

        self.recalculate_after_mutation(&mut tx, quote_id).await?;
        tx.commit().await?;
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
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .costing_repo
            .get_component(&mut *tx, id)
            .await?
            .ok_or(AppError::CostRecordNotFound)?;
        self.check_mutable_quote(&mut tx, existing.quote_id).await?;

        let component = self
            .costing_repo
            .update_component(&mut *tx, id, unit, quantity, unit_cost, total_cost)
            .await?;

        self.recalculate_after_mutation(&mut tx, existing.quote_id).await?;
        tx.commit().await?;
        Ok(component)
    }

    pub async fn delete_component<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .costing_repo
            .get_component(&mut *tx, id)
            .await?
            .ok_or(AppError::CostRecordNotFound)?;
        self.check_mutable_quote(&mut tx, existing.quote_id).await?;

        self.costing_repo.delete_component(&mut *tx, id).await?;

        self.recalculate_after_mutation(&mut tx, existing.quote_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_components_for_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<CostComponent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.costing_repo.list_components_by_quote(executor, quote_id).await
    }

    pub async fn list_components_for_job<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
    ) -> Result<Vec<CostComponent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.costing_repo.list_components_by_job(executor, job_id).await
    }

    // =========================================================================
    //  VIAGENS
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_trip<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        staff_id: Uuid,
        scheduled_date: NaiveDate,
        duration_minutes: i32,
        distance_km: Decimal,
        travel_cost_total: Decimal,
    ) -> Result<Trip, AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let job_id = self.check_mutable_quote(&mut tx, quote_id).await?;

        let trip = self
            .costing_repo
            .create_trip(
                &mut *tx, quote_id, job_id, staff_id, scheduled_date, duration_minutes,
                distance_km, travel_cost_total,
            )
            .await?;

        self.recalculate_after_mutation(&mut tx, quote_id).await?;
        tx.commit().await?;
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
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .costing_repo
            .get_trip(&mut *tx, id)
            .await?
            .ok_or(AppError::CostRecordNotFound)?;
        self.check_mutable_quote(&mut tx, existing.quote_id).await?;

        let trip = self
            .costing_repo
            .update_trip(&mut *tx, id, scheduled_date, duration_minutes, distance_km, travel_cost_total)
            .await?;

        self.recalculate_after_mutation(&mut tx, existing.quote_id).await?;
        tx.commit().await?;
        Ok(trip)
    }

    pub async fn delete_trip<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .costing_repo
            .get_trip(&mut *tx, id)
            .await?
            .ok_or(AppError::CostRecordNotFound)?;
        self.check_mutable_quote(&mut tx, existing.quote_id).await?;

        self.costing_repo.delete_trip(&mut *tx, id).await?;

        self.recalculate_after_mutation(&mut tx, existing.quote_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_trips_for_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<Trip>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.costing_repo.list_trips_by_quote(executor, quote_id).await
    }

    pub async fn list_trips_for_job<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
    ) -> Result<Vec<Trip>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.costing_repo.list_trips_by_job(executor, job_id).await
    }

    // =========================================================================
    //  TEMPO ADMINISTRATIVO
    // =========================================================================

    pub async fn create_admin_time<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        staff_id: Uuid,
        duration_minutes: i32,
        total_cost: Decimal,
    ) -> Result<AdminTimeEntry, AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let job_id = self.check_mutable_quote(&mut tx, quote_id).await?;

        let entry = self
            .costing_repo
            .create_admin_time(&mut *tx, quote_id, job_id, staff_id, duration_minutes, total_cost)
            .await?;

        self.recalculate_after_mutation(&mut tx, quote_id).await?;
        tx.commit().await?;
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
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .costing_repo
            .get_admin_time(&mut *tx, id)
            .await?
            .ok_or(AppError::CostRecordNotFound)?;
        self.check_mutable_quote(&mut tx, existing.quote_id).await?;

        let entry = self
            .costing_repo
            .update_admin_time(&mut *tx, id, duration_minutes, total_cost)
            .await?;

        self.recalculate_after_mutation(&mut tx, existing.quote_id).await?;
        tx.commit().await?;
        Ok(entry)
    }

    pub async fn delete_admin_time<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .costing_repo
            .get_admin_time(&mut *tx, id)
            .await?
            .ok_or(AppError::CostRecordNotFound)?;
        self.check_mutable_quote(&mut tx, existing.quote_id).await?;

        self.costing_repo.delete_admin_time(&mut *tx, id).await?;

        self.recalculate_after_mutation(&mut tx, existing.quote_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_admin_time_for_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<AdminTimeEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.costing_repo.list_admin_time_by_quote(executor, quote_id).await
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
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.check_mutable_quote(&mut tx, quote_id).await?;

        let condition = self
            .costing_repo
            .create_ground_condition(&mut *tx, quote_id, description, additional_cost)
            .await?;

        self.recalculate_after_mutation(&mut tx, quote_id).await?;
        tx.commit().await?;
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
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .costing_repo
            .get_ground_condition(&mut *tx, id)
            .await?
            .ok_or(AppError::CostRecordNotFound)?;
        self.check_mutable_quote(&mut tx, existing.quote_id).await?;

        let condition = self
            .costing_repo
            .update_ground_condition(&mut *tx, id, description, additional_cost)
            .await?;

        self.recalculate_after_mutation(&mut tx, existing.quote_id).await?;
        tx.commit().await?;
        Ok(condition)
    }

    pub async fn delete_ground_condition<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .costing_repo
            .get_ground_condition(&mut *tx, id)
            .await?
            .ok_or(AppError::CostRecordNotFound)?;
        self.check_mutable_quote(&mut tx, existing.quote_id).await?;

        self.costing_repo.delete_ground_condition(&mut *tx, id).await?;

        self.recalculate_after_mutation(&mut tx, existing.quote_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_ground_conditions_for_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<GroundCondition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.costing_repo.list_ground_conditions_by_quote(executor, quote_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn quote(job_id: Option<Uuid>) -> Quote {
        Quote {
            id: Uuid::new_v4(),
            total_amount: "10000.00".parse().unwrap(),
            labour_estimate: None,
            job_id,
            archived_at: None,
        }
    }

    #[test]
    fn mutable_quote_hands_back_the_linked_job() {
        let job_id = Uuid::new_v4();
        assert_eq!(ensure_mutable(&quote(Some(job_id))).unwrap(), Some(job_id));
        assert_eq!(ensure_mutable(&quote(None)).unwrap(), None);
    }

    #[test]
    fn archived_quote_rejects_cost_mutations() {
        let mut archived = quote(Some(Uuid::new_v4()));
        archived.archived_at = Some(Utc::now());

        assert!(matches!(
            ensure_mutable(&archived),
            Err(AppError::QuoteArchived)
        ));
    }
}
