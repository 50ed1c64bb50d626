// src/services/rollup_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CostingRepository, PlSummaryRepository, QuoteRepository},
    models::{
        costing::{AdminTimeEntry, CostCategory, CostComponent, CostUnit, GroundCondition, Trip},
        pl_summary::PlSummary,
        quotes::Quote,
    },
};

// Motor de rollup de lucratividade.
//
// `recalculate` é o ÚNICO escritor de pl_summaries. Toda a sequência
// ler-agregar-gravar roda numa transação com a linha do orçamento travada
// (`FOR UPDATE`), então dois recálculos do mesmo orçamento nunca se
// atropelam e uma falha no meio não persiste resumo parcial.
//
// A agregação em si é a função pura `aggregate`, testada abaixo sem banco.
#[derive(Clone)]
pub struct RollupService {
    quote_repo: QuoteRepository,
    costing_repo: CostingRepository,
    summary_repo: PlSummaryRepository,
}

impl RollupService {
    pub fn new(
        quote_repo: QuoteRepository,
        costing_repo: CostingRepository,
        summary_repo: PlSummaryRepository,
    ) -> Self {
        Self {
            quote_repo,
            costing_repo,
            summary_repo,
        }
    }

    /// Recalcula o resumo de P&L de um orçamento a partir do estado atual
    /// de TODOS os registros contribuintes, e grava o resultado via upsert.
    ///
    /// Chamado duas vezes sem mutação no meio, produz o mesmo resumo
    /// (idempotente); só `last_calculated_at` avança.
    pub async fn recalculate<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<PlSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Orçamento travado até o commit: serializa recálculos concorrentes.
        let quote = self
            .quote_repo
            .get_quote_for_update(&mut *tx, quote_id)
            .await?
            .ok_or(AppError::QuoteNotFound)?;

        // 2. Snapshot de todos os registros contribuintes, na mesma transação.
        let components = self
            .costing_repo
            .list_components_by_quote(&mut *tx, quote_id)
            .await?;
        let trips = self.costing_repo.list_trips_by_quote(&mut *tx, quote_id).await?;
        let admin_entries = self
            .costing_repo
            .list_admin_time_by_quote(&mut *tx, quote_id)
            .await?;
        let ground_conditions = self
            .costing_repo
            .list_ground_conditions_by_quote(&mut *tx, quote_id)
            .await?;

        // 3. Agregação pura + upsert atômico.
        let summary = aggregate(
            &quote,
            &components,
            &trips,
            &admin_entries,
            &ground_conditions,
            Utc::now(),
        );
        let saved = self.summary_repo.upsert(&mut *tx, &summary).await?;

        tx.commit().await?;

        tracing::debug!(
            quote_id = %quote_id,
            total_cost = %saved.total_cost,
            profit = %saved.profit_amount,
            "Resumo de P&L recalculado"
        );

        Ok(saved)
    }

    /// Leitura com cálculo sob demanda: se ainda não existe linha no cache,
    /// a primeira consulta dispara um `recalculate` antes de responder.
    pub async fn get_summary_for_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<PlSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        if let Some(summary) = self.summary_repo.get_by_quote(&mut *conn, quote_id).await? {
            return Ok(summary);
        }
        self.recalculate(&mut *conn, quote_id).await
    }

    pub async fn get_summary_for_job<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
    ) -> Result<PlSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        // O job herda a linha do orçamento; job_id é chave secundária do cache.
        if let Some(summary) = self.summary_repo.get_by_job(&mut *conn, job_id).await? {
            return Ok(summary);
        }

        let quote = self
            .quote_repo
            .get_quote_by_job(&mut *conn, job_id)
            .await?
            .ok_or(AppError::JobNotFound)?;

        self.recalculate(&mut *conn, quote.id).await
    }

    pub async fn recalculate_for_job<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
    ) -> Result<PlSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + sqlx::Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let quote = self
            .quote_repo
            .get_quote_by_job(&mut *conn, job_id)
            .await?
            .ok_or(AppError::JobNotFound)?;

        self.recalculate(&mut *conn, quote.id).await
    }
}

// ---
// Agregação pura
// ---

const MINUTES_PER_HOUR: i64 = 60;

/// Reduz o estado atual dos registros contribuintes de um orçamento num
/// resumo de P&L. Função pura: mesmas entradas, mesmo resumo.
pub fn aggregate(
    quote: &Quote,
    components: &[CostComponent],
    trips: &[Trip],
    admin_entries: &[AdminTimeEntry],
    ground_conditions: &[GroundCondition],
    calculated_at: DateTime<Utc>,
) -> PlSummary {
    let total_revenue = quote.total_amount;

    // --- Componentes de custo, somados por categoria ---
    // Somamos o `total_cost` SALVO, não quantity * unit_cost: o usuário pode
    // ter editado o total à mão e o valor de registro é o que vale.
    let mut materials_cost = Decimal::ZERO;
    let mut manufacturing_labour_cost = Decimal::ZERO;
    let mut installation_labour_cost = Decimal::ZERO;
    let mut supplier_delivery_fees = Decimal::ZERO;
    let mut third_party_cost = Decimal::ZERO;

    let mut total_manufacturing_minutes: i64 = 0;
    let mut total_install_minutes: i64 = 0;

    for component in components {
        let cost = component_cost(component);
        match component.category {
            CostCategory::Materials => materials_cost += cost,
            CostCategory::ManufacturingLabour => manufacturing_labour_cost += cost,
            CostCategory::InstallLabour => installation_labour_cost += cost,
            CostCategory::SupplierFees => supplier_delivery_fees += cost,
            CostCategory::ThirdParty => third_party_cost += cost,
        }

        // Minutos só saem de componentes de mão de obra com unidade em horas.
        // A tag de unidade explícita evita interpretar metragem como tempo.
        if component.category.is_labour() && component.unit == CostUnit::Hours {
            let minutes = (component.quantity * Decimal::from(MINUTES_PER_HOUR))
                .round()
                .to_i64()
                .unwrap_or(0);
            match component.category {
                CostCategory::ManufacturingLabour => total_manufacturing_minutes += minutes,
                CostCategory::InstallLabour => total_install_minutes += minutes,
                _ => {}
            }
        }
    }

    // --- Viagens ---
    let mut travel_cost = Decimal::ZERO;
    let mut total_travel_minutes: i64 = 0;
    for trip in trips {
        match trip.travel_cost_total {
            Some(cost) => travel_cost += cost,
            None => {
                tracing::warn!(
                    trip_id = %trip.id,
                    quote_id = %trip.quote_id,
                    "Viagem sem travel_cost_total; contribuindo zero para o rollup"
                );
            }
        }
        total_travel_minutes += i64::from(trip.duration_minutes);
    }
    let actual_trip_count = trips.len() as i32;

    // --- Tempo administrativo ---
    let mut admin_cost = Decimal::ZERO;
    let mut total_admin_minutes: i64 = 0;
    for entry in admin_entries {
        match entry.total_cost {
            Some(cost) => admin_cost += cost,
            None => {
                tracing::warn!(
                    entry_id = %entry.id,
                    quote_id = %entry.quote_id,
                    "Tempo administrativo sem total_cost; contribuindo zero para o rollup"
                );
            }
        }
        total_admin_minutes += i64::from(entry.duration_minutes);
    }

    // --- Condições de terreno ---
    let mut ground_conditions_cost = Decimal::ZERO;
    for condition in ground_conditions {
        match condition.additional_cost {
            Some(cost) => ground_conditions_cost += cost,
            None => {
                tracing::warn!(
                    condition_id = %condition.id,
                    quote_id = %condition.quote_id,
                    "Condição de terreno sem additional_cost; contribuindo zero para o rollup"
                );
            }
        }
    }

    // --- Totais ---
    // total_cost é, por construção, a soma exata das oito categorias.
    let total_cost = materials_cost
        + manufacturing_labour_cost
        + installation_labour_cost
        + travel_cost
        + admin_cost
        + supplier_delivery_fees
        + third_party_cost
        + ground_conditions_cost;

    let profit_amount = total_revenue - total_cost;

    // Ramo explícito: margem é 0 quando não há receita. Nunca NaN/Inf.
    let profit_margin_percent = if total_revenue > Decimal::ZERO {
        (profit_amount / total_revenue * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };

    PlSummary {
        quote_id: quote.id,
        job_id: quote.job_id,
        total_revenue,
        materials_cost,
        manufacturing_labour_cost,
        installation_labour_cost,
        travel_cost,
        admin_cost,
        supplier_delivery_fees,
        third_party_cost,
        ground_conditions_cost,
        total_cost,
        profit_amount,
        profit_margin_percent,
        is_supply_only: quote.is_supply_only(),
        total_manufacturing_minutes: total_manufacturing_minutes.try_into().unwrap_or(i32::MAX),
        total_install_minutes: total_install_minutes.try_into().unwrap_or(i32::MAX),
        total_admin_minutes: total_admin_minutes.try_into().unwrap_or(i32::MAX),
        total_travel_minutes: total_travel_minutes.try_into().unwrap_or(i32::MAX),
        actual_trip_count,
        last_calculated_at: calculated_at,
    }
}

// Uma linha malformada (total_cost nulo) contribui zero e vira aviso de
// qualidade de dados: uma linha ruim nunca pode derrubar o rollup inteiro.
fn component_cost(component: &CostComponent) -> Decimal {
    match component.total_cost {
        Some(cost) => cost,
        None => {
            tracing::warn!(
                component_id = %component.id,
                quote_id = %component.quote_id,
                category = ?component.category,
                "Componente de custo sem total_cost; contribuindo zero para o rollup"
            );
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn quote(total_amount: &str, labour_estimate: Option<&str>) -> Quote {
        Quote {
            id: Uuid::new_v4(),
            total_amount: dec(total_amount),
            labour_estimate: labour_estimate.map(dec),
            job_id: None,
            archived_at: None,
        }
    }

    fn component(
        quote_id: Uuid,
        category: CostCategory,
        unit: CostUnit,
        quantity: &str,
        total_cost: Option<&str>,
    ) -> CostComponent {
        let now = Utc::now();
        CostComponent {
            id: Uuid::new_v4(),
            quote_id,
            job_id: None,
            category,
            unit,
            quantity: dec(quantity),
            unit_cost: Decimal::ZERO,
            total_cost: total_cost.map(dec),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    fn trip(quote_id: Uuid, duration_minutes: i32, cost: Option<&str>) -> Trip {
        let now = Utc::now();
        Trip {
            id: Uuid::new_v4(),
            quote_id,
            job_id: None,
            staff_id: Uuid::new_v4(),
            scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            duration_minutes,
            distance_km: dec("42.3"),
            travel_cost_total: cost.map(dec),
            created_at: now,
            updated_at: now,
        }
    }

    fn admin_entry(quote_id: Uuid, duration_minutes: i32, cost: Option<&str>) -> AdminTimeEntry {
        let now = Utc::now();
        AdminTimeEntry {
            id: Uuid::new_v4(),
            quote_id,
            job_id: None,
            staff_id: Uuid::new_v4(),
            duration_minutes,
            total_cost: cost.map(dec),
            created_at: now,
            updated_at: now,
        }
    }

    fn ground(quote_id: Uuid, cost: Option<&str>) -> GroundCondition {
        let now = Utc::now();
        GroundCondition {
            id: Uuid::new_v4(),
            quote_id,
            description: "Solo rochoso".into(),
            additional_cost: cost.map(dec),
            created_at: now,
            updated_at: now,
        }
    }

    // Cenário de referência: materiais 4000 + instalação 100 + viagem 80
    // + administrativo 40, receita 10000.
    fn scenario_a() -> (Quote, Vec<CostComponent>, Vec<Trip>, Vec<AdminTimeEntry>) {
        let q = quote("10000.00", Some("100.00"));
        let components = vec![
            component(q.id, CostCategory::Materials, CostUnit::Count, "20", Some("4000.00")),
            component(q.id, CostCategory::InstallLabour, CostUnit::Hours, "2", Some("100.00")),
        ];
        let trips = vec![trip(q.id, 45, Some("80.00"))];
        let admin = vec![admin_entry(q.id, 30, Some("40.00"))];
        (q, components, trips, admin)
    }

    #[test]
    fn scenario_a_totals() {
        let (q, components, trips, admin) = scenario_a();
        let summary = aggregate(&q, &components, &trips, &admin, &[], Utc::now());

        assert_eq!(summary.materials_cost, dec("4000.00"));
        assert_eq!(summary.installation_labour_cost, dec("100.00"));
        assert_eq!(summary.travel_cost, dec("80.00"));
        assert_eq!(summary.admin_cost, dec("40.00"));
        assert_eq!(summary.total_cost, dec("4220.00"));
        assert_eq!(summary.profit_amount, dec("5780.00"));
        assert_eq!(summary.profit_margin_percent, dec("57.80"));
        assert!(!summary.is_supply_only);
    }

    #[test]
    fn scenario_b_zero_revenue_has_zero_margin() {
        // Rascunho sem preço e com custos: margem 0, nunca erro ou NaN.
        let q = quote("0", None);
        let components = vec![component(
            q.id,
            CostCategory::Materials,
            CostUnit::Count,
            "3",
            Some("1234.56"),
        )];
        let summary = aggregate(&q, &components, &[], &[], &[], Utc::now());

        assert_eq!(summary.profit_margin_percent, Decimal::ZERO);
        assert_eq!(summary.total_cost, dec("1234.56"));
        assert_eq!(summary.profit_amount, dec("-1234.56"));
    }

    #[test]
    fn scenario_c_deleting_a_component_removes_its_contribution() {
        let (q, mut components, trips, admin) = scenario_a();
        // Remove o componente de mão de obra de instalação (100.00).
        components.retain(|c| c.category != CostCategory::InstallLabour);

        let summary = aggregate(&q, &components, &trips, &admin, &[], Utc::now());
        assert_eq!(summary.total_cost, dec("4120.00"));
        assert_eq!(summary.installation_labour_cost, Decimal::ZERO);
    }

    #[test]
    fn scenario_d_adding_a_component_adds_exactly_its_cost() {
        let (q, mut components, trips, admin) = scenario_a();
        let before = aggregate(&q, &components, &trips, &admin, &[], Utc::now());

        components.push(component(
            q.id,
            CostCategory::Materials,
            CostUnit::Length,
            "12.5",
            Some("500.00"),
        ));
        let after = aggregate(&q, &components, &trips, &admin, &[], Utc::now());

        assert_eq!(after.total_cost, before.total_cost + dec("500.00"));
        assert_eq!(after.materials_cost, before.materials_cost + dec("500.00"));
        // As demais categorias não mudam.
        assert_eq!(after.installation_labour_cost, before.installation_labour_cost);
        assert_eq!(after.travel_cost, before.travel_cost);
        assert_eq!(after.admin_cost, before.admin_cost);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let (q, components, trips, admin) = scenario_a();
        let at = Utc::now();

        let first = aggregate(&q, &components, &trips, &admin, &[], at);
        let second = aggregate(&q, &components, &trips, &admin, &[], at);
        assert_eq!(first, second);
    }

    #[test]
    fn total_cost_equals_sum_of_the_eight_categories() {
        let q = quote("2500.00", Some("300.00"));
        let components = vec![
            component(q.id, CostCategory::Materials, CostUnit::Count, "1", Some("100.10")),
            component(q.id, CostCategory::ManufacturingLabour, CostUnit::Hours, "1.5", Some("90.00")),
            component(q.id, CostCategory::InstallLabour, CostUnit::Hours, "4", Some("260.00")),
            component(q.id, CostCategory::SupplierFees, CostUnit::Count, "1", Some("55.25")),
            component(q.id, CostCategory::ThirdParty, CostUnit::Count, "1", Some("300.33")),
        ];
        let trips = vec![trip(q.id, 60, Some("75.40")), trip(q.id, 30, Some("22.10"))];
        let admin = vec![admin_entry(q.id, 15, Some("18.75"))];
        let grounds = vec![ground(q.id, Some("350.00"))];

        let summary = aggregate(&q, &components, &trips, &admin, &grounds, Utc::now());

        let expected = summary.materials_cost
            + summary.manufacturing_labour_cost
            + summary.installation_labour_cost
            + summary.travel_cost
            + summary.admin_cost
            + summary.supplier_delivery_fees
            + summary.third_party_cost
            + summary.ground_conditions_cost;
        assert_eq!(summary.total_cost, expected);
        assert_eq!(summary.profit_amount, summary.total_revenue - summary.total_cost);
    }

    #[test]
    fn malformed_rows_contribute_zero_without_blocking_the_rollup() {
        // Uma linha ruim nunca pode esconder a lucratividade das demais.
        let q = quote("1000.00", None);
        let components = vec![
            component(q.id, CostCategory::Materials, CostUnit::Count, "1", None),
            component(q.id, CostCategory::Materials, CostUnit::Count, "1", Some("200.00")),
        ];
        let trips = vec![trip(q.id, 20, None)];
        let grounds = vec![ground(q.id, None)];

        let summary = aggregate(&q, &components, &trips, &[], &grounds, Utc::now());

        assert_eq!(summary.materials_cost, dec("200.00"));
        assert_eq!(summary.travel_cost, Decimal::ZERO);
        assert_eq!(summary.ground_conditions_cost, Decimal::ZERO);
        assert_eq!(summary.total_cost, dec("200.00"));
        // A viagem malformada ainda conta minutos e presença.
        assert_eq!(summary.total_travel_minutes, 20);
        assert_eq!(summary.actual_trip_count, 1);
    }

    #[test]
    fn labour_minutes_derive_only_from_hour_tagged_components() {
        let q = quote("5000.00", Some("1.00"));
        let components = vec![
            component(q.id, CostCategory::ManufacturingLabour, CostUnit::Hours, "2.5", Some("150.00")),
            component(q.id, CostCategory::InstallLabour, CostUnit::Hours, "3", Some("210.00")),
            // Metragem em categoria de mão de obra: custo conta, minutos não.
            component(q.id, CostCategory::InstallLabour, CostUnit::Length, "40", Some("80.00")),
            // Materiais nunca geram minutos, mesmo se alguém marcar horas.
            component(q.id, CostCategory::Materials, CostUnit::Hours, "8", Some("99.00")),
        ];

        let summary = aggregate(&q, &components, &[], &[], &[], Utc::now());

        assert_eq!(summary.total_manufacturing_minutes, 150);
        assert_eq!(summary.total_install_minutes, 180);
        assert_eq!(summary.installation_labour_cost, dec("290.00"));
    }

    #[test]
    fn supply_only_classification_follows_labour_estimate() {
        let none = quote("100.00", None);
        let zero = quote("100.00", Some("0"));
        let some = quote("100.00", Some("250.00"));

        assert!(aggregate(&none, &[], &[], &[], &[], Utc::now()).is_supply_only);
        assert!(aggregate(&zero, &[], &[], &[], &[], Utc::now()).is_supply_only);
        assert!(!aggregate(&some, &[], &[], &[], &[], Utc::now()).is_supply_only);
    }

    #[test]
    fn trip_and_admin_minutes_are_summed() {
        let q = quote("100.00", None);
        let trips = vec![trip(q.id, 45, Some("10.00")), trip(q.id, 75, Some("12.00"))];
        let admin = vec![admin_entry(q.id, 30, Some("5.00")), admin_entry(q.id, 10, Some("2.00"))];

        let summary = aggregate(&q, &[], &trips, &admin, &[], Utc::now());

        assert_eq!(summary.total_travel_minutes, 120);
        assert_eq!(summary.actual_trip_count, 2);
        assert_eq!(summary.total_admin_minutes, 40);
        assert_eq!(summary.travel_cost, dec("22.00"));
        assert_eq!(summary.admin_cost, dec("7.00"));
    }

    #[tokio::test]
    async fn summary_read_futures_are_send() {
        // O axum só aceita handlers cujos futures sejam Send; as leituras
        // por job precisam continuar satisfazendo isso com o pool como
        // executor (este teste não abre conexão nenhuma: o pool é lazy e
        // os futures nunca são polled).
        fn assert_send<T: Send>(_: T) {}

        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let service = RollupService::new(
            crate::db::QuoteRepository::new(),
            crate::db::CostingRepository::new(),
            crate::db::PlSummaryRepository::new(),
        );
        let id = Uuid::new_v4();

        assert_send(service.get_summary_for_quote(&pool, id));
        assert_send(service.get_summary_for_job(&pool, id));
        assert_send(service.recalculate(&pool, id));
        assert_send(service.recalculate_for_job(&pool, id));
    }

    #[test]
    fn repeated_recalculation_does_not_drift() {
        // Simula o ciclo editar-recalcular muitas vezes: os totais saem
        // idênticos ao centavo em toda rodada (Decimal, nunca float).
        let (q, components, trips, admin) = scenario_a();
        let at = Utc::now();

        let baseline = aggregate(&q, &components, &trips, &admin, &[], at);
        for _ in 0..100 {
            let again = aggregate(&q, &components, &trips, &admin, &[], at);
            assert_eq!(again.total_cost, baseline.total_cost);
            assert_eq!(again.profit_margin_percent, baseline.profit_margin_percent);
        }
    }
}
