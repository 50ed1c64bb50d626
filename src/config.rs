// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{CostingRepository, PlSummaryRepository, QuoteRepository, RateCardRepository},
    services::{CostingService, RateCardService, RollupService},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub costing_service: CostingService,
    pub rollup_service: RollupService,
    pub rate_card_service: RateCardService,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, o main
    // decide abortar a inicialização.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let quote_repo = QuoteRepository::new();
        let costing_repo = CostingRepository::new();
        let summary_repo = PlSummaryRepository::new();
        let rate_card_repo = RateCardRepository::new();

        let rollup_service =
            RollupService::new(quote_repo.clone(), costing_repo.clone(), summary_repo);
        let costing_service =
            CostingService::new(costing_repo, quote_repo, rollup_service.clone());
        let rate_card_service = RateCardService::new(rate_card_repo);

        Ok(Self {
            db_pool,
            costing_service,
            rollup_service,
            rate_card_service,
        })
    }
}
