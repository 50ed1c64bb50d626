//src/main.rs

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    // Inicializa o logger. RUST_LOG controla o filtro (ex: backend=debug).
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Registros de custo contribuintes: toda mutação aqui dispara o
    // recálculo do resumo de P&L dentro da mesma transação (CostingService).
    let costing_routes = Router::new()
        .route("/components"
               ,post(handlers::costing::create_component)
               .get(handlers::costing::list_components)
        )
        .route("/components/{id}"
               ,put(handlers::costing::update_component)
               .delete(handlers::costing::delete_component)
        )
        .route("/trips"
               ,post(handlers::costing::create_trip)
               .get(handlers::costing::list_trips)
        )
        .route("/trips/{id}"
               ,put(handlers::costing::update_trip)
               .delete(handlers::costing::delete_trip)
        )
        .route("/admin-time"
               ,post(handlers::costing::create_admin_time)
               .get(handlers::costing::list_admin_time)
        )
        .route("/admin-time/{id}"
               ,put(handlers::costing::update_admin_time)
               .delete(handlers::costing::delete_admin_time)
        )
        .route("/ground-conditions"
               ,post(handlers::costing::create_ground_condition)
               .get(handlers::costing::list_ground_conditions)
        )
        .route("/ground-conditions/{id}"
               ,put(handlers::costing::update_ground_condition)
               .delete(handlers::costing::delete_ground_condition)
        );

    // Leitura do resumo + recálculo manual, nas visões de orçamento e job
    let summary_routes = Router::new()
        .route("/quotes/{quote_id}/pl-summary"
               ,get(handlers::pl_summary::get_quote_summary)
        )
        .route("/quotes/{quote_id}/pl-summary/recalculate"
               ,post(handlers::pl_summary::recalculate_quote_summary)
        )
        .route("/jobs/{job_id}/pl-summary"
               ,get(handlers::pl_summary::get_job_summary)
        )
        .route("/jobs/{job_id}/pl-summary/recalculate"
               ,post(handlers::pl_summary::recalculate_job_summary)
        );

    let rate_card_routes = Router::new()
        .route("/"
               ,post(handlers::rate_cards::create_rate_card)
               .get(handlers::rate_cards::list_rate_cards)
        )
        .route("/resolve"
               ,get(handlers::rate_cards::resolve_rate)
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/costing", costing_routes)
        .nest("/api", summary_routes)
        .nest("/api/rate-cards", rate_card_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
