// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Componentes de Custo ---
        handlers::costing::create_component,
        handlers::costing::list_components,
        handlers::costing::update_component,
        handlers::costing::delete_component,

        // --- Viagens ---
        handlers::costing::create_trip,
        handlers::costing::list_trips,
        handlers::costing::update_trip,
        handlers::costing::delete_trip,

        // --- Tempo Administrativo ---
        handlers::costing::create_admin_time,
        handlers::costing::list_admin_time,
        handlers::costing::update_admin_time,
        handlers::costing::delete_admin_time,

        // --- Condições de Terreno ---
        handlers::costing::create_ground_condition,
        handlers::costing::list_ground_conditions,
        handlers::costing::update_ground_condition,
        handlers::costing::delete_ground_condition,

        // --- Resumo de P&L ---
        handlers::pl_summary::get_quote_summary,
        handlers::pl_summary::recalculate_quote_summary,
        handlers::pl_summary::get_job_summary,
        handlers::pl_summary::recalculate_job_summary,

        // --- Rate Cards ---
        handlers::rate_cards::create_rate_card,
        handlers::rate_cards::list_rate_cards,
        handlers::rate_cards::resolve_rate,
    ),
    components(
        schemas(
            models::costing::CostComponent,
            models::costing::Trip,
            models::costing::AdminTimeEntry,
            models::costing::GroundCondition,
            models::costing::CostCategory,
            models::costing::CostUnit,
            models::pl_summary::PlSummary,
            models::rates::RateCard,
            models::rates::RateType,
            handlers::costing::CreateCostComponentPayload,
            handlers::costing::UpdateCostComponentPayload,
            handlers::costing::CreateTripPayload,
            handlers::costing::UpdateTripPayload,
            handlers::costing::CreateAdminTimePayload,
            handlers::costing::UpdateAdminTimePayload,
            handlers::costing::CreateGroundConditionPayload,
            handlers::costing::UpdateGroundConditionPayload,
            handlers::rate_cards::CreateRateCardPayload,
            handlers::rate_cards::ResolvedRateResponse,
        )
    ),
    tags(
        (name = "costing", description = "Registros de custo contribuintes"),
        (name = "pl-summary", description = "Resumo derivado de lucro/prejuízo"),
        (name = "rate-cards", description = "Tarifas horárias para sugestão de custo")
    )
)]
pub struct ApiDoc;
