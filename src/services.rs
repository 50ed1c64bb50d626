pub mod costing_service;
pub use costing_service::CostingService;
pub mod rate_card_service;
pub use rate_card_service::RateCardService;
pub mod rollup_service;
pub use rollup_service::RollupService;
