pub mod costing_repo;
pub use costing_repo::CostingRepository;
pub mod quote_repo;
pub use quote_repo::QuoteRepository;
pub mod rate_card_repo;
pub use rate_card_repo::RateCardRepository;
pub mod pl_summary_repo;
pub use pl_summary_repo::PlSummaryRepository;
