pub mod costing;
pub mod pl_summary;
pub mod rate_cards;
