pub mod costing;
pub mod pl_summary;
pub mod quotes;
pub mod rates;
