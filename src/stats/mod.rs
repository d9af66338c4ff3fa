mod aggregator;
mod models;
mod week;

pub use aggregator::StatsAggregator;
pub use models::StatsSummary;
pub use week::iso_week_key;
