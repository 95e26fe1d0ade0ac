pub mod aggregator;
pub mod filter;
pub mod heatmap;

pub use aggregator::{
    aggregate, aggregate_filtered, aggregate_with, BandSummary, PortfolioOverview,
    PortfolioSnapshot, StageSummary,
};
pub use filter::AccountFilter;
pub use heatmap::{Bucket, Heatmap, HeatmapCell};
