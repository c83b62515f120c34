//! # PriceLens Analytics Engine
//!
//! This crate computes descriptive risk/return statistics for a single instrument's
//! return series.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `StatisticsEngine` is a stateless calculator. It takes
//!   a `ReturnSeries` as input and produces a `MetricsReport` as output. It performs no I/O.
//!
//! ## Public API
//!
//! - `StatisticsEngine`: The struct that contains the calculation logic.
//! - `MetricsReport`: The fixed set of five metrics, with explicit undefined markers.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{
    StatisticsEngine, cumulative_return_pct, drawdown_series, max_drawdown_pct, mean,
    sample_std_dev,
};
pub use error::AnalyticsError;
pub use report::{Metric, MetricValue, MetricWarning, MetricsReport};
