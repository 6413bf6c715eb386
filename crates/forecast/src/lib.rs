//! Consumption rate and depletion estimates.
//!
//! A derived read over a ledger snapshot: no side effects, safe to compute
//! repeatedly and concurrently with mutations. Insufficient data is a valid
//! result (`Confidence::Unknown`), not an error.

pub mod forecast;

pub use forecast::{
    Confidence, ForecastConfig, ForecastEngine, ForecastResult, ReorderSuggestion, forecast,
};
