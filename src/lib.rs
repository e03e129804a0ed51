pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod types;

// Layered boundaries: use cases over ports, file adapters behind them
pub mod app;
pub mod infra;
