//! HTTP API for the stock ledger.

pub mod app;
pub mod middleware;
