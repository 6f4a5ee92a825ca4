//! HTTP surface of the payout engine.

pub mod rest;

pub use rest::{router, serve, AppState};
