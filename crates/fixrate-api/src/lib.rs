//! fixrate-api: HTTP API layer for fixrate
//!
//! Serves market pricing, node status, and ad-hoc quotes over JSON.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
