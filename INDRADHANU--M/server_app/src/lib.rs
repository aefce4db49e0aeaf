#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! HTTP surface of the Indradhanu backend: configuration, shared state, and
//! the axum router serving simulation and dashboard endpoints.

/// TOML configuration and secret lookup.
#[path = "../config.rs"]
pub mod config;

/// Endpoint handlers.
#[path = "../handlers.rs"]
pub mod handlers;

/// Route table and middleware.
#[path = "../router.rs"]
pub mod router;

/// Shared request state.
#[path = "../state.rs"]
pub mod state;

pub use config::{env_lookup, ConfigError, ServerConfig};
pub use router::build_router;
pub use state::AppState;
