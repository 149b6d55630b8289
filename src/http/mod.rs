//! HTTP server module
//!
//! - Axum router with the relay endpoints
//! - Handlers for liveness, expansion, redirect probing and analysis
//! - Streaming download proxy
//! - CORS middleware

pub mod download;
pub mod handlers;
pub mod routes;
pub mod stream;

pub use routes::create_router;
