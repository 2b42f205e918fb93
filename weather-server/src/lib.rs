//! HTTP front end for `weather-core`.
//!
//! Exposes the aggregated temperature of a city over HTTP. The binary in
//! `main.rs` adds the command line and logging setup.

pub mod http;

pub use http::{AppState, create_router, run_http_server, serve};
