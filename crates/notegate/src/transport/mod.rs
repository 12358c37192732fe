//! HTTP transport
//!
//! Thin glue that exposes the token lifecycle over axum routes.

mod http;

pub use http::{AppState, router, run_http};
