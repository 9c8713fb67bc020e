//! # phyloplot-api
//!
//! HTTP API for PhyloPlot built on Axum.
//!
//! Exposes the render pipeline as a multipart form endpoint, a metadata
//! inspection endpoint for populating column pickers, and health checks.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
