//! # phyloplot-core
//!
//! Core crate for PhyloPlot. Contains configuration schemas, typed
//! identifiers, the output format catalogue, and the unified error system.
//!
//! This crate has **no** internal dependencies on other PhyloPlot crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
