//! Core type definitions used across the PhyloPlot workspace.

pub mod format;
pub mod id;

pub use format::OutputFormat;
pub use id::*;
