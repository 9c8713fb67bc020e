//! Convenience result type alias for PhyloPlot.

use crate::error::AppError;

/// A specialized `Result` type for PhyloPlot operations.
pub type AppResult<T> = Result<T, AppError>;
