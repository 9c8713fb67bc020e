//! Response DTOs.

use chrono::{DateTime, Utc};
use phyloplot_render::metrics::MetricsSnapshot;
use serde::Serialize;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since startup.
    pub uptime_seconds: u64,
}

/// Detailed health: renderer settings, render slots, and counters.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealthResponse {
    /// `"ok"`, or `"degraded"` once the renderer has failed to start.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since startup.
    pub uptime_seconds: u64,
    /// Server time.
    pub checked_at: DateTime<Utc>,
    /// Renderer command prefix.
    pub renderer: String,
    /// Renderer wall-clock limit.
    pub renderer_timeout_seconds: u64,
    /// Total render slots.
    pub render_slots_total: usize,
    /// Render slots currently free.
    pub render_slots_available: usize,
    /// Session workspace root.
    pub workspace_root: String,
    /// Render counters.
    pub metrics: MetricsSnapshot,
}

/// Columns of an uploaded metadata table and, optionally, one column's values.
#[derive(Debug, Clone, Serialize)]
pub struct InspectResponse {
    /// Header column names, in file order.
    pub columns: Vec<String>,
    /// Number of data rows.
    pub row_count: usize,
    /// The inspected column, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Distinct non-missing values of `column`, in first-appearance order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}
