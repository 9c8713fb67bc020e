//! Custom Axum extractors.

pub mod render_form;

pub use render_form::{HttpFrontend, RenderForm};
