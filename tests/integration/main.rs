//! HTTP end-to-end tests: the full router driven through `tower::ServiceExt`.

#![cfg(unix)]

mod health_test;
mod helpers;
mod metadata_test;
mod render_test;
