//! # phyloplot-render
//!
//! The parameter-to-render pipeline. A raw parameter bag goes through
//! [`validator`] → [`workspace`] → [`marshal`] → [`invoker`] →
//! [`delivery`], orchestrated by [`pipeline::RenderPipeline`].
//!
//! Tree layout and drawing are done by an external program (by default
//! `Rscript ggtree_trial.R`); this crate only stages its inputs, runs it,
//! and hands back what it produced.

pub mod delivery;
pub mod error;
pub mod frontend;
pub mod invoker;
pub mod marshal;
pub mod metadata;
pub mod metrics;
pub mod models;
pub mod newick;
pub mod pipeline;
pub mod validator;
pub mod workspace;

pub use delivery::ResultDelivery;
pub use error::RenderError;
pub use frontend::RenderFrontend;
pub use invoker::RenderInvoker;
pub use metadata::MetadataTable;
pub use models::{
    FailureKind, Highlight, RenderOutcome, RenderParams, RenderRequest, RenderedArtifact,
    UploadedFile,
};
pub use pipeline::RenderPipeline;
pub use workspace::{Session, SessionGuard, SessionWorkspace};
