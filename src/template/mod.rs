//! Template-driven output generation
//!
//! A template is any file under the template root whose name ends in
//! [`TEMPLATE_SUFFIX`]. Its path relative to the root is itself a template
//! that yields the output name; its contents yield the output body. Files
//! ending in [`PARTIAL_SUFFIX`] are registered as partials; anything else
//! under the root is ignored.
//!
//! The pipeline for one batch is:
//! [`discover`] → [`render::Renderer`] → [`engine::Encoder`] →
//! [`merge::OutputMerger`].

pub mod context;
pub mod discover;
pub mod engine;
#[allow(missing_docs)]
pub mod helpers;
pub mod merge;
pub mod render;

pub use context::{Environment, RenderContext};
pub use engine::{Encoder, Target};
pub use merge::OutputMerger;
pub use render::{Rendered, Renderer};

/// File suffix marking a template
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// File suffix marking a partial
pub const PARTIAL_SUFFIX: &str = ".hbs";
