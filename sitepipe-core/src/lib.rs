//! # sitepipe-core
//!
//! A chainable load → transform → render pipeline for static sites and
//! generated files, built on Tera templates and YAML data.
//!
//! Steps record failures instead of returning them, so one run can attempt
//! every load and render and report all problems at a single checkpoint.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sitepipe_core::{Helpers, Pipeline, PipelineConfig};
//!
//! let mut site = Pipeline::new(PipelineConfig::rooted_at("site"), &Helpers::new());
//! site.load_glob("_layouts/*.html")
//!     .set_data("title", "My site")
//!     .set_data_yaml("posts", "posts.yaml")
//!     .render_single("index.html", "index.html")
//!     .load_render_repeated("post.html", "posts", "posts/{{KEY}}/index.html");
//! site.must();
//! ```

pub mod config;
pub mod engine;
pub mod error;
mod load;
pub mod maybe;
pub mod pipeline;
mod render;
mod steps;
#[cfg(test)]
mod test_support;
pub mod value;

pub use config::PipelineConfig;
pub use engine::{HelperFn, Helpers, TemplateSet};
pub use error::{CheckpointError, ConfigError, FileAction, PipelineError};
pub use maybe::MaybePipeline;
pub use pipeline::{Branch, DataMap, Pipeline};
pub use render::KEY_PLACEHOLDER;
pub use tera::Value;
