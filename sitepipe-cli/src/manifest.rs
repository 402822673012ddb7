//! Build manifest — the declarative description of one site build.
//!
//! ```yaml
//! config:
//!   output_dir: public
//! layouts: ["_layouts/*.html"]
//! data:
//!   site: { title: Example }
//! data_files:
//!   posts: posts.yaml
//! renders:
//!   - { template: index.html, target: index.html }
//!   - { template: post.html, key: posts, target: "posts/{{KEY}}.html" }
//!   - { template: pages/about.html, target: about/index.html, load: true }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use sitepipe_core::{Pipeline, PipelineConfig};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub config: PipelineConfig,
    /// Globs loaded into the base pipeline, relative to `templates_dir`.
    #[serde(default)]
    pub layouts: Vec<String>,
    /// Literal values set before any render.
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    /// Data keys loaded from YAML files under `data_dir`.
    #[serde(default)]
    pub data_files: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub renders: Vec<RenderStep>,
}

/// One render. With `key` it fans out over `data[key]`; with `load` the
/// template is loaded into a throwaway clone first.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderStep {
    pub template: String,
    pub target: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub load: bool,
}

impl RenderStep {
    pub fn apply(&self, site: &mut Pipeline) {
        match (&self.key, self.load) {
            (None, false) => site.render_single(&self.template, &self.target),
            (None, true) => site.load_render_single(&self.template, &self.target),
            (Some(key), false) => site.render_repeated(&self.template, key, &self.target),
            (Some(key), true) => site.load_render_repeated(&self.template, key, &self.target),
        };
    }
}

impl Manifest {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read manifest '{}'", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse manifest '{}'", path.display()))
    }

    /// Build the base pipeline: layouts, literal data, then data files.
    pub fn base_pipeline(&self, root: &Path, helpers: &sitepipe_core::Helpers) -> Pipeline {
        let config = self.config.clone().resolve_against(root);
        let mut site = Pipeline::new(config, helpers);
        for pattern in &self.layouts {
            site.load_glob(pattern);
        }
        for (key, value) in &self.data {
            site.set_data(key, value.clone());
        }
        for (key, path) in &self.data_files {
            site.set_data_yaml(key, path);
        }
        site
    }
}
