//! Tera template set — helper registration, glob loading and execution.
//!
//! Templates are registered under their file basename, so
//! `templates/pages/post.html` is rendered as `post.html`. Loading the same
//! basename again replaces the earlier definition.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tera::{Context, Tera, Value};

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// A named helper callable from templates as `{{ name(arg=...) }}`.
pub type HelperFn =
    Arc<dyn Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static>;

/// Table of helper functions installed into a fresh template set.
#[derive(Clone, Default)]
pub struct Helpers {
    fns: Vec<(String, HelperFn)>,
}

impl Helpers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a helper. A later helper with the same name wins.
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static,
    {
        self.fns.push((name.into(), Arc::new(f)));
        self
    }

    pub fn len(&self) -> usize {
        self.fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fns.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for Helpers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ---------------------------------------------------------------------------
// Glob expansion
// ---------------------------------------------------------------------------

/// Basename used as the template name for `path`.
pub fn name_for_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let invalid = |reason: String| PipelineError::TemplateGlobInvalid {
        pattern: pattern.to_string(),
        reason,
    };

    let mut files = Vec::new();
    for entry in glob::glob(pattern).map_err(|e| invalid(e.to_string()))? {
        let path = entry.map_err(|e| invalid(e.to_string()))?;
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(PipelineError::TemplateGlobEmpty {
            pattern: pattern.to_string(),
        });
    }
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// TemplateSet
// ---------------------------------------------------------------------------

/// A named, mergeable set of parsed templates.
///
/// Cloning produces an independent set with the same definitions and
/// helpers; later loads into either copy are not seen by the other.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    tera: Tera,
}

impl TemplateSet {
    /// Empty set with every helper installed before any parse.
    pub fn new(helpers: &Helpers) -> Self {
        let mut tera = Tera::default();
        for (name, f) in &helpers.fns {
            let f = Arc::clone(f);
            tera.register_function(name, move |args: &HashMap<String, Value>| f(args));
        }
        if !helpers.is_empty() {
            tracing::debug!(helpers = ?helpers, "helpers registered");
        }
        TemplateSet { tera }
    }

    /// Parse every file matching `pattern` into the set.
    ///
    /// All-or-nothing: when any file fails to parse, the set is left as it
    /// was. Returns the names defined by this load.
    pub fn load_glob(&mut self, pattern: &str) -> Result<Vec<String>, PipelineError> {
        let files = expand_glob(pattern)?;
        let named: Vec<(PathBuf, Option<String>)> = files
            .into_iter()
            .map(|path| {
                let name = name_for_path(&path);
                (path, Some(name))
            })
            .collect();
        let names = named
            .iter()
            .filter_map(|(_, name)| name.clone())
            .collect();

        let mut scratch = self.tera.clone();
        scratch
            .add_template_files(named)
            .map_err(|source| PipelineError::TemplateParseFailed {
                pattern: pattern.to_string(),
                source,
            })?;
        self.tera = scratch;
        Ok(names)
    }

    /// Execute `name` against `context`, streaming into `out`.
    pub fn render_to(
        &self,
        name: &str,
        context: &Context,
        out: impl Write,
    ) -> Result<(), PipelineError> {
        self.tera
            .render_to(name, context, out)
            .map_err(|source| PipelineError::TemplateExecuteFailed {
                template_name: name.to_string(),
                source,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Defined template names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tera
            .get_template_names()
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
