//! Template loading.

use crate::pipeline::Pipeline;

impl Pipeline {
    /// Parse every file matching `templates_dir/pattern` into the template set.
    ///
    /// On failure nothing from this load is added and the error is recorded.
    pub fn load_glob(&mut self, pattern: &str) -> &mut Self {
        let resolved = self.config.templates_dir.join(pattern);
        let resolved = resolved.to_string_lossy();
        let span = tracing::debug_span!("load_glob", step = "load_glob", glob = %resolved);
        let _enter = span.enter();

        match self.templates.load_glob(&resolved) {
            Ok(names) => {
                tracing::debug!(defined_templates = ?names, "templates loaded");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load templates");
                self.record(err);
            }
        }
        self
    }
}
