//! Rendering — single files, repeated fan-out, and load-then-render branches.
//!
//! Every render goes through the same four failure points, each recorded as
//! its own error and each ending only that one render:
//!
//! 1. create the parent directory → [`PipelineError::DirectoryCreateFailed`]
//! 2. create/truncate the target → `FileActionFailed(CREATE_TRUNCATE)`
//! 3. execute the template → [`PipelineError::TemplateExecuteFailed`]
//! 4. flush and close the target → `FileActionFailed(CLOSE)`
//!
//! Step 4 runs whenever step 2 succeeded, including after a failed step 3.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tera::{Context, Value};

use crate::engine::name_for_path;
use crate::error::{FileAction, PipelineError};
use crate::pipeline::Pipeline;
use crate::value::type_name;

/// Marker replaced by each entry key in a repeated-render target path.
pub const KEY_PLACEHOLDER: &str = "{{KEY}}";

impl Pipeline {
    /// Render `template_name` with `{Data}` into `output_dir/target_path`.
    pub fn render_single(&mut self, template_name: &str, target_path: impl AsRef<Path>) -> &mut Self {
        let target_path = target_path.as_ref();
        let output_path = self.config.output_dir.join(target_path);
        let span = tracing::debug_span!(
            "render_single",
            step = "render_single",
            template_name,
            target_path = %target_path.display(),
            output_path = %output_path.display()
        );
        let _enter = span.enter();

        match self.data_context() {
            Ok(context) => self.render(template_name, &output_path, &context),
            Err(err) => self.add_error(err),
        }
    }

    /// Render `template_name` once per entry of the mapping at
    /// `data[repeated_data_key]`.
    ///
    /// Each entry is written to `output_dir/target_path_template` with every
    /// `{{KEY}}` replaced by the entry key, and rendered with
    /// `{Data, RepeatedKey, RepeatedValue}`. Entries are visited in key order.
    /// A failing entry is recorded and the remaining entries still render.
    pub fn render_repeated(
        &mut self,
        template_name: &str,
        repeated_data_key: &str,
        target_path_template: &str,
    ) -> &mut Self {
        let output_template = self
            .config
            .output_dir
            .join(target_path_template)
            .to_string_lossy()
            .into_owned();
        let span = tracing::debug_span!(
            "render_repeated",
            step = "render_repeated",
            template_name,
            repeated_data_key,
            target_path_template,
            output_path_template = %output_template
        );
        let _enter = span.enter();

        let entries = match self.repeated_entries(repeated_data_key) {
            Ok(entries) => entries,
            Err(err) => return self.add_error(err),
        };

        if !output_template.contains(KEY_PLACEHOLDER) {
            tracing::error!("{KEY_PLACEHOLDER} placeholder missing in target path template");
            return self.add_error(PipelineError::PathPlaceholderMissing {
                path: output_template,
            });
        }

        let base = match self.data_context() {
            Ok(context) => context,
            Err(err) => return self.add_error(err),
        };

        for (key, value) in entries {
            let target = output_template.replace(KEY_PLACEHOLDER, &key);
            let entry_span = tracing::debug_span!("entry", key = %key, target_path = %target);
            let _entry = entry_span.enter();

            let mut context = base.clone();
            context.insert("RepeatedKey", &key);
            context.insert("RepeatedValue", &value);
            self.render(template_name, Path::new(&target), &context);
        }
        self
    }

    /// Load `template_path` into a clone and render it there as
    /// [`render_single`](Self::render_single).
    ///
    /// The template is rendered under its basename. `self` keeps its own
    /// template set; data and errors are shared with the clone as usual.
    pub fn load_render_single(&mut self, template_path: &str, target_path: impl AsRef<Path>) -> &mut Self {
        let span = tracing::debug_span!("load_render_single", step = "load_render_single", template_path);
        let _enter = span.enter();

        let name = name_for_path(Path::new(template_path));
        let mut branch = self.clone();
        branch
            .load_glob(template_path)
            .render_single(&name, target_path);
        self
    }

    /// Load `template_path` into a clone and render it there as
    /// [`render_repeated`](Self::render_repeated).
    pub fn load_render_repeated(
        &mut self,
        template_path: &str,
        repeated_data_key: &str,
        target_path_template: &str,
    ) -> &mut Self {
        let span = tracing::debug_span!(
            "load_render_repeated",
            step = "load_render_repeated",
            template_path,
            repeated_data_key
        );
        let _enter = span.enter();

        let name = name_for_path(Path::new(template_path));
        let mut branch = self.clone();
        branch
            .load_glob(template_path)
            .render_repeated(&name, repeated_data_key, target_path_template);
        self
    }

    fn data_context(&self) -> Result<Context, PipelineError> {
        let mut context = Context::new();
        context
            .try_insert("Data", &*self.data.borrow())
            .map_err(PipelineError::ContextFailed)?;
        Ok(context)
    }

    fn repeated_entries(&self, key: &str) -> Result<Vec<(String, Value)>, PipelineError> {
        let data = self.data.borrow();
        match data.get(key) {
            Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            Some(other) => {
                tracing::error!(
                    found = type_name(other),
                    "repeated data key points to a {}, but a mapping is required",
                    type_name(other)
                );
                Err(PipelineError::RepeatedDataKeyMissing { key: key.to_string() })
            }
            None => {
                tracing::error!(keys = ?data.keys().collect::<Vec<_>>(), "repeated data key not found in data");
                Err(PipelineError::RepeatedDataKeyMissing { key: key.to_string() })
            }
        }
    }

    fn render(&mut self, template_name: &str, target_path: &Path, context: &Context) -> &mut Self {
        if let Some(parent) = target_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(source) = std::fs::create_dir_all(parent) {
                tracing::error!(error = %source, "failed to create target directory");
                return self.add_error(PipelineError::DirectoryCreateFailed {
                    path: parent.to_path_buf(),
                    source,
                });
            }
        }

        let file = match File::create(target_path) {
            Ok(file) => file,
            Err(err) => {
                tracing::error!(error = %err, "failed to create/truncate target file");
                return self.add_error(PipelineError::file(
                    FileAction::CreateTruncate,
                    target_path,
                    err,
                ));
            }
        };
        let mut writer = BufWriter::new(file);

        let executed = self.templates.render_to(template_name, context, &mut writer);

        // Close after execute either way; a close failure is its own error.
        let closed = writer.into_inner().map_err(|e| e.into_error());

        let mut rendered = true;
        if let Err(err) = executed {
            tracing::error!(error = %err, "failed to render template");
            self.record(err);
            rendered = false;
        }
        if let Err(err) = closed {
            tracing::error!(error = %err, "failed to close target file");
            self.record(PipelineError::file(FileAction::Close, target_path, err));
            rendered = false;
        }

        if rendered {
            tracing::debug!("template rendered");
        }
        self
    }
}
