//! Pipeline state and lifecycle — construction, cloning and checkpoints.
//!
//! # Sharing
//!
//! A [`Pipeline`] owns its configuration and its [`TemplateSet`]. The data
//! mapping and the error list live behind `Rc<RefCell<_>>` and are aliased
//! by every clone:
//!
//! | Field       | On `clone()`            |
//! |-------------|-------------------------|
//! | `config`    | copied                  |
//! | `templates` | deep-copied             |
//! | `data`      | shared with the source  |
//! | `errors`    | shared with the source  |
//!
//! Setting data or recording an error through a clone is visible through the
//! original, while templates loaded into a clone stay in that clone. The
//! error list only ever grows.
//!
//! The state is single-threaded; it is neither `Send` nor `Sync`.

use std::cell::{Ref, RefCell};
use std::fmt::Display;
use std::rc::Rc;

use tera::Value;

use crate::config::PipelineConfig;
use crate::engine::{Helpers, TemplateSet};
use crate::error::{CheckpointError, PipelineError};

/// String-keyed data mapping handed to templates as `Data`.
pub type DataMap = serde_json::Map<String, Value>;

/// A unit of work run against its own clone by
/// [`Pipeline::must_with_clones`].
pub type Branch<'a> = Box<dyn FnOnce(&mut Pipeline) + 'a>;

/// Load → transform → render chain with accumulated errors.
#[derive(Debug)]
pub struct Pipeline {
    pub(crate) config: PipelineConfig,
    pub(crate) templates: TemplateSet,
    pub(crate) data: Rc<RefCell<DataMap>>,
    pub(crate) errors: Rc<RefCell<Vec<PipelineError>>>,
}

impl Pipeline {
    /// Create a pipeline with an empty template set and the given helpers
    /// installed.
    pub fn new(config: PipelineConfig, helpers: &Helpers) -> Self {
        tracing::debug!(
            helper_count = helpers.len(),
            templates_dir = %config.templates_dir.display(),
            output_dir = %config.output_dir.display(),
            "pipeline created"
        );
        Pipeline {
            config,
            templates: TemplateSet::new(helpers),
            data: Rc::new(RefCell::new(DataMap::new())),
            errors: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// HTML site pipeline with default directories and `.html` output.
    pub fn html(helpers: &Helpers) -> Self {
        Pipeline::new(PipelineConfig::default(), helpers)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    /// Append `err` to the shared error list.
    pub fn add_error(&mut self, err: PipelineError) -> &mut Self {
        self.record(err);
        self
    }

    pub(crate) fn record(&self, err: PipelineError) {
        self.errors.borrow_mut().push(err);
    }

    /// Errors accumulated by this pipeline and every pipeline sharing its state.
    pub fn errors(&self) -> Ref<'_, Vec<PipelineError>> {
        self.errors.borrow()
    }

    pub fn error_count(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.borrow().is_empty()
    }

    // -----------------------------------------------------------------------
    // Data and templates
    // -----------------------------------------------------------------------

    pub fn data(&self) -> Ref<'_, DataMap> {
        self.data.borrow()
    }

    /// Cloned value at `key`, if set.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.borrow().get(key).cloned()
    }

    /// `true` when both pipelines alias the same data and error list.
    pub fn shares_state_with(&self, other: &Pipeline) -> bool {
        Rc::ptr_eq(&self.data, &other.data) && Rc::ptr_eq(&self.errors, &other.errors)
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains(name)
    }

    pub fn template_names(&self) -> Vec<String> {
        self.templates.names()
    }

    // -----------------------------------------------------------------------
    // Checkpoints
    // -----------------------------------------------------------------------

    /// `Ok(())` when no error has been recorded, otherwise every message.
    pub fn check(&self) -> Result<(), CheckpointError> {
        let errors = self.errors.borrow();
        if errors.is_empty() {
            return Ok(());
        }
        Err(CheckpointError::Failed {
            count: errors.len(),
            messages: errors.iter().map(ToString::to_string).collect(),
        })
    }

    /// Terminate the process when any error has been recorded.
    pub fn must(&self) {
        if let Err(err) = self.check() {
            abort(&err);
        }
    }

    /// Run each branch on a fresh clone and check after each one.
    ///
    /// Stops at the first failing checkpoint. Since clones share the error
    /// list, errors already present on `self` fail the first branch.
    pub fn check_with_clones<'a, I>(&self, branches: I) -> Result<(), CheckpointError>
    where
        I: IntoIterator<Item = Branch<'a>>,
    {
        for (index, branch) in branches.into_iter().enumerate() {
            let mut cloned = self.clone();
            branch(&mut cloned);
            if let Err(err) = cloned.check() {
                tracing::error!(branch = index, error = %err, "branch failed checkpoint");
                return Err(err);
            }
        }
        Ok(())
    }

    /// [`check_with_clones`](Self::check_with_clones), terminating the process
    /// at the first failing branch.
    pub fn must_with_clones<'a, I>(&mut self, branches: I) -> &mut Self
    where
        I: IntoIterator<Item = Branch<'a>>,
    {
        if let Err(err) = self.check_with_clones(branches) {
            abort(&err);
        }
        self
    }
}

impl Clone for Pipeline {
    /// Copy config, duplicate the template set, alias data and errors.
    fn clone(&self) -> Self {
        tracing::debug!(templates = ?self.templates.names(), "pipeline cloned");
        Pipeline {
            config: self.config.clone(),
            templates: self.templates.clone(),
            data: Rc::clone(&self.data),
            errors: Rc::clone(&self.errors),
        }
    }
}

/// Log `err` and exit with status 1.
pub(crate) fn abort(err: &dyn Display) -> ! {
    tracing::error!(error = %err, "must called, but received errors");
    eprintln!("error: {err}");
    std::process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileAction;
    use std::path::PathBuf;

    fn pipeline() -> Pipeline {
        Pipeline::html(&Helpers::new())
    }

    fn open_error() -> PipelineError {
        PipelineError::file(
            FileAction::Open,
            PathBuf::from("data/missing.yaml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        )
    }

    #[test]
    fn html_pipeline_starts_empty() {
        let p = pipeline();
        assert_eq!(p.config().extension, ".html");
        assert!(p.data().is_empty());
        assert!(!p.has_errors());
        assert!(p.template_names().is_empty());
    }

    #[test]
    fn add_error_appends_in_order() {
        let mut p = pipeline();
        p.add_error(open_error())
            .add_error(PipelineError::RepeatedDataKeyMissing { key: "posts".into() });
        assert_eq!(p.error_count(), 2);
        assert_eq!(p.errors()[0].file_action(), Some(FileAction::Open));
        assert!(matches!(
            p.errors()[1],
            PipelineError::RepeatedDataKeyMissing { .. }
        ));
    }

    #[test]
    fn clone_aliases_data_and_errors() {
        let original = pipeline();
        let mut cloned = original.clone();
        assert!(cloned.shares_state_with(&original));

        cloned.set_data("title", "Hello");
        cloned.add_error(open_error());

        assert_eq!(original.get("title"), Some(Value::from("Hello")));
        assert_eq!(original.error_count(), 1);
    }

    #[test]
    fn separately_created_pipelines_share_nothing() {
        let a = pipeline();
        let b = pipeline();
        assert!(!a.shares_state_with(&b));
    }

    #[test]
    fn check_is_noop_without_errors() {
        let p = pipeline();
        assert_eq!(p.check(), Ok(()));
        p.must();
    }

    #[test]
    fn check_reports_every_error() {
        let mut p = pipeline();
        p.add_error(open_error())
            .add_error(PipelineError::PathPlaceholderMissing { path: "out/x.html".into() });
        match p.check() {
            Err(CheckpointError::Failed { count, messages }) => {
                assert_eq!(count, 2);
                assert!(messages[0].contains("OPEN"));
                assert!(messages[1].contains("{{KEY}}"));
            }
            other => panic!("unexpected checkpoint result: {other:?}"),
        }
    }

    #[test]
    fn check_with_clones_runs_every_clean_branch() {
        let p = pipeline();
        let mut seen = Vec::new();
        {
            let branches: Vec<Branch<'_>> = vec![
                Box::new(|c: &mut Pipeline| {
                    c.set_data("a", 1);
                }),
                Box::new(|c: &mut Pipeline| {
                    seen.push(c.get("a"));
                }),
            ];
            p.check_with_clones(branches).unwrap();
        }
        assert_eq!(seen, vec![Some(Value::from(1))]);
    }

    #[test]
    fn check_with_clones_stops_at_first_failing_branch() {
        let p = pipeline();
        let mut ran_third = false;
        let result = {
            let branches: Vec<Branch<'_>> = vec![
                Box::new(|_: &mut Pipeline| {}),
                Box::new(|c: &mut Pipeline| {
                    c.add_error(open_error());
                }),
                Box::new(|_: &mut Pipeline| ran_third = true),
            ];
            p.check_with_clones(branches)
        };
        assert!(matches!(result, Err(CheckpointError::Failed { count: 1, .. })));
        assert!(!ran_third);
        assert_eq!(p.error_count(), 1, "branch error lands in the shared list");
    }

    #[test]
    fn must_with_clones_passes_through_clean_branches() {
        let mut p = pipeline();
        let branches: Vec<Branch<'_>> = vec![
            Box::new(|c: &mut Pipeline| {
                c.set_data("first", true);
            }),
            Box::new(|c: &mut Pipeline| {
                c.set_data("second", true);
            }),
        ];
        p.must_with_clones(branches).set_data("after", true);

        assert_eq!(p.get("first"), Some(Value::from(true)));
        assert_eq!(p.get("second"), Some(Value::from(true)));
        assert_eq!(p.get("after"), Some(Value::from(true)));
        assert!(!p.has_errors());
    }
}
