//! Chaining on a possibly absent pipeline.
//!
//! `Option<Pipeline>` stands in for a pipeline that may not exist. Every
//! operation here is a no-op on `None` and hands the option back, so a chain
//! can continue after an earlier step produced no pipeline. Cloning an absent
//! pipeline is plain `Option::clone`.

use std::path::Path;

use crate::error::{CheckpointError, PipelineError};
use crate::pipeline::{abort, Branch, DataMap, Pipeline};
use tera::Value;

/// [`Pipeline`] operations lifted over `Option<Pipeline>`.
pub trait MaybePipeline {
    fn add_error(&mut self, err: PipelineError) -> &mut Self;
    fn load_glob(&mut self, pattern: &str) -> &mut Self;
    fn set_data(&mut self, key: &str, value: impl Into<Value>) -> &mut Self;
    fn set_data_yaml(&mut self, key: &str, relative_path: impl AsRef<Path>) -> &mut Self;
    fn transform_data<F, E>(&mut self, transform: F) -> &mut Self
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>;

    /// `Ok` without running `transform` for `None`.
    fn try_transform_data<F, E>(&mut self, transform: F) -> Result<&mut Self, PipelineError>
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>;

    /// A no-op for `None`; terminates the process only when a present
    /// pipeline's transform fails.
    fn must_transform_data<F, E>(&mut self, transform: F) -> &mut Self
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>;

    fn render_single(&mut self, template_name: &str, target_path: impl AsRef<Path>) -> &mut Self;
    fn render_repeated(&mut self, template_name: &str, repeated_data_key: &str, target_path_template: &str) -> &mut Self;
    fn load_render_single(&mut self, template_path: &str, target_path: impl AsRef<Path>) -> &mut Self;
    fn load_render_repeated(&mut self, template_path: &str, repeated_data_key: &str, target_path_template: &str) -> &mut Self;
    fn must_with_clones<'a, I>(&mut self, branches: I) -> &mut Self
    where
        I: IntoIterator<Item = Branch<'a>>;

    /// [`CheckpointError::Absent`] for `None`.
    fn check(&self) -> Result<(), CheckpointError>;

    /// Terminates the process for `None` as well as for recorded errors.
    fn must(&self);
}

impl MaybePipeline for Option<Pipeline> {
    fn add_error(&mut self, err: PipelineError) -> &mut Self {
        if let Some(p) = self {
            p.add_error(err);
        }
        self
    }

    fn load_glob(&mut self, pattern: &str) -> &mut Self {
        if let Some(p) = self {
            p.load_glob(pattern);
        }
        self
    }

    fn set_data(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if let Some(p) = self {
            p.set_data(key, value);
        }
        self
    }

    fn set_data_yaml(&mut self, key: &str, relative_path: impl AsRef<Path>) -> &mut Self {
        if let Some(p) = self {
            p.set_data_yaml(key, relative_path);
        }
        self
    }

    fn transform_data<F, E>(&mut self, transform: F) -> &mut Self
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if let Some(p) = self {
            p.transform_data(transform);
        }
        self
    }

    fn try_transform_data<F, E>(&mut self, transform: F) -> Result<&mut Self, PipelineError>
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if let Some(p) = self {
            p.try_transform_data(transform)?;
        }
        Ok(self)
    }

    fn must_transform_data<F, E>(&mut self, transform: F) -> &mut Self
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if let Some(p) = self {
            p.must_transform_data(transform);
        }
        self
    }

    fn render_single(&mut self, template_name: &str, target_path: impl AsRef<Path>) -> &mut Self {
        if let Some(p) = self {
            p.render_single(template_name, target_path);
        }
        self
    }

    fn render_repeated(&mut self, template_name: &str, repeated_data_key: &str, target_path_template: &str) -> &mut Self {
        if let Some(p) = self {
            p.render_repeated(template_name, repeated_data_key, target_path_template);
        }
        self
    }

    fn load_render_single(&mut self, template_path: &str, target_path: impl AsRef<Path>) -> &mut Self {
        if let Some(p) = self {
            p.load_render_single(template_path, target_path);
        }
        self
    }

    fn load_render_repeated(&mut self, template_path: &str, repeated_data_key: &str, target_path_template: &str) -> &mut Self {
        if let Some(p) = self {
            p.load_render_repeated(template_path, repeated_data_key, target_path_template);
        }
        self
    }

    fn must_with_clones<'a, I>(&mut self, branches: I) -> &mut Self
    where
        I: IntoIterator<Item = Branch<'a>>,
    {
        if let Some(p) = self {
            p.must_with_clones(branches);
        }
        self
    }

    fn check(&self) -> Result<(), CheckpointError> {
        match self {
            Some(p) => p.check(),
            None => Err(CheckpointError::Absent),
        }
    }

    fn must(&self) {
        if let Err(err) = MaybePipeline::check(self) {
            abort(&err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Helpers;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn every_operation_is_a_noop_on_none() {
        let tmp = TempDir::new().unwrap();
        let mut absent: Option<Pipeline> = None;
        absent
            .add_error(PipelineError::RepeatedDataKeyMissing { key: "x".into() })
            .load_glob("*.html")
            .set_data("k", 1)
            .set_data_yaml("k", tmp.path().join("missing.yaml"))
            .transform_data(|_: &DataMap| Err::<DataMap, _>("boom"))
            .must_transform_data(|_: &DataMap| Err::<DataMap, _>("boom"))
            .render_single("index.html", tmp.path().join("index.html"))
            .render_repeated("post.html", "posts", "{{KEY}}.html")
            .load_render_single("index.html", "index.html")
            .load_render_repeated("post.html", "posts", "{{KEY}}.html")
            .must_with_clones(Vec::<Branch<'_>>::new());

        assert!(absent
            .try_transform_data(|_: &DataMap| Err::<DataMap, _>("boom"))
            .is_ok());
        assert!(absent.is_none());
        assert!(absent.clone().is_none());
        assert_eq!(MaybePipeline::check(&absent), Err(CheckpointError::Absent));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn present_pipeline_behaves_like_the_inner_one() {
        let mut present = Some(Pipeline::html(&Helpers::new()));
        present
            .set_data("k", "v")
            .add_error(PipelineError::RepeatedDataKeyMissing { key: "x".into() });

        let inner = present.as_ref().unwrap();
        assert_eq!(inner.get("k"), Some(json!("v")));
        assert!(matches!(
            MaybePipeline::check(&present),
            Err(CheckpointError::Failed { count: 1, .. })
        ));
    }

    #[test]
    fn present_pipeline_transforms_through_the_option() {
        let mut present = Some(Pipeline::html(&Helpers::new()));
        present.set_data("n", 1).must_transform_data(|data: &DataMap| {
            let mut next = data.clone();
            next.insert("m".to_string(), json!(2));
            Ok::<_, std::io::Error>(next)
        });

        let err = present
            .try_transform_data(|_: &DataMap| Err::<DataMap, _>("rejected"))
            .err()
            .expect("transform should fail");
        assert!(err.to_string().contains("rejected"));

        let inner = present.as_ref().unwrap();
        assert_eq!(inner.get("m"), Some(json!(2)));
        assert!(!inner.has_errors());
    }
}
