//! Data steps — set values, load YAML files, transform the whole mapping.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tera::Value;

use crate::error::{FileAction, PipelineError};
use crate::pipeline::{abort, DataMap, Pipeline};

impl Pipeline {
    /// Set `key` to `value`, overwriting any previous value.
    pub fn set_data(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.data.borrow_mut().insert(key.to_string(), value.into());
        tracing::debug!(step = "set_data", key, "data set");
        self
    }

    /// Decode the first YAML document in `data_dir/relative_path` and store
    /// it at `key`.
    ///
    /// An open or decode failure records a [`PipelineError::FileActionFailed`]
    /// and leaves `key` untouched. A file holding no document (empty, or only
    /// comments) is a decode failure.
    pub fn set_data_yaml(&mut self, key: &str, relative_path: impl AsRef<Path>) -> &mut Self {
        let path = self.config.data_dir.join(relative_path);
        let span = tracing::debug_span!("set_data_yaml", step = "set_data_yaml", key, file = %path.display());
        let _enter = span.enter();

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                tracing::error!(error = %err, "failed to open YAML file");
                return self.add_error(PipelineError::file(FileAction::Open, path, err));
            }
        };

        let mut contents = String::new();
        let decoded = BufReader::new(file)
            .read_to_string(&mut contents)
            .map_err(Into::into)
            .and_then(|_| first_document(&contents));
        match decoded {
            Ok(value) => {
                self.set_data(key, value);
                tracing::debug!("data set from YAML file");
                self
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to decode YAML file");
                self.add_error(PipelineError::file(FileAction::DecodeYaml, path, err))
            }
        }
    }

    /// Replace the data mapping with `transform(&data)`.
    ///
    /// On failure a [`PipelineError::TransformFailed`] is recorded and the
    /// data is left as it was.
    pub fn transform_data<F, E>(&mut self, transform: F) -> &mut Self
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if let Err(err) = self.apply_transform(transform) {
            tracing::error!(step = "transform_data", error = %err, "failed to transform data");
            self.record(err);
        }
        self
    }

    /// [`transform_data`](Self::transform_data) that hands the failure back
    /// instead of recording it.
    pub fn try_transform_data<F, E>(&mut self, transform: F) -> Result<&mut Self, PipelineError>
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.apply_transform(transform)?;
        Ok(self)
    }

    /// [`transform_data`](Self::transform_data) that terminates the process on
    /// failure. Meant for top-level build code that must not render from bad
    /// data.
    pub fn must_transform_data<F, E>(&mut self, transform: F) -> &mut Self
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if let Err(err) = self.apply_transform(transform) {
            abort(&err);
        }
        self
    }

    // The result replaces the contents in place so clones keep aliasing the
    // same mapping.
    fn apply_transform<F, E>(&self, transform: F) -> Result<(), PipelineError>
    where
        F: FnOnce(&DataMap) -> Result<DataMap, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let transformed = {
            let data = self.data.borrow();
            transform(&data)
        };
        match transformed {
            Ok(next) => {
                *self.data.borrow_mut() = next;
                tracing::debug!(step = "transform_data", "data transformed");
                Ok(())
            }
            Err(err) => Err(PipelineError::TransformFailed { source: err.into() }),
        }
    }
}

fn first_document(contents: &str) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
    let has_content = contents.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });
    let document = serde_yaml::Deserializer::from_str(contents)
        .next()
        .filter(|_| has_content)
        .ok_or("no YAML document in file")?;
    Ok(Value::deserialize(document)?)
}
