//! Template helpers installed by the CLI.

use std::collections::HashMap;

use sitepipe_core::{Helpers, Value};

/// `env(name="VAR", default="...")` reads an environment variable.
fn env(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = args
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("env() requires a string `name` argument"))?;
    match std::env::var(name) {
        Ok(value) => Ok(Value::String(value)),
        Err(_) => args
            .get("default")
            .cloned()
            .ok_or_else(|| tera::Error::msg(format!("environment variable {name} is not set"))),
    }
}

pub fn builtin() -> Helpers {
    Helpers::new().with("env", env)
}
