//! Task file helpers.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

/// The part of a task file dmctl needs to look at
#[derive(Debug, Deserialize)]
struct TaskFile {
    #[serde(default)]
    name: String,
}

/// Read a whole file, typically a task definition.
pub fn get_file_content(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| Error::FileContent {
        path: path.display().to_string(),
        source,
    })
}

/// Resolve a task name from `arg`.
///
/// When `arg` looks like a YAML file name and the file decodes as a task
/// definition with a name, that name is returned; in every other case `arg`
/// is returned unchanged.
pub fn task_name_from_arg_or_file(arg: &str) -> String {
    if !(arg.ends_with(".yaml") || arg.ends_with(".yml")) {
        return arg.to_string();
    }

    let content = match get_file_content(arg) {
        Ok(content) => content,
        Err(e) => {
            debug!(file = %arg, error = %e, "Treating argument as task name");
            return arg.to_string();
        }
    };

    match serde_yaml::from_slice::<TaskFile>(&content) {
        Ok(task) if !task.name.is_empty() => task.name,
        Ok(_) => arg.to_string(),
        Err(e) => {
            debug!(file = %arg, error = %e, "Treating argument as task name");
            arg.to_string()
        }
    }
}
