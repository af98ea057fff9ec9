use std::path::{Path, PathBuf};

use log::debug;

use crate::config::ContextConfig;
use crate::error::{PayloadError, Result};
use crate::util::file::PathExt;

/// Resolves the build file of the context at `root`, returned as a posix
/// path relative to `root`.
///
/// An explicit path, absolute or relative to `root`, wins over the default
/// `Containerfile`/`Dockerfile` lookup. The file must exist inside `root`;
/// symlinks are followed before that check.
pub fn prepare_dockerfile(root: &Path, explicit: Option<&Path>) -> Result<String> {
    prepare_dockerfile_with(root, explicit, &ContextConfig::default())
}

pub fn prepare_dockerfile_with(root: &Path, explicit: Option<&Path>, config: &ContextConfig) -> Result<String> {
    let root = root
        .canonicalize()
        .map_err(|_| PayloadError::ContextNotFound(root.to_path_buf()))?;
    if !root.is_dir() {
        return Err(PayloadError::ContextNotFound(root));
    }
    let candidate = match explicit {
        Some(path) => root.join(path),
        None => default_build_file(&root, config)?,
    };
    let resolved = candidate
        .canonicalize()
        .map_err(|_| PayloadError::ContextNotFound(candidate.clone()))?;
    if !resolved.is_file() || !resolved.is_within(&root) {
        return Err(PayloadError::ContextNotFound(candidate));
    }
    let relative = resolved
        .relative_posix(&root)
        .ok_or_else(|| PayloadError::ContextNotFound(candidate.clone()))?;
    debug!("build file resolved to '{}'", relative);
    Ok(relative)
}

fn default_build_file(root: &Path, config: &ContextConfig) -> Result<PathBuf> {
    config
        .build_files
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            let name = config.build_files.last().map(String::as_str).unwrap_or("Dockerfile");
            PayloadError::ContextNotFound(root.join(name))
        })
}
