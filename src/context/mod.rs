//! Build-context archives for image builds.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use log::debug;

use crate::config::{ContextConfig, DOCKERFILE, DOCKERIGNORE};
use crate::error::{PayloadError, Result};
use crate::util::file::posix;

pub mod archive;
pub mod dockerfile;
pub mod ignore;

pub use archive::ContextArchive;
pub use dockerfile::{prepare_dockerfile, prepare_dockerfile_with};
pub use ignore::{prepare_dockerignore, prepare_ignore_with, IgnorePattern, IgnorePatternSet};

/// One step of an archive plan. `Include`/`Exclude` are decided by the last
/// matching op; overrides are written after the directory walk.
#[derive(Debug, Clone)]
pub enum ArchiveOp {
    Include(IgnorePattern),
    Exclude(IgnorePattern),
    /// Adds `path` with `content`, replacing a walked file of the same path.
    Override { path: String, content: Bytes },
}

#[derive(Debug, Clone, Default)]
pub struct ArchivePlan {
    ops: Vec<ArchiveOp>,
    gzip: bool,
}

impl ArchivePlan {
    pub fn new() -> ArchivePlan {
        ArchivePlan::default()
    }

    pub fn from_parts(ignore: Option<&IgnorePatternSet>, overrides: Option<&BTreeMap<String, Bytes>>) -> ArchivePlan {
        let mut plan = ArchivePlan::new();
        if let Some(ignore) = ignore {
            plan.ops.extend(ignore.to_ops());
        }
        if let Some(overrides) = overrides {
            for (path, content) in overrides {
                plan.push(ArchiveOp::Override {
                    path: path.clone(),
                    content: content.clone(),
                });
            }
        }
        plan
    }

    pub fn push(&mut self, op: ArchiveOp) -> &mut ArchivePlan {
        self.ops.push(op);
        self
    }

    pub fn set_gzip(&mut self, gzip: bool) -> &mut ArchivePlan {
        self.gzip = gzip;
        self
    }

    pub fn ops(&self) -> &[ArchiveOp] {
        &self.ops
    }

    /// Whether the posix `relative` path is left out of the walk.
    pub fn is_excluded(&self, relative: &str) -> bool {
        for op in self.ops.iter().rev() {
            match op {
                ArchiveOp::Include(pattern) if pattern.matches(relative) => return false,
                ArchiveOp::Exclude(pattern) if pattern.matches(relative) => return true,
                _ => {}
            }
        }
        false
    }

    /// Whether the walk never reaches `relative`: the path itself or one of
    /// its parent directories is excluded.
    pub fn is_pruned(&self, relative: &str) -> bool {
        relative
            .match_indices('/')
            .map(|(at, _)| &relative[..at])
            .chain(std::iter::once(relative))
            .any(|prefix| self.is_excluded(prefix))
    }
}

/// Tar archive of `root` with `ignore` applied and `overrides` injected.
pub fn create_tar(
    root: &Path,
    ignore: Option<&IgnorePatternSet>,
    overrides: Option<&BTreeMap<String, Bytes>>,
) -> Result<ContextArchive> {
    ArchivePlan::from_parts(ignore, overrides).spool(root)
}

/// Everything a build request uploads: the context directory, its ignore
/// rules and the build file.
#[derive(Debug, Clone)]
pub struct BuildContext {
    root: PathBuf,
    dockerfile: Option<PathBuf>,
    dockerfile_content: Option<Bytes>,
    ignore_content: Option<String>,
    extra: BTreeMap<String, Bytes>,
    config: ContextConfig,
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>) -> BuildContext {
        BuildContext {
            root: root.into(),
            dockerfile: None,
            dockerfile_content: None,
            ignore_content: None,
            extra: BTreeMap::new(),
            config: ContextConfig::default(),
        }
    }

    pub fn config(mut self, config: ContextConfig) -> BuildContext {
        self.config = config;
        self
    }

    /// Build file path, absolute or relative to the root.
    pub fn dockerfile(mut self, path: impl Into<PathBuf>) -> BuildContext {
        self.dockerfile = Some(path.into());
        self
    }

    /// Inline build file, written as the build file entry even when the
    /// directory has none.
    pub fn dockerfile_content(mut self, content: impl Into<Bytes>) -> BuildContext {
        self.dockerfile_content = Some(content.into());
        self
    }

    /// Inline ignore rules, used instead of the ignore file on disk and
    /// shipped as `.dockerignore`.
    pub fn ignore_content(mut self, content: impl Into<String>) -> BuildContext {
        self.ignore_content = Some(content.into());
        self
    }

    pub fn add_file(mut self, path: impl Into<String>, content: impl Into<Bytes>) -> BuildContext {
        self.extra.insert(path.into(), content.into());
        self
    }

    pub fn gzip(mut self, gzip: bool) -> BuildContext {
        self.config.gzip = gzip;
        self
    }

    /// Archives the context. Returns the archive and the relative build file
    /// path to name in the build request.
    pub fn archive(&self) -> Result<(ContextArchive, String)> {
        if !self.root.is_dir() {
            return Err(PayloadError::ContextNotFound(self.root.clone()));
        }
        let ignore = match &self.ignore_content {
            Some(content) => IgnorePatternSet::parse(content),
            None => prepare_ignore_with(&self.root, &self.config)?,
        };
        let mut plan = ArchivePlan::from_parts(Some(&ignore), Some(&self.extra));
        plan.set_gzip(self.config.gzip);
        if let Some(content) = &self.ignore_content {
            plan.push(ArchiveOp::Override {
                path: DOCKERIGNORE.to_string(),
                content: Bytes::from(content.clone()),
            });
        }

        let dockerfile = match &self.dockerfile_content {
            Some(content) => {
                let name = self.synthesized_dockerfile_name()?;
                plan.push(ArchiveOp::Override {
                    path: name.clone(),
                    content: content.clone(),
                });
                name
            }
            None => {
                let name = prepare_dockerfile_with(&self.root, self.dockerfile.as_deref(), &self.config)?;
                // the build file is always shipped, even when ignored
                if plan.is_pruned(&name) {
                    let path = self.root.join(&name);
                    let content = fs::read(&path).map_err(|e| PayloadError::archive_io(&path, e))?;
                    plan.push(ArchiveOp::Override {
                        path: name.clone(),
                        content: Bytes::from(content),
                    });
                }
                name
            }
        };
        debug!("build context {:?} uses build file '{}'", self.root, dockerfile);
        let archive = plan.spool(&self.root)?;
        Ok((archive, dockerfile))
    }

    fn synthesized_dockerfile_name(&self) -> Result<String> {
        match &self.dockerfile {
            None => Ok(self.config.build_files.last().cloned().unwrap_or_else(|| DOCKERFILE.to_string())),
            Some(path) => {
                let relative = if path.is_absolute() {
                    path.strip_prefix(&self.root).ok().and_then(posix)
                } else {
                    posix(path)
                };
                relative
                    .filter(|relative| !relative.is_empty())
                    .ok_or_else(|| PayloadError::ContextNotFound(path.clone()))
            }
        }
    }
}
