use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use log::{debug, warn};

use crate::config::ContextConfig;
use crate::context::ArchiveOp;
use crate::error::{PayloadError, Result};

// `*` and `?` stay within one path segment, only `**` crosses `/`.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One line of an ignore file.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    /// Cleaned pattern text, without the `!` prefix.
    pub pattern: String,
    /// `!pattern`: re-include what earlier patterns excluded.
    pub negated: bool,
    glob: Pattern,
}

impl IgnorePattern {
    /// Parses one ignore line. Blank lines, comments and patterns that do
    /// not compile give `None`.
    pub fn parse(line: &str) -> Option<IgnorePattern> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, line),
        };
        let pattern = clean_pattern(body);
        if pattern.is_empty() {
            return None;
        }
        match Pattern::new(&pattern) {
            Ok(glob) => Some(IgnorePattern { pattern, negated, glob }),
            Err(e) => {
                warn!("skip ignore pattern '{}': {}", line, e);
                None
            }
        }
    }

    /// Matches a posix path relative to the context root.
    pub fn matches(&self, relative: &str) -> bool {
        self.glob.matches_with(relative, MATCH_OPTIONS)
    }
}

/// Ordered ignore patterns. Later patterns override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatternSet {
    patterns: Vec<IgnorePattern>,
}

impl IgnorePatternSet {
    pub fn parse(content: &str) -> IgnorePatternSet {
        IgnorePatternSet {
            patterns: content.lines().filter_map(IgnorePattern::parse).collect(),
        }
    }

    pub fn patterns(&self) -> &[IgnorePattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn to_ops(&self) -> Vec<ArchiveOp> {
        self.patterns
            .iter()
            .map(|pattern| {
                if pattern.negated {
                    ArchiveOp::Include(pattern.clone())
                } else {
                    ArchiveOp::Exclude(pattern.clone())
                }
            })
            .collect()
    }
}

/// Loads the ignore file of `root`, `.containerignore` before
/// `.dockerignore`. A context without one ignores nothing.
pub fn prepare_dockerignore(root: &Path) -> Result<IgnorePatternSet> {
    prepare_ignore_with(root, &ContextConfig::default())
}

pub fn prepare_ignore_with(root: &Path, config: &ContextConfig) -> Result<IgnorePatternSet> {
    for name in &config.ignore_files {
        let path = root.join(name);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let set = IgnorePatternSet::parse(&content);
                debug!("loaded {} ignore patterns from {:?}", set.len(), path);
                return Ok(set);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(PayloadError::archive_io(path, e)),
        }
    }
    Ok(IgnorePatternSet::default())
}

fn clean_pattern(pattern: &str) -> String {
    let mut parts = Vec::new();
    for part in pattern.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    parts.join("/")
}
