use serde::{Deserialize, Serialize};

/// Versioned path prefix of the libpod API.
pub const DEFAULT_API_BASE: &str = "/v4.0.0/libpod";
/// Suggested read size when streaming archives and image exports.
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const CONTAINERIGNORE: &str = ".containerignore";
pub const DOCKERIGNORE: &str = ".dockerignore";
pub const CONTAINERFILE: &str = "Containerfile";
pub const DOCKERFILE: &str = "Dockerfile";

/// How build contexts are assembled.
///
/// Deserializes with defaults for missing fields, so an application can keep
/// it inside its own configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextConfig {
    /// Ignore files looked up in the context root, first match wins.
    pub ignore_files: Vec<String>,
    /// Build files looked up in the context root, first match wins.
    pub build_files: Vec<String>,
    pub gzip: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            ignore_files: vec![CONTAINERIGNORE.to_string(), DOCKERIGNORE.to_string()],
            build_files: vec![CONTAINERFILE.to_string(), DOCKERFILE.to_string()],
            gzip: false,
        }
    }
}

impl ContextConfig {
    pub fn from_json(text: &str) -> serde_json::Result<ContextConfig> {
        serde_json::from_str(text)
    }
}
