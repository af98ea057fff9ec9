//! Payload shaping for the Podman/Docker HTTP API.
//!
//! Everything here is synchronous and side-effect free apart from the
//! build-context archiver reading the filesystem. The transport that sends
//! the results lives elsewhere.

pub mod config;
pub mod context;
pub mod error;
pub mod frames;
pub mod init;
pub mod parse;
pub mod query;
mod util;

pub use config::{ContextConfig, DEFAULT_API_BASE, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_SECS};
pub use context::{
    create_tar, prepare_dockerfile, prepare_dockerignore, ArchiveOp, ArchivePlan, BuildContext, ContextArchive,
    IgnorePattern, IgnorePatternSet,
};
pub use error::{PayloadError, Result};
pub use frames::{demux_all, Frame, FrameReader, StreamKind};
pub use parse::{
    decode_header, encode_header, parse_repository, prepare_body, prepare_body_from, prepare_cidr, prepare_timestamp,
    ImageReference,
};
pub use query::{filters_param, format_filters, join, FilterValue, Filters};
