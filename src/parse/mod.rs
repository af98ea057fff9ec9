//! Parsing and shaping of individual request and response values.

pub mod body;
pub mod cidr;
pub mod header;
pub mod reference;
pub mod time;

pub use body::{prepare_body, prepare_body_from, strip_nulls};
pub use cidr::prepare_cidr;
pub use header::{decode_header, encode_header};
pub use reference::{parse_repository, ImageReference, Qualifier};
pub use time::{prepare_timestamp, Timestamp};
