pub mod compress;
pub mod file;
