//! Shared utilities

pub mod config;
pub mod fs;

pub use config::HostConfig;
pub use fs::DirListing;
