//! pubgen - BUILD file generation for Flutter and Dart packages
//!
//! This crate provides the core library functionality for pubgen,
//! including directive-driven configuration, dependency classification,
//! label resolution, and the language extensions a host walker drives.

pub mod core;
pub mod language;
pub mod ops;
pub mod resolver;
pub mod util;

pub use core::{
    build_file::BuildFile, config::ConfigStore, config::FlutterConfig, lockfile::LockFile,
    pubspec::Pubspec, rule::Rule, rule::RuleKind,
};

pub use language::{default_languages, Language};
pub use util::HostConfig;
