//! Core data structures for pubgen.
//!
//! This module contains the foundational types used throughout pubgen:
//! - Pub package metadata (pubspec, lockfiles)
//! - Per-directory configuration and directives
//! - Rules and existing BUILD files

pub mod build_file;
pub mod config;
pub mod error;
pub mod lockfile;
pub mod pubspec;
pub mod rule;

pub use build_file::{BuildFile, Directive};
pub use config::{ConfigStore, FlutterConfig};
pub use error::ParseError;
pub use lockfile::{DependencyKind, LockFile, LockedDependency, RegistrySource};
pub use pubspec::Pubspec;
pub use rule::{AttrValue, ExistingTargetIndex, LoadInfo, Rule, RuleKind};
