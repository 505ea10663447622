//! High-level operations.
//!
//! This module contains the generation pipeline behind pubgen commands.

pub mod generate;
pub mod imports;
pub mod render;
pub mod walk;

pub use generate::{generate_deps, generate_library, generate_proto_libraries, library_kind};
pub use imports::{parse_imports, resolve_package_import, scan_sources};
pub use render::{merge_rule, render_file, render_rule, update_file};
pub use walk::{run, DirOutput, Mode, WalkReport};
