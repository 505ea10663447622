//! Dependency resolution: from a decoded lockfile to the sorted label list
//! of a generated rule's `deps`.

pub mod classify;
pub mod label;

pub use classify::{classify, direct_dependencies, ClassifyPolicy};
pub use label::{
    dependency_labels, resolve_label, sanitize_repo_name, sdk_dependency_label, sdk_package_path,
    Label,
};
