//! Filesystem layout: naming rules, run folders, and the oversized manifest.

pub mod naming;
pub mod paths;

pub use naming::{media_file_name, run_folder_name, sanitize_component};
pub use paths::{create_run_dir, write_oversized_manifest, MANIFEST_FILE_NAME};
