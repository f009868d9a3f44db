//! Media classification and album resolution.

pub mod classify;
pub mod group;

pub use classify::{classify, ClassifiedMedia, ALLOWED_EXTENSIONS};
pub use group::{resolve_group_members, resolve_media_group, MediaGroup, GROUP_SEARCH_RADIUS};
