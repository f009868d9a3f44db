//! Media type classification.

use std::path::Path;

use crate::session::Attachment;

/// File extensions accepted for named document attachments.
pub const ALLOWED_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "mp4", "mov", "avi", "mkv"];

/// Extension used for photo attachments.
pub const IMAGE_DEFAULT_EXTENSION: &str = "jpg";

/// Extension used for streamed-video containers.
pub const STREAMING_VIDEO_EXTENSION: &str = "mp4";

/// A supported attachment, ready to be scheduled for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedMedia {
    /// Extension without the dot, already lower-cased.
    pub extension: String,
    /// Byte size when the session reported one.
    pub size: Option<u64>,
}

/// Decide whether an attachment is downloadable and under what name/size.
///
/// Pure decision over one attachment:
/// - streamed-video documents are always video files;
/// - named documents qualify by their extension alone;
/// - photos always qualify, sized by the largest available rendition;
/// - everything else is unsupported and returns `None`.
pub fn classify(attachment: &Attachment) -> Option<ClassifiedMedia> {
    match attachment {
        Attachment::Document {
            is_streaming_video: true,
            size,
            ..
        } => Some(ClassifiedMedia {
            extension: STREAMING_VIDEO_EXTENSION.to_string(),
            size: *size,
        }),

        Attachment::Document {
            file_name: Some(name),
            size,
            ..
        } => {
            let extension = Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())?
                .to_lowercase();
            if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
                Some(ClassifiedMedia {
                    extension,
                    size: *size,
                })
            } else {
                None
            }
        }

        Attachment::Document { .. } => None,

        Attachment::Photo { rendition_sizes } => Some(ClassifiedMedia {
            extension: IMAGE_DEFAULT_EXTENSION.to_string(),
            size: rendition_sizes.iter().max().copied(),
        }),
    }
}
