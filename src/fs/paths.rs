//! Run directory management and the oversized-media manifest.

use std::path::{Path, PathBuf};

use crate::download::OversizedMedia;
use crate::error::Result;

/// Sidecar file listing media skipped for exceeding the size cap.
pub const MANIFEST_FILE_NAME: &str = "large_media_links.txt";

/// Default downloads root when the configuration names none.
pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

/// Create the folder for one run under the downloads root.
pub async fn create_run_dir(root: &Path, folder_name: &str) -> Result<PathBuf> {
    let dir = root.join(folder_name);
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Write the oversized-media manifest into the run folder.
///
/// One line per item: `Message ID: <id>, Link: <link>, Size: <bytes> bytes`.
pub async fn write_oversized_manifest(
    run_dir: &Path,
    entries: &[OversizedMedia],
) -> Result<PathBuf> {
    let path = run_dir.join(MANIFEST_FILE_NAME);
    let mut content = String::new();
    for entry in entries {
        content.push_str(&format!(
            "Message ID: {}, Link: {}, Size: {} bytes\n",
            entry.message_id, entry.link, entry.size
        ));
    }

    tokio::fs::write(&path, content).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_run_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = create_run_dir(root.path(), "Chat_20240301_090507")
            .await
            .unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("Chat_20240301_090507"));
    }

    #[tokio::test]
    async fn test_manifest_format() {
        let root = tempfile::tempdir().unwrap();
        let entries = vec![
            OversizedMedia {
                message_id: 12,
                link: "https://t.me/c/123/12".to_string(),
                size: 262_144_001,
            },
            OversizedMedia {
                message_id: 30,
                link: "https://t.me/c/123/30".to_string(),
                size: 300_000_000,
            },
        ];

        let path = write_oversized_manifest(root.path(), &entries).await.unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "Message ID: 12, Link: https://t.me/c/123/12, Size: 262144001 bytes\n\
             Message ID: 30, Link: https://t.me/c/123/30, Size: 300000000 bytes\n"
        );
    }
}
