//! The blob store trait and its value types.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "mkv", "webm", "avi"];

/// A file on local disk waiting to be uploaded.
///
/// Only the server creates these, from files it staged itself; request
/// payloads never name a path directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile(PathBuf);

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// The final path component, or the whole path if it has none.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }

    /// Lower-cased extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.0
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn is_video(&self) -> bool {
        self.extension()
            .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// A stored asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
    /// Playback length in seconds, reported for media files.
    pub duration: Option<f64>,
}

/// Stores uploaded media and hands back public URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads a local file. Completes only once the asset is durable.
    async fn upload(&self, file: &LocalFile) -> Result<UploadedAsset>;

    /// Deletes an asset by its public id.
    async fn delete(&self, public_id: &str) -> Result<()>;

    /// Recovers the public id from a URL this store issued.
    ///
    /// URLs end with `/<public_id>`.
    fn public_id_of(&self, url: &str) -> Option<String> {
        url.rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_files_are_detected_by_extension() {
        assert!(LocalFile::new("/tmp/clip.MP4").is_video());
        assert!(!LocalFile::new("/tmp/thumb.png").is_video());
        assert!(!LocalFile::new("/tmp/noext").is_video());
    }

    #[test]
    fn file_name_is_the_last_component() {
        assert_eq!(LocalFile::new("/tmp/staged/a.png").file_name(), "a.png");
        assert_eq!(LocalFile::new("/tmp/a.PNG").extension().as_deref(), Some("png"));
    }
}
