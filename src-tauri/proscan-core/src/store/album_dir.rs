//! 旧式写入：`<Pictures>/<相册名>/<文件名>`。同名文件直接覆盖，不做去重。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{EntryMeta, GalleryEntry, GalleryWriter};
use crate::error::{ImportError, Result};

pub struct AlbumDirWriter {
    pictures_dir: PathBuf,
    album_name: String,
}

impl AlbumDirWriter {
    pub fn new(pictures_dir: PathBuf, album_name: String) -> Self {
        Self {
            pictures_dir,
            album_name,
        }
    }

    pub fn album_dir(&self) -> PathBuf {
        self.pictures_dir.join(&self.album_name)
    }
}

#[async_trait]
impl GalleryWriter for AlbumDirWriter {
    fn name(&self) -> &'static str {
        "album-dir"
    }

    async fn commit(&self, source: &Path, meta: &EntryMeta) -> Result<GalleryEntry> {
        let dir = self.album_dir();
        fs::create_dir_all(&dir).await.map_err(|e| {
            ImportError::Io(format!("Failed to create album dir {}: {}", dir.display(), e))
        })?;
        let dest = dir.join(&meta.display_name);

        let mut input = fs::File::open(source)
            .await
            .map_err(|e| ImportError::Io(format!("Failed to open source: {}", e)))?;
        let mut output = fs::File::create(&dest)
            .await
            .map_err(|e| ImportError::Io(format!("Failed to create {}: {}", dest.display(), e)))?;
        let size = tokio::io::copy(&mut input, &mut output)
            .await
            .map_err(|e| ImportError::Io(format!("Failed to copy image: {}", e)))?;
        output.sync_all().await?;

        let pictures_name = self
            .pictures_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Pictures");
        Ok(GalleryEntry {
            display_name: meta.display_name.clone(),
            mime_type: meta.mime_type.to_string(),
            relative_path: format!("{}/{}", pictures_name, self.album_name),
            location: dest.to_string_lossy().to_string(),
            size,
        })
    }
}
