//! 把字节提交到图库的两种实现：
//! - `AlbumDirWriter`：旧式，直接复制到公共图片目录下的相册文件夹
//! - `ScopedMediaWriter`：新式，经 `MediaStore` 两阶段（pending → 完成）写入
//!
//! 启动时按 `CapabilityLevel` 选定一种，导入流程只持有 `Arc<dyn GalleryWriter>`。

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::CapabilityLevel;
use crate::error::Result;
use crate::settings::GallerySettings;

pub mod album_dir;
pub mod local_media_store;
pub mod media_store;

pub use album_dir::AlbumDirWriter;
pub use local_media_store::{LocalMediaStore, MediaRecord};
pub use media_store::{MediaStore, NewMediaRecord, ScopedMediaWriter};

/// 写入前确定的条目信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    pub display_name: String,
    pub mime_type: &'static str,
    /// 调用方给的标题，只作展示用途，不参与重名处理
    pub title: String,
}

/// 一次成功提交的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryEntry {
    pub display_name: String,
    pub mime_type: String,
    pub relative_path: String,
    /// 目标绝对路径或媒体库 URI
    pub location: String,
    pub size: u64,
}

#[async_trait]
pub trait GalleryWriter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn commit(&self, source: &Path, meta: &EntryMeta) -> Result<GalleryEntry>;
}

/// 按能力等级选定写入实现。Scoped 在非移动端落到本地媒体库（同目录下带索引）。
pub fn select_writer(
    capability: CapabilityLevel,
    settings: &GallerySettings,
) -> Result<Arc<dyn GalleryWriter>> {
    let writer: Arc<dyn GalleryWriter> = match capability {
        CapabilityLevel::Legacy => Arc::new(AlbumDirWriter::new(
            settings.pictures_dir(),
            settings.album_name.clone(),
        )),
        CapabilityLevel::Scoped => {
            let store = LocalMediaStore::open(settings.media_root())?;
            Arc::new(ScopedMediaWriter::new(
                Arc::new(store),
                settings.relative_path(),
            ))
        }
    };
    log::info!(
        "[gallery] 写入策略: {} ({:?})",
        writer.name(),
        capability
    );
    Ok(writer)
}
