//! 媒体库两阶段写入：先插入 pending 条目（对图库不可见），复制完字节后再置为完成。
//! 插入之后的任何失败都会丢弃该条目，不留下悬空的 pending 记录；
//! commit 的 future 在中途被丢弃（超时、取消）时同样会在后台丢弃。

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{EntryMeta, GalleryEntry, GalleryWriter};
use crate::error::{ImportError, Result};

/// 插入时写入的字段（对应 DISPLAY_NAME / MIME_TYPE / RELATIVE_PATH / IS_PENDING=1）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaRecord {
    pub display_name: String,
    pub mime_type: String,
    pub relative_path: String,
}

pub type MediaWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// 系统媒体库抽象。桌面端与测试用 `LocalMediaStore`，移动端由宿主注册原生实现。
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// 插入 pending 条目，返回条目 id
    async fn insert_pending(&self, record: &NewMediaRecord) -> Result<i64>;

    async fn open_writer(&self, id: i64) -> Result<MediaWriter>;

    /// 清除 pending 标记，返回条目最终位置（路径或 URI）
    async fn finalize(&self, id: i64) -> Result<String>;

    /// 删除条目及其数据
    async fn discard(&self, id: i64) -> Result<()>;
}

/// commit 未走完时负责丢弃 pending 条目
struct PendingGuard {
    store: Arc<dyn MediaStore>,
    id: i64,
    armed: bool,
}

impl PendingGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let store = self.store.clone();
        let id = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.discard(id).await {
                        log::warn!("[media-store] 丢弃被取消的 pending 条目 {} 失败: {}", id, e);
                    } else {
                        log::debug!("[media-store] 已丢弃被取消的 pending 条目 {}", id);
                    }
                });
            }
            // 运行时已关闭：留给下次 open 时清理
            Err(_) => log::warn!("[media-store] 无运行时，pending 条目 {} 留待下次启动清理", id),
        }
    }
}

pub struct ScopedMediaWriter {
    store: Arc<dyn MediaStore>,
    relative_path: String,
}

impl ScopedMediaWriter {
    pub fn new(store: Arc<dyn MediaStore>, relative_path: String) -> Self {
        Self {
            store,
            relative_path,
        }
    }

    async fn write_and_finalize(&self, id: i64, source: &Path) -> Result<(String, u64)> {
        let mut input = tokio::fs::File::open(source)
            .await
            .map_err(|e| ImportError::Io(format!("Failed to open source: {}", e)))?;
        let mut out = self.store.open_writer(id).await?;
        let size = tokio::io::copy(&mut input, &mut out)
            .await
            .map_err(|e| ImportError::Io(format!("Failed to copy image: {}", e)))?;
        out.flush().await?;
        out.shutdown().await?;
        drop(out);
        let location = self.store.finalize(id).await?;
        Ok((location, size))
    }
}

#[async_trait]
impl GalleryWriter for ScopedMediaWriter {
    fn name(&self) -> &'static str {
        "media-store"
    }

    async fn commit(&self, source: &Path, meta: &EntryMeta) -> Result<GalleryEntry> {
        let record = NewMediaRecord {
            display_name: meta.display_name.clone(),
            mime_type: meta.mime_type.to_string(),
            relative_path: self.relative_path.clone(),
        };
        let id = self.store.insert_pending(&record).await?;
        log::debug!("[media-store] pending 条目 {} ({})", id, record.display_name);
        let mut guard = PendingGuard {
            store: self.store.clone(),
            id,
            armed: true,
        };

        match self.write_and_finalize(id, source).await {
            Ok((location, size)) => {
                guard.disarm();
                Ok(GalleryEntry {
                    display_name: record.display_name,
                    mime_type: record.mime_type,
                    relative_path: record.relative_path,
                    location,
                    size,
                })
            }
            Err(e) => {
                if let Err(cleanup) = self.store.discard(id).await {
                    log::warn!("[media-store] 丢弃 pending 条目 {} 失败: {}", id, cleanup);
                }
                guard.disarm();
                Err(e)
            }
        }
    }
}
