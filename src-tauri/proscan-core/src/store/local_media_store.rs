//! 本地媒体库：行为对齐 Android MediaStore 的 pending 语义，索引存在 SQLite。
//!
//! - 索引：`<root>/.proscan-media/index.db`
//! - pending 数据：`<root>/.proscan-media/pending/<id>-<name>`（对图库不可见）
//! - 完成后移动到 `<root>/<relative_path>/<display_name>`，重名时改为 `name (n).ext`
//!
//! 同一 root 只应打开一个实例：`open` 会清掉上次进程遗留的 pending 条目。

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::media_store::{MediaStore, MediaWriter, NewMediaRecord};
use crate::error::{ImportError, Result};

const INDEX_DIR: &str = ".proscan-media";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: i64,
    pub display_name: String,
    pub mime_type: String,
    pub relative_path: String,
    pub is_pending: bool,
    pub data_path: String,
    pub size: u64,
    pub date_added: i64,
}

#[derive(Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    db: Arc<Mutex<Connection>>,
}

impl LocalMediaStore {
    pub fn open(root: PathBuf) -> Result<Self> {
        let index_dir = root.join(INDEX_DIR);
        std::fs::create_dir_all(index_dir.join("pending")).map_err(|e| {
            ImportError::Io(format!(
                "Failed to create media index dir {}: {}",
                index_dir.display(),
                e
            ))
        })?;
        let conn = Connection::open(index_dir.join("index.db"))?;
        let _ = conn.execute_batch(
            r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;
"#,
        );
        conn.execute(
            "CREATE TABLE IF NOT EXISTS media (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                display_name TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                relative_path TEXT NOT NULL,
                is_pending INTEGER NOT NULL DEFAULT 1,
                data_path TEXT NOT NULL DEFAULT '',
                size INTEGER NOT NULL DEFAULT 0,
                date_added INTEGER NOT NULL
            )",
            [],
        )?;
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_media_pending ON media(is_pending)",
            [],
        );
        let store = Self {
            root,
            db: Arc::new(Mutex::new(conn)),
        };
        let purged = store.purge_stale_pending()?;
        if purged > 0 {
            log::info!("[media-store] 清理上次遗留的 pending 条目: {}", purged);
        }
        Ok(store)
    }

    /// 删除所有 pending 行以及 pending 目录下的数据文件（进程中断后遗留的半成品）。
    fn purge_stale_pending(&self) -> Result<usize> {
        let pending_dir = self.root.join(INDEX_DIR).join("pending");
        if let Ok(entries) = std::fs::read_dir(&pending_dir) {
            for entry in entries.flatten() {
                if let Err(e) = std::fs::remove_file(entry.path()) {
                    log::warn!(
                        "[media-store] 删除遗留文件 {} 失败: {}",
                        entry.path().display(),
                        e
                    );
                }
            }
        }
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM media WHERE is_pending = 1", [])?;
        Ok(removed)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| ImportError::Io(format!("Lock error: {}", e)))
    }

    pub fn get(&self, id: i64) -> Result<Option<MediaRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT id, display_name, mime_type, relative_path, is_pending, data_path, size, date_added
                 FROM media WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// 已完成（图库可见）的条目，按插入顺序。
    pub fn visible_entries(&self) -> Result<Vec<MediaRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, display_name, mime_type, relative_path, is_pending, data_path, size, date_added
             FROM media WHERE is_pending = 0 ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn pending_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM media WHERE is_pending = 1", [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }

    fn pending_record(&self, id: i64) -> Result<MediaRecord> {
        match self.get(id)? {
            Some(r) if r.is_pending => Ok(r),
            Some(_) => Err(ImportError::Io(format!("Media entry {} is not pending", id))),
            None => Err(ImportError::Io(format!("Media entry {} not found", id))),
        }
    }

    /// 在目标目录下占住一个不冲突的文件名：`scan.jpg` -> `scan (1).jpg` -> `scan (2).jpg` ...
    /// 用 create_new 原子地创建占位文件，并发提交同名条目时不会选中同一个路径。
    async fn reserve_destination(dir: &Path, display_name: &str) -> Result<(PathBuf, String)> {
        let (stem, ext) = match display_name.rfind('.') {
            Some(dot) if dot > 0 => (&display_name[..dot], &display_name[dot..]),
            _ => (display_name, ""),
        };
        let mut n = 0;
        loop {
            let name = if n == 0 {
                display_name.to_string()
            } else {
                format!("{} ({}){}", stem, n, ext)
            };
            let path = dir.join(&name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok((path, name)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => {
                    return Err(ImportError::Io(format!(
                        "Failed to reserve {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaRecord> {
    Ok(MediaRecord {
        id: row.get(0)?,
        display_name: row.get(1)?,
        mime_type: row.get(2)?,
        relative_path: row.get(3)?,
        is_pending: row.get::<_, i64>(4)? != 0,
        data_path: row.get(5)?,
        size: row.get::<_, i64>(6)? as u64,
        date_added: row.get(7)?,
    })
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn insert_pending(&self, record: &NewMediaRecord) -> Result<i64> {
        let id = {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO media (display_name, mime_type, relative_path, is_pending, date_added)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                params![
                    record.display_name,
                    record.mime_type,
                    record.relative_path,
                    now_secs()
                ],
            )?;
            let id = conn.last_insert_rowid();
            let data_path = self
                .root
                .join(INDEX_DIR)
                .join("pending")
                .join(format!("{}-{}", id, record.display_name));
            conn.execute(
                "UPDATE media SET data_path = ?1 WHERE id = ?2",
                params![data_path.to_string_lossy().to_string(), id],
            )?;
            id
        };
        Ok(id)
    }

    async fn open_writer(&self, id: i64) -> Result<MediaWriter> {
        let record = self.pending_record(id)?;
        let file = tokio::fs::File::create(&record.data_path)
            .await
            .map_err(|e| ImportError::Io(format!("Failed to open media entry {}: {}", id, e)))?;
        Ok(Box::new(file))
    }

    async fn finalize(&self, id: i64) -> Result<String> {
        let record = self.pending_record(id)?;
        let dir = self.root.join(&record.relative_path);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            ImportError::Io(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        let (dest, display_name) = Self::reserve_destination(&dir, &record.display_name).await?;
        // 覆盖占位文件即为发布
        if let Err(e) = tokio::fs::rename(&record.data_path, &dest).await {
            let _ = tokio::fs::remove_file(&dest).await;
            return Err(ImportError::Io(format!(
                "Failed to publish media entry {}: {}",
                id, e
            )));
        }
        let size = tokio::fs::metadata(&dest).await.map(|m| m.len()).unwrap_or(0);
        let location = dest.to_string_lossy().to_string();
        let updated = self.conn().and_then(|conn| {
            conn.execute(
                "UPDATE media SET is_pending = 0, display_name = ?1, data_path = ?2, size = ?3 WHERE id = ?4",
                params![display_name, location, size as i64, id],
            )
            .map_err(ImportError::from)
        });
        if let Err(e) = updated {
            // 索引没更新成功：撤回已发布的文件，条目仍按 pending 交给 discard 处理
            if let Err(rm) = tokio::fs::remove_file(&dest).await {
                log::warn!("[media-store] 撤回 {} 失败: {}", location, rm);
            }
            return Err(e);
        }
        Ok(location)
    }

    async fn discard(&self, id: i64) -> Result<()> {
        if let Some(record) = self.get(id)? {
            if record.is_pending && !record.data_path.is_empty() {
                match tokio::fs::remove_file(&record.data_path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        let conn = self.conn()?;
        conn.execute("DELETE FROM media WHERE id = ?1", params![id])?;
        Ok(())
    }
}
