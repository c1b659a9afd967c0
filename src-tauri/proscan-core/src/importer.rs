//! 相册导入：解析路径 → 校验源文件 → 判定 MIME → 权限 → 提交到图库。
//!
//! 状态流转：
//! `Idle → AwaitingPermission → {Granted → Importing → {Succeeded, Failed}, Denied → Failed}`，
//! 无需弹窗时 `Idle → Importing`。除 `AwaitingPermission` 外均为终态或瞬时态。

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::{PermissionRequirement, PlatformProfile};
use crate::error::{ImportError, Result};
use crate::image_type;
use crate::permission::PermissionGate;
use crate::settings::GallerySettings;
use crate::source;
use crate::store::{self, EntryMeta, GalleryEntry, GalleryWriter};

/// 桥接层传入的导入请求。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub path: Option<String>,
    pub title: Option<String>,
}

impl ImportRequest {
    pub fn new(path: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            path: Some(path.into()),
            title: title.map(|t| t.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    AwaitingPermission,
    Granted,
    Denied,
    Importing,
    Succeeded,
    Failed,
}

fn transition(from: ImportState, to: ImportState, display_name: &str) -> ImportState {
    log::debug!("[import] {}: {:?} -> {:?}", display_name, from, to);
    to
}

pub struct GalleryImporter {
    profile: PlatformProfile,
    gate: Arc<dyn PermissionGate>,
    writer: Arc<dyn GalleryWriter>,
    default_title: String,
    verify_image_content: bool,
}

impl GalleryImporter {
    pub fn new(
        profile: PlatformProfile,
        gate: Arc<dyn PermissionGate>,
        writer: Arc<dyn GalleryWriter>,
    ) -> Self {
        let defaults = GallerySettings::default();
        Self {
            profile,
            gate,
            writer,
            default_title: defaults.default_title,
            verify_image_content: defaults.verify_image_content,
        }
    }

    /// 按配置探测平台并选定写入策略（启动时调用一次）。
    pub fn from_settings(settings: &GallerySettings, gate: Arc<dyn PermissionGate>) -> Result<Self> {
        let profile = settings.platform();
        let writer = store::select_writer(profile.capability(), settings)?;
        Ok(Self::new(profile, gate, writer).with_settings(settings))
    }

    pub fn with_settings(mut self, settings: &GallerySettings) -> Self {
        self.default_title = settings.default_title.clone();
        self.verify_image_content = settings.verify_image_content;
        self
    }

    pub fn profile(&self) -> PlatformProfile {
        self.profile
    }

    pub async fn import_path(&self, path: &str, title: Option<&str>) -> Result<bool> {
        self.import_image(ImportRequest::new(path, title)).await
    }

    /// 导入一张图片。`Ok(false)` 表示未导入但不算错误（内容校验未通过）。
    pub async fn import_image(&self, request: ImportRequest) -> Result<bool> {
        let raw = request.path.as_deref().ok_or_else(ImportError::missing_path)?;
        let path = source::resolve_source_path(raw)?;
        source::ensure_source_file(&path)?;
        let display_name = source::display_name_of(&path)?;
        let meta = EntryMeta {
            mime_type: image_type::mime_for_path(&path),
            display_name,
            title: request
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| self.default_title.clone()),
        };

        if self.verify_image_content && !image_type::looks_like_image(&path) {
            log::warn!("[import] {} 不是可识别的图片，跳过", path.display());
            return Ok(false);
        }

        let state = self.ensure_permission(&meta).await?;
        let state = transition(state, ImportState::Importing, &meta.display_name);
        match self.commit(&path, &meta).await {
            Ok(entry) => {
                transition(state, ImportState::Succeeded, &meta.display_name);
                log::info!(
                    "[import] 已保存到图库: {}「{}」({}, {} bytes) -> {}",
                    entry.display_name,
                    meta.title,
                    entry.mime_type,
                    entry.size,
                    entry.location
                );
                Ok(true)
            }
            Err(e) => {
                transition(state, ImportState::Failed, &meta.display_name);
                log::warn!("[import] 保存 {} 失败: {}", meta.display_name, e);
                Err(e)
            }
        }
    }

    async fn commit(&self, path: &Path, meta: &EntryMeta) -> Result<GalleryEntry> {
        self.writer.commit(path, meta).await
    }

    /// 权限已授予或无需权限时直接通过；否则弹窗一次，不重试。
    async fn ensure_permission(&self, meta: &EntryMeta) -> Result<ImportState> {
        let requirement = self.profile.permission();
        if requirement == PermissionRequirement::None {
            return Ok(ImportState::Idle);
        }
        if self.gate.status(requirement).await.allows_write() {
            return Ok(ImportState::Idle);
        }

        let state = transition(
            ImportState::Idle,
            ImportState::AwaitingPermission,
            &meta.display_name,
        );
        let decision = self.gate.request(requirement).await;
        if decision.allows_write() {
            Ok(transition(state, ImportState::Granted, &meta.display_name))
        } else {
            let state = transition(state, ImportState::Denied, &meta.display_name);
            transition(state, ImportState::Failed, &meta.display_name);
            Err(ImportError::PermissionDenied(
                requirement.denied_message().to_string(),
            ))
        }
    }
}
