use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use proscan_core::capability::{CapabilityLevel, PermissionRequirement, PlatformProfile};
use proscan_core::permission::{PermissionBroker, PermissionGate, PermissionState};
use proscan_core::settings::GallerySettings;
use proscan_core::store::{AlbumDirWriter, EntryMeta, GalleryEntry, GalleryWriter};
use proscan_core::{GalleryImporter, ImportError};
use serde::de::DeserializeOwned;
use tauri::{
  plugin::{PluginApi, PluginHandle},
  AppHandle, Runtime,
};

use crate::models::*;
use crate::Gallery;

#[cfg(target_os = "ios")]
tauri::ios_plugin_binding!(init_plugin_gallery);

// initializes the Kotlin or Swift plugin classes
pub fn init<R: Runtime, C: DeserializeOwned>(
  app: &AppHandle<R>,
  api: PluginApi<R, C>,
  settings: GallerySettings,
) -> crate::Result<Gallery<R>> {
  #[cfg(target_os = "android")]
  let handle = api.register_android_plugin("app.proscan.plugin.gallery", "GalleryPlugin")?;
  #[cfg(target_os = "ios")]
  let handle = api.register_ios_plugin(init_plugin_gallery)?;

  // 平台信息只在启动时取一次，之后按能力等级固定写入策略
  let reported: Option<PlatformResponse> =
    match tauri::async_runtime::block_on(handle.run_mobile_plugin_async("getPlatform", ())) {
      Ok(r) => Some(r),
      Err(e) => {
        log::warn!("[gallery] 获取平台信息失败，使用编译期推断: {}", e);
        None
      }
    };
  let profile = settings
    .platform
    .or_else(|| reported.as_ref().map(|r| r.profile))
    .unwrap_or_else(PlatformProfile::probe);

  let writer: Arc<dyn GalleryWriter> = match profile.capability() {
    CapabilityLevel::Legacy => {
      let pictures_dir = settings
        .pictures_dir
        .clone()
        .or_else(|| reported.as_ref().and_then(|r| r.pictures_dir.clone()).map(PathBuf::from))
        .ok_or_else(|| crate::Error::Setup("Pictures directory unavailable".to_string()))?;
      Arc::new(AlbumDirWriter::new(pictures_dir, settings.album_name.clone()))
    }
    CapabilityLevel::Scoped => Arc::new(NativeGalleryWriter {
      handle: handle.clone(),
      relative_path: settings.relative_path(),
    }),
  };
  log::info!(
    "[gallery] mobile 初始化完成: {:?} / {} ({:?})",
    profile.os,
    writer.name(),
    profile.capability()
  );

  // 弹窗统一经 broker 排队，由唯一的 UI 任务逐个交给原生侧
  let (broker, prompts) = PermissionBroker::new(PermissionState::Prompt);
  let prompt_handle = handle.clone();
  tauri::async_runtime::spawn(broker.clone().serve(prompts, move |requirement| {
    let handle = prompt_handle.clone();
    async move { native_permission(&handle, "requestPermissions", requirement).await }
  }));

  let gate = Arc::new(NativePermissionGate { handle, broker });
  let importer = GalleryImporter::new(profile, gate, writer).with_settings(&settings);
  Ok(Gallery::new(app.clone(), importer))
}

async fn native_permission<R: Runtime>(
  handle: &PluginHandle<R>,
  method: &str,
  requirement: PermissionRequirement,
) -> PermissionState {
  match handle
    .run_mobile_plugin_async::<PermissionResponse>(method, PermissionArgs { requirement })
    .await
  {
    Ok(r) => r.state,
    Err(e) => {
      log::warn!("[gallery] {} 失败: {}", method, e);
      PermissionState::Denied
    }
  }
}

/// 状态直接查询原生插件；弹窗请求交给 broker，由 UI 任务调用 `requestPermissions`。
struct NativePermissionGate<R: Runtime> {
  handle: PluginHandle<R>,
  broker: PermissionBroker,
}

#[async_trait]
impl<R: Runtime> PermissionGate for NativePermissionGate<R> {
  async fn status(&self, requirement: PermissionRequirement) -> PermissionState {
    let state = native_permission(&self.handle, "checkPermissions", requirement).await;
    self.broker.set_status(state);
    state
  }

  async fn request(&self, requirement: PermissionRequirement) -> PermissionState {
    self.broker.request(requirement).await
  }
}

/// 新式写入：原生侧完成 MediaStore pending 插入、写入与提交（iOS 为 PHAssetCreationRequest）。
struct NativeGalleryWriter<R: Runtime> {
  handle: PluginHandle<R>,
  relative_path: String,
}

#[async_trait]
impl<R: Runtime> GalleryWriter for NativeGalleryWriter<R> {
  fn name(&self) -> &'static str {
    "native-media-store"
  }

  async fn commit(&self, source: &Path, meta: &EntryMeta) -> proscan_core::Result<GalleryEntry> {
    let args = CommitImageArgs {
      path: source.to_string_lossy().to_string(),
      display_name: meta.display_name.clone(),
      mime_type: meta.mime_type.to_string(),
      relative_path: self.relative_path.clone(),
    };
    let resp: CommitImageResponse = self
      .handle
      .run_mobile_plugin_async("commitImage", args)
      .await
      .map_err(|e| ImportError::Io(e.to_string()))?;
    Ok(GalleryEntry {
      display_name: meta.display_name.clone(),
      mime_type: meta.mime_type.to_string(),
      relative_path: self.relative_path.clone(),
      location: resp.uri,
      size: resp.size,
    })
  }
}
