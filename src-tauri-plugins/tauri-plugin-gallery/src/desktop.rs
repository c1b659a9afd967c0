use std::sync::Arc;

use proscan_core::permission::{FixedPermissionGate, PermissionState};
use proscan_core::settings::GallerySettings;
use proscan_core::GalleryImporter;
use serde::de::DeserializeOwned;
use tauri::{plugin::PluginApi, AppHandle, Runtime};

use crate::Gallery;

/// 桌面端无需系统授权，直接写入用户图片目录。
pub fn init<R: Runtime, C: DeserializeOwned>(
  app: &AppHandle<R>,
  _api: PluginApi<R, C>,
  settings: GallerySettings,
) -> crate::Result<Gallery<R>> {
  let gate = Arc::new(FixedPermissionGate(PermissionState::Granted));
  let importer = GalleryImporter::from_settings(&settings, gate)?;
  log::info!(
    "[gallery] desktop 初始化完成, 图片目录: {}",
    settings.pictures_dir().display()
  );
  Ok(Gallery::new(app.clone(), importer))
}
