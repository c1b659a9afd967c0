use proscan_core::settings::{GallerySettings, SETTINGS_FILE_NAME};
use tauri::{
  plugin::{Builder, TauriPlugin},
  AppHandle, Manager, Runtime,
};

pub use models::*;

#[cfg(desktop)]
mod desktop;
#[cfg(mobile)]
mod mobile;

mod commands;
mod error;
mod gallery;
mod models;

pub use error::{Error, Result};
pub use gallery::Gallery;

/// Extensions to [`tauri::App`], [`tauri::AppHandle`] and [`tauri::Window`] to access the gallery APIs.
pub trait GalleryExt<R: Runtime> {
  fn gallery(&self) -> &Gallery<R>;
}

impl<R: Runtime, T: Manager<R>> crate::GalleryExt<R> for T {
  fn gallery(&self) -> &Gallery<R> {
    self.state::<Gallery<R>>().inner()
  }
}

/// `plugins.gallery` 优先；未配置时读取应用配置目录下的 `gallery.json`（首次启动写入默认值）。
fn resolve_settings<R: Runtime>(app: &AppHandle<R>, config: Option<GallerySettings>) -> GallerySettings {
  if let Some(settings) = config {
    return settings;
  }
  let path = match app.path().app_config_dir() {
    Ok(dir) => dir.join(SETTINGS_FILE_NAME),
    Err(e) => {
      log::warn!("[gallery] 无法获取配置目录，使用默认设置: {}", e);
      return GallerySettings::default();
    }
  };
  match GallerySettings::load_or_init(&path) {
    Ok(settings) => settings,
    Err(e) => {
      log::warn!("[gallery] 读取 {} 失败，使用默认设置: {}", path.display(), e);
      GallerySettings::default()
    }
  }
}

/// Initializes the plugin. 配置取自 `plugins.gallery` 或应用配置目录下的 `gallery.json`。
pub fn init<R: Runtime>() -> TauriPlugin<R, Option<GallerySettings>> {
  Builder::<R, Option<GallerySettings>>::new("gallery")
    .invoke_handler(tauri::generate_handler![
      commands::save_image,
      commands::dispatch,
    ])
    .setup(|app, api| {
      let settings = resolve_settings(app, api.config().clone());
      #[cfg(mobile)]
      let gallery = mobile::init(app, api, settings)?;
      #[cfg(desktop)]
      let gallery = desktop::init(app, api, settings)?;
      app.manage(gallery);
      Ok(())
    })
    .build()
}
