use std::sync::Arc;

use proscan_core::capability::PlatformProfile;
use proscan_core::{GalleryChannel, GalleryImporter, ImportRequest, MethodCall, MethodResult};
use tauri::{AppHandle, Runtime};

use crate::models::SaveImageArgs;

/// Access to the gallery APIs.
pub struct Gallery<R: Runtime> {
  _app: AppHandle<R>,
  importer: Arc<GalleryImporter>,
  channel: GalleryChannel,
}

impl<R: Runtime> Gallery<R> {
  pub(crate) fn new(app: AppHandle<R>, importer: GalleryImporter) -> Self {
    let importer = Arc::new(importer);
    Self {
      _app: app,
      channel: GalleryChannel::new(importer.clone()),
      importer,
    }
  }

  pub fn profile(&self) -> PlatformProfile {
    self.importer.profile()
  }

  pub async fn save_image(&self, args: SaveImageArgs) -> crate::Result<bool> {
    let request = ImportRequest {
      path: args.path,
      title: args.title,
    };
    Ok(self.importer.import_image(request).await?)
  }

  /// 以方法通道的形式调用（`saveImage`，其余方法返回未实现）。
  pub async fn dispatch(&self, call: MethodCall) -> MethodResult {
    self.channel.handle(call).await
  }
}
