use proscan_core::{MethodCall, MethodResult};
use tauri::{command, AppHandle, Runtime};

use crate::models::SaveImageArgs;
use crate::GalleryExt;

#[command(rename = "saveImage")]
pub(crate) async fn save_image<R: Runtime>(
  app: AppHandle<R>,
  path: Option<String>,
  title: Option<String>,
) -> crate::Result<bool> {
  app.gallery().save_image(SaveImageArgs { path, title }).await
}

#[command]
pub(crate) async fn dispatch<R: Runtime>(
  app: AppHandle<R>,
  call: MethodCall,
) -> crate::Result<MethodResult> {
  Ok(app.gallery().dispatch(call).await)
}
