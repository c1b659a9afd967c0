use proscan_core::capability::{PermissionRequirement, PlatformProfile};
use proscan_core::permission::PermissionState;
use serde::{Deserialize, Serialize};

/// `saveImage` 的参数：path 必填（可为 file:// URI），title 可选。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveImageArgs {
  pub path: Option<String>,
  pub title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionArgs {
  pub requirement: PermissionRequirement,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
  pub state: PermissionState,
}

/// 原生侧一次性完成 pending 插入、字节写入与提交。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitImageArgs {
  pub path: String,
  pub display_name: String,
  pub mime_type: String,
  pub relative_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitImageResponse {
  pub uri: String,
  #[serde(default)]
  pub size: u64,
}

/// 原生侧上报的平台信息（Android 提供真实 SDK_INT）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformResponse {
  pub profile: PlatformProfile,
  /// 旧式写入用的公共图片目录（Environment.DIRECTORY_PICTURES 的绝对路径）
  #[serde(default)]
  pub pictures_dir: Option<String>,
}
