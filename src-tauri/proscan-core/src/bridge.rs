//! 方法通道 `proscan.gallery`：把 `MethodCall` 分发给导入器，并把结果折叠为
//! 成功 / 错误码 / 未实现三种回复。任何失败都不会越过通道边界。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;
use crate::importer::{GalleryImporter, ImportRequest};

pub const CHANNEL: &str = "proscan.gallery";
pub const METHOD_SAVE_IMAGE: &str = "saveImage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResult {
    Success {
        result: Value,
    },
    Error {
        code: String,
        message: String,
        #[serde(default)]
        details: Option<Value>,
    },
    NotImplemented,
}

impl From<ImportError> for MethodResult {
    fn from(e: ImportError) -> Self {
        MethodResult::Error {
            code: e.code().to_string(),
            message: e.message().to_string(),
            details: None,
        }
    }
}

pub struct GalleryChannel {
    importer: Arc<GalleryImporter>,
}

impl GalleryChannel {
    pub fn new(importer: Arc<GalleryImporter>) -> Self {
        Self { importer }
    }

    pub fn name(&self) -> &'static str {
        CHANNEL
    }

    pub async fn handle(&self, call: MethodCall) -> MethodResult {
        match call.method.as_str() {
            METHOD_SAVE_IMAGE => {
                let request = match parse_save_image_args(&call.arguments) {
                    Ok(r) => r,
                    Err(e) => return e.into(),
                };
                match self.importer.import_image(request).await {
                    Ok(imported) => MethodResult::Success {
                        result: Value::Bool(imported),
                    },
                    Err(e) => e.into(),
                }
            }
            other => {
                log::debug!("[bridge] {} 未实现的方法: {}", CHANNEL, other);
                MethodResult::NotImplemented
            }
        }
    }
}

/// `{ "path": String, "title"?: String }`。path 缺失或非字符串视为缺少参数；
/// title 非字符串按未提供处理。
fn parse_save_image_args(args: &Value) -> Result<ImportRequest, ImportError> {
    let map = args.as_object().ok_or_else(ImportError::missing_path)?;
    let path = map
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(ImportError::missing_path)?;
    let title = map.get("title").and_then(Value::as_str);
    Ok(ImportRequest::new(path, title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::PlatformProfile;
    use crate::permission::{FixedPermissionGate, PermissionState};
    use crate::store::AlbumDirWriter;
    use serde_json::json;

    fn channel(tmp: &tempfile::TempDir, state: PermissionState, profile: PlatformProfile) -> GalleryChannel {
        let writer = AlbumDirWriter::new(tmp.path().join("Pictures"), "ProScan".to_string());
        let importer = GalleryImporter::new(
            profile,
            Arc::new(FixedPermissionGate(state)),
            Arc::new(writer),
        );
        GalleryChannel::new(Arc::new(importer))
    }

    #[tokio::test]
    async fn test_save_image_success() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("scan.jpg");
        std::fs::write(&src, b"x").unwrap();
        let ch = channel(&tmp, PermissionState::Granted, PlatformProfile::desktop());

        let res = ch
            .handle(MethodCall::new(
                "saveImage",
                json!({ "path": src.to_str().unwrap(), "title": "Receipt" }),
            ))
            .await;
        assert_eq!(res, MethodResult::Success { result: json!(true) });
    }

    #[tokio::test]
    async fn test_missing_path_is_arg() {
        let tmp = tempfile::tempdir().unwrap();
        let ch = channel(&tmp, PermissionState::Granted, PlatformProfile::desktop());
        for args in [json!({}), json!({ "path": 3 }), json!(null), json!({ "path": "" })] {
            let res = ch.handle(MethodCall::new("saveImage", args)).await;
            assert_eq!(
                res,
                MethodResult::Error {
                    code: "ARG".into(),
                    message: "Missing path".into(),
                    details: None
                }
            );
        }
    }

    #[tokio::test]
    async fn test_denied_is_perm() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("scan.jpg");
        std::fs::write(&src, b"x").unwrap();
        let ch = channel(&tmp, PermissionState::Denied, PlatformProfile::android(26));
        let res = ch
            .handle(MethodCall::new("saveImage", json!({ "path": src.to_str().unwrap() })))
            .await;
        assert!(matches!(res, MethodResult::Error { ref code, .. } if code == "PERM"));
    }

    #[tokio::test]
    async fn test_missing_file_is_err() {
        let tmp = tempfile::tempdir().unwrap();
        let ch = channel(&tmp, PermissionState::Granted, PlatformProfile::desktop());
        let res = ch
            .handle(MethodCall::new("saveImage", json!({ "path": "/definitely/not/here.jpg" })))
            .await;
        assert!(matches!(res, MethodResult::Error { ref code, .. } if code == "ERR"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let tmp = tempfile::tempdir().unwrap();
        let ch = channel(&tmp, PermissionState::Granted, PlatformProfile::desktop());
        assert_eq!(
            ch.handle(MethodCall::new("deleteImage", json!({}))).await,
            MethodResult::NotImplemented
        );
    }

    #[test]
    fn test_wire_format() {
        let call: MethodCall =
            serde_json::from_str(r#"{"method":"saveImage","arguments":{"path":"/a.png"}}"#).unwrap();
        assert_eq!(call.method, "saveImage");
        let err = serde_json::to_value(MethodResult::from(ImportError::Io("boom".into()))).unwrap();
        assert_eq!(
            err,
            json!({ "status": "error", "code": "ERR", "message": "boom", "details": null })
        );
        assert_eq!(
            serde_json::to_value(MethodResult::NotImplemented).unwrap(),
            json!({ "status": "notImplemented" })
        );
    }
}
