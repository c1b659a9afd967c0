use proscan_core::ImportError;
use serde::{ser::SerializeStruct, Serialize, Serializer};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error(transparent)]
  Import(#[from] ImportError),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("{0}")]
  Setup(String),
  #[cfg(mobile)]
  #[error(transparent)]
  PluginInvoke(#[from] tauri::plugin::mobile::PluginInvokeError),
}

impl Error {
  /// 与方法通道一致的错误码：ARG / PERM / ERR
  pub fn code(&self) -> &'static str {
    match self {
      Error::Import(e) => e.code(),
      _ => "ERR",
    }
  }
}

/// 前端收到 `{ code, message }`
impl Serialize for Error {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let mut s = serializer.serialize_struct("Error", 2)?;
    s.serialize_field("code", self.code())?;
    s.serialize_field("message", &self.to_string())?;
    s.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_serialized_shape() {
    let e = Error::from(ImportError::PermissionDenied("Storage permission denied".into()));
    assert_eq!(
      serde_json::to_value(&e).unwrap(),
      serde_json::json!({ "code": "PERM", "message": "Storage permission denied" })
    );
    let e = Error::Setup("boom".into());
    assert_eq!(serde_json::to_value(&e).unwrap()["code"], "ERR");
  }
}
