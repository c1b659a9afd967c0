//! 导入失败的三类错误，与桥接层错误码一一对应。

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// 缺少 / 无法使用的 path（调用方错误，不会尝试导入）
    #[error("{0}")]
    InvalidArgument(String),
    /// 用户拒绝或系统拒绝了写入权限
    #[error("{0}")]
    PermissionDenied(String),
    /// 源文件缺失、读写失败、媒体库拒绝
    #[error("{0}")]
    Io(String),
}

impl ImportError {
    pub fn missing_path() -> Self {
        Self::InvalidArgument("Missing path".to_string())
    }

    /// 桥接层错误码：ARG / PERM / ERR
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::InvalidArgument(_) => "ARG",
            ImportError::PermissionDenied(_) => "PERM",
            ImportError::Io(_) => "ERR",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ImportError::InvalidArgument(m)
            | ImportError::PermissionDenied(m)
            | ImportError::Io(m) => m,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Io(e.to_string())
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(e: rusqlite::Error) -> Self {
        ImportError::Io(format!("Media store error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ImportError::missing_path().code(), "ARG");
        assert_eq!(ImportError::PermissionDenied("x".into()).code(), "PERM");
        assert_eq!(ImportError::Io("x".into()).code(), "ERR");
        assert_eq!(ImportError::missing_path().message(), "Missing path");
    }

    #[test]
    fn test_io_error_maps_to_err() {
        let e: ImportError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(e.code(), "ERR");
        assert!(e.to_string().contains("gone"));
    }
}
