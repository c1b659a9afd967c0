//! 源路径解析：`file://` URI 解码为本地路径，普通路径原样使用。

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{ImportError, Result};

const FILE_SCHEME_PREFIX: &str = "file://";

/// 将请求中的 path 解析为本地文件路径。空串或纯空白视为缺少 path；
/// 其余情况原样使用，文件名首尾的空格属于文件名本身。
pub fn resolve_source_path(raw: &str) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        return Err(ImportError::missing_path());
    }
    if !raw.starts_with(FILE_SCHEME_PREFIX) {
        return Ok(PathBuf::from(raw));
    }
    let url = Url::parse(raw)
        .map_err(|e| ImportError::InvalidArgument(format!("Invalid file URI {}: {}", raw, e)))?;
    url.to_file_path()
        .map_err(|_| ImportError::InvalidArgument(format!("Invalid file URI: {}", raw)))
}

/// 确认源文件存在且为普通文件；缺失一律按 io 错误处理。
pub fn ensure_source_file(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(ImportError::Io(format!(
            "Source is not a file: {}",
            path.display()
        ))),
        Err(e) => Err(ImportError::Io(format!(
            "Source file not found: {} ({})",
            path.display(),
            e
        ))),
    }
}

/// 源文件的文件名，作为图库条目的显示名。
pub fn display_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ImportError::InvalidArgument(format!("Path has no file name: {}", path.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        assert_eq!(
            resolve_source_path("/tmp/scan.jpg").unwrap(),
            PathBuf::from("/tmp/scan.jpg")
        );
    }

    #[test]
    fn test_empty_is_missing() {
        assert_eq!(resolve_source_path(""), Err(ImportError::missing_path()));
        assert_eq!(resolve_source_path("   "), Err(ImportError::missing_path()));
    }

    #[test]
    fn test_surrounding_spaces_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("scan.jpg ");
        std::fs::write(&f, b"x").unwrap();
        let raw = f.to_string_lossy().to_string();
        let resolved = resolve_source_path(&raw).unwrap();
        assert_eq!(resolved, f);
        assert!(ensure_source_file(&resolved).is_ok());
        assert_eq!(display_name_of(&resolved).unwrap(), "scan.jpg ");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_uri_is_decoded() {
        assert_eq!(
            resolve_source_path("file:///tmp/scan.jpg").unwrap(),
            PathBuf::from("/tmp/scan.jpg")
        );
        assert_eq!(
            resolve_source_path("file:///tmp/my%20scan.jpg").unwrap(),
            PathBuf::from("/tmp/my scan.jpg")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_file_uri_with_remote_host_rejected() {
        let err = resolve_source_path("file://server/share/a.jpg").unwrap_err();
        assert_eq!(err.code(), "ARG");
    }

    #[test]
    fn test_ensure_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("a.jpg");
        std::fs::write(&f, b"x").unwrap();
        assert!(ensure_source_file(&f).is_ok());
        assert_eq!(ensure_source_file(dir.path()).unwrap_err().code(), "ERR");
        assert_eq!(
            ensure_source_file(&dir.path().join("nope.jpg")).unwrap_err().code(),
            "ERR"
        );
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name_of(Path::new("/tmp/scan.jpg")).unwrap(), "scan.jpg");
    }
}
