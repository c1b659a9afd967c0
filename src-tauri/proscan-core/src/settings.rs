use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::capability::PlatformProfile;

pub const DEFAULT_ALBUM_NAME: &str = "ProScan";
pub const DEFAULT_TITLE: &str = "Image";
/// 应用配置目录下的设置文件名（未提供 `plugins.gallery` 配置时使用）
pub const SETTINGS_FILE_NAME: &str = "gallery.json";

fn atomic_replace_file(tmp: &Path, dest: &Path) -> Result<(), String> {
    if !tmp.exists() {
        return Err(format!(
            "Failed to replace settings file: temporary file does not exist: {}",
            tmp.display()
        ));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create destination directory: {}", e))?;
    }
    fs::rename(tmp, dest).map_err(|e| format!("Failed to replace settings file: {}", e))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GallerySettings {
    /// 公共图片目录下的相册文件夹名
    pub album_name: String,
    /// 覆盖系统图片目录（None 时用 dirs::picture_dir）
    pub pictures_dir: Option<PathBuf>,
    /// 请求未带 title 时的显示标题
    pub default_title: String,
    /// 导入前用 infer 校验文件头，不是图片则返回 false（不报错）
    pub verify_image_content: bool,
    /// 覆盖启动时探测到的平台（Android 由宿主填入真实 API level）
    pub platform: Option<PlatformProfile>,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            album_name: DEFAULT_ALBUM_NAME.to_string(),
            pictures_dir: None,
            default_title: DEFAULT_TITLE.to_string(),
            verify_image_content: false,
            platform: None,
        }
    }
}

impl GallerySettings {
    /// 从 JSON 文件加载；文件不存在时返回默认值。
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse settings: {}", e))
    }

    /// 加载设置文件；首次启动时写入一份默认值，便于用户在原处修改。
    pub fn load_or_init(path: &Path) -> Result<Self, String> {
        if path.exists() {
            return Self::load(path);
        }
        let settings = Self::default();
        settings.save(path)?;
        Ok(settings)
    }

    /// 先写临时文件再替换，避免写一半的配置。
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        let tmp = path.with_extension("json.tmp");
        if let Some(parent) = tmp.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }
        fs::write(&tmp, content).map_err(|e| format!("Failed to write settings: {}", e))?;
        atomic_replace_file(&tmp, path)
    }

    pub fn pictures_dir(&self) -> PathBuf {
        if let Some(dir) = &self.pictures_dir {
            return dir.clone();
        }
        dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
            .unwrap_or_else(|| PathBuf::from("Pictures"))
    }

    /// 媒体库根目录（相对路径以图片目录名开头，所以根为其上一级）。
    pub fn media_root(&self) -> PathBuf {
        let pictures = self.pictures_dir();
        pictures
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or(pictures)
    }

    /// 媒体库 RELATIVE_PATH：`Pictures/<相册名>`
    pub fn relative_path(&self) -> String {
        let pictures = self.pictures_dir();
        let base = pictures
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Pictures");
        format!("{}/{}", base, self.album_name)
    }

    pub fn platform(&self) -> PlatformProfile {
        self.platform.unwrap_or_else(PlatformProfile::probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = GallerySettings::default();
        assert_eq!(s.album_name, "ProScan");
        assert_eq!(s.default_title, "Image");
        assert!(!s.verify_image_content);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let s = GallerySettings::load(&tmp.path().join("gallery.json")).unwrap();
        assert_eq!(s, GallerySettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("conf").join("gallery.json");
        let s = GallerySettings {
            album_name: "Scans".to_string(),
            pictures_dir: Some(tmp.path().join("Pictures")),
            platform: Some(PlatformProfile::android(28)),
            ..Default::default()
        };
        s.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(GallerySettings::load(&path).unwrap(), s);
    }

    #[test]
    fn test_load_or_init_writes_defaults_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config").join(SETTINGS_FILE_NAME);

        let first = GallerySettings::load_or_init(&path).unwrap();
        assert_eq!(first, GallerySettings::default());
        assert!(path.exists());

        // 用户改过的文件不会被覆盖
        std::fs::write(&path, r#"{"albumName":"Receipts","verifyImageContent":true}"#).unwrap();
        let edited = GallerySettings::load_or_init(&path).unwrap();
        assert_eq!(edited.album_name, "Receipts");
        assert!(edited.verify_image_content);
    }

    #[test]
    fn test_load_or_init_rejects_broken_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(GallerySettings::load_or_init(&path).is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: GallerySettings = serde_json::from_str(r#"{"albumName":"Docs"}"#).unwrap();
        assert_eq!(s.album_name, "Docs");
        assert_eq!(s.default_title, "Image");
    }

    #[test]
    fn test_paths() {
        let s = GallerySettings {
            pictures_dir: Some(PathBuf::from("/sdcard/Pictures")),
            ..Default::default()
        };
        assert_eq!(s.relative_path(), "Pictures/ProScan");
        assert_eq!(s.media_root(), PathBuf::from("/sdcard"));
    }
}
