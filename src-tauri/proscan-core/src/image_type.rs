//! 扩展名到 MIME 的判定。只看后缀，不嗅探内容：`.png` 为 PNG，其余一律按 JPEG 处理。
//! 内容校验（可选）单独走 `looks_like_image`，不影响 MIME 标记。

use std::path::Path;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

/// 媒体库接受的图片 MIME（infer 嗅探结果必须落在该集合内才算图片）。
const IMAGE_MIMES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/heif",
    "image/avif",
];

/// 根据路径后缀决定 MIME（大小写不敏感）。
pub fn mime_for_path(path: &Path) -> &'static str {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(false);
    if is_png {
        MIME_PNG
    } else {
        MIME_JPEG
    }
}

/// 用 infer 检查文件头是否为受支持的图片。读不到文件视为 false。
pub fn looks_like_image(path: &Path) -> bool {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => {
            let mime = kind.mime_type().to_lowercase();
            IMAGE_MIMES.contains(&mime.as_str())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_png_suffix() {
        assert_eq!(mime_for_path(Path::new("/tmp/a.png")), MIME_PNG);
        assert_eq!(mime_for_path(Path::new("/tmp/A.PNG")), MIME_PNG);
    }

    #[test]
    fn test_everything_else_is_jpeg() {
        assert_eq!(mime_for_path(Path::new("/tmp/a.jpg")), MIME_JPEG);
        assert_eq!(mime_for_path(Path::new("/tmp/a.webp")), MIME_JPEG);
        assert_eq!(mime_for_path(Path::new("/tmp/noext")), MIME_JPEG);
        assert_eq!(mime_for_path(Path::new("/tmp/png")), MIME_JPEG);
    }

    #[test]
    fn test_looks_like_image() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("x.bin");
        let mut f = std::fs::File::create(&png).unwrap();
        f.write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0])
            .unwrap();
        assert!(looks_like_image(&png));

        let txt = dir.path().join("y.png");
        std::fs::write(&txt, b"just text").unwrap();
        assert!(!looks_like_image(&txt));
        assert!(!looks_like_image(&dir.path().join("missing.png")));
    }
}
