//! 扫描图片
//!
//! 目录中的一张扫描图片，只保存文件名和大小，不持有图片内容

use std::path::Path;

/// 支持的图片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// 根据扩展名判断图片类型（不区分大小写）
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    /// 传输时使用的 MIME 类型
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }
}

/// 扫描图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFile {
    /// 文件名（含扩展名）
    pub name: String,
    /// 文件大小（字节）
    pub size: u64,
    /// 图片类型
    pub kind: ImageKind,
}

impl ScanFile {
    /// 文件名不在白名单内时返回 None
    pub fn new(name: impl Into<String>, size: u64) -> Option<Self> {
        let name = name.into();
        let kind = ImageKind::from_file_name(&name)?;
        Some(Self { name, size, kind })
    }

    /// 原始扩展名（带点，保留大小写）
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default()
    }

    /// 换一个文件名，大小和类型不变
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: self.size,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ImageKind::from_file_name("a.jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_file_name("a.JPEG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_file_name("scan.Png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_file_name("notes.txt"), None);
        assert_eq!(ImageKind::from_file_name("jpg"), None);
    }

    #[test]
    fn test_extension_keeps_case() {
        let file = ScanFile::new("IMG_0001.JPG", 10).unwrap();
        assert_eq!(file.extension(), ".JPG");
        assert_eq!(file.kind.mime_type(), "image/jpeg");
    }
}
