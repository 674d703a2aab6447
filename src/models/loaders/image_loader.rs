use crate::error::ScanError;
use crate::models::scan_file::ScanFile;
use std::path::Path;
use tokio::fs;

/// 扫描目录，收集所有图片并按文件名排序
///
/// 只看扩展名白名单，不进入子目录
pub async fn discover_images(dir: &Path) -> Result<Vec<ScanFile>, ScanError> {
    let read_dir_err = |source| ScanError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(read_dir_err)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        let metadata = entry.metadata().await.map_err(read_dir_err)?;
        if !metadata.is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!("跳过非 UTF-8 文件名: {:?}", entry.file_name());
            continue;
        };

        if let Some(file) = ScanFile::new(name, metadata.len()) {
            files.push(file);
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_discover_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.png", "a.JPG", "c.jpeg", "notes.txt", "TEXT_CONTENT.md"] {
            std::fs::write(dir.path().join(name), b"xx").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.png")).unwrap();

        let files = discover_images(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.jpeg"]);
        assert!(files.iter().all(|f| f.size == 2));
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = discover_images(&dir.path().join("missing")).await;
        assert!(matches!(result, Err(ScanError::ReadDir { .. })));
    }
}
