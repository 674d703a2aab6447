//! 识别结果写入服务 - 业务能力层
//!
//! 只负责"写 TEXT_CONTENT.md"能力：先写标题，之后每识别完一页就追加一段并落盘，
//! 中途失败时已完成的页面仍然保留在文件里。

use crate::error::ExtractionError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 识别结果文件名（固定，不随 FILENAME 变化）
pub const TEXT_CONTENT_FILE: &str = "TEXT_CONTENT.md";

/// 页面之间的分隔符
const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// 识别结果写入服务
pub struct TextWriter {
    path: PathBuf,
    file: File,
    sections: usize,
}

impl TextWriter {
    /// 创建（或覆盖）结果文件并写入标题
    pub fn create(data_dir: &Path, title: &str) -> Result<Self, ExtractionError> {
        let path = data_dir.join(TEXT_CONTENT_FILE);
        let file = File::create(&path).map_err(|source| ExtractionError::Persist {
            path: path.clone(),
            source,
        })?;

        let mut writer = Self {
            path,
            file,
            sections: 0,
        };
        writer.write_synced(&format!("# {}\n\n", title))?;
        Ok(writer)
    }

    /// 追加一页识别结果
    ///
    /// # 参数
    /// - `page_index`: 页码（从 1 开始）
    /// - `text`: 识别出的文本
    pub fn append_page(&mut self, page_index: usize, text: &str) -> Result<(), ExtractionError> {
        debug!("写入第 {} 页，长度: {} 字符", page_index, text.len());

        let separator = if self.sections == 0 { "" } else { SECTION_SEPARATOR };
        let section = format!("{}## Page {}\n\n{}", separator, page_index, text);
        self.write_synced(&section)?;
        self.sections += 1;
        Ok(())
    }

    /// 写入结尾换行
    pub fn finish(mut self) -> Result<PathBuf, ExtractionError> {
        self.write_synced("\n")?;
        Ok(self.path)
    }

    /// 已写入的页数
    pub fn sections(&self) -> usize {
        self.sections
    }

    fn write_synced(&mut self, content: &str) -> Result<(), ExtractionError> {
        self.file
            .write_all(content.as_bytes())
            .and_then(|_| self.file.sync_data())
            .map_err(|source| ExtractionError::Persist {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_document_layout() {
        let dir = tempdir().unwrap();
        let mut writer = TextWriter::create(dir.path(), "report").unwrap();
        writer.append_page(1, "first page").unwrap();
        writer.append_page(2, "second page").unwrap();
        assert_eq!(writer.sections(), 2);
        let path = writer.finish().unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "# report\n\n## Page 1\n\nfirst page\n\n---\n\n## Page 2\n\nsecond page\n"
        );
    }

    #[test]
    fn test_each_page_is_on_disk_before_finish() {
        let dir = tempdir().unwrap();
        let mut writer = TextWriter::create(dir.path(), "doc").unwrap();
        writer.append_page(1, "hello").unwrap();

        let content = std::fs::read_to_string(dir.path().join(TEXT_CONTENT_FILE)).unwrap();
        assert_eq!(content, "# doc\n\n## Page 1\n\nhello");
    }

    #[test]
    fn test_create_overwrites_previous_run() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(TEXT_CONTENT_FILE), "stale content").unwrap();

        let writer = TextWriter::create(dir.path(), "fresh").unwrap();
        writer.finish().unwrap();

        let content = std::fs::read_to_string(dir.path().join(TEXT_CONTENT_FILE)).unwrap();
        assert_eq!(content, "# fresh\n\n\n");
    }
}
