//! 页面处理上下文
//!
//! 封装"我正在识别第几页、共几页、是哪个文件"这一信息

use std::fmt::Display;

/// 页面处理上下文
#[derive(Debug, Clone)]
pub struct PageCtx {
    /// 页码（从1开始）
    pub page_index: usize,

    /// 总页数
    pub total_pages: usize,

    /// 图片文件名
    pub file_name: String,
}

impl PageCtx {
    /// 创建新的页面上下文
    pub fn new(page_index: usize, total_pages: usize, file_name: impl Into<String>) -> Self {
        Self {
            page_index,
            total_pages,
            file_name: file_name.into(),
        }
    }
}

impl Display for PageCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[第 {}/{} 页 {}]",
            self.page_index, self.total_pages, self.file_name
        )
    }
}
