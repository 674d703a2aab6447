use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum ScanError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 目录中没有可处理的图片
    #[error("目录 {} 中没有找到图片文件", dir.display())]
    NoImages { dir: PathBuf },
    /// 读取目录失败
    #[error("无法读取目录 {}: {source}", dir.display())]
    ReadDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    /// 重命名错误
    #[error("重命名错误: {0}")]
    Rename(#[from] RenameError),
    /// PDF 生成错误
    #[error("PDF 生成错误: {0}")]
    Assembly(#[from] AssemblyError),
    /// OCR 错误
    #[error("OCR 错误: {0}")]
    Extraction(#[from] ExtractionError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// FILENAME 未设置或为空
    #[error("环境变量 FILENAME 未设置")]
    MissingFilename,
    /// FILENAME 含有路径分隔符
    #[error("FILENAME 不能包含路径分隔符: '{value}'")]
    InvalidFilename { value: String },
}

/// 重命名错误
///
/// 任何一步失败都不回滚，临时目录保留供人工检查
#[derive(Debug, Error)]
pub enum RenameError {
    /// 上次运行遗留的临时目录
    #[error("临时目录已存在，可能是上次重命名中断遗留: {}", path.display())]
    StagingExists { path: PathBuf },
    /// 创建临时目录失败
    #[error("无法创建临时目录 {}: {source}", path.display())]
    CreateStaging {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 移入临时目录失败
    #[error("无法移动 {} → {}: {source}", from.display(), to.display())]
    Stage {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// 目标文件已存在
    #[error("目标文件已存在，拒绝覆盖: {}", path.display())]
    TargetExists { path: PathBuf },
    /// 移回数据目录失败
    #[error("无法移回 {} → {}: {source}", from.display(), to.display())]
    Restore {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// 删除临时目录失败
    #[error("无法删除临时目录 {}: {source}", path.display())]
    RemoveStaging {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// PDF 生成错误
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// 没有输入图片
    #[error("没有可写入 PDF 的图片")]
    Empty,
    /// 读取图片失败
    #[error("读取图片失败 ({}): {source}", path.display())]
    ReadImage {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 解码图片失败
    #[error("无法解码图片 ({}): {source}", path.display())]
    DecodeImage {
        path: PathBuf,
        source: image::ImageError,
    },
    /// lopdf 错误
    #[error("PDF 编码失败: {0}")]
    Pdf(#[from] lopdf::Error),
    /// 写入 PDF 失败
    #[error("写入 PDF 失败 ({}): {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// OCR 服务边界上的失败类型
///
/// 在适配层完成分类，重试逻辑只看变体，不解析错误信息
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractFailure {
    /// 请求频率限制，可重试
    #[error("请求频率限制: {0}")]
    RateLimited(String),
    /// 其他失败，不可重试
    #[error("{0}")]
    Other(String),
}

/// OCR 流程错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 重试次数用尽后仍被限流
    #[error("第 {page} 页在 {attempts} 次尝试后仍被限流: {message}")]
    RateLimitExhausted {
        page: usize,
        attempts: u32,
        message: String,
    },
    /// 不可重试的服务错误
    #[error("第 {page} 页识别失败: {message}")]
    Service { page: usize, message: String },
    /// 读取图片失败
    #[error("读取图片失败 ({}): {source}", path.display())]
    ReadImage {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 写入结果文件失败
    #[error("写入结果文件失败 ({}): {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 读取确认输入失败
    #[error("读取确认输入失败: {0}")]
    Confirm(std::io::Error),
}

/// 应用程序结果类型
pub type Result<T, E = ScanError> = std::result::Result<T, E>;
