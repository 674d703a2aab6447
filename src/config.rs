use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// 运行模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// 排序 → 重命名 → 生成 PDF → OCR
    Full,
    /// 只对已排好序的图片做 OCR
    OcrOnly,
}

impl RunMode {
    /// 解析 MODE 环境变量，无法识别的值返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "full" => Some(RunMode::Full),
            "ocr" | "ocr-only" => Some(RunMode::OcrOnly),
            _ => None,
        }
    }
}

/// 程序配置
///
/// 启动时构建一次，之后只以引用的形式传给各个组件
#[derive(Clone, Debug)]
pub struct Config {
    /// 扫描图片所在目录
    pub data_dir: PathBuf,
    /// 输出文件的基础名称
    pub filename: String,
    /// 运行模式
    pub mode: RunMode,
    /// MODE 变量无法识别时保存原值，用于启动时告警
    pub unknown_mode: Option<String>,
    // --- OCR 配置 ---
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub openai_model: String,
    /// 单页最大尝试次数
    pub max_attempts: u32,
    /// 退避的起始等待时间，之后每次翻倍
    pub backoff_base: Duration,
    /// 预估 token 数达到该值时需要人工确认
    pub confirm_threshold: u64,
    /// 跳过交互式确认
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/data"),
            filename: String::new(),
            mode: RunMode::Full,
            unknown_mode: None,
            openai_api_key: None,
            openai_api_base: None,
            openai_model: "gpt-4o-mini".to_string(),
            max_attempts: 5,
            backoff_base: Duration::from_secs(1),
            confirm_threshold: 1_000,
            assume_yes: false,
        }
    }
}

impl Config {
    /// 从进程环境变量读取配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置（测试中传入 HashMap）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let filename = non_blank("FILENAME").ok_or(ConfigError::MissingFilename)?;
        if filename.contains('/') || filename.contains('\\') {
            return Err(ConfigError::InvalidFilename { value: filename });
        }

        let raw_mode = non_blank("MODE").unwrap_or_default();
        let (mode, unknown_mode) = match RunMode::parse(&raw_mode) {
            Some(mode) => (mode, None),
            None => (RunMode::Full, Some(raw_mode)),
        };

        Ok(Self {
            data_dir: non_blank("DATA_DIR").map(PathBuf::from).unwrap_or(default.data_dir),
            filename,
            mode,
            unknown_mode,
            openai_api_key: non_blank("OPENAI_API_KEY"),
            openai_api_base: non_blank("OPENAI_API_BASE"),
            openai_model: non_blank("OPENAI_MODEL").unwrap_or(default.openai_model),
            max_attempts: non_blank("OCR_MAX_ATTEMPTS").and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.max_attempts),
            backoff_base: non_blank("OCR_BACKOFF_BASE_MS").and_then(|v| v.parse().ok()).map(Duration::from_millis).unwrap_or(default.backoff_base),
            confirm_threshold: non_blank("OCR_CONFIRM_THRESHOLD").and_then(|v| v.parse().ok()).unwrap_or(default.confirm_threshold),
            assume_yes: non_blank("OCR_ASSUME_YES").and_then(|v| v.parse().ok()).unwrap_or(default.assume_yes),
        })
    }

    /// 是否配置了 OCR 凭证
    pub fn has_credentials(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// PDF 输出路径
    pub fn pdf_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.pdf", self.filename))
    }
}
