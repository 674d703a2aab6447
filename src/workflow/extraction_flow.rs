//! OCR 处理流程 - 流程层
//!
//! 核心职责：按页序逐页识别，并把结果追加到 TEXT_CONTENT.md
//!
//! 流程顺序：
//! 1. 没有 API key → 跳过（不算失败）
//! 2. 预估 token，超过阈值时请求确认，拒绝 → 跳过
//! 3. 逐页：读取 → 编码 → 识别（限流时指数退避重试）→ 立即落盘
//!
//! 只有限流会重试，最多尝试 `max_attempts` 次，等待时间 1, 2, 4, 8 … 倍基准时间，无抖动。
//! 其他失败立即终止整个流程，已写入的页面保留在文件中。

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ExtractFailure, ExtractionError};
use crate::models::ScanFile;
use crate::services::confirm::Confirmer;
use crate::services::ocr_service::{PageImage, TextExtractor, OCR_PROMPT};
use crate::services::text_writer::TextWriter;
use crate::services::token_estimator::estimate_tokens;
use crate::utils::logging::truncate_text;
use crate::workflow::page_ctx::PageCtx;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 单页最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 第一次重试前的等待时间
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.backoff_base,
        }
    }

    /// 第 `attempt` 次失败后的等待时间（attempt 从 1 开始）
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// 跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 没有配置 API key
    MissingCredentials,
    /// 操作者拒绝继续
    Declined,
}

/// 识别统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    /// 完成的页数
    pub pages: usize,
    /// 所有页面的请求总次数
    pub attempts: u32,
    /// 退避等待的总时长
    pub backoff: Duration,
    /// 结果文件路径
    pub output: PathBuf,
}

/// 流程结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Completed(ExtractionReport),
    Skipped(SkipReason),
}

/// 单页识别结果
struct PageResult {
    text: String,
    attempts: u32,
    backoff: Duration,
}

/// OCR 处理流程
///
/// - 决定是否运行、何时重试、何时终止
/// - 识别能力和确认能力都由外部注入
pub struct ExtractionFlow<E> {
    extractor: E,
    confirmer: Box<dyn Confirmer>,
    policy: RetryPolicy,
    has_credentials: bool,
    confirm_threshold: u64,
}

impl<E: TextExtractor> ExtractionFlow<E> {
    /// 创建新的 OCR 处理流程
    pub fn new(config: &Config, extractor: E, confirmer: Box<dyn Confirmer>) -> Self {
        Self {
            extractor,
            confirmer,
            policy: RetryPolicy::from_config(config),
            has_credentials: config.has_credentials(),
            confirm_threshold: config.confirm_threshold,
        }
    }

    /// 对已排好序的页面执行 OCR
    ///
    /// # 参数
    /// - `data_dir`: 图片所在目录，结果文件也写在这里
    /// - `pages`: 按页序排列的图片
    /// - `title`: 结果文件标题
    pub async fn run(
        &self,
        data_dir: &Path,
        pages: &[ScanFile],
        title: &str,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        if !self.has_credentials {
            warn!("⚠️ 未设置 OPENAI_API_KEY，跳过 OCR");
            return Ok(ExtractionOutcome::Skipped(SkipReason::MissingCredentials));
        }

        let estimated = estimate_tokens(pages);
        info!("🧮 预估 OCR 消耗约 {} tokens（{} 页）", estimated, pages.len());

        if estimated >= self.confirm_threshold
            && !self
                .confirmer
                .confirm(estimated, pages.len())
                .map_err(ExtractionError::Confirm)?
        {
            warn!("⚠️ 已取消 OCR");
            return Ok(ExtractionOutcome::Skipped(SkipReason::Declined));
        }

        info!("🤖 开始 OCR，共 {} 页", pages.len());

        let mut writer = TextWriter::create(data_dir, title)?;
        let mut attempts = 0;
        let mut backoff = Duration::ZERO;

        for (index, file) in pages.iter().enumerate() {
            let ctx = PageCtx::new(index + 1, pages.len(), &file.name);

            let result = self.process_page(data_dir, file, &ctx).await?;
            writer.append_page(ctx.page_index, &result.text)?;

            attempts += result.attempts;
            backoff += result.backoff;
            info!("{} ✓ 识别完成", ctx);
        }

        let output = writer.finish()?;
        info!("✓ 已生成 {}", output.display());

        Ok(ExtractionOutcome::Completed(ExtractionReport {
            pages: pages.len(),
            attempts,
            backoff,
            output,
        }))
    }

    /// 识别单页（带重试）
    async fn process_page(
        &self,
        data_dir: &Path,
        file: &ScanFile,
        ctx: &PageCtx,
    ) -> Result<PageResult, ExtractionError> {
        let path = data_dir.join(&file.name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ExtractionError::ReadImage { path, source })?;
        let image = PageImage::encode(&file.name, file.kind, &bytes);

        let mut backoff = Duration::ZERO;
        let mut attempt = 1;

        loop {
            match self.extractor.extract(OCR_PROMPT, &image).await {
                Ok(text) => {
                    debug!("{} 识别结果: {}", ctx, truncate_text(&text, 60));
                    return Ok(PageResult {
                        text,
                        attempts: attempt,
                        backoff,
                    });
                }
                Err(ExtractFailure::RateLimited(message)) if attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        "{} 被限流，{:?} 后重试 ({}/{}): {}",
                        ctx, delay, attempt, self.policy.max_attempts, message
                    );
                    tokio::time::sleep(delay).await;
                    backoff += delay;
                    attempt += 1;
                }
                Err(ExtractFailure::RateLimited(message)) => {
                    return Err(ExtractionError::RateLimitExhausted {
                        page: ctx.page_index,
                        attempts: attempt,
                        message,
                    });
                }
                Err(ExtractFailure::Other(message)) => {
                    return Err(ExtractionError::Service {
                        page: ctx.page_index,
                        message,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::confirm::AssumeYes;
    use crate::services::text_writer::TEXT_CONTENT_FILE;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};
    use tokio_test::{assert_err, assert_ok};

    const BASE: Duration = Duration::from_millis(1);

    type Script = Box<dyn Fn(usize, &PageImage) -> Result<String, ExtractFailure> + Send + Sync>;

    /// 按调用序号返回预设结果，并记录每次调用
    struct StubExtractor {
        script: Script,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl StubExtractor {
        fn new(
            script: impl Fn(usize, &PageImage) -> Result<String, ExtractFailure> + Send + Sync + 'static,
        ) -> Self {
            Self {
                script: Box::new(script),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextExtractor for &StubExtractor {
        async fn extract(&self, prompt: &str, image: &PageImage) -> Result<String, ExtractFailure> {
            assert_eq!(prompt, OCR_PROMPT);
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.seen.lock().unwrap().push(image.file_name.clone());
            (self.script)(call, image)
        }
    }

    struct Decline;

    impl Confirmer for Decline {
        fn confirm(&self, _estimated_tokens: u64, _pages: usize) -> io::Result<bool> {
            Ok(false)
        }
    }

    struct NeverAsked;

    impl Confirmer for NeverAsked {
        fn confirm(&self, _estimated_tokens: u64, _pages: usize) -> io::Result<bool> {
            panic!("低于阈值时不应请求确认");
        }
    }

    fn test_config() -> Config {
        Config {
            filename: "doc".to_string(),
            openai_api_key: Some("sk-test".to_string()),
            backoff_base: BASE,
            confirm_threshold: u64::MAX,
            ..Config::default()
        }
    }

    fn pages(names: &[&str]) -> (TempDir, Vec<ScanFile>) {
        let dir = tempdir().unwrap();
        let files = names
            .iter()
            .map(|name| {
                std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
                ScanFile::new(*name, name.len() as u64).unwrap()
            })
            .collect();
        (dir, files)
    }

    fn rate_limited() -> ExtractFailure {
        ExtractFailure::RateLimited("429".to_string())
    }

    fn read_output(dir: &Path) -> String {
        std::fs::read_to_string(dir.join(TEXT_CONTENT_FILE)).unwrap()
    }

    #[test]
    fn test_retry_policy_delays_double() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=5).map(|n| policy.delay_after(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
    }

    #[tokio::test]
    async fn test_success_after_four_rate_limits() {
        let (dir, files) = pages(&["doc_001.jpg"]);
        let stub = StubExtractor::new(|call, _| {
            if call < 5 {
                Err(rate_limited())
            } else {
                Ok("recovered".to_string())
            }
        });
        let flow = ExtractionFlow::new(&test_config(), &stub, Box::new(AssumeYes));

        let outcome = assert_ok!(flow.run(dir.path(), &files, "doc").await);

        let ExtractionOutcome::Completed(report) = outcome else {
            panic!("应当完成识别");
        };
        assert_eq!(stub.calls(), 5);
        assert_eq!(report.attempts, 5);
        assert_eq!(report.backoff, BASE * (1 + 2 + 4 + 8));
        assert!(read_output(dir.path()).contains("recovered"));
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_fails_after_five_attempts() {
        let (dir, files) = pages(&["doc_001.jpg"]);
        let stub = StubExtractor::new(|_, _| Err(rate_limited()));
        let flow = ExtractionFlow::new(&test_config(), &stub, Box::new(AssumeYes));

        let err = assert_err!(flow.run(dir.path(), &files, "doc").await);

        assert!(matches!(
            err,
            ExtractionError::RateLimitExhausted {
                page: 1,
                attempts: 5,
                ..
            }
        ));
        assert_eq!(stub.calls(), 5);
    }

    #[tokio::test]
    async fn test_other_failure_is_not_retried() {
        let (dir, files) = pages(&["doc_001.jpg", "doc_002.jpg"]);
        let stub = StubExtractor::new(|_, _| Err(ExtractFailure::Other("invalid key".to_string())));
        let flow = ExtractionFlow::new(&test_config(), &stub, Box::new(AssumeYes));

        let err = flow.run(dir.path(), &files, "doc").await.unwrap_err();

        assert!(matches!(err, ExtractionError::Service { page: 1, .. }));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_pages_on_disk() {
        let (dir, files) = pages(&["doc_001.jpg", "doc_002.png", "doc_003.jpg"]);
        let stub = StubExtractor::new(|_, image| {
            if image.file_name == "doc_002.png" {
                Err(ExtractFailure::Other("boom".to_string()))
            } else {
                Ok(format!("text of {}", image.file_name))
            }
        });
        let flow = ExtractionFlow::new(&test_config(), &stub, Box::new(AssumeYes));

        assert!(flow.run(dir.path(), &files, "doc").await.is_err());

        let content = read_output(dir.path());
        assert!(content.starts_with("# doc\n\n## Page 1\n\ntext of doc_001.jpg"));
        assert!(!content.contains("## Page 2"));
        assert!(!content.contains("## Page 3"));
        assert!(!content.contains("doc_003.jpg"));
    }

    #[tokio::test]
    async fn test_pages_are_sent_in_order_with_mime_type() {
        let (dir, files) = pages(&["doc_001.jpg", "doc_002.png", "doc_003.JPEG"]);
        let stub = StubExtractor::new(|_, image| Ok(image.mime_type.to_string()));
        let flow = ExtractionFlow::new(&test_config(), &stub, Box::new(AssumeYes));

        let outcome = flow.run(dir.path(), &files, "doc").await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Completed(ExtractionReport { pages: 3, attempts: 3, .. })));

        assert_eq!(
            *stub.seen.lock().unwrap(),
            vec!["doc_001.jpg", "doc_002.png", "doc_003.JPEG"]
        );
        assert_eq!(
            read_output(dir.path()),
            "# doc\n\n## Page 1\n\nimage/jpeg\n\n---\n\n## Page 2\n\nimage/png\n\n---\n\n## Page 3\n\nimage/jpeg\n"
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_skips_without_calls() {
        let (dir, files) = pages(&["doc_001.jpg"]);
        let stub = StubExtractor::new(|_, _| Ok("unused".to_string()));
        let config = Config {
            openai_api_key: None,
            ..test_config()
        };
        let flow = ExtractionFlow::new(&config, &stub, Box::new(AssumeYes));

        let outcome = flow.run(dir.path(), &files, "doc").await.unwrap();

        assert_eq!(outcome, ExtractionOutcome::Skipped(SkipReason::MissingCredentials));
        assert_eq!(stub.calls(), 0);
        assert!(!dir.path().join(TEXT_CONTENT_FILE).exists());
    }

    #[tokio::test]
    async fn test_declined_confirmation_skips_without_calls() {
        let (dir, files) = pages(&["doc_001.jpg"]);
        let stub = StubExtractor::new(|_, _| Ok("unused".to_string()));
        let config = Config {
            confirm_threshold: 0,
            ..test_config()
        };
        let flow = ExtractionFlow::new(&config, &stub, Box::new(Decline));

        let outcome = flow.run(dir.path(), &files, "doc").await.unwrap();

        assert_eq!(outcome, ExtractionOutcome::Skipped(SkipReason::Declined));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_small_estimate_does_not_ask() {
        let (dir, files) = pages(&["doc_001.jpg"]);
        let stub = StubExtractor::new(|_, _| Ok("fine".to_string()));
        let flow = ExtractionFlow::new(&test_config(), &stub, Box::new(NeverAsked));

        let outcome = flow.run(dir.path(), &files, "doc").await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_missing_image_file_is_reported() {
        let dir = tempdir().unwrap();
        let files = vec![ScanFile::new("ghost.jpg", 10).unwrap()];
        let stub = StubExtractor::new(|_, _| Ok("unused".to_string()));
        let flow = ExtractionFlow::new(&test_config(), &stub, Box::new(AssumeYes));

        let err = flow.run(dir.path(), &files, "doc").await.unwrap_err();
        assert!(matches!(err, ExtractionError::ReadImage { .. }));
        assert_eq!(stub.calls(), 0);
    }
}
