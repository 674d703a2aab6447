//! 扫描批次处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次运行的完整调度。
//!
//! ## 核心功能
//!
//! 1. **扫描目录**：收集所有图片，没有图片直接失败
//! 2. **完整模式**：排序 → 重命名 → 生成 PDF → OCR
//! 3. **OCR 模式**：假定图片已排好序并重命名，直接 OCR
//! 4. **全局统计**：输出页数和 OCR 结果

use crate::config::{Config, RunMode};
use crate::error::ScanError;
use crate::models::{discover_images, ScanFile};
use crate::services::confirm::{confirmer_for, Confirmer};
use crate::services::ocr_service::{OcrService, TextExtractor};
use crate::services::pdf_assembler::{write_document, DocumentAssembler, PdfAssembler};
use crate::services::{rename_files, reorder};
use crate::utils::logging::{log_images_found, log_reordered, log_startup, print_final_stats};
use crate::workflow::{ExtractionFlow, ExtractionOutcome, SkipReason};
use std::path::PathBuf;
use tracing::{error, info};

/// 一次运行的结果
#[derive(Debug)]
pub struct RunSummary {
    /// 最终页序
    pub pages: Vec<ScanFile>,
    /// OCR 结果
    pub extraction: ExtractionOutcome,
}

/// 应用主结构
pub struct App<E = OcrService> {
    config: Config,
    extraction: ExtractionFlow<E>,
    assembler: Box<dyn DocumentAssembler>,
}

impl App<OcrService> {
    /// 初始化应用：OpenAI OCR + lopdf PDF，终端在场时交互确认
    pub fn initialize(config: Config) -> Self {
        let extractor = OcrService::new(&config);
        if config.has_credentials() {
            info!("🤖 OCR 模型: {}", extractor.model_name());
        }
        let confirmer = confirmer_for(config.assume_yes);
        Self::with_services(config, extractor, confirmer, Box::new(PdfAssembler))
    }
}

impl<E: TextExtractor> App<E> {
    /// 使用自定义能力创建应用
    pub fn with_services(
        config: Config,
        extractor: E,
        confirmer: Box<dyn Confirmer>,
        assembler: Box<dyn DocumentAssembler>,
    ) -> Self {
        let extraction = ExtractionFlow::new(&config, extractor, confirmer);
        Self {
            config,
            extraction,
            assembler,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary, ScanError> {
        log_startup(&self.config);

        // 加载所有图片
        info!("\n📁 正在扫描图片...");
        let images = discover_images(&self.config.data_dir).await?;
        if images.is_empty() {
            error!("❌ 没有找到图片文件: {}", self.config.data_dir.display());
            return Err(ScanError::NoImages {
                dir: self.config.data_dir.clone(),
            });
        }
        log_images_found(images.len());

        let pages = match self.config.mode {
            RunMode::Full => self.prepare_document(images).await?,
            RunMode::OcrOnly => images,
        };

        let extraction = self
            .extraction
            .run(&self.config.data_dir, &pages, &self.config.filename)
            .await?;

        print_final_stats(pages.len(), &describe(&extraction));

        Ok(RunSummary { pages, extraction })
    }

    /// 排序 → 重命名 → 生成 PDF
    async fn prepare_document(&self, images: Vec<ScanFile>) -> Result<Vec<ScanFile>, ScanError> {
        let ordered = reorder(&images);
        log_reordered(&ordered.iter().map(|f| f.name.clone()).collect::<Vec<_>>());

        let renamed = rename_files(&self.config.data_dir, &ordered, &self.config.filename).await?;

        let image_paths: Vec<PathBuf> = renamed
            .iter()
            .map(|f| self.config.data_dir.join(&f.name))
            .collect();
        let pdf_path = self.config.pdf_path();
        write_document(self.assembler.as_ref(), &image_paths, &pdf_path).await?;
        info!("✓ 已生成 PDF: {}", pdf_path.display());

        Ok(renamed)
    }
}

fn describe(outcome: &ExtractionOutcome) -> String {
    match outcome {
        ExtractionOutcome::Completed(report) => format!(
            "完成 {} 页，请求 {} 次，退避等待 {:?}",
            report.pages, report.attempts, report.backoff
        ),
        ExtractionOutcome::Skipped(SkipReason::MissingCredentials) => "已跳过（未设置 API key）".to_string(),
        ExtractionOutcome::Skipped(SkipReason::Declined) => "已跳过（操作者取消）".to_string(),
    }
}
