//! # Scan Reorder
//!
//! 还原双面扫描的页序，重命名、生成 PDF，并可选地逐页 OCR
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 扫描图片（`ScanFile`）以及目录扫描
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，互不依赖
//! - `page_orderer` - 还原页序（纯函数）
//! - `batch_renamer` - 经临时目录批量重命名
//! - `token_estimator` - 预估 OCR 消耗
//! - `ocr_service` - 识别单页文字（async-openai）
//! - `pdf_assembler` - 合成 PDF（lopdf）
//! - `text_writer` - 逐页追加写 TEXT_CONTENT.md
//! - `confirm` - OCR 前的人工确认
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次 OCR"的完整流程
//! - `PageCtx` - 上下文封装（页码 + 文件名）
//! - `ExtractionFlow` - 流程编排（预估 → 确认 → 逐页识别 → 重试 → 落盘）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 按运行模式串联以上各层
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, RunMode};
pub use error::{ExtractFailure, ExtractionError, Result, ScanError};
pub use models::{ImageKind, ScanFile};
pub use orchestrator::{App, RunSummary};
pub use workflow::{ExtractionFlow, ExtractionOutcome, ExtractionReport, PageCtx, SkipReason};
