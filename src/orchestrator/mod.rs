//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 按运行模式串联各个能力，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (App：按模式调度)
//!     ↓
//! workflow::ExtractionFlow (逐页 OCR)
//!     ↓
//! services (能力层：排序 / 重命名 / PDF / OCR / 写结果)
//!     ↓
//! models (扫描图片 + 目录加载)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一数据流**：全程单线程顺序执行，一次只发一个请求
//! 2. **无副作用前置检查**：没有图片时在任何写操作之前失败
//! 3. **向下依赖**：编排层 → workflow → services → models

pub mod batch_processor;

pub use batch_processor::{App, RunSummary};
