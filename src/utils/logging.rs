/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use crate::config::{Config, RunMode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 日志级别读取 `RUST_LOG`，默认 `info`；重复调用不会报错
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    let mode = match config.mode {
        RunMode::Full => "完整流程（排序 → 重命名 → PDF → OCR）",
        RunMode::OcrOnly => "仅 OCR",
    };

    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("📁 数据目录: {}", config.data_dir.display());
    info!("📄 文件名: {}", config.filename);
    info!("{}", "=".repeat(60));

    if let Some(raw) = &config.unknown_mode {
        warn!("⚠️ 无法识别的 MODE '{}'，按完整流程处理", raw);
    }
}

/// 记录图片扫描结果
pub fn log_images_found(total: usize) {
    info!("✓ 找到 {} 张图片", total);
}

/// 记录排序结果
pub fn log_reordered(names: &[String]) {
    info!("🔀 重排后的顺序: {}", names.join(", "));
}

/// 打印最终统计信息
///
/// # 参数
/// - `pages`: 处理的页数
/// - `ocr_summary`: OCR 结果描述
pub fn print_final_stats(pages: usize, ocr_summary: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 页数: {}", pages);
    info!("🤖 OCR: {}", ocr_summary);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("第一页的内容很长", 3), "第一页...");
    }
}
