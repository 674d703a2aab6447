//! Token 预估
//!
//! 只根据文件大小粗略估算，不发任何请求。结果仅用于提示操作者确认，
//! 不会据此限流或拒绝运行，也不等于实际计费。

use crate::models::ScanFile;

/// base64 编码后的膨胀比例（×100）
const BASE64_INFLATION_PERCENT: u64 = 137;
/// 每个 token 约等于多少字符
const CHARS_PER_TOKEN: u64 = 4;
/// 每页的固定开销（提示词和回复）
const PER_PAGE_OVERHEAD: u64 = 200;

/// 预估单页 token 数
pub fn estimate_page_tokens(size: u64) -> u64 {
    let encoded_chars = (size.saturating_mul(BASE64_INFLATION_PERCENT)).div_ceil(100);
    encoded_chars.div_ceil(CHARS_PER_TOKEN) + PER_PAGE_OVERHEAD
}

/// 预估所有页面的 token 总数
pub fn estimate_tokens(files: &[ScanFile]) -> u64 {
    files
        .iter()
        .map(|f| estimate_page_tokens(f.size))
        .fold(0u64, u64::saturating_add)
}
