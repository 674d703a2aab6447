//! OCR 前的人工确认
//!
//! 读终端属于 I/O 副作用，抽成 trait 注入到流程里，测试时换成固定答案

use std::io::{self, BufRead, IsTerminal, Write};

/// 确认能力
pub trait Confirmer: Send + Sync {
    /// 展示预估并询问是否继续
    ///
    /// # 参数
    /// - `estimated_tokens`: 预估 token 数
    /// - `pages`: 页数
    fn confirm(&self, estimated_tokens: u64, pages: usize) -> io::Result<bool>;
}

/// 无人值守：不询问，直接继续
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _estimated_tokens: u64, _pages: usize) -> io::Result<bool> {
        Ok(true)
    }
}

/// 从终端读取 y/N
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirmer;

impl TerminalConfirmer {
    /// 标准输入是否连着终端
    pub fn is_attended() -> bool {
        io::stdin().is_terminal()
    }
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, estimated_tokens: u64, pages: usize) -> io::Result<bool> {
        let mut stdout = io::stdout();
        write!(
            stdout,
            "即将识别 {} 页，预估约 {} tokens（粗略估算，仅供参考）。继续？[y/N] ",
            pages, estimated_tokens
        )?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}

/// 只有明确的 y / yes 才算同意
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "是")
}

/// 根据运行环境选择确认方式
pub fn confirmer_for(assume_yes: bool) -> Box<dyn Confirmer> {
    if !assume_yes && TerminalConfirmer::is_attended() {
        Box::new(TerminalConfirmer)
    } else {
        Box::new(AssumeYes)
    }
}
