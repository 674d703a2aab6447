//! 批量重命名服务 - 业务能力层
//!
//! 把排好序的图片重命名为 `{base}_{序号:03}{扩展名}`。
//!
//! 新名字可能和某个原文件名重叠，所以分两步走：
//! 1. 全部移进临时目录并改成新名字
//! 2. 第一步全部成功后再移回数据目录
//!
//! 任何一步失败都直接报错，不回滚，临时目录保留给人工处理。
//! 第二步移回前会检查目标是否已存在，但检查和 `rename` 之间没有加锁：
//! 这期间若有别的进程创建了同名文件，Unix 上 `rename` 仍会覆盖它。
//! 超过 999 页时序号自然变宽（`_1000`），名字仍然唯一。

use crate::error::RenameError;
use crate::models::ScanFile;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// 临时目录名
pub const STAGING_DIR_NAME: &str = "__tmp_rename";

/// 生成规范文件名
///
/// # 参数
/// - `base`: 基础名称
/// - `index`: 页码（从 1 开始）
/// - `extension`: 原扩展名（带点）
pub fn canonical_name(base: &str, index: usize, extension: &str) -> String {
    format!("{}_{:03}{}", base, index, extension)
}

/// 重命名所有图片
///
/// # 返回
/// 返回与输入顺序一致的新文件列表
pub async fn rename_files(
    data_dir: &Path,
    ordered: &[ScanFile],
    base: &str,
) -> Result<Vec<ScanFile>, RenameError> {
    let staging = data_dir.join(STAGING_DIR_NAME);

    let staging_exists = fs::try_exists(&staging)
        .await
        .map_err(|source| RenameError::CreateStaging {
            path: staging.clone(),
            source,
        })?;
    if staging_exists {
        return Err(RenameError::StagingExists { path: staging });
    }
    fs::create_dir(&staging)
        .await
        .map_err(|source| RenameError::CreateStaging {
            path: staging.clone(),
            source,
        })?;

    // ========== 第一步：移入临时目录 ==========
    let mut renamed = Vec::with_capacity(ordered.len());
    for (i, file) in ordered.iter().enumerate() {
        let new_name = canonical_name(base, i + 1, &file.extension());
        let from = data_dir.join(&file.name);
        let to = staging.join(&new_name);

        debug!("暂存: {} → {}", file.name, new_name);
        fs::rename(&from, &to)
            .await
            .map_err(|source| RenameError::Stage { from, to, source })?;

        renamed.push(file.renamed(new_name));
    }

    // ========== 第二步：移回数据目录 ==========
    for file in &renamed {
        let from = staging.join(&file.name);
        let to = data_dir.join(&file.name);

        let target_exists = match fs::try_exists(&to).await {
            Ok(exists) => exists,
            Err(source) => return Err(RenameError::Restore { from, to, source }),
        };
        if target_exists {
            return Err(RenameError::TargetExists { path: to });
        }
        fs::rename(&from, &to)
            .await
            .map_err(|source| RenameError::Restore { from, to, source })?;
    }

    fs::remove_dir(&staging)
        .await
        .map_err(|source| RenameError::RemoveStaging {
            path: staging.clone(),
            source,
        })?;

    info!("✓ 已重命名 {} 个文件", renamed.len());
    Ok(renamed)
}
