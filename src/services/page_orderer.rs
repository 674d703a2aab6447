//! 页面排序服务 - 业务能力层
//!
//! 双面扫描时先扫完所有正面（页序递增），把整叠纸翻过来再扫所有背面（页序递减）。
//! 按文件名排序后的列表因此是 `[正1, 正2, 正3, 背3, 背2, 背1]`，
//! 这里把它还原成 `[正1, 背1, 正2, 背2, 正3, 背3]`。
//!
//! 张数为奇数时，假定多出来的那张是最后一页正面，没有背面。

/// 还原双面扫描的真实页序
///
/// 纯函数，输出总是输入的一个排列；空输入返回空列表，由调用方判定为"没有图片"。
pub fn reorder<T: Clone>(files: &[T]) -> Vec<T> {
    let mid = files.len().div_ceil(2);
    let (fronts, backs) = files.split_at(mid);

    let mut result = Vec::with_capacity(files.len());
    for (i, front) in fronts.iter().enumerate() {
        result.push(front.clone());
        // backs 逆序后第 i 个就是第 i 张纸的背面
        if let Some(back) = backs.len().checked_sub(i + 1).map(|j| &backs[j]) {
            result.push(back.clone());
        }
    }
    result
}
