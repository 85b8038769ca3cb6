use yrs::{Text, TransactionMut};

use super::position::Range;
use crate::error::Result;

/// 將 `range` 涵蓋的內容取代為 `text`
///
/// 先解析所有片段再開始刪除，由後往前刪，最後在第一個片段的起點插入 `text`。
/// 範圍外的錨點仍指向原本的字元。
///
/// # Arguments
/// * `txn` - 此次編輯所屬的寫入交易
/// * `range` - 要覆寫的範圍
/// * `text` - 取代文字，可以是空字串
///
/// # Errors
/// 任一片段無法解析時回傳 [`crate::Error::StaleRange`]
pub fn replace_range_content(txn: &mut TransactionMut, range: &Range, text: &str) -> Result<()> {
    // 位置以 UTF-16 計算，與文檔的 OffsetKind 相同
    let spans = range.span_offsets(&*txn)?;

    for span in spans.iter().rev() {
        let len = span.end - span.start;
        if len > 0 {
            span.node.remove_range(txn, span.start, len);
        }
    }

    if !text.is_empty() {
        let first = &spans[0];
        first.node.insert(txn, first.start, text);
    }

    tracing::debug!(spans = spans.len(), replacement = text, "replaced range content");
    Ok(())
}
