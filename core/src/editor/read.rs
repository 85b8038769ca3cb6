use std::sync::Arc;
use yrs::{Doc, GetString, ReadTxn, Transact, XmlFragment};

// ============================================================================
// Constants: Element Type Definitions
// ============================================================================

/// 區塊級元素列表：這些元素在結束時需要添加換行符，且不與相鄰元素共用文字片段
const BLOCK_ELEMENTS: &[&str] = &[
    "paragraph",
    "heading",
    "code_block",
    "blockquote",
    "horizontal_rule",
    "bullet_list",
    "ordered_list",
    "list_item",
    "table",
    "table_row",
    "table_cell",
];

/// 換行元素列表：這些元素本身代表換行
const BREAK_ELEMENTS: &[&str] = &["hard_break", "br"];

// ============================================================================
// Public API
// ============================================================================

/// 從 Yrs Doc 中提取純文字內容
///
/// 這個函數會遍歷名為 `fragment_name` 的 XML Fragment，遞迴提取所有文字節點，
/// 並根據元素類型適當地添加換行符。
///
/// # Arguments
/// * `doc` - 共享的 Yrs Doc 實例，包含協作編輯的文檔內容
/// * `fragment_name` - 根 XML Fragment 的名稱（通常是 `"content"`）
///
/// # Returns
/// 提取的純文字內容，已移除末尾多餘的換行符
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use yrs::Doc;
/// use findreplace_core::editor::get_doc_content;
///
/// let doc = Arc::new(Doc::new());
/// let content = get_doc_content(&doc, "content");
/// assert!(content.is_empty());
/// ```
pub fn get_doc_content(doc: &Arc<Doc>, fragment_name: &str) -> String {
    let xml_fragment = doc.get_or_insert_xml_fragment(fragment_name);
    let txn = doc.transact();
    extract_text_from_fragment(&xml_fragment, &txn)
}

/// 從 XML Fragment 中提取所有文字內容
///
/// 與 [`get_doc_content`] 相同，但使用已開啟的交易。
pub fn extract_text_from_fragment<T: ReadTxn>(
    fragment: &yrs::types::xml::XmlFragmentRef,
    txn: &T,
) -> String {
    let mut content = String::new();
    let child_count = fragment.len(txn);

    // 遍歷所有子節點並提取文字
    for i in 0..child_count {
        if let Some(child) = fragment.get(txn, i) {
            extract_text_from_node(&child, txn, &mut content);
        }
    }

    // 移除末尾多餘的換行符，保持輸出整潔
    content.trim_end_matches('\n').to_string()
}

/// 檢查元素是否為區塊級元素
pub(crate) fn is_block_level_element(tag_name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag_name)
}

/// 檢查元素是否為換行元素
pub(crate) fn is_break_element(tag_name: &str) -> bool {
    BREAK_ELEMENTS.contains(&tag_name)
}

// ============================================================================
// Internal Implementation: Text Extraction
// ============================================================================

/// 從單個 XML 節點遞迴提取文字內容
///
/// 根據節點類型（Text、Element、Fragment）採用不同的處理策略：
/// - Text: 直接提取文字
/// - Element: 遞迴處理子節點，並根據元素類型添加換行
/// - Fragment: 遞迴處理嵌套的 fragment
///
/// # Arguments
/// * `node` - 要處理的 XML 節點
/// * `txn` - 讀取交易
/// * `output` - 輸出緩衝區，累積提取的文字
fn extract_text_from_node<T: ReadTxn>(
    node: &yrs::types::xml::XmlOut,
    txn: &T,
    output: &mut String,
) {
    match node {
        yrs::types::xml::XmlOut::Text(text_node) => {
            let text = text_node.get_string(txn);
            output.push_str(&text);
        }
        yrs::types::xml::XmlOut::Element(element_node) => {
            handle_element_node(element_node, txn, output);
        }
        yrs::types::xml::XmlOut::Fragment(fragment_node) => {
            let child_count = fragment_node.len(txn);
            for i in 0..child_count {
                if let Some(child) = fragment_node.get(txn, i) {
                    extract_text_from_node(&child, txn, output);
                }
            }
        }
    }
}

/// 處理 Element 節點
///
/// 巢狀區塊（例如清單內的清單項目）在共同結尾只輸出一個換行符。
fn handle_element_node<T: ReadTxn>(
    element_node: &yrs::types::xml::XmlElementRef,
    txn: &T,
    output: &mut String,
) {
    let tag_name = element_node.tag().as_ref();
    let child_count = element_node.len(txn);

    for i in 0..child_count {
        if let Some(child) = element_node.get(txn, i) {
            extract_text_from_node(&child, txn, output);
        }
    }

    if is_break_element(tag_name) {
        output.push('\n');
    } else if is_block_level_element(tag_name) && !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
}

// ============================================================================
// Tests
// ============================================================================
