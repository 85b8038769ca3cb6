use std::fmt;

use serde::{Deserialize, Serialize};
use yrs::{Assoc, GetString, IndexedSequence, ReadTxn, StickyIndex, TransactionMut, XmlTextRef};

use crate::error::{Error, Result};

/// 從根 fragment 到節點的子索引路徑
pub type NodePath = Vec<u32>;

// ============================================================================
// Offset Units: UTF-16 <-> Byte
// ============================================================================

/// 將字串內的位元組位置換算成 UTF-16 單位
///
/// 文檔以 UTF-16 計算位置，而 Rust 字串以位元組切片，
/// 所有交給 yrs 的位置都要經過這裡換算。
///
/// # Arguments
/// * `text` - 節點的文字內容
/// * `byte` - 位於字元邊界上的位元組位置
///
/// # Returns
/// `byte` 之前的 UTF-16 單位數
pub(crate) fn utf16_offset(text: &str, byte: usize) -> u32 {
    text.char_indices()
        .take_while(|(index, _)| *index < byte)
        .map(|(_, ch)| ch.len_utf16() as u32)
        .sum()
}

/// 將 UTF-16 位置換回位元組位置
///
/// # Returns
/// 位置落在代理對中間或超出字串時回傳 `None`
pub(crate) fn byte_offset(text: &str, utf16: u32) -> Option<usize> {
    let mut units = 0u32;
    for (byte, ch) in text.char_indices() {
        if units == utf16 {
            return Some(byte);
        }
        if units > utf16 {
            return None;
        }
        units += ch.len_utf16() as u32;
    }
    (units == utf16).then_some(text.len())
}

// ============================================================================
// Resolved (serialisable) positions
// ============================================================================

/// 當下解析出的位置：文字節點路徑加上節點內的 UTF-16 位置
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedPosition {
    pub path: NodePath,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: ResolvedPosition,
    pub end: ResolvedPosition,
}

// ============================================================================
// Live positions
// ============================================================================

/// 文字節點內的錨點，在其他地方編輯後仍跟隨同一個字元
///
/// 路徑在建立時記錄，只要編輯不動到元素結構就保持正確。
#[derive(Clone)]
pub struct Position {
    node: XmlTextRef,
    path: NodePath,
    anchor: StickyIndex,
}

impl Position {
    pub fn node(&self) -> &XmlTextRef {
        &self.node
    }

    pub fn path(&self) -> &[u32] {
        &self.path
    }

    /// 錨點目前在文字節點內的 UTF-16 位置
    ///
    /// 錨點已無法解析時回傳 [`Error::StaleRange`]
    pub fn offset<T: ReadTxn>(&self, txn: &T) -> Result<u32> {
        self.anchor
            .get_offset(txn)
            .map(|offset| offset.index)
            .ok_or(Error::StaleRange)
    }

    pub fn resolve<T: ReadTxn>(&self, txn: &T) -> Result<ResolvedPosition> {
        Ok(ResolvedPosition {
            path: self.path.clone(),
            offset: self.offset(txn)?,
        })
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("path", &self.path)
            .field("anchor", &self.anchor)
            .finish()
    }
}

/// 在 `node` 的 `offset` 建立位置
///
/// # Arguments
/// * `offset` - UTF-16 位置
/// * `assoc` - 錨點黏附的鄰近字元：範圍起點用 [`Assoc::After`]，終點用 [`Assoc::Before`]
pub fn create_position(
    txn: &mut TransactionMut,
    node: &XmlTextRef,
    path: NodePath,
    offset: u32,
    assoc: Assoc,
) -> Result<Position> {
    let anchor = node
        .sticky_index(txn, offset, assoc)
        .ok_or(Error::StaleRange)?;
    Ok(Position {
        node: node.clone(),
        path,
        anchor,
    })
}

// ============================================================================
// Ranges
// ============================================================================

/// 範圍中位於單一文字節點內的片段
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub start: Position,
    pub end: Position,
}

/// 一段定位好的內容，起點在終點之前
///
/// 跨越相鄰文字節點的匹配會依文檔順序為每個節點保留一個 [`TextSpan`]。
#[derive(Debug, Clone)]
pub struct Range {
    spans: Vec<TextSpan>,
}

/// 針對交易解析好的片段，可直接編輯
pub(crate) struct SpanOffsets {
    pub node: XmlTextRef,
    pub start: u32,
    pub end: u32,
}

impl Range {
    /// 以同一文字節點內的起點與終點建立範圍
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            spans: vec![TextSpan { start, end }],
        }
    }

    pub fn from_spans(spans: Vec<TextSpan>) -> Option<Self> {
        if spans.is_empty() {
            return None;
        }
        Some(Self { spans })
    }

    pub fn start(&self) -> &Position {
        &self.spans[0].start
    }

    pub fn end(&self) -> &Position {
        &self.spans[self.spans.len() - 1].end
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    pub fn resolve<T: ReadTxn>(&self, txn: &T) -> Result<ResolvedRange> {
        Ok(ResolvedRange {
            start: self.start().resolve(txn)?,
            end: self.end().resolve(txn)?,
        })
    }

    pub(crate) fn span_offsets<T: ReadTxn>(&self, txn: &T) -> Result<Vec<SpanOffsets>> {
        self.spans
            .iter()
            .map(|span| {
                let start = span.start.offset(txn)?;
                let end = span.end.offset(txn)?;
                if start > end {
                    return Err(Error::StaleRange);
                }
                Ok(SpanOffsets {
                    node: span.start.node().clone(),
                    start,
                    end,
                })
            })
            .collect()
    }

    /// 範圍目前涵蓋的文字
    ///
    /// # Returns
    /// 任一端點無法解析或落在字元中間時回傳 [`Error::StaleRange`]
    pub fn text<T: ReadTxn>(&self, txn: &T) -> Result<String> {
        let mut text = String::new();
        for span in self.span_offsets(txn)? {
            let data = span.node.get_string(txn);
            // yrs 以 UTF-16 回報位置，切片前換回位元組
            let start = byte_offset(&data, span.start).ok_or(Error::StaleRange)?;
            let end = byte_offset(&data, span.end).ok_or(Error::StaleRange)?;
            let piece = data.get(start..end).ok_or(Error::StaleRange)?;
            text.push_str(piece);
        }
        Ok(text)
    }
}
