//! 依文檔順序走訪編輯器內容
//!
//! [`DocumentWalker`] 逐步產出文字片段與元素邊界，
//! [`TextChunks`] 再把它們合併成連續文字，遇到任何邊界就切開，
//! 因此匹配不會跨過行內物件，也不會從一個區塊跳到下一個區塊。

use std::ops::Range as ByteRange;

use yrs::types::xml::{XmlFragmentRef, XmlOut};
use yrs::{GetString, ReadTxn, XmlFragment, XmlTextRef};

use super::position::{NodePath, utf16_offset};
use super::read::is_block_level_element;

/// 單一文字節點持有的純文字
#[derive(Clone)]
pub struct TextRun {
    pub node: XmlTextRef,
    pub path: NodePath,
    /// `data` 在 `node` 內的 UTF-16 起始位置
    pub start_offset: u32,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Block,
    /// 非文字的行內物件（圖片、換行、提及等）
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Enter,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub tag: String,
    pub kind: BoundaryKind,
    pub edge: Edge,
}

pub enum WalkItem {
    Text(TextRun),
    Boundary(Boundary),
}

struct Frame {
    parent: XmlOut,
    path: NodePath,
    next: u32,
    len: u32,
    exit: Option<Boundary>,
}

/// 對 fragment 的惰性深度優先走訪，重新開始就建立新的 walker
pub struct DocumentWalker<'t, T: ReadTxn> {
    txn: &'t T,
    stack: Vec<Frame>,
}

pub fn walk<'t, T: ReadTxn>(txn: &'t T, root: &XmlFragmentRef) -> DocumentWalker<'t, T> {
    let len = root.len(txn);
    DocumentWalker {
        txn,
        stack: vec![Frame {
            parent: XmlOut::Fragment(root.clone()),
            path: NodePath::new(),
            next: 0,
            len,
            exit: None,
        }],
    }
}

impl<'t, T: ReadTxn> DocumentWalker<'t, T> {
    pub fn text_chunks(self) -> TextChunks<Self> {
        TextChunks::new(self)
    }
}

fn child_at<T: ReadTxn>(parent: &XmlOut, txn: &T, index: u32) -> Option<XmlOut> {
    match parent {
        XmlOut::Element(element) => element.get(txn, index),
        XmlOut::Fragment(fragment) => fragment.get(txn, index),
        XmlOut::Text(_) => None,
    }
}

impl<T: ReadTxn> Iterator for DocumentWalker<'_, T> {
    type Item = WalkItem;

    fn next(&mut self) -> Option<WalkItem> {
        loop {
            let frame = self.stack.last_mut()?;
            if frame.next >= frame.len {
                let finished = self.stack.pop()?;
                match finished.exit {
                    Some(boundary) => return Some(WalkItem::Boundary(boundary)),
                    None => continue,
                }
            }

            let index = frame.next;
            frame.next += 1;
            let Some(child) = child_at(&frame.parent, self.txn, index) else {
                continue;
            };
            let mut path = frame.path.clone();
            path.push(index);

            match child {
                XmlOut::Text(node) => {
                    let data = node.get_string(self.txn);
                    return Some(WalkItem::Text(TextRun {
                        node,
                        path,
                        start_offset: 0,
                        data,
                    }));
                }
                XmlOut::Element(element) => {
                    let tag = element.tag().to_string();
                    let kind = if is_block_level_element(&tag) {
                        BoundaryKind::Block
                    } else {
                        BoundaryKind::Inline
                    };
                    let len = element.len(self.txn);
                    self.stack.push(Frame {
                        parent: XmlOut::Element(element),
                        path,
                        next: 0,
                        len,
                        exit: Some(Boundary {
                            tag: tag.clone(),
                            kind,
                            edge: Edge::Exit,
                        }),
                    });
                    return Some(WalkItem::Boundary(Boundary {
                        tag,
                        kind,
                        edge: Edge::Enter,
                    }));
                }
                // 巢狀 fragment 視為透明容器
                XmlOut::Fragment(fragment) => {
                    let len = fragment.len(self.txn);
                    self.stack.push(Frame {
                        parent: XmlOut::Fragment(fragment),
                        path,
                        next: 0,
                        len,
                        exit: None,
                    });
                }
            }
        }
    }
}

// ============================================================================
// Contiguous text chunks
// ============================================================================

/// 文字片段及其在所屬 chunk 內的位元組起點
#[derive(Clone)]
pub struct ChunkPiece {
    pub run: TextRun,
    pub chunk_offset: usize,
}

/// 相鄰且中間沒有邊界的文字節點組成的文字
#[derive(Clone, Default)]
pub struct TextChunk {
    pub text: String,
    pub pieces: Vec<ChunkPiece>,
}

/// chunk 範圍中落在單一文字節點內的部分，以節點的 UTF-16 位置表示
pub struct PieceSlice<'c> {
    pub run: &'c TextRun,
    pub start: u32,
    pub end: u32,
}

impl TextChunk {
    fn push(&mut self, run: TextRun) {
        let chunk_offset = self.text.len();
        self.text.push_str(&run.data);
        self.pieces.push(ChunkPiece { run, chunk_offset });
    }

    /// 將 [`TextChunk::text`] 的位元組範圍對應回涵蓋的文字節點
    ///
    /// # Arguments
    /// * `range` - chunk 文字內的位元組範圍，兩端需在字元邊界上
    ///
    /// # Returns
    /// 每個涵蓋到的節點一個片段，位置已換算成節點內的 UTF-16 單位
    pub fn slices(&self, range: ByteRange<usize>) -> Vec<PieceSlice<'_>> {
        self.pieces
            .iter()
            .filter_map(|piece| {
                let data = &piece.run.data;
                let piece_end = piece.chunk_offset + data.len();
                let start = range.start.max(piece.chunk_offset);
                let end = range.end.min(piece_end);
                if start >= end {
                    return None;
                }
                let base = piece.run.start_offset;
                Some(PieceSlice {
                    run: &piece.run,
                    start: base + utf16_offset(data, start - piece.chunk_offset),
                    end: base + utf16_offset(data, end - piece.chunk_offset),
                })
            })
            .collect()
    }
}

pub struct TextChunks<I> {
    items: I,
    pending: TextChunk,
}

impl<I> TextChunks<I> {
    pub fn new(items: I) -> Self {
        Self {
            items,
            pending: TextChunk::default(),
        }
    }

    fn flush(&mut self) -> Option<TextChunk> {
        if self.pending.pieces.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }
}

impl<I: Iterator<Item = WalkItem>> Iterator for TextChunks<I> {
    type Item = TextChunk;

    fn next(&mut self) -> Option<TextChunk> {
        loop {
            match self.items.next() {
                Some(WalkItem::Text(run)) => {
                    if !run.data.is_empty() {
                        self.pending.push(run);
                    }
                }
                Some(WalkItem::Boundary(_)) => {
                    if let Some(chunk) = self.flush() {
                        return Some(chunk);
                    }
                }
                None => return self.flush(),
            }
        }
    }
}
