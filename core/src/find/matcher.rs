//! 在單一段連續文字上做純字串匹配

use std::ops::Range;

/// `needle` 在 `haystack` 中每個匹配的位元組起點
pub fn find_indices(haystack: &str, needle: &str, case_sensitive: bool) -> Vec<usize> {
    find_matches(haystack, needle, case_sensitive)
        .into_iter()
        .map(|range| range.start)
        .collect()
}

/// 找出 `needle` 在 `haystack` 中的所有匹配
///
/// 由左至右、互不重疊：每次從上一個匹配的結尾繼續掃描。
/// 空的 `needle` 永遠不會匹配。
///
/// # Arguments
/// * `case_sensitive` - 為 `false` 時，兩邊都以同一套逐字元小寫規則折疊後再比對
///
/// # Returns
/// 指向原始 `haystack` 的位元組範圍
pub fn find_matches(haystack: &str, needle: &str, case_sensitive: bool) -> Vec<Range<usize>> {
    if needle.is_empty() {
        return Vec::new();
    }

    if case_sensitive {
        return haystack
            .match_indices(needle)
            .map(|(start, _)| start..start + needle.len())
            .collect();
    }

    // 兩邊用同一套折疊規則，避免 `str::to_lowercase` 的詞尾 sigma 規則造成不一致
    let folded = FoldedText::new(haystack);
    let needle = FoldedText::new(needle).text;
    let mut matches: Vec<Range<usize>> = Vec::new();
    for (start, _) in folded.text.match_indices(needle.as_str()) {
        let range = folded.original_range(start..start + needle.len());
        // 從多字元小寫展開中間開始的匹配，可能對回上一個匹配的最後一個字元
        if matches.last().is_some_and(|prev| range.start < prev.end) {
            continue;
        }
        matches.push(range);
    }
    matches
}

/// 逐字元小寫後的文字，記錄每個位元組來自原始文字的哪個字元
struct FoldedText {
    text: String,
    char_starts: Vec<usize>,
    char_ends: Vec<usize>,
}

impl FoldedText {
    fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut char_starts = Vec::with_capacity(original.len());
        let mut char_ends = Vec::with_capacity(original.len());

        for (offset, ch) in original.char_indices() {
            let end = offset + ch.len_utf8();
            for lower in ch.to_lowercase() {
                text.push(lower);
                for _ in 0..lower.len_utf8() {
                    char_starts.push(offset);
                    char_ends.push(end);
                }
            }
        }

        Self {
            text,
            char_starts,
            char_ends,
        }
    }

    /// 將折疊後文字的非空位元組範圍對應回原始文字
    fn original_range(&self, folded: Range<usize>) -> Range<usize> {
        self.char_starts[folded.start]..self.char_ends[folded.end - 1]
    }
}
