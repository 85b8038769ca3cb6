//! 以簡單的 XML 標記語言讀寫編輯器 fragment
//!
//! `<paragraph>Hello <image src="a.png"/>world</paragraph>` 會變成一個 `paragraph`
//! 元素，內含文字節點、`image` 元素與第二個文字節點。
//! 只支援編輯器 schema 需要的部分：元素、自閉合元素、雙引號屬性、文字與五個預定義實體。

use std::iter::Peekable;
use std::str::Chars;

use yrs::types::xml::{XmlElementPrelim, XmlFragmentRef, XmlOut};
use yrs::{GetString, ReadTxn, TransactionMut, Xml, XmlFragment, XmlTextPrelim};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
    Text(String),
}

// ============================================================================
// Public API
// ============================================================================

/// 清空 `fragment` 並填入解析後的 `markup`
///
/// 先解析再刪除，格式錯誤時 fragment 保持不變。
///
/// # Arguments
/// * `txn` - 寫入交易
/// * `fragment` - 目標 fragment
/// * `markup` - 標記語言內容
///
/// # Returns
/// 格式錯誤時回傳 [`Error::Markup`]
pub fn replace_fragment_markup(
    txn: &mut TransactionMut,
    fragment: &XmlFragmentRef,
    markup: &str,
) -> Result<()> {
    let nodes = parse_markup(markup)?;

    let len = fragment.len(txn);
    if len > 0 {
        fragment.remove_range(txn, 0, len);
    }
    insert_nodes(txn, fragment, &nodes);
    Ok(())
}

/// 將 fragment 序列化回標記語言，屬性依名稱排序
pub fn fragment_to_markup<T: ReadTxn>(txn: &T, fragment: &XmlFragmentRef) -> String {
    let mut result = String::new();
    let len = fragment.len(txn);
    for i in 0..len {
        if let Some(child) = fragment.get(txn, i) {
            write_node(&child, txn, &mut result);
        }
    }
    result
}

pub fn parse_markup(markup: &str) -> Result<Vec<MarkupNode>> {
    let mut chars = markup.chars().peekable();
    parse_children(&mut chars, None)
}

// ============================================================================
// Parsing
// ============================================================================

fn markup_error(message: impl Into<String>) -> Error {
    Error::Markup(message.into())
}

fn parse_children(chars: &mut Peekable<Chars>, parent: Option<&str>) -> Result<Vec<MarkupNode>> {
    let mut nodes = Vec::new();
    loop {
        match chars.peek() {
            None => {
                return match parent {
                    Some(tag) => Err(markup_error(format!("missing closing tag </{tag}>"))),
                    None => Ok(nodes),
                };
            }
            Some('<') => {
                if chars.clone().nth(1) == Some('/') {
                    let Some(tag) = parent else {
                        return Err(markup_error("closing tag without an open element"));
                    };
                    chars.next();
                    chars.next();
                    let closing = parse_name(chars)?;
                    skip_whitespace(chars);
                    expect_char(chars, '>')?;
                    if closing != tag {
                        return Err(markup_error(format!(
                            "expected </{tag}>, found </{closing}>"
                        )));
                    }
                    return Ok(nodes);
                }
                nodes.push(parse_element(chars)?);
            }
            Some(_) => {
                let text = decode_entities(&parse_text(chars))?;
                if !is_layout_whitespace(&text, parent.is_none()) {
                    nodes.push(MarkupNode::Text(text));
                }
            }
        }
    }
}

/// 判斷是否為排版用的空白而非內容
///
/// 頂層區塊之間的純空白，或元素內含換行的純空白文字都視為排版。
fn is_layout_whitespace(text: &str, top_level: bool) -> bool {
    text.trim().is_empty() && (top_level || text.contains('\n'))
}

fn parse_element(chars: &mut Peekable<Chars>) -> Result<MarkupNode> {
    expect_char(chars, '<')?;
    let tag = parse_name(chars)?;
    let mut attrs = Vec::new();

    loop {
        skip_whitespace(chars);
        match chars.peek() {
            Some('/') => {
                chars.next();
                expect_char(chars, '>')?;
                return Ok(MarkupNode::Element {
                    tag,
                    attrs,
                    children: Vec::new(),
                });
            }
            Some('>') => {
                chars.next();
                let children = parse_children(chars, Some(&tag))?;
                return Ok(MarkupNode::Element {
                    tag,
                    attrs,
                    children,
                });
            }
            Some(_) => {
                let key = parse_name(chars)?;
                skip_whitespace(chars);
                expect_char(chars, '=')?;
                skip_whitespace(chars);
                let value = parse_attr_value(chars)?;
                attrs.push((key, value));
            }
            None => return Err(markup_error(format!("unterminated <{tag}> tag"))),
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars>) {
    while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
}

fn expect_char(chars: &mut Peekable<Chars>, expected: char) -> Result<()> {
    match chars.next() {
        Some(ch) if ch == expected => Ok(()),
        Some(ch) => Err(markup_error(format!("expected '{expected}', found '{ch}'"))),
        None => Err(markup_error(format!("expected '{expected}', found end of input"))),
    }
}

fn parse_name(chars: &mut Peekable<Chars>) -> Result<String> {
    let mut name = String::new();
    while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '-' || *ch == '_') {
        name.push(ch);
    }
    if name.is_empty() {
        return Err(markup_error("empty tag or attribute name"));
    }
    Ok(name)
}

fn parse_attr_value(chars: &mut Peekable<Chars>) -> Result<String> {
    expect_char(chars, '"')?;
    let mut value = String::new();
    loop {
        match chars.next() {
            Some('"') => return decode_entities(&value),
            Some(ch) => value.push(ch),
            None => return Err(markup_error("unterminated attribute value")),
        }
    }
}

fn parse_text(chars: &mut Peekable<Chars>) -> String {
    let mut text = String::new();
    while let Some(ch) = chars.next_if(|ch| *ch != '<') {
        text.push(ch);
    }
    text
}

fn decode_entities(raw: &str) -> Result<String> {
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        let Some(semi) = rest[amp..].find(';') else {
            return Err(markup_error("unterminated entity"));
        };
        let entity = &rest[amp + 1..amp + semi];
        decoded.push(match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            other => return Err(markup_error(format!("unknown entity &{other};"))),
        });
        rest = &rest[amp + semi + 1..];
    }
    decoded.push_str(rest);
    Ok(decoded)
}

// ============================================================================
// Writing into the document
// ============================================================================

fn insert_nodes<F: XmlFragment>(txn: &mut TransactionMut, parent: &F, nodes: &[MarkupNode]) {
    for node in nodes {
        match node {
            MarkupNode::Element {
                tag,
                attrs,
                children,
            } => {
                let index = parent.len(txn);
                let elem = parent.insert(txn, index, XmlElementPrelim::empty(tag.as_str()));
                for (key, value) in attrs {
                    elem.insert_attribute(txn, key.as_str(), value.as_str());
                }
                insert_nodes(txn, &elem, children);
            }
            MarkupNode::Text(text) => {
                let index = parent.len(txn);
                parent.insert(txn, index, XmlTextPrelim::new(text.as_str()));
            }
        }
    }
}

// ============================================================================
// Serialising
// ============================================================================

fn write_node<T: ReadTxn>(node: &XmlOut, txn: &T, out: &mut String) {
    match node {
        XmlOut::Element(elem) => {
            let tag: &str = elem.tag();
            out.push('<');
            out.push_str(tag);

            let mut attrs: Vec<(String, String)> = elem
                .attributes(txn)
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            attrs.sort();
            for (key, value) in attrs {
                out.push(' ');
                out.push_str(&key);
                out.push_str("=\"");
                out.push_str(&escape(&value, true));
                out.push('"');
            }

            let len = elem.len(txn);
            if len == 0 {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for i in 0..len {
                if let Some(child) = elem.get(txn, i) {
                    write_node(&child, txn, out);
                }
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        XmlOut::Text(text) => out.push_str(&escape(&text.get_string(txn), false)),
        XmlOut::Fragment(fragment) => {
            let len = fragment.len(txn);
            for i in 0..len {
                if let Some(child) = fragment.get(txn, i) {
                    write_node(&child, txn, out);
                }
            }
        }
    }
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use yrs::{Doc, Transact};

    #[test]
    fn test_parse_keeps_inline_whitespace() {
        let nodes = parse_markup("<paragraph>Hello <image src=\"a.png\"/> world</paragraph>").unwrap();
        assert_eq!(
            nodes,
            vec![MarkupNode::Element {
                tag: "paragraph".into(),
                attrs: vec![],
                children: vec![
                    MarkupNode::Text("Hello ".into()),
                    MarkupNode::Element {
                        tag: "image".into(),
                        attrs: vec![("src".into(), "a.png".into())],
                        children: vec![],
                    },
                    MarkupNode::Text(" world".into()),
                ],
            }]
        );
    }

    #[test]
    fn test_parse_drops_layout_whitespace() {
        let nodes = parse_markup("\n<bullet_list>\n  <list_item>a</list_item>\n</bullet_list>\n").unwrap();
        let [MarkupNode::Element { children, .. }] = nodes.as_slice() else {
            panic!("expected a single list");
        };
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn test_parse_decodes_entities() {
        let nodes = parse_markup("<paragraph>a &lt;b&gt; &amp; c</paragraph>").unwrap();
        let [MarkupNode::Element { children, .. }] = nodes.as_slice() else {
            panic!("expected a paragraph");
        };
        assert_eq!(children, &vec![MarkupNode::Text("a <b> & c".into())]);
    }

    #[test]
    fn test_malformed_markup_is_an_error() {
        assert!(matches!(parse_markup("<paragraph>open"), Err(Error::Markup(_))));
        assert!(matches!(parse_markup("<a></b>"), Err(Error::Markup(_))));
        assert!(matches!(parse_markup("</a>"), Err(Error::Markup(_))));
        assert!(matches!(parse_markup("<p>&nbsp;</p>"), Err(Error::Markup(_))));
    }

    #[test]
    fn test_markup_survives_document_round_trip() {
        let markup = "<heading level=\"1\">Title</heading><paragraph>x &amp; y<hard_break/>z</paragraph>";
        let doc = Doc::new();
        let fragment = doc.get_or_insert_xml_fragment("content");
        {
            let mut txn = doc.transact_mut();
            replace_fragment_markup(&mut txn, &fragment, markup).unwrap();
        }

        let txn = doc.transact();
        assert_eq!(fragment_to_markup(&txn, &fragment), markup);
    }
}
