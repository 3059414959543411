//! Lenient HTML fragment parser → MarkupTree.
//!
//! Built on `winnow` 0.7 for the tag-level grammar. The outer loop never
//! fails: anything that does not parse as a tag, end tag or comment is kept
//! as text, unmatched end tags are dropped, and unclosed elements are closed
//! at end of input. This mirrors what a browser does with a detached
//! container closely enough for generated component markup.

use crate::model::*;
use petgraph::graph::NodeIndex;
use smallvec::SmallVec;
use std::borrow::Cow;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// Elements nested deeper than this are attached as siblings at the limit
/// instead of opening a new level.
pub const MAX_NESTING: usize = 256;

/// Parse a markup fragment into a `MarkupTree`. Never fails.
#[must_use]
pub fn parse_fragment(input: &str) -> MarkupTree {
    let mut tree = MarkupTree::new();
    let mut open: Vec<(NodeIndex, String)> = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while !rest.is_empty() {
        let parent = open.last().map_or(tree.root, |(idx, _)| *idx);

        if let Some(body) = rest.strip_prefix("<!--") {
            flush_text(&mut tree, parent, &mut text);
            let (comment, after) = match body.find("-->") {
                Some(end) => (&body[..end], &body[end + 3..]),
                None => (body, ""),
            };
            tree.add_comment(parent, comment);
            rest = after;
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            // Doctype and processing instructions carry nothing we keep.
            flush_text(&mut tree, parent, &mut text);
            rest = rest.find('>').map_or("", |end| &rest[end + 1..]);
        } else if rest.starts_with("</") {
            let checkpoint = rest;
            match parse_end_tag.parse_next(&mut rest) {
                Ok(name) => {
                    flush_text(&mut tree, parent, &mut text);
                    if let Some(pos) = open.iter().rposition(|(_, tag)| *tag == name) {
                        open.truncate(pos);
                    }
                }
                Err(_) => {
                    rest = &checkpoint[1..];
                    text.push('<');
                }
            }
        } else if rest.starts_with('<') {
            let checkpoint = rest;
            match parse_start_tag.parse_next(&mut rest) {
                Ok(tag) => {
                    flush_text(&mut tree, parent, &mut text);
                    let idx = tree.add_element(parent, &tag.name, tag.attrs);
                    if is_raw_text(&tag.name) {
                        if !tag.self_closing {
                            let (content, after) = split_raw_text(rest, &tag.name);
                            if !content.is_empty() {
                                tree.add_text(idx, content);
                            }
                            rest = after;
                        }
                    } else if !is_void(&tag.name) && !tag.self_closing && open.len() < MAX_NESTING {
                        open.push((idx, tag.name));
                    }
                }
                Err(_) => {
                    rest = &checkpoint[1..];
                    text.push('<');
                }
            }
        } else {
            let chunk: &str = take_till::<_, _, ContextError>(1.., '<')
                .parse_next(&mut rest)
                .unwrap_or_default();
            if chunk.is_empty() {
                // take_till only fails on empty input, which the loop guards.
                break;
            }
            text.push_str(&decode_entities(chunk));
        }
    }

    let parent = open.last().map_or(tree.root, |(idx, _)| *idx);
    flush_text(&mut tree, parent, &mut text);
    tree
}

fn flush_text(tree: &mut MarkupTree, parent: NodeIndex, text: &mut String) {
    if !text.is_empty() {
        tree.add_text(parent, std::mem::take(text));
    }
}

/// Split raw-text content at the case-insensitive `</tag` terminator and
/// skip past its `>`. Unterminated content runs to end of input.
fn split_raw_text<'a>(input: &'a str, tag: &str) -> (&'a str, &'a str) {
    let needle = format!("</{tag}");
    let lowered = input.to_ascii_lowercase();
    match lowered.find(&needle) {
        Some(start) => {
            let after_name = &input[start + needle.len()..];
            let after = after_name.find('>').map_or("", |end| &after_name[end + 1..]);
            (&input[..start], after)
        }
        None => (input, ""),
    }
}

// ─── Tags ────────────────────────────────────────────────────────────────

struct StartTag {
    name: String,
    attrs: SmallVec<[Attribute; 4]>,
    self_closing: bool,
}

fn skip_space(input: &mut &str) {
    let _: Result<&str, ErrMode<ContextError>> = multispace0.parse_next(input);
}

fn parse_tag_name(input: &mut &str) -> ModalResult<String> {
    if !input.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
    })
    .map(|name: &str| name.to_ascii_lowercase())
    .parse_next(input)
}

fn parse_start_tag(input: &mut &str) -> ModalResult<StartTag> {
    '<'.parse_next(input)?;
    let name = parse_tag_name(input)?;
    let mut attrs: SmallVec<[Attribute; 4]> = SmallVec::new();

    loop {
        skip_space(input);
        if let Some(after) = input.strip_prefix("/>") {
            *input = after;
            return Ok(StartTag {
                name,
                attrs,
                self_closing: true,
            });
        }
        if let Some(after) = input.strip_prefix('>') {
            *input = after;
            return Ok(StartTag {
                name,
                attrs,
                self_closing: false,
            });
        }
        if let Some(after) = input.strip_prefix('/') {
            *input = after;
            continue;
        }
        if input.is_empty() {
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        let attr = parse_attribute(input)?;
        // Duplicate attributes: the first occurrence wins.
        if !attrs.iter().any(|a| a.name == attr.name) {
            attrs.push(attr);
        }
    }
}

fn parse_attribute(input: &mut &str) -> ModalResult<Attribute> {
    let name: &str = take_while(1.., |c: char| {
        !c.is_whitespace() && !matches!(c, '>' | '/' | '=' | '"' | '\'' | '<')
    })
    .parse_next(input)?;
    skip_space(input);
    let value = opt(preceded(('=', multispace0), parse_attribute_value)).parse_next(input)?;
    Ok(Attribute::new(
        name.to_ascii_lowercase(),
        value.map(|v| decode_entities(v).into_owned()).unwrap_or_default(),
    ))
}

fn parse_attribute_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
        take_while(1.., |c: char| !c.is_whitespace() && c != '>'),
    ))
    .parse_next(input)
}

fn parse_end_tag(input: &mut &str) -> ModalResult<String> {
    "</".parse_next(input)?;
    let name = parse_tag_name(input)?;
    let _: &str = take_till(0.., '>').parse_next(input)?;
    '>'.parse_next(input)?;
    Ok(name)
}

// ─── Entities ────────────────────────────────────────────────────────────

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("colon", ':'),
    ("tab", '\t'),
    ("newline", '\n'),
    ("copy", '©'),
    ("reg", '®'),
    ("hellip", '…'),
    ("mdash", '—'),
    ("ndash", '–'),
    ("middot", '·'),
    ("times", '×'),
];

/// Decode character references. Numeric references are accepted with or
/// without the trailing `;`; named ones require it. Unknown references are
/// kept verbatim.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_reference(&rest[1..]) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[1 + consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode the reference following an `&`. Returns the character and the
/// number of bytes consumed after the `&`.
fn decode_reference(after_amp: &str) -> Option<(char, usize)> {
    if let Some(numeric) = after_amp.strip_prefix('#') {
        let (digits, radix, prefix) = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 2),
            None => (numeric, 10, 1),
        };
        let len = digits
            .char_indices()
            .take_while(|(_, c)| c.is_digit(radix))
            .count()
            .min(8);
        if len == 0 {
            return None;
        }
        let value = u32::from_str_radix(&digits[..len], radix).ok()?;
        let ch = match char::from_u32(value) {
            Some('\0') | None => '\u{fffd}',
            Some(c) => c,
        };
        let semicolon = usize::from(digits[len..].starts_with(';'));
        return Some((ch, prefix + len + semicolon));
    }

    let end = after_amp.find(';')?;
    let name = &after_amp[..end];
    NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| name.eq_ignore_ascii_case(entity))
        .map(|(_, ch)| (*ch, end + 1))
}
