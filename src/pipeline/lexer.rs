//! Content stream splitting ahead of `lopdf`'s operation parser.
//!
//! `lopdf::content::Content::decode` stops silently at the first thing it
//! cannot parse: a comment, a form feed, an inline image's binary samples.
//! This pass walks the raw bytes first. It strips comments, normalises
//! whitespace, cuts inline images (`BI … ID <data> EI`) out of the stream,
//! and remembers where every operator ends. Each run of operators between
//! inline images is then handed to `lopdf`; an operation it cannot parse is
//! reported and skipped, and parsing resumes after it.

use lopdf::content::{Content, Operation};
use lopdf::Object;

/// Longest excerpt of an unparseable operation kept in a problem report.
const EXCERPT_LEN: usize = 40;

/// One element of a content stream, in paint order.
#[derive(Debug, Clone)]
pub(crate) enum ContentItem {
    Op(Operation),
    /// `BI <entries> ID <data> EI`; `entries` alternate key names and values.
    InlineImage { entries: Vec<Object>, data: Vec<u8> },
}

/// Items of a content stream plus what could not be read.
#[derive(Debug, Default)]
pub(crate) struct ParsedContent {
    pub items: Vec<ContentItem>,
    pub problems: Vec<String>,
}

/// Split `bytes` into operations and inline images.
pub(crate) fn parse_content(bytes: &[u8]) -> ParsedContent {
    let mut lexer = Lexer { bytes, pos: 0 };
    let mut parsed = ParsedContent::default();
    let mut segment = Segment::default();

    while let Some(token) = lexer.next_token() {
        let text = &bytes[token.start..token.end];
        match token.kind {
            TokenKind::Space => segment.clean.push(b' '),
            TokenKind::Unterminated => {
                parsed.problems.push(format!(
                    "unterminated string at byte {}",
                    token.start
                ));
                segment.clean.extend_from_slice(text);
                segment.trailing_operands = true;
            }
            TokenKind::Operand => {
                segment.clean.extend_from_slice(text);
                segment.trailing_operands = true;
            }
            TokenKind::Operator if text == b"BI" => {
                segment.flush(&mut parsed);
                lexer.inline_image(&mut parsed);
            }
            TokenKind::Operator => {
                segment.clean.extend_from_slice(text);
                segment.op_ends.push(segment.clean.len());
                segment.trailing_operands = false;
            }
        }
    }
    segment.flush(&mut parsed);
    parsed
}

// ── Segments ─────────────────────────────────────────────────────────────

/// Cleaned bytes between inline images.
#[derive(Debug, Default)]
struct Segment {
    clean: Vec<u8>,
    /// Offset in `clean` just past each operator.
    op_ends: Vec<usize>,
    trailing_operands: bool,
}

impl Segment {
    fn flush(&mut self, parsed: &mut ParsedContent) {
        let segment = std::mem::take(self);
        let mut start = 0;
        let mut done = 0;

        while done < segment.op_ends.len() {
            let operations = Content::decode(&segment.clean[start..])
                .map(|c| c.operations)
                .unwrap_or_default();
            let take = operations.len().min(segment.op_ends.len() - done);
            parsed.items.extend(operations.into_iter().take(take).map(ContentItem::Op));
            done += take;

            if done < segment.op_ends.len() {
                let from = if done == 0 { 0 } else { segment.op_ends[done - 1] };
                let to = segment.op_ends[done];
                parsed.problems.push(format!(
                    "operation {} could not be parsed: {}",
                    done,
                    excerpt(&segment.clean[from..to])
                ));
                start = to;
                done += 1;
            }
        }

        if segment.trailing_operands {
            let from = segment.op_ends.last().copied().unwrap_or(0);
            parsed.problems.push(format!(
                "operands without an operator: {}",
                excerpt(&segment.clean[from..])
            ));
        }
    }
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

// ── Tokens ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    /// Whitespace run or comment.
    Space,
    Operand,
    Operator,
    /// A string or hex string that runs to the end of the stream.
    Unterminated,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

fn is_white(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\0' | b'\x0C')
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_regular(b: u8) -> bool {
    !is_white(b) && !is_delimiter(b)
}

/// Anything regular that is not a number or a keyword operand.
fn is_operator(token: &[u8]) -> bool {
    match token.first() {
        Some(b) if b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.') => false,
        Some(_) => !matches!(token, b"true" | b"false" | b"null"),
        None => false,
    }
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Lexer<'_> {
    fn next_token(&mut self) -> Option<Token> {
        let bytes = self.bytes;
        let start = self.pos;
        let first = *bytes.get(start)?;
        let run = |from: usize, pred: fn(u8) -> bool| {
            bytes[from..].iter().position(|&b| !pred(b)).map_or(bytes.len(), |n| from + n)
        };

        let (kind, end) = match first {
            b if is_white(b) => (TokenKind::Space, run(start, is_white)),
            b'%' => (TokenKind::Space, run(start, |b| b != b'\r' && b != b'\n')),
            b'(' => match literal_string_end(bytes, start) {
                Some(end) => (TokenKind::Operand, end),
                None => (TokenKind::Unterminated, bytes.len()),
            },
            b'<' if bytes.get(start + 1) == Some(&b'<') => (TokenKind::Operand, start + 2),
            b'<' => match bytes[start..].iter().position(|&b| b == b'>') {
                Some(n) => (TokenKind::Operand, start + n + 1),
                None => (TokenKind::Unterminated, bytes.len()),
            },
            b'>' if bytes.get(start + 1) == Some(&b'>') => (TokenKind::Operand, start + 2),
            b'/' => (TokenKind::Operand, run(start + 1, is_regular)),
            b if is_delimiter(b) => (TokenKind::Operand, start + 1),
            _ => {
                let end = run(start, is_regular);
                let kind = if is_operator(&bytes[start..end]) {
                    TokenKind::Operator
                } else {
                    TokenKind::Operand
                };
                (kind, end)
            }
        };

        self.pos = end;
        Some(Token { kind, start, end })
    }

    /// Read an inline image whose `BI` was just consumed.
    fn inline_image(&mut self, parsed: &mut ParsedContent) {
        let bytes = self.bytes;
        let begin = self.pos;
        let mut entries = Vec::new();

        loop {
            let Some(token) = self.next_token() else {
                parsed.problems.push(format!("inline image at byte {begin} has no ID"));
                return;
            };
            match token.kind {
                TokenKind::Operator if &bytes[token.start..token.end] == b"ID" => break,
                TokenKind::Space => entries.push(b' '),
                _ => entries.extend_from_slice(&bytes[token.start..token.end]),
            }
        }

        // exactly one whitespace byte separates ID from the samples
        let data_start = match bytes.get(self.pos) {
            Some(&b) if is_white(b) => self.pos + 1,
            _ => self.pos,
        };
        let Some(ei) = find_end_marker(bytes, data_start) else {
            parsed.problems.push(format!("inline image at byte {begin} has no EI"));
            self.pos = bytes.len();
            return;
        };
        self.pos = ei + 2;

        entries.extend_from_slice(b" ID");
        let entries = match Content::decode(&entries).map(|c| c.operations) {
            Ok(mut ops) if ops.len() == 1 && ops[0].operator == "ID" => std::mem::take(&mut ops[0].operands),
            _ => {
                parsed.problems.push(format!("inline image at byte {begin} has an unreadable dictionary"));
                Vec::new()
            }
        };
        // the whitespace before EI is not part of the samples
        let data_end = if ei > data_start && is_white(bytes[ei - 1]) { ei - 1 } else { ei };
        parsed.items.push(ContentItem::InlineImage {
            entries,
            data: bytes[data_start..data_end.max(data_start)].to_vec(),
        });
    }
}

/// Offset just past the `)` closing the literal string opened at `start`.
fn literal_string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Position of the `EI` ending inline image samples that start at `from`:
/// preceded by whitespace and followed by whitespace, a delimiter or the end.
fn find_end_marker(bytes: &[u8], from: usize) -> Option<usize> {
    (from..bytes.len().saturating_sub(1)).find(|&i| {
        bytes[i] == b'E'
            && bytes[i + 1] == b'I'
            && (i == from || is_white(bytes[i - 1]))
            && bytes.get(i + 2).is_none_or(|&b| is_white(b) || is_delimiter(b))
    })
}
