//! Symbol extraction.
//!
//! Locates entity and derived-alias declarations in a schema source without
//! parsing the language. A lexical pass marks comments and string literals;
//! declarations starting inside one are ignored. Alias statements are found
//! next and blanked out of a working copy, so the entity scan never sees them.
//! Entity bodies are then bounded by a bracket stack that skips strings,
//! comments and template literals, including `${ ... }` holes.
//!
//! Regex literals are not recognized. A bracket or quote inside one (`/[}]/`)
//! is read as code and can misplace a boundary.

use crate::core::catalog::{Catalog, DerivedAlias, Entity, Shape};
use crate::core::error::SplitError;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::iter::Peekable;
use std::sync::LazyLock;

static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+type\s+(\w+)\s*=\s*typeof\s+(\w+)\s*\.\s*\$infer(Select|Insert)\s*;?")
        .expect("static regex")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"export\s+const\s+(\w+)\s*=\s*\w*Table\s*(\()\s*["']([^"'\n]*)["']\s*,\s*\{"#)
        .expect("static regex")
});

/// Extract the full symbol catalog from `source`.
///
/// `origin` names the source in diagnostics (usually its path).
pub fn extract(source: &str, origin: &str) -> Result<Catalog, SplitError> {
    let inert = inert_spans(source);
    let aliases = find_aliases(source, &inert);
    let spans: Vec<(usize, usize)> = aliases
        .iter()
        .map(|a| (a.offset, a.offset + a.body_text.len()))
        .collect();
    let working = blank_spans(source, &spans);

    let mut entities: Vec<Entity> = Vec::new();
    let mut consumed = 0usize;
    for caps in ENTITY_RE.captures_iter(&working) {
        let (Some(whole), Some(paren)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let start = whole.start();
        // Builder calls nested inside an earlier body belong to that body.
        if start < consumed || within(&inert, start) {
            continue;
        }
        let name = caps[1].to_string();
        let end = find_declaration_end(&working, paren.start())
            .map_err(|reason| SplitError::UnterminatedDeclaration {
                name: name.clone(),
                reason,
            })?;

        let boundary = spans
            .iter()
            .filter(|(_, alias_end)| *alias_end <= start)
            .map(|(_, alias_end)| *alias_end)
            .chain(std::iter::once(consumed))
            .max()
            .unwrap_or(0);

        entities.push(Entity {
            name,
            physical_name: caps[3].to_string(),
            body_text: source[start..end].to_string(),
            leading_comment: leading_comment(source, boundary, start),
            offset: start,
        });
        consumed = end;
    }

    if entities.is_empty() {
        return Err(SplitError::NoEntitiesFound(origin.to_string()));
    }

    let mut seen = FxHashSet::default();
    for name in entities
        .iter()
        .map(|e| e.name.as_str())
        .chain(aliases.iter().map(|a| a.name.as_str()))
    {
        if !seen.insert(name) {
            return Err(SplitError::DuplicateSymbolName(name.to_string()));
        }
    }

    Ok(Catalog::new(entities, aliases))
}

fn find_aliases(source: &str, inert: &[(usize, usize)]) -> Vec<DerivedAlias> {
    ALIAS_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if within(inert, whole.start()) {
                return None;
            }
            Some(DerivedAlias {
                name: caps[1].to_string(),
                referenced_entity: caps[2].to_string(),
                shape: Shape::from_infer_suffix(&caps[3])?,
                body_text: whole.as_str().to_string(),
                resolved: false,
                offset: whole.start(),
            })
        })
        .collect()
}

/// Replace every non-newline char inside `spans` with a space.
///
/// Byte offsets are preserved so positions found in the result index the
/// unmodified input directly.
fn blank_spans(source: &str, spans: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for &(start, end) in spans {
        out.push_str(&source[cursor..start]);
        for ch in source[start..end].chars() {
            if ch == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
            }
        }
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    LineComment,
    BlockComment,
    Str(char),
}

/// Lexical position tracker shared by the comment pass and the body scanner.
struct Lexer {
    state: ScanState,
    /// One entry per open `${` hole: braces opened inside it and not yet closed.
    holes: Vec<usize>,
}

impl Lexer {
    fn new() -> Self {
        Self {
            state: ScanState::Code,
            holes: Vec::new(),
        }
    }

    /// Consume `ch` (and any char it pairs with). Returns true when `ch` is
    /// code, outside every comment and string.
    fn step<I>(&mut self, ch: char, chars: &mut Peekable<I>) -> bool
    where
        I: Iterator<Item = (usize, char)>,
    {
        let next = chars.peek().map(|(_, c)| *c);
        match self.state {
            ScanState::LineComment => {
                if ch == '\n' {
                    self.state = ScanState::Code;
                }
                false
            }
            ScanState::BlockComment => {
                if ch == '*' && next == Some('/') {
                    chars.next();
                    self.state = ScanState::Code;
                }
                false
            }
            ScanState::Str(quote) => {
                if ch == '\\' {
                    chars.next();
                } else if quote == '`' && ch == '$' && next == Some('{') {
                    chars.next();
                    self.holes.push(0);
                    self.state = ScanState::Code;
                } else if ch == quote {
                    self.state = ScanState::Code;
                }
                false
            }
            ScanState::Code => match ch {
                '"' | '\'' | '`' => {
                    self.state = ScanState::Str(ch);
                    false
                }
                '/' if next == Some('/') => {
                    self.state = ScanState::LineComment;
                    false
                }
                '/' if next == Some('*') => {
                    chars.next();
                    self.state = ScanState::BlockComment;
                    false
                }
                '{' => {
                    if let Some(open) = self.holes.last_mut() {
                        *open += 1;
                    }
                    true
                }
                '}' => match self.holes.last().copied() {
                    Some(0) => {
                        self.holes.pop();
                        self.state = ScanState::Str('`');
                        false
                    }
                    Some(open) => {
                        if let Some(last) = self.holes.last_mut() {
                            *last = open - 1;
                        }
                        true
                    }
                    None => true,
                },
                _ => true,
            },
        }
    }
}

/// Byte ranges of `text` covered by comments and string literals, in order.
/// A template hole's contents are code and split its literal into two ranges.
fn inert_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut lexer = Lexer::new();
    let mut open: Option<usize> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((at, ch)) = chars.next() {
        let was_code = lexer.state == ScanState::Code;
        lexer.step(ch, &mut chars);
        let is_code = lexer.state == ScanState::Code;
        if was_code && !is_code {
            open = Some(at);
        } else if !was_code && is_code {
            let end = chars.peek().map_or(text.len(), |(next, _)| *next);
            spans.push((open.take().unwrap_or(at), end));
        }
    }
    if let Some(start) = open {
        spans.push((start, text.len()));
    }
    spans
}

fn within(spans: &[(usize, usize)], pos: usize) -> bool {
    let idx = spans.partition_point(|&(_, end)| end <= pos);
    spans.get(idx).is_some_and(|&(start, _)| start <= pos)
}

/// Given the byte index of the builder call's `(`, return the byte index just
/// past its matching `)` plus an optional trailing `;`.
fn find_declaration_end(text: &str, open: usize) -> Result<usize, String> {
    let mut stack: Vec<char> = Vec::new();
    let mut lexer = Lexer::new();
    let mut chars = text[open..].char_indices().peekable();

    while let Some((rel, ch)) = chars.next() {
        if !lexer.step(ch, &mut chars) {
            continue;
        }
        match ch {
            '(' | '{' | '[' => stack.push(ch),
            ')' | '}' | ']' => {
                let expected = match stack.pop() {
                    Some('(') => ')',
                    Some('{') => '}',
                    Some('[') => ']',
                    _ => return Err(format!("unexpected `{}`", ch)),
                };
                if ch != expected {
                    return Err(format!("expected `{}` but found `{}`", expected, ch));
                }
                if stack.is_empty() {
                    let mut end = open + rel + 1;
                    let rest = &text[end..];
                    let trimmed = rest.trim_start_matches([' ', '\t']);
                    if trimmed.starts_with(';') {
                        end += rest.len() - trimmed.len() + 1;
                    }
                    return Ok(end);
                }
            }
            _ => {}
        }
    }

    Err(match lexer.state {
        ScanState::Str(q) => format!("string opened with {} never closes", q),
        ScanState::BlockComment => "block comment never closes".to_string(),
        _ => format!("{} bracket(s) still open at end of input", stack.len()),
    })
}

/// The run of `//` lines directly above `start`, bounded below by `boundary`.
/// Blank lines may separate the run from the declaration.
fn leading_comment(source: &str, boundary: usize, start: usize) -> Option<String> {
    let mut gap = &source[boundary..start];
    // A partial first line belongs to whatever ended at `boundary`.
    if boundary > 0 && !source[..boundary].ends_with('\n') {
        gap = match gap.find('\n') {
            Some(nl) => &gap[nl + 1..],
            None => return None,
        };
    }

    let mut run: Vec<&str> = Vec::new();
    let mut lines = gap.lines().rev().peekable();
    while lines.peek().is_some_and(|l| l.trim().is_empty()) {
        lines.next();
    }
    for line in lines {
        if line.trim_start().starts_with("//") {
            run.push(line.trim_end());
        } else {
            break;
        }
    }

    if run.is_empty() {
        return None;
    }
    run.reverse();
    Some(run.join("\n"))
}
