use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::node::{RangeNode, Separator};
use crate::token::Token;

/// Line-oriented view of the text a range is resolved against.
///
/// Line numbers are 1-based; line 0 is the position before the first line.
pub trait Buffer {
    fn line_count(&self) -> usize;
    fn line(&self, lineno: usize) -> Option<&str>;
    fn current_line(&self) -> usize;
    fn mark(&self, name: char) -> Option<usize>;
}

/// In-memory [`Buffer`].
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    lines: Vec<String>,
    current: usize,
    marks: HashMap<char, usize>,
}

impl LineBuffer {
    pub fn new(text: &str, current: usize) -> Self {
        Self {
            lines: text.lines().map(|l| l.to_string()).collect(),
            current,
            marks: HashMap::new(),
        }
    }

    pub fn with_mark(mut self, name: char, lineno: usize) -> Self {
        self.marks.insert(name, lineno);
        self
    }
}

impl Buffer for LineBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, lineno: usize) -> Option<&str> {
        lineno
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(|l| l.as_str())
    }

    fn current_line(&self) -> usize {
        self.current
    }

    fn mark(&self, name: char) -> Option<usize> {
        self.marks.get(&name).copied()
    }
}

/// Inclusive, 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("E20: Mark not set: '{0}")]
    MarkNotSet(char),

    #[error("E486: Pattern not found: {0}")]
    PatternNotFound(String),

    #[error("E35: No previous regular expression")]
    NoPreviousPattern,

    #[error("invalid regex: {0}")]
    InvalidPattern(String),

    #[error("E16: Invalid range: line {0} is outside the buffer")]
    InvalidRange(i64),

    #[error("E493: Backwards range given: {start},{end}")]
    BackwardsRange { start: usize, end: usize },
}

/// Resolve a parsed range to concrete line numbers.
///
/// An empty side means the current line. With `;` the resolved start becomes the
/// current line before the end side is resolved.
pub fn resolve_range(range: &RangeNode, buf: &impl Buffer) -> Result<LineRange, ResolveError> {
    let current = buf.current_line();
    let start = resolve_side(&range.start, &range.start_offset, current, buf, false)?;

    let end_current = match range.separator {
        Some(Separator::Semicolon) => start,
        _ => current,
    };
    let end = if range.end.is_empty() && range.end_offset.is_empty() {
        match range.separator {
            _ if range.start.first() == Some(&Token::Percent) => buf.line_count(),
            Some(_) => end_current,
            None => start,
        }
    } else {
        resolve_side(&range.end, &range.end_offset, end_current, buf, true)?
    };

    if start > end {
        return Err(ResolveError::BackwardsRange { start, end });
    }
    debug!(%range, start, end, "resolved range");
    Ok(LineRange { start, end })
}

fn resolve_side(
    tokens: &[Token],
    offsets: &[Token],
    current: usize,
    buf: &impl Buffer,
    is_end: bool,
) -> Result<usize, ResolveError> {
    let last = buf.line_count();
    let mut line: Option<usize> = None;
    for token in tokens.iter().chain(offsets) {
        let at = line.unwrap_or(current);
        line = Some(match token {
            Token::Dot => current,
            Token::Dollar => last,
            Token::Digits(n) => *n,
            Token::Percent if is_end => last,
            Token::Percent => 1,
            Token::Mark(name) => buf.mark(*name).ok_or(ResolveError::MarkNotSet(*name))?,
            Token::Offset(n) => apply_offset(at, *n)?,
            Token::SearchForward(p) => search(buf, p, at, true)?,
            Token::SearchBackward(p) => search(buf, p, at, false)?,
            Token::Eof | Token::Comma | Token::Semicolon | Token::Command(_) => at,
        });
    }
    let line = line.unwrap_or(current);
    if line > last {
        return Err(ResolveError::InvalidRange(
            i64::try_from(line).unwrap_or(i64::MAX),
        ));
    }
    Ok(line)
}

fn apply_offset(line: usize, offset: i64) -> Result<usize, ResolveError> {
    let line = i64::try_from(line).unwrap_or(i64::MAX);
    let target = line
        .checked_add(offset)
        .ok_or(ResolveError::InvalidRange(if offset < 0 { i64::MIN } else { i64::MAX }))?;
    usize::try_from(target).map_err(|_| ResolveError::InvalidRange(target))
}

fn build_regex(pattern: &str) -> Result<Regex, ResolveError> {
    if pattern.is_empty() {
        return Err(ResolveError::NoPreviousPattern);
    }
    Regex::new(pattern).map_err(|e| ResolveError::InvalidPattern(e.to_string()))
}

/// Nearest matching line after (or before) `from`, wrapping around the buffer.
fn search(buf: &impl Buffer, pattern: &str, from: usize, forward: bool) -> Result<usize, ResolveError> {
    let re = build_regex(pattern)?;
    let count = buf.line_count();
    if count == 0 {
        return Err(ResolveError::PatternNotFound(pattern.to_string()));
    }
    let from = from.min(count);
    for step in 1..=count {
        // Forward from line 0 checks line 1 first.
        let lineno = if forward {
            (from + step - 1) % count + 1
        } else {
            (from.max(1) - 1 + count - step % count) % count + 1
        };
        if buf.line(lineno).is_some_and(|l| re.is_match(l)) {
            return Ok(lineno);
        }
    }
    Err(ResolveError::PatternNotFound(pattern.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    const TEXT: &str = "one\ntwo\nthree\nfour\nfive\nsix\n";

    fn resolve(line: &str, current: usize) -> Result<(usize, usize), ResolveError> {
        let buf = LineBuffer::new(TEXT, current).with_mark('a', 2);
        let node = parse(line).unwrap();
        let range = node.line_range.unwrap_or_default();
        resolve_range(&range, &buf).map(|r| (r.start, r.end))
    }

    #[test]
    fn absolute_addresses() {
        assert_eq!(resolve("3", 1), Ok((3, 3)));
        assert_eq!(resolve(".", 4), Ok((4, 4)));
        assert_eq!(resolve("$", 1), Ok((6, 6)));
        assert_eq!(resolve("%", 3), Ok((1, 6)));
        assert_eq!(resolve("'a,$", 1), Ok((2, 6)));
        assert_eq!(resolve("", 5), Ok((5, 5)));
    }

    #[test]
    fn offsets_apply_to_what_the_side_resolved_to() {
        assert_eq!(resolve(".+2", 1), Ok((3, 3)));
        assert_eq!(resolve("+", 1), Ok((2, 2)));
        assert_eq!(resolve("'a-1,.", 3), Ok((1, 3)));
        assert_eq!(resolve("-5", 2), Err(ResolveError::InvalidRange(-3)));
        assert_eq!(resolve("9", 1), Err(ResolveError::InvalidRange(9)));
    }

    #[test]
    fn offset_overflow_is_an_invalid_range() {
        assert_eq!(
            resolve("+9223372036854775807", 1),
            Err(ResolveError::InvalidRange(i64::MAX))
        );
        assert_eq!(
            resolve(".+9223372036854775807+1", 6),
            Err(ResolveError::InvalidRange(i64::MAX))
        );
        assert_eq!(
            resolve("18446744073709551615", 1),
            Err(ResolveError::InvalidRange(i64::MAX))
        );
    }

    #[test]
    fn searches_wrap_around() {
        assert_eq!(resolve("/f/", 1), Ok((4, 4)));
        assert_eq!(resolve("/f/", 5), Ok((4, 4)));
        assert_eq!(resolve("?t?", 2), Ok((3, 3)));
        assert_eq!(resolve("?t?", 4), Ok((3, 3)));
        assert_eq!(resolve("/one/", 1), Ok((1, 1)));
        assert_eq!(resolve("3/f/", 1), Ok((4, 4)));
        assert_eq!(resolve("0/one/", 3), Ok((1, 1)));
        assert_eq!(resolve("0/o/", 3), Ok((1, 1)));
        assert_eq!(resolve("0?o?", 3), Ok((4, 4)));
        assert_eq!(
            resolve("/zzz/", 1),
            Err(ResolveError::PatternNotFound("zzz".into()))
        );
    }

    #[test]
    fn semicolon_moves_the_current_line() {
        assert_eq!(
            resolve("4,+1", 1),
            Err(ResolveError::BackwardsRange { start: 4, end: 2 })
        );
        assert_eq!(resolve("4;+1", 1), Ok((4, 5)));
        assert_eq!(resolve("2;/f/", 5), Ok((2, 4)));
        assert_eq!(resolve("2,", 5), Ok((2, 5)));
        assert_eq!(resolve("2;", 5), Ok((2, 2)));
    }

    #[test]
    fn unset_mark_and_empty_pattern() {
        assert_eq!(resolve("'z", 1), Err(ResolveError::MarkNotSet('z')));
        assert_eq!(resolve("//", 1), Err(ResolveError::NoPreviousPattern));
        assert!(matches!(resolve("/(/", 1), Err(ResolveError::InvalidPattern(_))));
    }

    #[test]
    fn line_buffer_is_one_based() {
        let buf = LineBuffer::new("a\nb", 1);
        assert_eq!(buf.line(0), None);
        assert_eq!(buf.line(1), Some("a"));
        assert_eq!(buf.line(3), None);
    }
}
