use std::collections::VecDeque;

use regex::Regex;
use tracing::trace;

use crate::registry;
use crate::token::Token;
use crate::{ParseError, ScanErrorKind};

/// Lazy, forward-only lexer over one command line.
///
/// Tokens are produced on demand by [`Scanner::next_token`]. Range lexemes are
/// recognised by their first character; the first alphabetic run is looked up in the
/// command registry and handed to that command's scanner, after which the stream ends
/// with exactly one [`Token::Command`] followed by [`Token::Eof`].
#[derive(Debug)]
pub struct Scanner<'a> {
    source: &'a str,
    /// Start of the pending (not yet committed) span.
    start: usize,
    position: usize,
    /// Width of the last consumed char; zero once backed up, so backtrack is one level.
    last_width: usize,
    queued: VecDeque<Token>,
    finished: bool,
    exhausted: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            start: 0,
            position: 0,
            last_width: 0,
            queued: VecDeque::new(),
            finished: false,
            exhausted: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Byte offset of the next char to be consumed.
    pub fn offset(&self) -> usize {
        self.position
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    /// Input consumed since the last [`Scanner::ignore`].
    pub fn span(&self) -> &'a str {
        &self.source[self.start..self.position]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Next char, or `None` at end of input.
    pub fn consume(&mut self) -> Option<char> {
        match self.peek() {
            Some(c) => {
                self.last_width = c.len_utf8();
                self.position += self.last_width;
                Some(c)
            }
            None => {
                self.last_width = 0;
                None
            }
        }
    }

    /// Un-consume the last char. Consuming end of input leaves nothing to back up.
    pub fn backup(&mut self) {
        self.position -= self.last_width;
        self.last_width = 0;
    }

    /// Commit the pending span.
    pub fn ignore(&mut self) {
        self.start = self.position;
    }

    pub fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.consume();
        }
        self.ignore();
    }

    pub fn expect(&mut self, ch: char) -> Result<(), ParseError> {
        let at = self.position;
        match self.consume() {
            Some(c) if c == ch => Ok(()),
            _ => Err(ParseError::scan(
                ScanErrorKind::UnexpectedCharacter,
                at,
                &self.source[at..],
            )),
        }
    }

    /// Advance past a match of `re` that starts at the current position.
    pub fn expect_match<F>(&mut self, re: &Regex, on_error: F) -> Result<&'a str, ParseError>
    where
        F: FnOnce(&Self) -> ParseError,
    {
        let rest = self.rest();
        match re.find(rest) {
            Some(m) if m.start() == 0 => {
                self.position += m.end();
                self.last_width = 0;
                Ok(m.as_str())
            }
            _ => Err(on_error(&*self)),
        }
    }

    pub fn expect_eof(&mut self) -> Result<(), ParseError> {
        let at = self.position;
        match self.consume() {
            None => Ok(()),
            Some(_) => Err(ParseError::scan(
                ScanErrorKind::TrailingCharacters,
                at,
                &self.source[at..],
            )),
        }
    }

    /// Produce the next token. Keeps returning [`Token::Eof`] once the input is spent.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        if let Some(t) = self.queued.pop_front() {
            return Ok(t);
        }
        if self.finished {
            return Ok(Token::Eof);
        }

        self.skip_blanks();
        let at = self.position;
        let Some(c) = self.consume() else {
            self.finished = true;
            return Ok(Token::Eof);
        };

        let token = match c {
            '.' => Token::Dot,
            '$' => Token::Dollar,
            '%' => Token::Percent,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '0'..='9' => {
                self.backup();
                Token::Digits(self.scan_number(at)?)
            }
            '\'' => match self.consume() {
                Some(m) if !m.is_whitespace() => Token::Mark(m),
                _ => return Err(ParseError::scan(ScanErrorKind::MissingMark, at, &self.source[at..])),
            },
            '/' => Token::SearchForward(self.scan_pattern('/', at)?),
            '?' => Token::SearchBackward(self.scan_pattern('?', at)?),
            '+' | '-' => Token::Offset(self.scan_offset(c, at)?),
            c if c.is_ascii_alphabetic() => {
                self.backup();
                return self.scan_command();
            }
            _ => {
                return Err(ParseError::scan(
                    ScanErrorKind::UnexpectedCharacter,
                    at,
                    &self.source[at..],
                ))
            }
        };
        self.ignore();
        trace!(?token, at, "scanned range token");
        Ok(token)
    }

    fn scan_number(&mut self, at: usize) -> Result<usize, ParseError> {
        while matches!(self.consume(), Some('0'..='9')) {}
        self.backup();
        let digits = self.span();
        digits
            .parse()
            .map_err(|_| ParseError::scan(ScanErrorKind::MalformedNumber, at, digits))
    }

    fn scan_offset(&mut self, sign: char, at: usize) -> Result<i64, ParseError> {
        self.ignore();
        let count = match self.peek() {
            Some('0'..='9') => self.scan_number(at)?,
            _ => 1,
        };
        let count = i64::try_from(count)
            .map_err(|_| ParseError::scan(ScanErrorKind::MalformedNumber, at, &self.source[at..self.position]))?;
        Ok(if sign == '-' { -count } else { count })
    }

    /// Collect a search pattern up to the closing `delim`. `\delim` yields `delim`;
    /// other escapes are kept for the regex engine.
    fn scan_pattern(&mut self, delim: char, at: usize) -> Result<String, ParseError> {
        let mut pattern = String::new();
        loop {
            match self.consume() {
                None => {
                    return Err(ParseError::scan(
                        ScanErrorKind::UnterminatedPattern,
                        at,
                        &self.source[at..],
                    ))
                }
                Some('\\') => match self.consume() {
                    None => {
                        return Err(ParseError::scan(
                            ScanErrorKind::BadEscape,
                            self.position - 1,
                            "\\",
                        ))
                    }
                    Some(c) if c == delim => pattern.push(c),
                    Some(c) => {
                        pattern.push('\\');
                        pattern.push(c);
                    }
                },
                Some(c) if c == delim => return Ok(pattern),
                Some(c) => pattern.push(c),
            }
        }
    }

    fn scan_command(&mut self) -> Result<Token, ParseError> {
        let at = self.position;
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let spec = registry::lookup(&rest[..len])
            .ok_or_else(|| ParseError::scan(ScanErrorKind::UnknownCommand, at, rest))?;
        self.position += len;
        self.last_width = 0;
        self.ignore();

        let command = (spec.scan)(self, spec)?;
        if !self.rest().is_empty() {
            return Err(ParseError::scan(
                ScanErrorKind::TrailingCharacters,
                self.position,
                self.rest(),
            ));
        }
        self.finished = true;
        self.queued.push_back(Token::Eof);
        trace!(name = spec.name, "scanned command");
        Ok(Token::Command(command))
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, ParseError>;

    /// Yields tokens up to and including the first `Eof`, or the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Ok(Token::Eof) | Err(_)) {
            self.exhausted = true;
        }
        Some(item)
    }
}
