use std::fmt;

use crate::commands::Params;

/// A lexical unit of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Eof,
    Digits(usize),
    Dot,
    Dollar,
    Percent,
    Comma,
    Semicolon,
    Mark(char),
    /// `+n` / `-n`; a bare sign counts as 1.
    Offset(i64),
    SearchForward(String),
    SearchBackward(String),
    Command(Command),
}

impl Token {
    /// Absolute line references. A range side holds at most one of these.
    pub fn is_base(&self) -> bool {
        matches!(
            self,
            Token::Digits(_) | Token::Dot | Token::Dollar | Token::Percent | Token::Mark(_)
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => Ok(()),
            Token::Digits(n) => write!(f, "{n}"),
            Token::Dot => f.write_str("."),
            Token::Dollar => f.write_str("$"),
            Token::Percent => f.write_str("%"),
            Token::Comma => f.write_str(","),
            Token::Semicolon => f.write_str(";"),
            Token::Mark(c) => write!(f, "'{c}"),
            Token::Offset(n) if *n < 0 => write!(f, "{n}"),
            Token::Offset(n) => write!(f, "+{n}"),
            Token::SearchForward(p) => write!(f, "/{}/", p.replace('/', "\\/")),
            Token::SearchBackward(p) => write!(f, "?{}?", p.replace('?', "\\?")),
            Token::Command(c) => write!(f, "{c}"),
        }
    }
}

/// A recognised command together with the arguments its scanner collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Canonical name from the registry (`"wq"`, `"write"`, ...).
    pub name: &'static str,
    /// Operation the dispatcher should run (`"ex_write_and_quit"`, ...).
    pub target: &'static str,
    /// Trailing `!` on the command name.
    pub forced: bool,
    pub params: Params,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        if self.forced {
            f.write_str("!")?;
        }
        write!(f, "{}", self.params)
    }
}
