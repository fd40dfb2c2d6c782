use std::fmt;

use crate::token::{Command, Token};
use crate::ParseError;

/// How the end address is evaluated relative to the start address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `,`: both sides are resolved from the current line.
    Comma,
    /// `;`: the resolved start becomes the current line before the end is resolved.
    Semicolon,
}

/// The address part of a command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeNode {
    pub start: Vec<Token>,
    /// Offset override for the start side. Cleared whenever a new search anchor lands
    /// on that side.
    pub start_offset: Vec<Token>,
    pub end: Vec<Token>,
    pub end_offset: Vec<Token>,
    pub separator: Option<Separator>,
}

impl RangeNode {
    /// The address list and offset override list of one side.
    pub(crate) fn side_mut(&mut self, end: bool) -> (&mut Vec<Token>, &mut Vec<Token>) {
        if end {
            (&mut self.end, &mut self.end_offset)
        } else {
            (&mut self.start, &mut self.start_offset)
        }
    }

    fn validate(&self, source: &str) -> Result<(), ParseError> {
        for side in [&self.start, &self.end] {
            let bases = side.iter().filter(|t| t.is_base()).count();
            if bases > 1 {
                return Err(ParseError::BadRange(source.to_string()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for RangeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in self.start.iter().chain(&self.start_offset) {
            write!(f, "{t}")?;
        }
        match self.separator {
            Some(Separator::Comma) => f.write_str(",")?,
            Some(Separator::Semicolon) => f.write_str(";")?,
            None => {}
        }
        for t in self.end.iter().chain(&self.end_offset) {
            write!(f, "{t}")?;
        }
        Ok(())
    }
}

/// The result of parsing one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLineNode {
    pub line_range: Option<RangeNode>,
    pub command: Option<Command>,
}

impl CommandLineNode {
    pub(crate) fn range_mut(&mut self) -> &mut RangeNode {
        self.line_range.get_or_insert_with(RangeNode::default)
    }

    /// Structural checks run once, after the last token has been consumed.
    pub(crate) fn validate(&self, source: &str) -> Result<(), ParseError> {
        match &self.line_range {
            Some(r) => r.validate(source),
            None => Ok(()),
        }
    }
}

impl fmt::Display for CommandLineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(r) = &self.line_range {
            write!(f, "{r}")?;
        }
        if let Some(c) = &self.command {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: Vec<Token>, end: Vec<Token>) -> RangeNode {
        RangeNode {
            start,
            end,
            separator: Some(Separator::Comma),
            ..RangeNode::default()
        }
    }

    #[test]
    fn validate_accepts_base_followed_by_offsets_and_searches() {
        let r = range(
            vec![Token::Mark('a'), Token::SearchForward("x".into()), Token::Offset(2)],
            vec![Token::Offset(-1)],
        );
        assert!(r.validate("'a/x/+2,-1").is_ok());
    }

    #[test]
    fn validate_rejects_two_bases() {
        let r = range(vec![Token::Digits(1), Token::Dot], vec![]);
        assert_eq!(r.validate("1.,"), Err(ParseError::BadRange("1.,".into())));
    }

    #[test]
    fn validate_accepts_base_after_offset_or_search() {
        let r = range(
            vec![Token::SearchForward("foo".into()), Token::Digits(3)],
            vec![Token::Offset(1), Token::Mark('b')],
        );
        assert!(r.validate("/foo/3,+1'b").is_ok());
        let r = range(vec![Token::Percent, Token::Offset(1)], vec![]);
        assert!(r.validate("%+1,").is_ok());
    }

    #[test]
    fn display_renders_range() {
        let r = RangeNode {
            start: vec![Token::Dot, Token::Offset(3)],
            end: vec![Token::Dollar],
            separator: Some(Separator::Semicolon),
            ..RangeNode::default()
        };
        assert_eq!(r.to_string(), ".+3;$");
    }
}
