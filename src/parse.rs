use tracing::{debug, trace};

use crate::node::{CommandLineNode, Separator};
use crate::scanner::Scanner;
use crate::token::Token;
use crate::ParseError;

/// Per-parse state, owned by a single call to [`parse`].
#[derive(Debug)]
pub struct ParserState<'a> {
    scanner: Scanner<'a>,
    /// Which side of the range the next address lands on.
    filling_end: bool,
    source: &'a str,
}

impl<'a> ParserState<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            scanner: Scanner::new(source),
            filling_end: false,
            source,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn filling_end(&self) -> bool {
        self.filling_end
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.scanner.next_token()
    }

    fn bad_range(&self) -> ParseError {
        ParseError::BadRange(self.source.to_string())
    }
}

/// What the parse loop runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    LineRef,
    Done,
}

/// Parse one command line (without the leading `:`).
///
/// Either the whole line parses or an error is returned; there are no partial results.
pub fn parse(source: &str) -> Result<CommandLineNode, ParseError> {
    let mut state = ParserState::new(source);
    let mut node = CommandLineNode::default();
    let mut step = Step::LineRef;
    while step != Step::Done {
        step = match step {
            Step::LineRef => parse_line_ref(&mut state, &mut node)?,
            Step::Done => Step::Done,
        };
    }
    node.validate(source)?;
    debug!(source, parsed = %node, "parsed command line");
    Ok(node)
}

fn parse_line_ref(state: &mut ParserState<'_>, node: &mut CommandLineNode) -> Result<Step, ParseError> {
    let token = state.next_token()?;
    trace!(?token, filling_end = state.filling_end, "range token");
    match token {
        Token::Eof => return Ok(Step::Done),
        Token::Command(command) => {
            node.command = Some(command);
            return Ok(Step::Done);
        }
        Token::Comma => separate(state, node, Separator::Comma),
        Token::Semicolon => separate(state, node, Separator::Semicolon),
        address => push_address(state, node, address)?,
    }
    Ok(Step::LineRef)
}

/// `:1,2,3,4` keeps flipping sides; with digit replacement it ends up as `:3,4`.
fn separate(state: &mut ParserState<'_>, node: &mut CommandLineNode, separator: Separator) {
    node.range_mut().separator = Some(separator);
    state.filling_end = !state.filling_end;
}

fn push_address(
    state: &ParserState<'_>,
    node: &mut CommandLineNode,
    token: Token,
) -> Result<(), ParseError> {
    let (side, offsets) = node.range_mut().side_mut(state.filling_end);
    let last = side.last();
    match token {
        Token::Dot => {
            if matches!(last, Some(Token::Offset(_))) {
                return Err(state.bad_range());
            }
        }
        Token::Offset(_) => {
            if last == Some(&Token::Dollar) {
                return Err(state.bad_range());
            }
        }
        Token::Percent | Token::Dollar => {
            if last.is_some() {
                return Err(state.bad_range());
            }
        }
        Token::Digits(_) => match last {
            Some(Token::Dot) => return Err(state.bad_range()),
            Some(Token::Digits(_)) => side.clear(),
            _ => {}
        },
        Token::SearchForward(_) | Token::SearchBackward(_) => {
            if last.is_some() {
                offsets.clear();
            }
        }
        Token::Mark(_) => {}
        Token::Eof | Token::Comma | Token::Semicolon | Token::Command(_) => {
            unreachable!("not an address: {token:?}")
        }
    }
    side.push(token);
    Ok(())
}
