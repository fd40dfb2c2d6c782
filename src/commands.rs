use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::registry::CommandSpec;
use crate::scanner::Scanner;
use crate::token::Command;
use crate::{ParseError, ScanErrorKind};

/// Arguments collected by a command's scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Params {
    #[default]
    None,
    /// `:wq [file]`, `:e [file]`, ...
    File { file: Option<String> },
    /// `:w [>>] [file]`
    Write { file: Option<String>, append: bool },
}

impl Params {
    pub fn file(&self) -> Option<&str> {
        match self {
            Params::None => None,
            Params::File { file } | Params::Write { file, .. } => file.as_deref(),
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Params::Write { append: true, .. } = self {
            f.write_str(" >>")?;
        }
        if let Some(file) = self.file() {
            write!(f, " {file}")?;
        }
        Ok(())
    }
}

/// A `++opt[=value]` file option, with its name expanded to the long form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlusPlusOpt {
    name: &'static str,
    value: Option<String>,
}

impl fmt::Display for PlusPlusOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "++{}", self.name)?;
        if let Some(v) = &self.value {
            write!(f, "={v}")?;
        }
        Ok(())
    }
}

static PLUS_PLUS_OPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(?:f(?:ile)?f(?:ormat)?|(?:file)?enc(?:oding)?|(?:no)?bin(?:ary)?|bad|edit)")
        .expect("valid ++opt regex")
});

static OPT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[^\s]+").expect("valid ++opt value regex"));

static REST_OF_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A.+").expect("valid catch-all regex"));

fn invalid_argument(state: &Scanner<'_>) -> ParseError {
    ParseError::scan(ScanErrorKind::InvalidArgument, state.offset(), state.rest())
}

/// Long name for a matched `++opt` name, and whether it takes `=value`.
fn expand_opt_name(name: &str) -> Option<(&'static str, bool)> {
    Some(match name {
        "ff" | "fformat" | "fileformat" => ("fileformat", true),
        "enc" | "encoding" | "fileenc" | "fileencoding" => ("fileencoding", true),
        "bin" | "binary" => ("binary", false),
        "nobin" | "nobinary" => ("nobinary", false),
        "bad" => ("bad", true),
        "edit" => ("edit", false),
        _ => return None,
    })
}

/// Parse `++opt[=value]` at the current position.
fn scan_plus_plus_opt(state: &mut Scanner<'_>) -> Result<PlusPlusOpt, ParseError> {
    let at = state.offset();
    state.expect('+')?;
    state.expect('+')?;
    state.ignore();
    let matched = state.expect_match(&PLUS_PLUS_OPT, invalid_argument)?;
    let (name, takes_value) = expand_opt_name(matched)
        .ok_or_else(|| ParseError::scan(ScanErrorKind::InvalidArgument, at, matched))?;

    let value = match state.peek() {
        None | Some(' ' | '\t') => None,
        Some('=') if takes_value => {
            state.consume();
            state.ignore();
            Some(state.expect_match(&OPT_VALUE, invalid_argument)?.to_string())
        }
        Some(_) => {
            return Err(ParseError::scan(
                ScanErrorKind::InvalidArgument,
                at,
                &state.source()[at..],
            ))
        }
    };
    if takes_value && value.is_none() {
        return Err(ParseError::scan(
            ScanErrorKind::InvalidArgument,
            at,
            &state.source()[at..],
        ));
    }
    state.ignore();
    Ok(PlusPlusOpt { name, value })
}

/// `++opt` parses, but no command acts on it yet.
fn reject_plus_plus_opt(state: &mut Scanner<'_>) -> ParseError {
    match scan_plus_plus_opt(state) {
        Ok(opt) => ParseError::Unsupported(format!("[++opt] {opt}")),
        Err(e) => e,
    }
}

/// A `!` directly after the command name.
fn scan_bang(state: &mut Scanner<'_>) -> bool {
    match state.consume() {
        Some('!') => {
            state.ignore();
            true
        }
        Some(_) => {
            state.backup();
            false
        }
        None => false,
    }
}

/// Free-form trailing argument, if any.
fn scan_file(state: &mut Scanner<'_>) -> Result<Option<String>, ParseError> {
    state.skip_blanks();
    if state.peek().is_none() {
        return Ok(None);
    }
    let file = state.expect_match(&REST_OF_LINE, invalid_argument)?.trim();
    state.ignore();
    Ok((!file.is_empty()).then(|| file.to_string()))
}

/// `:q[uit][!]`, `:on[ly][!]`, `:qa[ll][!]`
pub(crate) fn scan_bang_only(
    state: &mut Scanner<'_>,
    spec: &'static CommandSpec,
) -> Result<Command, ParseError> {
    let forced = scan_bang(state);
    state.skip_blanks();
    state.expect_eof()?;
    Ok(spec.token(forced, Params::None))
}

/// `:noh[lsearch]`
pub(crate) fn scan_no_args(
    state: &mut Scanner<'_>,
    spec: &'static CommandSpec,
) -> Result<Command, ParseError> {
    state.skip_blanks();
    state.expect_eof()?;
    Ok(spec.token(false, Params::None))
}

/// `:wq[!] [++opt] [file]`, `:x[it]`, `:exi[t]`
pub(crate) fn scan_write_and_quit(
    state: &mut Scanner<'_>,
    spec: &'static CommandSpec,
) -> Result<Command, ParseError> {
    let forced = scan_bang(state);
    state.skip_blanks();
    if state.rest().starts_with("++") {
        return Err(reject_plus_plus_opt(state));
    }
    let file = scan_file(state)?;
    Ok(spec.token(forced, Params::File { file }))
}

/// `:wqa[ll][!] [++opt]`, `:xa[ll][!] [++opt]`
pub(crate) fn scan_write_all(
    state: &mut Scanner<'_>,
    spec: &'static CommandSpec,
) -> Result<Command, ParseError> {
    let forced = scan_bang(state);
    state.skip_blanks();
    if state.rest().starts_with("++") {
        return Err(reject_plus_plus_opt(state));
    }
    state.expect_eof()?;
    Ok(spec.token(forced, Params::None))
}

/// `:w[rite][!] [++opt] [>>] [file]`
pub(crate) fn scan_write(
    state: &mut Scanner<'_>,
    spec: &'static CommandSpec,
) -> Result<Command, ParseError> {
    let forced = scan_bang(state);
    state.skip_blanks();
    if state.rest().starts_with("++") {
        return Err(reject_plus_plus_opt(state));
    }
    if state.peek() == Some('!') {
        return Err(ParseError::Unsupported(format!(
            ":write !{{cmd}}: {}",
            &state.rest()[1..]
        )));
    }
    let append = state.rest().starts_with(">>");
    if append {
        state.expect('>')?;
        state.expect('>')?;
        state.ignore();
    }
    let file = scan_file(state)?;
    Ok(spec.token(forced, Params::Write { file, append }))
}

/// `:e[dit][!] [++opt] [+cmd] [file]`
pub(crate) fn scan_edit(
    state: &mut Scanner<'_>,
    spec: &'static CommandSpec,
) -> Result<Command, ParseError> {
    let forced = scan_bang(state);
    state.skip_blanks();
    if state.rest().starts_with("++") {
        return Err(reject_plus_plus_opt(state));
    }
    if state.peek() == Some('+') {
        return Err(ParseError::Unsupported(format!("[+cmd] {}", state.rest())));
    }
    let file = scan_file(state)?;
    Ok(spec.token(forced, Params::File { file }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::lookup;
    use crate::token::Token;

    fn scan_cmd(line: &str) -> Result<Command, ParseError> {
        let mut s = Scanner::new(line);
        match s.next_token()? {
            Token::Command(c) => {
                assert_eq!(s.next_token()?, Token::Eof);
                Ok(c)
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    fn kind(e: ParseError) -> ScanErrorKind {
        match e {
            ParseError::Scan { kind, .. } => kind,
            other => panic!("expected scan error, got {other:?}"),
        }
    }

    #[test]
    fn write_and_quit_variants() {
        let c = scan_cmd("wq").unwrap();
        assert!(!c.forced);
        assert_eq!(c.params, Params::File { file: None });

        let c = scan_cmd("wq!").unwrap();
        assert!(c.forced);
        assert_eq!(c.params.file(), None);

        let c = scan_cmd("wq! foo.txt ").unwrap();
        assert!(c.forced);
        assert_eq!(c.params.file(), Some("foo.txt"));

        let c = scan_cmd("wq my file.txt").unwrap();
        assert!(!c.forced);
        assert_eq!(c.params.file(), Some("my file.txt"));
    }

    #[test]
    fn plus_plus_opt_is_expanded_then_rejected() {
        assert_eq!(
            scan_cmd("wq ++ff=unix").unwrap_err(),
            ParseError::Unsupported("[++opt] ++fileformat=unix".into())
        );
        assert_eq!(
            scan_cmd("wq! ++nobin foo").unwrap_err(),
            ParseError::Unsupported("[++opt] ++nobinary".into())
        );
        assert_eq!(
            scan_cmd("e ++enc=latin1 x").unwrap_err(),
            ParseError::Unsupported("[++opt] ++fileencoding=latin1".into())
        );
        assert!(scan_cmd("wqa ++bin").unwrap_err().is_unsupported());
    }

    #[test]
    fn bad_plus_plus_opt_is_invalid_argument() {
        assert_eq!(kind(scan_cmd("wq ++foo").unwrap_err()), ScanErrorKind::InvalidArgument);
        assert_eq!(kind(scan_cmd("wq ++ffx").unwrap_err()), ScanErrorKind::InvalidArgument);
        assert_eq!(kind(scan_cmd("wq ++bin=1").unwrap_err()), ScanErrorKind::InvalidArgument);
        assert_eq!(kind(scan_cmd("wq ++ff").unwrap_err()), ScanErrorKind::InvalidArgument);
        assert_eq!(kind(scan_cmd("wq ++fileff=unix").unwrap_err()), ScanErrorKind::InvalidArgument);
    }

    #[test]
    fn bad_plus_plus_opt_reports_where_it_failed() {
        match scan_cmd("wq ++foo").unwrap_err() {
            ParseError::Scan { position, text, .. } => {
                assert_eq!(position, 5);
                assert_eq!(text, "foo");
            }
            other => panic!("expected scan error, got {other:?}"),
        }
        match scan_cmd("wq ++bin=1").unwrap_err() {
            ParseError::Scan { position, text, .. } => {
                assert_eq!(position, 3);
                assert_eq!(text, "++bin=1");
            }
            other => panic!("expected scan error, got {other:?}"),
        }
    }

    #[test]
    fn expand_known_option_names() {
        assert_eq!(expand_opt_name("fformat"), Some(("fileformat", true)));
        assert_eq!(expand_opt_name("nobin"), Some(("nobinary", false)));
        assert_eq!(expand_opt_name("edit"), Some(("edit", false)));
        assert_eq!(expand_opt_name("utf8"), None);
    }

    #[test]
    fn bang_only_commands_reject_arguments() {
        let c = scan_cmd("only!").unwrap();
        assert!(c.forced);
        assert_eq!(c.target, "ex_only");
        assert!(!scan_cmd("q").unwrap().forced);
        assert_eq!(kind(scan_cmd("only x").unwrap_err()), ScanErrorKind::TrailingCharacters);
        assert_eq!(kind(scan_cmd("q!!").unwrap_err()), ScanErrorKind::TrailingCharacters);
    }

    #[test]
    fn nohlsearch_takes_nothing() {
        assert_eq!(scan_cmd("noh").unwrap().target, "ex_nohlsearch");
        assert!(scan_cmd("noh!").is_err());
    }

    #[test]
    fn write_append_and_shell_filter() {
        let c = scan_cmd("w >> log.txt").unwrap();
        assert_eq!(
            c.params,
            Params::Write {
                file: Some("log.txt".into()),
                append: true
            }
        );
        let c = scan_cmd("w!>>").unwrap();
        assert!(c.forced);
        assert_eq!(c.params, Params::Write { file: None, append: true });
        assert!(scan_cmd("w !sort").unwrap_err().is_unsupported());
    }

    #[test]
    fn edit_plus_cmd_is_unsupported() {
        assert!(scan_cmd("e +10 foo").unwrap_err().is_unsupported());
        let c = scan_cmd("e! #").unwrap();
        assert!(c.forced);
        assert_eq!(c.params.file(), Some("#"));
    }

    #[test]
    fn params_display() {
        let spec = lookup("w").unwrap();
        let c = spec.token(
            true,
            Params::Write {
                file: Some("a".into()),
                append: true,
            },
        );
        assert_eq!(c.to_string(), "write! >> a");
    }
}
