use tracing::debug;

use crate::commands::{self, Params};
use crate::scanner::Scanner;
use crate::token::Command;
use crate::ParseError;

/// Scans a command's arguments. Runs with the scanner positioned right after the
/// command name and must consume the rest of the line; the scanner then emits the
/// returned command followed by `Eof`.
pub type ScanFn = fn(&mut Scanner<'_>, &'static CommandSpec) -> Result<Command, ParseError>;

/// One registry entry.
#[derive(Debug)]
pub struct CommandSpec {
    /// Full command name.
    pub name: &'static str,
    /// Shortest accepted forms. Any prefix of `name` starting with one of these matches.
    pub abbreviations: &'static [&'static str],
    /// Operation identifier handed to the dispatcher.
    pub target: &'static str,
    pub scan: ScanFn,
}

impl CommandSpec {
    pub fn matches(&self, ident: &str) -> bool {
        ident == self.name
            || (self.name.starts_with(ident)
                && self.abbreviations.iter().any(|a| ident.starts_with(a)))
    }

    /// Build the command token for this entry.
    pub fn token(&self, forced: bool, params: Params) -> Command {
        Command {
            name: self.name,
            target: self.target,
            forced,
            params,
        }
    }
}

/// Every command the scanner knows.
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "write",
        abbreviations: &["w"],
        target: "ex_write",
        scan: commands::scan_write,
    },
    CommandSpec {
        name: "wq",
        abbreviations: &["wq"],
        target: "ex_write_and_quit",
        scan: commands::scan_write_and_quit,
    },
    CommandSpec {
        name: "xit",
        abbreviations: &["x"],
        target: "ex_exit",
        scan: commands::scan_write_and_quit,
    },
    CommandSpec {
        name: "exit",
        abbreviations: &["exi"],
        target: "ex_exit",
        scan: commands::scan_write_and_quit,
    },
    CommandSpec {
        name: "quit",
        abbreviations: &["q"],
        target: "ex_quit",
        scan: commands::scan_bang_only,
    },
    CommandSpec {
        name: "qall",
        abbreviations: &["qa"],
        target: "ex_quit_all",
        scan: commands::scan_bang_only,
    },
    CommandSpec {
        name: "quitall",
        abbreviations: &["quita"],
        target: "ex_quit_all",
        scan: commands::scan_bang_only,
    },
    CommandSpec {
        name: "wqall",
        abbreviations: &["wqa"],
        target: "ex_write_and_quit_all",
        scan: commands::scan_write_all,
    },
    CommandSpec {
        name: "xall",
        abbreviations: &["xa"],
        target: "ex_write_and_quit_all",
        scan: commands::scan_write_all,
    },
    CommandSpec {
        name: "only",
        abbreviations: &["on"],
        target: "ex_only",
        scan: commands::scan_bang_only,
    },
    CommandSpec {
        name: "edit",
        abbreviations: &["e"],
        target: "ex_edit",
        scan: commands::scan_edit,
    },
    CommandSpec {
        name: "nohlsearch",
        abbreviations: &["noh"],
        target: "ex_nohlsearch",
        scan: commands::scan_no_args,
    },
];

/// Find the entry for a typed command name (`"w"`, `"wri"`, `"wq"`, ...).
pub fn lookup(ident: &str) -> Option<&'static CommandSpec> {
    let spec = COMMANDS.iter().find(|c| c.matches(ident));
    if let Some(spec) = spec {
        debug!(ident, name = spec.name, "command lookup");
    }
    spec
}
