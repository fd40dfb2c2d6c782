use std::env;
use std::fs;
use std::io::{self, BufRead};
use std::process;

use tracing::{info, Level};

use excmd::{parse, resolve_range, strip_prompt, CommandLineNode, LineBuffer, Params, RangeNode};

fn usage() {
    eprintln!(
        "Usage: excmd [--resolve FILE] [--line N] [--verbose] [command-line...]\n\n\
         Parses each Ex command line and prints its range and command.\n\
         - Command lines come from argv, or from stdin (one per line) when none are given.\n\
         - A leading ':' is optional.\n\n\
         With --resolve, ranges are also resolved against the lines of FILE;\n\
         --line sets the current line (default 1)."
    );
}

fn describe(node: &CommandLineNode) -> String {
    let range = node
        .line_range
        .as_ref()
        .map(|r| r.to_string())
        .unwrap_or_default();
    let mut out = format!("range={range:?}");
    match &node.command {
        Some(c) => {
            out.push_str(&format!(
                " command={} target={} forced={}",
                c.name, c.target, c.forced
            ));
            if let Some(file) = c.params.file() {
                out.push_str(&format!(" file={file:?}"));
            }
            if let Params::Write { append: true, .. } = &c.params {
                out.push_str(" append=true");
            }
        }
        None => out.push_str(" command=none"),
    }
    out
}

fn read_buffer(path: &str, current: usize) -> LineBuffer {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: failed to read {path}: {e}");
            process::exit(1);
        }
    };
    if bytes.iter().any(|&b| b == 0) {
        eprintln!("error: binary file rejected (NUL byte found)");
        process::exit(1);
    }
    match String::from_utf8(bytes) {
        Ok(text) => LineBuffer::new(&text, current),
        Err(_) => {
            eprintln!("error: non-UTF8 file rejected");
            process::exit(1);
        }
    }
}

fn run_line(line: &str, buffer: Option<&LineBuffer>) {
    let line = strip_prompt(line);
    let node = match parse(line) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    };
    let mut out = describe(&node);

    if let Some(buf) = buffer {
        let range = node.line_range.clone().unwrap_or_else(RangeNode::default);
        match resolve_range(&range, buf) {
            Ok(r) => out.push_str(&format!(" lines={},{}", r.start, r.end)),
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(2);
            }
        }
    }
    println!("{out}");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut resolve_path: Option<String> = None;
    let mut current_line: usize = 1;
    let mut verbose = false;

    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "--resolve" => {
                let Some(path) = args.get(idx + 1) else {
                    eprintln!("error: --resolve requires a file");
                    process::exit(2);
                };
                resolve_path = Some(path.clone());
                idx += 2;
            }
            "--line" => {
                current_line = match args.get(idx + 1).map(|s| s.parse::<usize>()) {
                    Some(Ok(n)) => n,
                    _ => {
                        eprintln!("error: --line requires a line number");
                        process::exit(2);
                    }
                };
                idx += 2;
            }
            "--verbose" | "-v" => {
                verbose = true;
                idx += 1;
            }
            "--help" | "-h" => {
                usage();
                return;
            }
            "--" => {
                idx += 1;
                break;
            }
            s if s.starts_with("--") => {
                eprintln!("error: unknown flag {s}");
                usage();
                process::exit(2);
            }
            _ => break,
        }
    }

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let buffer = resolve_path.as_deref().map(|p| read_buffer(p, current_line));
    if let Some(path) = &resolve_path {
        info!(path, current_line, "resolving ranges against file");
    }

    let lines = &args[idx..];
    if !lines.is_empty() {
        for line in lines {
            run_line(line, buffer.as_ref());
        }
        return;
    }

    let stdin = io::stdin().lock();
    for line in stdin.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error: failed to read stdin: {e}");
                process::exit(1);
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        run_line(&line, buffer.as_ref());
    }
}
