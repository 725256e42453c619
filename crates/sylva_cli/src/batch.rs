//! The batch driver: one full command line per non-empty line of a script.
//!
//! Each line runs as a sub-invocation sharing the process. Lines carrying a
//! relative `-cd <dir>` get their outputs nested under
//! `<output-dir>/<dir>`; the working directory is restored after every
//! line. A failing line does not abort the batch; the aggregate return code
//! is the bitwise OR of per-line codes.

use std::path::{Path, PathBuf};

use sylva_diagnostics::Stats;

use crate::compile::execute_compilation;

/// Splits a batch line on whitespace, honoring single and double quotes.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Finds the value of an embedded `-cd <dir>`, if any.
fn embedded_cd(args: &[String]) -> Option<PathBuf> {
    args.windows(2)
        .find(|w| w[0] == "-cd")
        .map(|w| PathBuf::from(&w[1]))
}

/// Runs every line of `batch_file`, isolating working directories and
/// accumulating statistics. Returns the OR of per-line return codes.
pub fn run_batch(batch_file: &Path, output_dir: &Path, nostdout: bool) -> u32 {
    let mut return_code = 0u32;

    let Ok(original_dir) = std::env::current_dir() else {
        return 0x1;
    };
    let Ok(script) = std::fs::read_to_string(batch_file) else {
        return 0x1;
    };

    let mut count = 0usize;
    let mut overall = Stats::default();
    for line in script.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !nostdout {
            println!("Processing: {line}");
        }

        let mut args = split_command_line(line);
        let cd = embedded_cd(&args);
        match &cd {
            Some(dir) if dir.is_relative() => {
                if !output_dir.as_os_str().is_empty() {
                    args.push("-o".to_string());
                    args.push(output_dir.join(dir).to_string_lossy().into_owned());
                }
            }
            _ => {
                if !output_dir.as_os_str().is_empty() {
                    args.push("-o".to_string());
                    args.push(output_dir.to_string_lossy().into_owned());
                }
            }
        }
        if args.is_empty() {
            continue;
        }

        let (code, stats) = execute_compilation(&args);
        return_code |= code;
        overall += stats;
        count += 1;

        if std::env::set_current_dir(&original_dir).is_err() {
            return_code |= 0x1;
        }
    }

    if !nostdout {
        println!("Processed {count} tests.");
        println!(
            "FATAL: {} SYNTAX: {} ERROR: {}",
            overall.nb_fatal, overall.nb_syntax, overall.nb_error
        );
    }
    return_code
}
