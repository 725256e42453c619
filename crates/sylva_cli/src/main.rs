//! Sylva — a SystemVerilog compiler frontend with an incremental cache.

use std::path::PathBuf;
use std::process;

use sylva_cli::{execute_compilation, run_batch};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut batch_file: Option<PathBuf> = None;
    let mut output_dir = PathBuf::new();
    let mut nostdout = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-batch" => {
                if let Some(file) = args.get(i + 1) {
                    batch_file = Some(PathBuf::from(file));
                    i += 1;
                }
            }
            "-nostdout" => nostdout = true,
            "-o" => {
                if let Some(dir) = args.get(i + 1) {
                    output_dir = PathBuf::from(dir);
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if !output_dir.as_os_str().is_empty() && output_dir.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            output_dir = cwd.join(output_dir);
        }
    }

    let code = match batch_file {
        Some(batch) => run_batch(&batch, &output_dir, nostdout),
        None => execute_compilation(&args).0,
    };
    process::exit(code as i32);
}
