//! BAI Lockbox CLI
//!
//! Parses and validates a lockbox transmission file, then writes the
//! extracted checks as CSV to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- deposits.bai > checks.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` to trace record consumption
//!
//! Exits non-zero on the first parse or consistency failure, printing the
//! annotated error (line number plus raw line) to stderr.

use bai_lockbox::{ErrorKind, LockboxError, LockboxFile, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(LockboxError::new(ErrorKind::MissingArgument));
    }

    let input_path = &args[1];
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let lockbox_file = LockboxFile::from_reader(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    lockbox_file.write_checks_csv(handle)?;

    Ok(())
}
