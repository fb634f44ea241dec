//! Renders `mcn-conform.1` from the clap definitions at compile time.
//!
//! The page lands in `OUT_DIR`; the subcommand list is read straight from
//! `src/cli/mod.rs`, which is also the binary's parser.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

const MAN_PAGE: &str = "mcn-conform.1";
const WATCHED: [&str; 2] = ["build.rs", "src/cli/mod.rs"];

fn out_dir() -> io::Result<PathBuf> {
    env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR is unset"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout();
    for path in WATCHED {
        writeln!(stdout, "cargo:rerun-if-changed={path}")?;
    }

    let mut page = Vec::new();
    Man::new(cli::Cli::command()).render(&mut page)?;
    fs::write(out_dir()?.join(MAN_PAGE), page)?;

    Ok(())
}
