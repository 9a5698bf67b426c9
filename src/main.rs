//! Postman collection generator - Command-line tool for documenting axios calls.
//!
//! This binary scans the numbered tool directories of a repository (`tools/1_*`, `tools/2_*`,
//! ...), extracts every `axios.<method>(...)` call it can read statically, and writes a
//! Postman collection together with an environment template.
//!
//! # Usage
//!
//! ```bash
//! postman-from-source [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Scan `./tools` and write to `./generate_postman_schema`:
//! ```bash
//! postman-from-source
//! ```
//!
//! Scan another directory under a custom collection name:
//! ```bash
//! postman-from-source --root ./scripts --name "Cards API"
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! postman-from-source -v
//! ```

mod cli;
mod collection_builder;
mod error;
mod extractor;
mod literal;
mod parser;
mod scanner;
mod serializer;

use anyhow::Result;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let config = cli::parse_args_from_parsed(args)?;

    let summary = cli::run(&config)?;

    info!(
        "Postman collection generated: {} requests from {} files",
        summary.requests, summary.files_found
    );

    Ok(())
}
