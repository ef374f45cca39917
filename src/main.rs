//! OpenAPI from docs - command-line tool.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-docs [OPTIONS] <SOURCE_PATH>
//! ```
//!
//! # Examples
//!
//! Generate a JSON document on stdout:
//! ```bash
//! openapi-from-docs ./my-service/src
//! ```
//!
//! Generate YAML into a file:
//! ```bash
//! openapi-from-docs ./my-service/src -f yaml -o swagger.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_docs::cli;

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

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Document generation completed successfully");
    Ok(())
}
