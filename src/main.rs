//! Path redirector (v1)
//!
//! Evaluates an ordered list of redirect rules against each incoming request
//! path and answers the first match with a 307/308 redirect.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 REDIRECTOR                   │
//!    Client Request       │  ┌────────┐   ┌────────────┐   ┌─────────┐  │
//!    ─────────────────────┼─▶│  http  │──▶│  redirect  │──▶│ routing │  │
//!                         │  │ server │   │ middleware │   │resolver │  │
//!                         │  └────────┘   └─────┬──────┘   └────┬────┘  │
//!                         │                     │               │       │
//!    307/308 + Location   │                     ▼               ▼       │
//!    ◀────────────────────┼──────────── match ◀─┴──── snapshot ◀┐       │
//!                         │                     │               │       │
//!    Upstream / 404       │                no match      ┌──────┴─────┐ │
//!    ◀────────────────────┼─────────────────────┘        │ rule cache │◀┼── rule store
//!                         │                              └────────────┘ │   (inline/file/http)
//!                         │  config · observability · admin · lifecycle │
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use path_redirector::lifecycle::startup;

#[derive(Parser)]
#[command(name = "path-redirector")]
#[command(about = "Rule-based path redirection service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    startup::run(args.config).await
}
