//! Readwise Reader MCP server
//!
//! Speaks the Model Context Protocol over stdio so an assistant can save,
//! list, update, move and delete Reader documents.

use std::io;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reader_core::{Client, Config};

mod protocol;
#[cfg(test)]
mod testing;
mod tools;

use protocol::Server;

fn main() -> Result<()> {
    init_logging();

    let config = Config::from_env().context("failed to load configuration")?;
    let server = Server::new(Client::new(&config));

    info!("starting stdio server");
    server.serve(io::stdin().lock(), io::stdout().lock())
}

/// stdout carries the protocol stream, so logs must go to stderr.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reader_core=warn,reader_mcp_server=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
