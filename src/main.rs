use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use bicepmod_lsp::Backend;

/// Language server for Bicep module references.
#[derive(Parser)]
#[command(name = "bicepmod_lsp", version, about)]
struct Args {
    /// Log filter when RUST_LOG is not set (e.g. `info`, `bicepmod_lsp=debug`).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // stdout carries LSP traffic; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;
}
