use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::{debug, info};

use dws_language_server::logging;
use dws_language_server::server::Backend;

#[derive(Parser, Debug)]
#[command(
    name = "dws-language-server",
    version,
    about = "Language server for the DWScript scripting language"
)]
struct Args {
    /// Communicate over stdio (the default and only transport).
    #[arg(long)]
    stdio: bool,

    /// Override the stderr log level (otherwise RUST_LOG or "info").
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output.
    #[arg(long)]
    no_color: bool,

    /// Disable the session log file in the user cache directory.
    #[arg(long)]
    no_file_log: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = logging::init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_log)?;
    if args.stdio {
        debug!("stdio transport explicitly requested");
    }
    info!("dws-language-server {} starting", env!("CARGO_PKG_VERSION"));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("server stopped");
    Ok(())
}
