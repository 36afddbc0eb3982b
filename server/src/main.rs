use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};
use vitrine_server::build_app;

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Synonym table (JSON map of term to equivalents)
    #[arg(long)]
    synonyms: Option<PathBuf>,
    /// Query log file; pass --no-query-log to disable
    #[arg(long, default_value = "./query_log.json")]
    query_log: PathBuf,
    /// Disable query logging
    #[arg(long, default_value_t = false)]
    no_query_log: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let query_log = if args.no_query_log {
        None
    } else {
        Some(args.query_log.clone())
    };
    let app: Router = build_app(&args.index, args.synonyms.as_deref(), query_log)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
