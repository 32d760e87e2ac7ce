//! PDF Tools gateway server
//!
//! A stateless document-processing gateway: each request uploads PDFs or
//! images via multipart form and receives a transformed document (or a
//! zip archive of documents) back in the same response.
//!
//! Operations:
//!
//! - Merge, split, rotate and image-to-PDF conversion run in memory via
//!   `pdftools-core` (lopdf)
//! - Compression and PDF-to-JPEG rasterization shell out to Ghostscript
//!   through a bounded, timed subprocess driver
//!
//! Nothing is persisted: uploads live for one request, scratch files are
//! released before the response is sent.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod archive;
mod error;
mod ghostscript;
mod scratch;

use ghostscript::Rasterizer;
use scratch::ScratchConfig;

fn default_engine_command() -> &'static str {
    if cfg!(windows) {
        "gswin64c"
    } else {
        "gs"
    }
}

/// Command-line arguments for the gateway server
#[derive(Parser, Debug)]
#[command(name = "pdftools-server")]
#[command(about = "Document processing gateway for PDF merge/split/compress/convert/rotate")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Origin allowed to call the API
    #[arg(long, default_value = "http://localhost:5173")]
    allow_origin: String,

    /// Ghostscript executable name or path
    #[arg(long, default_value = default_engine_command())]
    engine: String,

    /// Timeout for one engine invocation, in seconds
    #[arg(long, default_value = "120")]
    engine_timeout_secs: u64,

    /// Maximum concurrent engine invocations
    #[arg(long, default_value = "4")]
    max_engine_jobs: usize,

    /// Scratch directory (defaults to the system temp directory)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "50")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rasterizer: Rasterizer,
    pub scratch: ScratchConfig,
}

/// The operation routes, without middleware.
fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::handle_health))
        .route("/merge", post(api::handle_merge))
        .route("/split", post(api::handle_split))
        .route("/compress", post(api::handle_compress))
        .route("/convert-to-document", post(api::handle_convert_to_document))
        .route(
            "/convert-from-document",
            post(api::handle_convert_from_document),
        )
        .route("/rotate", post(api::handle_rotate))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState {
        rasterizer: Rasterizer::new(
            args.engine.clone(),
            args.max_engine_jobs,
            Duration::from_secs(args.engine_timeout_secs),
        ),
        scratch: args
            .scratch_dir
            .clone()
            .map(ScratchConfig::new)
            .unwrap_or_else(ScratchConfig::system),
    };

    // Only the configured frontend origin may call the API.
    let origin = args.allow_origin.parse::<HeaderValue>()?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = router(state)
        .layer(DefaultBodyLimit::max(args.max_upload_mb * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Allowed origin: {}", args.allow_origin);
    info!(
        "Engine: {} ({} concurrent jobs, {}s timeout)",
        args.engine, args.max_engine_jobs, args.engine_timeout_secs
    );

    axum::serve(listener, app).await?;

    Ok(())
}
