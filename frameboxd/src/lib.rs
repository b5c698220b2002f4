use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use clap::Parser;
use framebox_core::{load_framebox_config, FrameError, FrameboxConfig, UploadError};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod routes;

pub use routes::{router, AppState};

pub type Result<T> = std::result::Result<T, AppError>;

const DEFAULT_LOG_FILTER: &str = "frameboxd=info,framebox_core=info,tower_http=info";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] framebox_core::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid bind address {0:?}")]
    Bind(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("invalid number of frames: {0:?}")]
    InvalidCount(String),
    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("missing form field `image`")]
    MissingImage,
    #[error("invalid frame name {0:?}")]
    InvalidFilename(String),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Frame(FrameError::InvalidCount { .. })
            | Self::Upload(UploadError::NotAnImage | UploadError::InvalidFilename(_))
            | Self::InvalidCount(_)
            | Self::Multipart(_)
            | Self::MissingImage
            | Self::InvalidFilename(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "frameboxd", error = %self, "request failed");
            let reason = status.canonical_reason().unwrap_or_default();
            (status, reason).into_response()
        } else {
            debug!(target: "frameboxd", error = %self, "request rejected");
            (status, self.to_string()).into_response()
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Serves subtitle-tagged frames over HTTP", long_about = None)]
pub struct Cli {
    /// Path to framebox.toml; built-in defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory holding the frames (overrides storage.image_dir)
    #[arg(long)]
    pub image_dir: Option<PathBuf>,
    /// Address to listen on (overrides server.bind)
    #[arg(long)]
    pub bind: Option<String>,
    /// Fixed seed for frame selection (overrides selection.seed)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let addr = config
        .bind_addr()
        .map_err(|_| AppError::Bind(config.server.bind.clone()))?;
    let state = AppState::from_config(&config);
    let image_dir = config.image_dir();

    let listener = TcpListener::bind(addr).await?;
    info!(
        target: "frameboxd",
        addr = %listener.local_addr()?,
        image_dir = %image_dir.display(),
        "frame server listening"
    );

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    serve(listener, router(state), grace, shutdown_signal()).await
}

fn resolve_config(cli: &Cli) -> Result<FrameboxConfig> {
    let mut config = match &cli.config {
        Some(path) => load_framebox_config(path)?,
        None => FrameboxConfig::default(),
    };
    if let Some(dir) = &cli.image_dir {
        config.storage.image_dir = std::env::current_dir()?.join(dir);
    }
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if cli.seed.is_some() {
        config.selection.seed = cli.seed;
    }
    Ok(config)
}

/// Serves `app` until `shutdown` resolves, then gives in-flight requests
/// `grace` to complete before stopping.
pub async fn serve<F>(listener: TcpListener, app: Router, grace: Duration, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let notify = Arc::new(Notify::new());
    let stop = Arc::clone(&notify);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.notified().await })
            .await
    });

    tokio::select! {
        joined = &mut server => return Ok(joined??),
        () = shutdown => {}
    }

    info!(target: "frameboxd", "shutting down frame server");
    notify.notify_one();
    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => joined??,
        Err(_) => {
            warn!(
                target: "frameboxd",
                grace_seconds = grace.as_secs(),
                "grace period elapsed with requests in flight"
            );
            server.abort();
        }
    }
    info!(target: "frameboxd", "frame server closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target: "frameboxd", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
