use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use framebox_core::config::DEFAULT_UPLOAD_LIMIT_BYTES;
use framebox_core::{
    build_index, exact_frames, fuzzy_frames, random_frames, store_upload, Frame, FrameboxConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info, Level};

use crate::{AppError, Result};

/// Per-server settings shared by every handler. Holds no mutable state: each
/// request rebuilds the frame index from disk.
#[derive(Debug, Clone)]
pub struct AppState {
    image_dir: Arc<PathBuf>,
    seed: Option<u64>,
    upload_limit: usize,
}

impl AppState {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: Arc::new(image_dir.into()),
            seed: None,
            upload_limit: DEFAULT_UPLOAD_LIMIT_BYTES,
        }
    }

    pub fn from_config(config: &FrameboxConfig) -> Self {
        Self::new(config.image_dir())
            .with_seed(config.selection.seed)
            .with_upload_limit(config.server.upload_limit_bytes)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_upload_limit(mut self, limit: usize) -> Self {
        self.upload_limit = limit;
        self
    }

    fn rng(&self) -> ChaCha20Rng {
        match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        }
    }

    async fn frames(&self) -> Result<Vec<Frame>> {
        let dir = Arc::clone(&self.image_dir);
        Ok(tokio::task::spawn_blocking(move || build_index(&dir)).await??)
    }
}

pub fn router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/frame/random/:count", get(random_handler))
        .route("/frame/fuzzy/:query/:count", get(fuzzy_handler))
        .route("/frame/exact/:query/:count", get(exact_handler))
        .route("/frame", post(upload_handler))
        .route("/frame/:name", get(download_handler))
        .layer(DefaultBodyLimit::max(state.upload_limit))
        .layer(trace)
        .with_state(state)
}

fn parse_count(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::InvalidCount(raw.to_string()))
}

async fn random_handler(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> Result<Json<Vec<Frame>>> {
    let count = parse_count(&count)?;
    let frames = state.frames().await?;
    let mut rng = state.rng();
    Ok(Json(random_frames(&frames, count, &mut rng)?))
}

async fn fuzzy_handler(
    State(state): State<AppState>,
    Path((query, count)): Path<(String, String)>,
) -> Result<Json<Vec<Frame>>> {
    let count = parse_count(&count)?;
    let frames = state.frames().await?;
    Ok(Json(fuzzy_frames(&frames, &query, count)?))
}

async fn exact_handler(
    State(state): State<AppState>,
    Path((query, count)): Path<(String, String)>,
) -> Result<Json<Vec<Frame>>> {
    let count = parse_count(&count)?;
    let frames = state.frames().await?;
    let mut rng = state.rng();
    Ok(Json(exact_frames(&frames, &query, count, &mut rng)?))
}

/// A single path component: no separators, not `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

async fn download_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Response> {
    if !is_plain_file_name(&name) {
        return Err(AppError::InvalidFilename(name));
    }
    let path = state.image_dir.join(&name);
    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never: Infallible| match never {});
    Ok(response.into_response())
}

/// Query-style unescaping of a client filename: `+` is a space, then
/// percent sequences are decoded.
fn unescape_file_name(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| AppError::InvalidFilename(raw.to_string()))
}

async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<StatusCode> {
    // Drain the whole form so an oversized body is rejected even when the
    // `image` field comes first.
    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        if image.is_some() || field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await?;
        image = Some((file_name, content));
    }
    let (raw_name, content) = image.ok_or(AppError::MissingImage)?;
    let file_name = unescape_file_name(&raw_name)?;

    let dir = Arc::clone(&state.image_dir);
    let stored =
        tokio::task::spawn_blocking(move || store_upload(&dir, &file_name, &content)).await??;
    info!(target: "frameboxd", file = %stored, "frame uploaded");
    Ok(StatusCode::CREATED)
}
