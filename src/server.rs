//! HTTP front-end for [`crate::convert`].
//!
//! `POST /api/convert` takes a multipart form with a `file` and a
//! `conversion_type` field and answers with the converted file. Uploads are
//! stored in a temporary directory that is removed once the request is done.

use std::{
    ffi::OsStr,
    fmt::Write as _,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    convert::{convert_with, ConversionKind},
    error::ConversionError,
};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Directory with the web front-end, served for every path that isn't an API route.
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8000)),
            static_dir: None,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::BadRequest(msg) => {
                tracing::warn!("rejected request: {msg}");
                (StatusCode::BAD_REQUEST, format!("conversion failed: {msg}"))
            }
            HttpError::InternalError(msg) => {
                tracing::error!("request failed: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, body).into_response()
    }
}

/// Every failure reported by the converter, including a failed write, is a 400.
/// Only the request plumbing around it (temp files, worker threads) gives a 500.
impl From<ConversionError> for HttpError {
    fn from(err: ConversionError) -> Self {
        HttpError::BadRequest(err.to_string())
    }
}

impl From<MultipartError> for HttpError {
    fn from(err: MultipartError) -> Self {
        HttpError::BadRequest(err.body_text())
    }
}

fn internal(err: impl std::fmt::Display) -> HttpError {
    HttpError::InternalError(err.to_string())
}

/// Create the Axum router with all routes
pub fn create_router(config: Arc<ServerConfig>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/convert", post(convert_upload))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Binds the listener and serves requests until the process is stopped.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    if let Some(dir) = &config.static_dir {
        tracing::info!("serving front-end from {}", dir.display());
    }
    axum::serve(listener, create_router(Arc::new(config))).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Conversion endpoint
/// POST /api/convert
async fn convert_upload(mut multipart: Multipart) -> Result<Response, HttpError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut kind: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                upload = Some((file_name, field.bytes().await?));
            }
            "conversion_type" => kind = Some(field.text().await?),
            _ => {}
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| HttpError::BadRequest("no file was uploaded".into()))?;
    let kind = kind
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| HttpError::BadRequest("no conversion type was given".into()))?;
    tracing::info!(conversion_type = %kind, file = %file_name, "received conversion request");

    // Nothing is written to disk until the request is known to be sensible
    let kind: ConversionKind = kind.trim().parse()?;
    let original = Path::new(&file_name);
    kind.input_format(original)?;

    let extension = original
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_ascii_lowercase();
    let stem = original
        .file_stem()
        .and_then(OsStr::to_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("subtitles");
    let output_name = kind.output_file_name(stem);

    let body = {
        let output_name = output_name.clone();
        tokio::task::spawn_blocking(move || {
            convert_in_temp_dir(&data, &extension, &output_name, kind)
        })
        .await
        .map_err(internal)??
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&output_name)).map_err(internal)?,
    );
    Ok((headers, body).into_response())
}

/// Runs a conversion on a private copy of the upload and returns the output bytes.
fn convert_in_temp_dir(
    data: &[u8],
    extension: &str,
    output_name: &str,
    kind: ConversionKind,
) -> Result<Vec<u8>, HttpError> {
    let dir = tempfile::tempdir().map_err(internal)?;
    let input = dir.path().join(format!("{}.{extension}", Uuid::new_v4()));
    let output = dir.path().join(output_name);
    std::fs::write(&input, data).map_err(internal)?;
    tracing::debug!("stored upload at {}", input.display());

    convert_with(&input, &output, kind)?;
    let body = std::fs::read(&output).map_err(internal)?;

    if let Err(e) = dir.close() {
        tracing::warn!("could not remove temporary directory: {e}");
    }
    Ok(body)
}

/// Builds an `attachment` disposition that survives non-ASCII file names.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for b in file_name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            let _ = write!(encoded, "%{b:02X}");
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
