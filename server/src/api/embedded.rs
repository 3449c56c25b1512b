//! Static assets embedded in the binary

use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "static"]
pub struct Assets;

const CACHE_REVALIDATE: &str = "public, max-age=0, must-revalidate";

/// Serve a file from `static/`; mounted under `/static`
pub async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    let Some(file) = Assets::get(path) else {
        tracing::debug!(path, "Static asset not found");
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let etag = hex::encode(file.metadata.sha256_hash());

    (
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, CACHE_REVALIDATE.to_string()),
            (header::ETAG, format!("\"{}\"", etag)),
        ],
        Body::from(file.data.into_owned()),
    )
        .into_response()
}
