use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::server::SgcServer;

/// Serve a stored file by the public URL handed out on upload
#[utoipa::path(
    get,
    path = "/files/{bucket}/{key}",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(server): State<SgcServer>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let object = server.service.objects().download(&bucket, &key).await?;
    tracing::debug!(bucket = %bucket, key = %key, size = object.data.len(), "Serving stored file");

    Ok((
        [
            (header::CONTENT_TYPE, object.metadata.content_type),
            (header::ETAG, format!("\"{}\"", object.metadata.etag)),
        ],
        object.data,
    )
        .into_response())
}
