use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use crate::error::{Result, ReelpressError};
use crate::upload::{is_checked, MetadataTag, ProcessingOptions, UploadRequest};
use super::error::{download_failure, found, internal_error, upload_failure};
use super::flash::clear_cookie;
use super::page::render_index;
use super::AppState;

const FILE_FIELD: &str = "input_file";
const OVERLAY_FIELD: &str = "overlay_enable";
const METADATA_FIELD: &str = "metadata_enable";

/// GET / - the upload form, with any pending flash message.
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let flash = state.flash.take(&headers);
    let page = match render_index(flash.as_deref()) {
        Ok(page) => page,
        Err(e) => {
            error!(error = %e, "Failed to render upload form");
            return internal_error();
        }
    };
    let mut response = Html(page).into_response();
    if flash.is_some() {
        response.headers_mut().insert(header::SET_COOKIE, clear_cookie());
    }
    response
}

/// POST /process - run the pipeline and redirect to the result.
///
/// A body that is not multipart form data carries no file part.
pub async fn process(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!("Form is not multipart: {}", rejection);
            return upload_failure(&state.flash, ReelpressError::NoFileProvided);
        }
    };

    let request = match read_upload(multipart).await {
        Ok(request) => request,
        Err(e) => return upload_failure(&state.flash, e),
    };

    // A client hanging up must not abort a running transcode.
    let workflow = state.workflow.clone();
    match tokio::spawn(async move { workflow.process(request).await }).await {
        Ok(Ok(output)) => {
            info!("Redirecting to download of {}", output.output_filename);
            found(&format!("/downloads/{}", urlencoding::encode(&output.output_filename)))
        }
        Ok(Err(e)) => upload_failure(&state.flash, e),
        Err(e) => {
            error!("Processing task failed: {}", e);
            internal_error()
        }
    }
}

/// GET /downloads/{filename} - stream a produced file as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    match open_download(&state, &filename).await {
        Ok(response) => response,
        Err(e) => download_failure(e),
    }
}

async fn open_download(state: &AppState, filename: &str) -> Result<Response> {
    let path = state.workflow.storage().resolve_download(filename).await?;
    let file = tokio::fs::File::open(&path).await?;
    let length = file.metadata().await?.len();

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|_| ReelpressError::InvalidFilename(filename.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type_for(filename))),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// Pull the file part and option fields out of the form.
async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest> {
    let mut request = UploadRequest::default();
    let mut options = ProcessingOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ReelpressError::Multipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            if request.filename.is_some() {
                continue;
            }
            request.filename = Some(field.file_name().unwrap_or_default().to_string());
            request.data = field
                .bytes()
                .await
                .map_err(|e| ReelpressError::Multipart(e.to_string()))?
                .to_vec();
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ReelpressError::Multipart(e.to_string()))?;

        match name.as_str() {
            OVERLAY_FIELD => options.overlay_enabled = is_checked(&value),
            METADATA_FIELD => options.metadata_enabled = is_checked(&value),
            other => {
                if let Some(tag) = MetadataTag::from_form_field(other) {
                    options.metadata.insert(tag, value);
                }
            }
        }
    }

    request.options = options;
    Ok(request)
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase());
    match extension.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("aac") => "audio/aac",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
