//! Mapping pipeline errors onto HTTP responses.
//!
//! Problems the uploader can fix are flashed and redirected back to the form.
//! Everything else is logged in full and answered with a bare 500.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::error::ReelpressError;
use super::flash::FlashSigner;

/// 302 redirect to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// 302 back to the form with `message` flashed.
pub fn flash_redirect(signer: &FlashSigner, message: &str) -> Response {
    let mut response = found("/");
    response
        .headers_mut()
        .insert(header::SET_COOKIE, signer.set_cookie(message));
    response
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Response for a failed `/process` request.
pub fn upload_failure(signer: &FlashSigner, err: ReelpressError) -> Response {
    match err.user_message() {
        Some(message) => flash_redirect(signer, &message),
        None => {
            error!(error = %err, "Upload processing failed");
            internal_error()
        }
    }
}

/// Response for a failed `/downloads/...` request.
pub fn download_failure(err: ReelpressError) -> Response {
    match err {
        ReelpressError::NotFound(_) | ReelpressError::InvalidFilename(_) => {
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
        other => {
            error!(error = %other, "Download failed");
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_redirect_with_cookie() {
        let signer = FlashSigner::new("k");
        let response = upload_failure(&signer, ReelpressError::DisallowedFileType("a.exe".into()));

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("reelpress_flash="));
    }

    #[test]
    fn test_storage_error_is_500() {
        let signer = FlashSigner::new("k");
        let response = upload_failure(&signer, ReelpressError::Storage("disk full".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_download_errors() {
        assert_eq!(
            download_failure(ReelpressError::InvalidFilename("..".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            download_failure(ReelpressError::Storage("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
