use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use oc2_core::error::Oc2Error;
use oc2_core::media::RESPONSE_MEDIA_TYPE;
use oc2_core::response::{self as oc2_response, Status};

// ---------------------------------------------------------------------------
// Envelope rendering
// ---------------------------------------------------------------------------

/// Render an OpenC2 response envelope as an HTTP response with matching status.
pub fn envelope(resp: &oc2_response::Response) -> Response {
    let body = match serde_json::to_vec(resp) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "cannot serialize response envelope");
            return internal_error();
        }
    };
    let status = StatusCode::from_u16(resp.status.code())
        .ok()
        .filter(|s| !s.is_informational())
        .unwrap_or(StatusCode::OK);
    (
        status,
        [
            (CONTENT_TYPE, HeaderValue::from_static(RESPONSE_MEDIA_TYPE)),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        body,
    )
        .into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Error").into_response()
}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// Client format errors become a 400 envelope carrying the diagnostic; every
/// other failure is logged and answered with a bare 500.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(e) = self.0.downcast_ref::<Oc2Error>() {
            if e.is_client_error() {
                return envelope(&oc2_response::Response::with_text(
                    Status::BadRequest,
                    e.to_string(),
                ));
            }
        }
        tracing::error!(error = %format!("{:#}", self.0), "request failed");
        internal_error()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
