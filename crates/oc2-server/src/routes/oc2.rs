use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_METHOD, CONTENT_TYPE, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use oc2_core::asset::Identity;
use oc2_core::media::COMMAND_MEDIA_TYPE;
use oc2_core::relay::Submission;
use oc2_core::response::{Response as Oc2Response, Status};
use tracing::{debug, info, warn};

use crate::error::{envelope, AppError};
use crate::headers::{PeerCertificate, ASSET_ID};
use crate::state::AppState;

/// Handles every method on the relay path: OPTIONS preflight, POST submit and
/// GET poll. Anything else is a 400 with a plain-text body.
pub async fn relay_endpoint(State(app): State<AppState>, request: Request) -> Response {
    match *request.method() {
        Method::OPTIONS => preflight(request.headers()),
        Method::POST => {
            let origin = request.headers().get(ORIGIN).cloned();
            let mut response = submit(&app, request).await.into_response();
            if let Some(origin) = origin {
                response
                    .headers_mut()
                    .insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            }
            response
        }
        Method::GET => poll(&app, &request).into_response(),
        ref other => {
            warn!(method = %other, "unsupported method on relay endpoint");
            (StatusCode::BAD_REQUEST, "Don't know how to process that.").into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// OPTIONS
// ---------------------------------------------------------------------------

fn preflight(headers: &HeaderMap) -> Response {
    let origin = headers.get(ORIGIN).filter(|v| !v.is_empty());
    let requested = headers
        .get(ACCESS_CONTROL_REQUEST_METHOD)
        .filter(|v| !v.is_empty());
    let (Some(origin), Some(_)) = (origin, requested) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    info!(origin = ?origin, "CORS access control allowed");
    let any = HeaderValue::from_static("*");
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone()),
            (ACCESS_CONTROL_ALLOW_METHODS, any.clone()),
            (ACCESS_CONTROL_ALLOW_HEADERS, any),
            (VARY, HeaderValue::from_static("Origin")),
        ],
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// POST
// ---------------------------------------------------------------------------

async fn submit(app: &AppState, request: Request) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, app.body_limit).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "cannot read request body");
            return Ok((StatusCode::BAD_REQUEST, "Read error").into_response());
        }
    };

    // The body is fully read before the relay lock is taken.
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let submission = app.relay.submit(content_type, &body)?;

    Ok(match submission {
        Submission::Queued { .. } => envelope(&Oc2Response::with_text(
            Status::Ok,
            "Command added to the queue.",
        )),
        Submission::Silent { index } => {
            debug!(index, "no response requested");
            (StatusCode::NO_CONTENT, Body::empty()).into_response()
        }
        Submission::Answered { response, .. } => envelope(&response),
    })
}

// ---------------------------------------------------------------------------
// GET
// ---------------------------------------------------------------------------

fn poll(app: &AppState, request: &Request) -> Result<Response, AppError> {
    let certificate = request
        .extensions()
        .get::<PeerCertificate>()
        .map(|cert| cert.subject.as_slice());
    let asserted = request
        .headers()
        .get(&ASSET_ID)
        .and_then(|v| v.to_str().ok());
    let identity = Identity::from_request(certificate, asserted);

    let delivery = app.relay.poll(&identity)?;

    let mut response = match delivery.command {
        Some((index, body)) => {
            debug!(asset_id = %delivery.asset_id, index, "delivering command");
            (
                StatusCode::OK,
                [(CONTENT_TYPE, HeaderValue::from_static(COMMAND_MEDIA_TYPE))],
                body,
            )
                .into_response()
        }
        None => (StatusCode::NO_CONTENT, Body::empty()).into_response(),
    };

    if delivery.created {
        match HeaderValue::from_str(&delivery.asset_id) {
            Ok(value) => {
                response.headers_mut().insert(ASSET_ID, value);
            }
            Err(e) => warn!(error = %e, "asset id is not a valid header value"),
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc2_core::Relay;
    use std::sync::Arc;

    fn app() -> AppState {
        AppState::new(Arc::new(Relay::new()), 1024 * 1024)
    }

    fn request(method: Method) -> axum::http::request::Builder {
        axum::http::Request::builder().method(method).uri("/oc2")
    }

    #[tokio::test]
    async fn preflight_requires_both_cors_headers() {
        let req = request(Method::OPTIONS)
            .header(ORIGIN, "https://console.example")
            .body(Body::empty())
            .unwrap();
        let resp = relay_endpoint(State(app()), req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn preflight_echoes_origin() {
        let req = request(Method::OPTIONS)
            .header(ORIGIN, "https://console.example")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let resp = relay_endpoint(State(app()), req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://console.example"
        );
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "*");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "*");
    }

    #[tokio::test]
    async fn unsupported_method_is_plain_400() {
        let req = request(Method::DELETE).body(Body::empty()).unwrap();
        let resp = relay_endpoint(State(app()), req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp
            .headers()
            .get(CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[tokio::test]
    async fn certificate_identity_is_used_for_polls() {
        let state = app();
        let mut req = request(Method::GET).body(Body::empty()).unwrap();
        req.extensions_mut().insert(PeerCertificate {
            subject: b"CN=fw-1".to_vec(),
        });
        let resp = relay_endpoint(State(state.clone()), req).await;
        let issued = resp.headers().get(ASSET_ID).unwrap().to_str().unwrap().to_string();
        assert_eq!(issued, oc2_core::asset::certificate_asset_id(b"CN=fw-1"));

        // A repeat connection with the same certificate reuses the asset.
        let mut req = request(Method::GET).body(Body::empty()).unwrap();
        req.extensions_mut().insert(PeerCertificate {
            subject: b"CN=fw-1".to_vec(),
        });
        let resp = relay_endpoint(State(state.clone()), req).await;
        assert!(resp.headers().get(ASSET_ID).is_none());
        assert_eq!(state.relay.snapshot().assets.len(), 1);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_unread() {
        let state = AppState::new(Arc::new(Relay::new()), 8);
        let req = request(Method::POST)
            .header(CONTENT_TYPE, COMMAND_MEDIA_TYPE)
            .body(Body::from(r#"{"action":"deny","target":{"ipv4_net":"10.0.0.1"}}"#))
            .unwrap();
        let resp = relay_endpoint(State(state.clone()), req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(state.relay.is_empty());
    }
}
