//! Header names used by the relay endpoint, in the lowercase form `http` requires.

use axum::http::HeaderName;

pub const ASSET_ID: HeaderName = HeaderName::from_static("x-openc2-asset-id");
pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Subject of a client certificate, verified by whatever terminates TLS in
/// front of the router and attached to the request as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCertificate {
    /// DER-encoded subject distinguished name.
    pub subject: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc2_core::media;

    #[test]
    fn names_match_wire_constants() {
        assert!(ASSET_ID
            .as_str()
            .eq_ignore_ascii_case(media::ASSET_ID_HEADER));
        assert!(REQUEST_ID
            .as_str()
            .eq_ignore_ascii_case(media::REQUEST_ID_HEADER));
        assert!(CORRELATION_ID
            .as_str()
            .eq_ignore_ascii_case(media::CORRELATION_ID_HEADER));
    }
}
