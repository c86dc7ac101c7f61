//! Media types and header names of the OpenC2 HTTPS transfer binding.

pub const COMMAND_MEDIA_TYPE: &str = "application/openc2-cmd+json;version=1.0";
pub const RESPONSE_MEDIA_TYPE: &str = "application/openc2-rsp+json;version=1.0";

/// Client-asserted or server-issued poller identity.
pub const ASSET_ID_HEADER: &str = "X-OpenC2-Asset-Id";
/// Echoed verbatim on every response, like the correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

/// Compare a declared `Content-Type` against the command media type, ignoring
/// ASCII case and whitespace around the parameter separator.
pub fn is_command_media_type(content_type: &str) -> bool {
    normalize(content_type) == normalize(COMMAND_MEDIA_TYPE)
}

fn normalize(media_type: &str) -> String {
    media_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_media_type_matches() {
        assert!(is_command_media_type(COMMAND_MEDIA_TYPE));
    }

    #[test]
    fn spacing_and_case_are_ignored() {
        assert!(is_command_media_type("Application/OpenC2-Cmd+JSON; version=1.0"));
    }

    #[test]
    fn other_media_types_do_not_match() {
        assert!(!is_command_media_type("application/json"));
        assert!(!is_command_media_type(RESPONSE_MEDIA_TYPE));
        assert!(!is_command_media_type("application/openc2-cmd+json;version=2.0"));
        assert!(!is_command_media_type(""));
    }
}
