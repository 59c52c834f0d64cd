//! Subprotocol negotiation.
//!
//! Pure handshake-time logic without side effects, making it easy to test.

use axum::http::{HeaderMap, header};

/// Wire subprotocol negotiated at handshake time, fixed for the lifetime
/// of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Raw payload bytes, unmodified.
    Text,
    /// Payloads wrapped in a `{timestamp, nick, data}` envelope.
    Json,
}

impl Protocol {
    /// The subprotocol token as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Text => "text",
            Protocol::Json => "json",
        }
    }
}

/// Select the wire subprotocol for a connection.
///
/// Scans the client's offered tokens in order and accepts the first one the
/// relay supports, so the result is the client's own first preference among
/// `text` and `json`. Returns `None` when no supported token appears; the
/// handshake is then rejected before upgrade.
pub fn negotiate<'a, I>(offered: I) -> Option<Protocol>
where
    I: IntoIterator<Item = &'a str>,
{
    for token in offered {
        if token == Protocol::Text.as_str() {
            return Some(Protocol::Text);
        }
        if token == Protocol::Json.as_str() {
            return Some(Protocol::Json);
        }
    }
    None
}

/// Parse the ordered subprotocol tokens offered in a handshake request.
///
/// The `Sec-WebSocket-Protocol` header may appear multiple times and each
/// occurrence may carry a comma-separated list; client order is preserved.
pub fn offered_protocols(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_negotiate_picks_clients_first_preference_json() {
        // given:
        let offered = ["json", "text"];

        // when:
        let result = negotiate(offered);

        // then:
        assert_eq!(result, Some(Protocol::Json));
    }

    #[test]
    fn test_negotiate_picks_clients_first_preference_text() {
        // given:
        let offered = ["text", "json"];

        // when:
        let result = negotiate(offered);

        // then:
        assert_eq!(result, Some(Protocol::Text));
    }

    #[test]
    fn test_negotiate_skips_unsupported_tokens() {
        // given:
        let offered = ["binary", "json"];

        // when:
        let result = negotiate(offered);

        // then:
        assert_eq!(result, Some(Protocol::Json));
    }

    #[test]
    fn test_negotiate_fails_when_nothing_is_supported() {
        // given:
        let offered = ["binary"];

        // when:
        let result = negotiate(offered);

        // then:
        assert_eq!(result, None);
    }

    #[test]
    fn test_negotiate_fails_on_empty_offer() {
        // given:
        let offered: [&str; 0] = [];

        // when:
        let result = negotiate(offered);

        // then:
        assert_eq!(result, None);
    }

    #[test]
    fn test_offered_protocols_splits_comma_separated_header() {
        // given:
        let mut headers = HeaderMap::new();
        headers.insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static("text, json"),
        );

        // when:
        let offered = offered_protocols(&headers);

        // then:
        assert_eq!(offered, vec!["text".to_string(), "json".to_string()]);
    }

    #[test]
    fn test_offered_protocols_preserves_order_across_repeated_headers() {
        // given:
        let mut headers = HeaderMap::new();
        headers.append(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static("binary"),
        );
        headers.append(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static("json,text"),
        );

        // when:
        let offered = offered_protocols(&headers);

        // then:
        assert_eq!(
            offered,
            vec!["binary".to_string(), "json".to_string(), "text".to_string()]
        );
    }

    #[test]
    fn test_offered_protocols_empty_when_header_is_absent() {
        // given:
        let headers = HeaderMap::new();

        // when:
        let offered = offered_protocols(&headers);

        // then:
        assert!(offered.is_empty());
    }
}
