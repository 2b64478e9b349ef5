//! HTTP transport to a Nominatim-compatible search endpoint.

use super::types::GeocodeError;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = concat!("choropleth/", env!("CARGO_PKG_VERSION"));

/// One GET against the geocoding service, returning the decoded JSON body.
///
/// Implementations must classify failures: non-success statuses and transport
/// problems become [`GeocodeError::Service`], undecodable bodies become
/// [`GeocodeError::Parse`].
pub trait Transport: Send + Sync {
    fn get_json(&self, params: &[(&str, &str)]) -> Result<serde_json::Value, GeocodeError>;
}

/// Blocking `ureq` transport with a per-request timeout.
pub struct HttpTransport {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self {
            agent,
            endpoint: endpoint.to_string(),
        }
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, params: &[(&str, &str)]) -> Result<serde_json::Value, GeocodeError> {
        let mut request = self.agent.get(&self.endpoint);
        for (key, value) in params {
            request = request.query(key, value);
        }

        let response = request.call().map_err(classify)?;

        response
            .into_json()
            .map_err(|e| GeocodeError::parse(e.to_string()))
    }
}

fn classify(err: ureq::Error) -> GeocodeError {
    match err {
        ureq::Error::Status(code, response) => {
            let retryable = code == 429 || code >= 500;
            GeocodeError::service(
                format!("HTTP {} {}", code, response.status_text()),
                retryable,
            )
        }
        // Timeouts, DNS and connection resets are all transient from our side.
        ureq::Error::Transport(t) => GeocodeError::service(t.to_string(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, text: &str) -> GeocodeError {
        let response = ureq::Response::new(code, text, "").unwrap();
        classify(ureq::Error::Status(code, response))
    }

    #[test]
    fn test_rate_limited_and_server_errors_are_retryable() {
        for (code, text) in [(429, "Too Many Requests"), (500, "Internal Server Error"), (503, "Service Unavailable")] {
            let err = status(code, text);
            assert!(err.is_retryable(), "HTTP {} should be retried", code);
            assert_eq!(err.kind(), "service_error");
        }
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        for (code, text) in [(400, "Bad Request"), (403, "Forbidden"), (404, "Not Found")] {
            let err = status(code, text);
            assert!(!err.is_retryable(), "HTTP {} should not be retried", code);
            assert_eq!(err.kind(), "service_error");
        }
    }

    #[test]
    fn test_status_message_names_the_code() {
        assert_eq!(
            status(503, "Service Unavailable").to_string(),
            "geocoding service error: HTTP 503 Service Unavailable"
        );
    }
}
