//! Core types for the geocoding subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single latitude/longitude pair, used to centre a map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lon >= 0.0 { 'E' } else { 'W' };
        write!(f, "{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", self.lat.abs(), ns, self.lon.abs(), ew)
    }
}

/// How the display name of a resolved place is derived from the service response.
///
/// The geocoder's address breakdown is locale dependent, so the rule is explicit
/// configuration rather than a positional assumption baked into the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NameRule {
    /// First non-empty value of the `address` mapping, in the order the service sent it.
    #[default]
    FirstComponent,
    /// First listed key present in the `address` mapping with a non-empty value.
    AddressKeys { keys: Vec<String> },
    /// Leading comma-separated segment of `display_name`.
    DisplayName,
    /// The query string itself.
    Query,
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstComponent => write!(f, "first address component"),
            Self::AddressKeys { keys } => write!(f, "address keys [{}]", keys.join(", ")),
            Self::DisplayName => write!(f, "display name"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// Geocoding errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// The service returned zero results for the query.
    #[error("no geocoding match for '{0}'")]
    NotFound(String),
    /// Transport failure or non-success HTTP status.
    #[error("geocoding service error: {message}")]
    Service { message: String, retryable: bool },
    /// The response did not have the expected shape.
    #[error("malformed geocoding response: {0}")]
    Parse(String),
}

impl GeocodeError {
    pub fn service(message: impl Into<String>, retryable: bool) -> Self {
        Self::Service {
            message: message.into(),
            retryable,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Only transient service failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Service { retryable: true, .. })
    }

    /// Short machine-readable label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Service { .. } => "service_error",
            Self::Parse(_) => "parse_error",
        }
    }
}
