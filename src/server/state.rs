use crate::geocode::CoordinateLookup;
use crate::join::JoinResult;
use std::sync::Mutex;

/// Everything is rendered once at startup; only point lookups hit the service.
pub struct AppState {
    pub page: String,
    pub geometry: serde_json::Value,
    pub join: JoinResult,
    pub lookup: Mutex<CoordinateLookup>,
}
