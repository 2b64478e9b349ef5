//! Deterministic in-memory transport for tests.

use super::transport::Transport;
use super::types::GeocodeError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

/// Answers by the `q` parameter. Unknown queries get an empty result set in the
/// shape the requested `format` implies.
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<String, Value>,
    permanent: Mutex<HashMap<String, GeocodeError>>,
    transient: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, body: Value) -> Self {
        self.responses.insert(query.to_string(), body);
        self
    }

    /// Fail the next `times` calls for `query` with a retryable service error.
    pub fn fail_transiently(&self, query: &str, times: usize) {
        self.transient.lock().unwrap().insert(query.to_string(), times);
    }

    pub fn fail_permanently(&self, query: &str, error: GeocodeError) {
        self.permanent.lock().unwrap().insert(query.to_string(), error);
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn get_json(&self, params: &[(&str, &str)]) -> Result<Value, GeocodeError> {
        let param = |name: &str| params.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);
        let query = param("q").unwrap_or_default().to_string();
        self.calls.lock().unwrap().push((query.clone(), Instant::now()));

        if let Some(err) = self.permanent.lock().unwrap().get(&query) {
            return Err(err.clone());
        }
        if let Some(left) = self.transient.lock().unwrap().get_mut(&query) {
            if *left > 0 {
                *left -= 1;
                return Err(GeocodeError::service("HTTP 503 Service Unavailable", true));
            }
        }

        match self.responses.get(&query) {
            Some(body) => Ok(body.clone()),
            None if param("format") == Some("jsonv2") => Ok(json!([])),
            None => Ok(json!({ "type": "FeatureCollection", "features": [] })),
        }
    }
}

/// A Nominatim `format=geojson` body with one polygon result.
pub fn polygon_response(address: Value, display_name: &str, ring: &[[f64; 2]]) -> Value {
    json!({
        "type": "FeatureCollection",
        "licence": "Data \u{00A9} OpenStreetMap contributors, ODbL 1.0.",
        "features": [{
            "type": "Feature",
            "properties": {
                "place_id": 1,
                "osm_type": "relation",
                "display_name": display_name,
                "address": address,
            },
            "bbox": [18.9, 47.3, 19.3, 47.6],
            "geometry": {
                "type": "Polygon",
                "coordinates": [ring],
            },
        }],
    })
}

/// A Nominatim `format=jsonv2` body with one point result.
pub fn point_response(lat: &str, lon: &str, display_name: &str) -> Value {
    json!([{
        "place_id": 1,
        "lat": lat,
        "lon": lon,
        "display_name": display_name,
        "category": "boundary",
        "type": "administrative",
        "importance": 0.8,
    }])
}
