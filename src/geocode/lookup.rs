//! Place name → single best-match point, for centring a map.

use super::cache::PointCache;
use super::client::GeocodeClient;
use super::types::{GeocodeError, Point};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
struct PointResult {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

pub struct CoordinateLookup {
    client: GeocodeClient,
    cache: Option<PointCache>,
}

impl CoordinateLookup {
    pub fn new(client: GeocodeClient) -> Self {
        Self { client, cache: None }
    }

    pub fn with_cache(mut self, cache: PointCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Look up one place. A miss is [`GeocodeError::NotFound`]; callers decide the
    /// fallback.
    pub fn locate(&mut self, place: &str) -> Result<Point, GeocodeError> {
        if let Some(point) = self.cache.as_ref().and_then(|c| c.get(place)) {
            tracing::debug!(place, %point, "point cache hit");
            return Ok(point);
        }

        let body = self
            .client
            .search(&[("q", place), ("format", "jsonv2"), ("limit", "1")])?;

        let results: Vec<PointResult> =
            serde_json::from_value(body).map_err(|e| GeocodeError::parse(e.to_string()))?;
        let top = results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(place.to_string()))?;

        let point = Point::new(parse_coord(&top.lat, "lat")?, parse_coord(&top.lon, "lon")?);
        tracing::debug!(place, %point, "located");

        if let Some(cache) = self.cache.as_mut() {
            cache.put(place, point, top.display_name);
        }
        Ok(point)
    }

    /// [`locate`](Self::locate), falling back to `default` on any failure.
    pub fn locate_or(&mut self, place: &str, default: Point) -> Point {
        match self.locate(place) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(place, error = %e, fallback = %default, "map centre lookup failed, using default");
                default
            }
        }
    }
}

fn parse_coord(raw: &str, field: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse()
        .map_err(|_| GeocodeError::parse(format!("{} '{}' is not a number", field, raw)))
}
