//! Address → polygon resolution.
//!
//! Query flow: limiter → `format=geojson&polygon_geojson=1&addressdetails=1` search →
//! first result → (name by [`NameRule`], geometry).

use super::client::GeocodeClient;
use super::types::{GeocodeError, NameRule};
use crate::geometry::Feature;
use geojson::Geometry;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Deserialize)]
struct SearchCollection {
    features: Vec<SearchFeature>,
}

#[derive(Deserialize)]
struct SearchFeature {
    #[serde(default)]
    properties: SearchProperties,
    #[serde(default)]
    geometry: Option<Value>,
}

#[derive(Deserialize, Default)]
struct SearchProperties {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<Map<String, Value>>,
}

/// Resolves a single address to a named polygon.
#[derive(Clone)]
pub struct AddressResolver {
    client: GeocodeClient,
    name_rule: NameRule,
}

impl AddressResolver {
    pub fn new(client: GeocodeClient, name_rule: NameRule) -> Self {
        Self { client, name_rule }
    }

    pub fn name_rule(&self) -> &NameRule {
        &self.name_rule
    }

    pub fn resolve_polygon(&self, address: &str) -> Result<Feature, GeocodeError> {
        let body = self.client.search(&[
            ("q", address),
            ("format", "geojson"),
            ("polygon_geojson", "1"),
            ("addressdetails", "1"),
            ("limit", "1"),
        ])?;

        let feature = parse_polygon_response(address, body, &self.name_rule)?;
        tracing::debug!(address, name = %feature.name, "resolved polygon");
        Ok(feature)
    }
}

fn parse_polygon_response(query: &str, body: Value, rule: &NameRule) -> Result<Feature, GeocodeError> {
    let collection: SearchCollection =
        serde_json::from_value(body).map_err(|e| GeocodeError::parse(e.to_string()))?;

    let first = collection
        .features
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NotFound(query.to_string()))?;

    let name = derive_name(query, &first.properties, rule)?;

    let raw = first
        .geometry
        .filter(|g| !g.is_null())
        .ok_or_else(|| GeocodeError::parse(format!("result for '{}' has no geometry", query)))?;
    let geometry: Geometry =
        serde_json::from_value(raw).map_err(|e| GeocodeError::parse(e.to_string()))?;

    match geometry.value {
        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => Ok(Feature { name, geometry }),
        _ => Err(GeocodeError::parse(format!(
            "result for '{}' is not a polygon",
            query
        ))),
    }
}

fn derive_name(query: &str, props: &SearchProperties, rule: &NameRule) -> Result<String, GeocodeError> {
    let address = || {
        props
            .address
            .as_ref()
            .ok_or_else(|| GeocodeError::parse(format!("result for '{}' has no address breakdown", query)))
    };

    let name = match rule {
        NameRule::FirstComponent => address()?.values().find_map(non_empty),
        NameRule::AddressKeys { keys } => {
            let address = address()?;
            keys.iter().find_map(|k| address.get(k).and_then(non_empty))
        }
        NameRule::DisplayName => props
            .display_name
            .as_deref()
            .and_then(|d| d.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        NameRule::Query => Some(query.trim().to_string()).filter(|s| !s.is_empty()),
    };

    name.ok_or_else(|| GeocodeError::parse(format!("cannot derive a name for '{}' using the {} rule", query, rule)))
}

fn non_empty(v: &Value) -> Option<String> {
    v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
