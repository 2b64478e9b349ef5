//! Named features and the ordered collection produced by one aggregation run.
//!
//! On disk a collection is a GeoJSON FeatureCollection where every feature carries
//! `properties.name` (the join key) and its polygon geometry. Writing and reading
//! back yields the same features in the same order.

use crate::error::{Error, Result};
use geojson::{FeatureCollection, GeoJson, Geometry, JsonObject};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Property holding the join key on every persisted feature.
pub const NAME_PROPERTY: &str = "name";

/// Key path a renderer uses to reach the join key.
pub const KEY_PATH: &str = "feature.properties.name";

/// One resolved place.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: String,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// GeoJSON form with only the name property.
    pub fn to_geojson(&self) -> geojson::Feature {
        let mut properties = JsonObject::new();
        properties.insert(NAME_PROPERTY.to_string(), self.name.clone().into());
        geojson::Feature {
            bbox: None,
            geometry: Some(self.geometry.clone()),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Ordered, immutable set of features.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryCollection {
    features: Vec<Feature>,
}

impl GeometryCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: None,
        }
    }

    pub fn from_geojson(collection: FeatureCollection) -> Result<Self> {
        let mut features = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get(NAME_PROPERTY))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .ok_or(Error::MissingName { index })?
                .to_string();
            let geometry = feature
                .geometry
                .ok_or_else(|| Error::MissingGeometry {
                    index,
                    name: name.clone(),
                })?;
            features.push(Feature { name, geometry });
        }
        Ok(Self { features })
    }

    /// Write the collection as a GeoJSON file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.to_geojson())?;
        writer.flush().map_err(|e| Error::io(path, e))?;
        tracing::debug!(path = %path.display(), features = self.len(), "wrote geometry file");
        Ok(())
    }

    /// Read a collection previously written by [`write_to`](Self::write_to) or any
    /// FeatureCollection following the same `properties.name` convention.
    pub fn read_from(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        match GeoJson::from_reader(BufReader::new(file))? {
            GeoJson::FeatureCollection(fc) => Self::from_geojson(fc),
            _ => Err(Error::NotACollection),
        }
    }
}

#[cfg(test)]
pub(crate) fn square(name: &str, x: f64, y: f64) -> Feature {
    let ring = vec![
        vec![x, y],
        vec![x + 1.0, y],
        vec![x + 1.0, y + 1.0],
        vec![x, y + 1.0],
        vec![x, y],
    ];
    Feature::new(name, Geometry::new(geojson::Value::Polygon(vec![ring])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_preserves_order_and_geometry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geodata.json");

        let multi = Geometry::new(geojson::Value::MultiPolygon(vec![
            vec![vec![
                vec![19.05, 47.49],
                vec![19.0625, 47.5],
                vec![19.07, 47.48],
                vec![19.05, 47.49],
            ]],
            vec![vec![
                vec![-0.1, 0.1],
                vec![0.2, 0.1],
                vec![0.2, -0.3],
                vec![-0.1, 0.1],
            ]],
        ]));
        let collection = GeometryCollection::new(vec![
            square("Pest", 19.0, 47.0),
            Feature::new("Budapest", multi),
            square("Baranya", 18.0, 46.0),
        ]);

        collection.write_to(&path).unwrap();
        let back = GeometryCollection::read_from(&path).unwrap();

        assert_eq!(back, collection);
        assert_eq!(back.names().collect::<Vec<_>>(), vec!["Pest", "Budapest", "Baranya"]);
    }

    #[test]
    fn test_empty_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.json");
        GeometryCollection::empty().write_to(&path).unwrap();
        assert!(GeometryCollection::read_from(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_rejects_missing_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"title":"Pest"},
                 "geometry":{"type":"Point","coordinates":[19.0,47.0]}}]}"#,
        )
        .unwrap();

        let err = GeometryCollection::read_from(&path).unwrap_err();
        assert!(matches!(err, Error::MissingName { index: 0 }));
    }

    #[test]
    fn test_read_rejects_missing_geometry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"name":"Pest"},"geometry":null}]}"#,
        )
        .unwrap();

        let err = GeometryCollection::read_from(&path).unwrap_err();
        assert!(matches!(err, Error::MissingGeometry { index: 0, .. }));
    }

    #[test]
    fn test_read_rejects_non_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("point.json");
        std::fs::write(&path, r#"{"type":"Point","coordinates":[19.0,47.0]}"#).unwrap();
        assert!(matches!(
            GeometryCollection::read_from(&path).unwrap_err(),
            Error::NotACollection
        ));
    }

    #[test]
    fn test_persisted_shape() {
        let fc = GeometryCollection::new(vec![square("Pest", 0.0, 0.0)]).to_geojson();
        let value = serde_json::to_value(&fc).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["properties"]["name"], "Pest");
        assert_eq!(value["features"][0]["geometry"]["type"], "Polygon");
    }
}
