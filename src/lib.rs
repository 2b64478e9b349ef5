//! Geocode place names into boundary polygons, join a tabular dataset to them by
//! name, and render the result as a choropleth map.
//!
//! Pipeline: [`PolygonAggregator`](aggregate::PolygonAggregator) →
//! [`GeometryCollection`](geometry::GeometryCollection) →
//! [`DatasetJoiner`](join::DatasetJoiner) → [`RenderRequest`](render::RenderRequest).

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod geocode;
pub mod geometry;
pub mod join;
pub mod palette;
pub mod render;
pub mod server;

pub use error::{Error, Result};
