//! Drives the resolver over an ordered address list.
//!
//! One failed address never discards the others: successes go into the collection,
//! failures into a side list, and the run itself cannot fail.

use crate::geocode::{AddressResolver, GeocodeError};
use crate::geometry::{Feature, GeometryCollection};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashSet;

/// An address that could not be resolved, with the reason.
///
/// Serializes as `{ address, kind, error }`, both derived from `cause`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveFailure {
    pub address: String,
    pub cause: GeocodeError,
}

impl ResolveFailure {
    fn new(address: &str, cause: GeocodeError) -> Self {
        Self {
            address: address.to_string(),
            cause,
        }
    }
}

impl Serialize for ResolveFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ResolveFailure", 3)?;
        s.serialize_field("address", &self.address)?;
        s.serialize_field("kind", self.cause.kind())?;
        s.serialize_field("error", &self.cause.to_string())?;
        s.end()
    }
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub collection: GeometryCollection,
    pub failures: Vec<ResolveFailure>,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct PolygonAggregator {
    resolver: AddressResolver,
}

impl PolygonAggregator {
    pub fn new(resolver: AddressResolver) -> Self {
        Self { resolver }
    }

    /// Resolve every address in order, one call at a time.
    pub fn aggregate<S: AsRef<str>>(&self, addresses: &[S]) -> Aggregation {
        let mut features: Vec<Feature> = Vec::with_capacity(addresses.len());
        let mut failures = Vec::new();
        let mut seen = HashSet::new();

        for (i, address) in addresses.iter().enumerate() {
            let address = address.as_ref();
            match self.resolver.resolve_polygon(address) {
                Ok(feature) => {
                    tracing::info!(
                        "[{}/{}] {} -> {}",
                        i + 1,
                        addresses.len(),
                        address,
                        feature.name
                    );
                    if !seen.insert(feature.name.clone()) {
                        tracing::warn!(
                            address,
                            name = %feature.name,
                            "duplicate feature name; only the first will receive joined data"
                        );
                    }
                    features.push(feature);
                }
                Err(e) => {
                    tracing::warn!(address, kind = e.kind(), error = %e, "could not resolve address");
                    failures.push(ResolveFailure::new(address, e));
                }
            }
        }

        tracing::info!(
            resolved = features.len(),
            failed = failures.len(),
            "aggregation finished"
        );

        Aggregation {
            collection: GeometryCollection::new(features),
            failures,
        }
    }
}
