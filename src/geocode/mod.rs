//! Geocoding subsystem: polygon resolution and point lookup against a
//! Nominatim-compatible service, behind one shared rate limiter.

pub mod cache;
pub mod client;
pub mod limiter;
pub mod lookup;
pub mod resolver;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use cache::PointCache;
pub use client::{GeocodeClient, RetryPolicy};
pub use limiter::RateLimiter;
pub use lookup::CoordinateLookup;
pub use resolver::AddressResolver;
pub use transport::{HttpTransport, Transport};
pub use types::{GeocodeError, NameRule, Point};
