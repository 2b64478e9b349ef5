//! File-based cache of point lookups, by default at ~/.choropleth/points.json.
//!
//! Keys are case-insensitive and trimmed. Entries older than the TTL are ignored.

use super::types::Point;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TTL_DAYS: i64 = 30;

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    lat: f64,
    lon: f64,
    /// Unix epoch milliseconds.
    timestamp: i64,
    #[serde(default)]
    display_name: Option<String>,
}

pub struct PointCache {
    path: PathBuf,
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl PointCache {
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".choropleth")
            .join("points.json")
    }

    /// Load from `path`. A missing or unreadable file starts an empty cache.
    pub fn load_from(path: PathBuf, ttl_days: i64) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self {
            path,
            ttl: Duration::days(ttl_days),
            entries,
        }
    }

    fn read_file(path: &Path) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable point cache");
                None
            }
        }
    }

    fn key(query: &str) -> String {
        query.trim().to_lowercase()
    }

    pub fn get(&self, query: &str) -> Option<Point> {
        let entry = self.entries.get(&Self::key(query))?;
        let age = Utc::now().timestamp_millis() - entry.timestamp;
        if age > self.ttl.num_milliseconds() {
            return None;
        }
        Some(Point::new(entry.lat, entry.lon))
    }

    /// Store a point and persist to disk.
    pub fn put(&mut self, query: &str, point: Point, display_name: Option<String>) {
        self.entries.insert(
            Self::key(query),
            CacheEntry {
                lat: point.lat,
                lon: point.lon,
                timestamp: Utc::now().timestamp_millis(),
                display_name,
            },
        );
        self.persist();
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "cannot create cache directory");
                return;
            }
        }
        let result = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&self.path, json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot persist point cache");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
