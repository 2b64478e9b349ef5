//! TOML configuration. Every field has a default, so an absent file is a valid
//! configuration.

use crate::dataset::TableLayout;
use crate::error::{Error, Result};
use crate::geocode::{
    transport, CoordinateLookup, GeocodeClient, HttpTransport, NameRule, Point, PointCache,
    RateLimiter, RetryPolicy,
};
use crate::palette::{self, MAX_CLASSES, MIN_CLASSES};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "choropleth.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub geocoder: GeocoderConfig,
    pub dataset: DatasetConfig,
    pub map: MapConfig,
    pub style: StyleConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// Fair-use floor between consecutive service calls.
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub name_rule: NameRule,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: transport::DEFAULT_ENDPOINT.to_string(),
            user_agent: transport::DEFAULT_USER_AGENT.to_string(),
            min_interval_ms: 500,
            timeout_secs: 10,
            retries: 1,
            backoff_ms: 1000,
            name_rule: NameRule::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub delimiter: String,
    pub key_column: String,
    pub value_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.csv"),
            delimiter: ";".into(),
            key_column: "name".into(),
            value_column: "value".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub geometry: PathBuf,
    pub output: PathBuf,
    pub title: String,
    pub legend: String,
    /// Place name looked up to centre the map.
    pub center: Option<String>,
    /// `[lat, lon]` used when there is no centre name or the lookup fails.
    pub default_center: [f64; 2],
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            geometry: PathBuf::from("geodata.json"),
            output: PathBuf::from("index.html"),
            title: "Choropleth".into(),
            legend: "Value".into(),
            center: None,
            default_center: [0.0, 0.0],
            zoom: 6,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    pub palette: String,
    pub bins: usize,
    pub fill_opacity: f64,
    pub line_opacity: f64,
    pub no_data_color: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            palette: "YlOrRd".into(),
            bins: 5,
            fill_opacity: 0.7,
            line_opacity: 0.2,
            no_data_color: "#bdbdbd".into(),
        }
    }
}

impl StyleConfig {
    /// Class colours, light to dark.
    pub fn colors(&self) -> Result<Vec<&'static str>> {
        let ramp = palette::get_palette(&self.palette)
            .ok_or_else(|| Error::Config(format!("unknown palette '{}'", self.palette)))?;
        Ok(palette::sample(ramp, self.bins))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub path: Option<PathBuf>,
    pub ttl_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            ttl_days: crate::geocode::cache::DEFAULT_TTL_DAYS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let style = &self.style;
        if !(MIN_CLASSES..=MAX_CLASSES).contains(&style.bins) {
            return Err(Error::Config(format!(
                "style.bins must be between {} and {}, got {}",
                MIN_CLASSES, MAX_CLASSES, style.bins
            )));
        }
        for (field, v) in [("fill_opacity", style.fill_opacity), ("line_opacity", style.line_opacity)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(Error::Config(format!("style.{} must be within 0..=1, got {}", field, v)));
            }
        }
        style.colors()?;
        self.delimiter()?;
        if self.geocoder.timeout_secs == 0 {
            return Err(Error::Config("geocoder.timeout_secs must be positive".into()));
        }
        let [lat, lon] = self.map.default_center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::Config("map.default_center must be [lat, lon] within -90..90, -180..180".into()));
        }
        Ok(())
    }

    fn delimiter(&self) -> Result<u8> {
        match self.dataset.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ if self.dataset.delimiter == "\\t" => Ok(b'\t'),
            _ => Err(Error::Config(format!(
                "dataset.delimiter must be a single ASCII character, got '{}'",
                self.dataset.delimiter
            ))),
        }
    }

    pub fn table_layout(&self) -> Result<TableLayout> {
        Ok(TableLayout {
            delimiter: self.delimiter()?,
            key_column: self.dataset.key_column.clone(),
            value_column: self.dataset.value_column.clone(),
        })
    }

    pub fn default_center(&self) -> Point {
        let [lat, lon] = self.map.default_center;
        Point::new(lat, lon)
    }

    /// One client, and therefore one rate limiter, per configured service.
    pub fn geocode_client(&self) -> GeocodeClient {
        let g = &self.geocoder;
        let transport = HttpTransport::new(&g.endpoint, &g.user_agent, Duration::from_secs(g.timeout_secs));
        GeocodeClient::new(
            Arc::new(transport),
            Arc::new(RateLimiter::new(Duration::from_millis(g.min_interval_ms))),
            RetryPolicy {
                retries: g.retries,
                backoff: Duration::from_millis(g.backoff_ms),
            },
        )
    }

    pub fn coordinate_lookup(&self, client: GeocodeClient) -> CoordinateLookup {
        let lookup = CoordinateLookup::new(client);
        if !self.cache.enabled {
            return lookup;
        }
        let path = self.cache.path.clone().unwrap_or_else(PointCache::default_path);
        lookup.with_cache(PointCache::load_from(path, self.cache.ttl_days))
    }
}
