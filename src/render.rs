//! Choropleth render request and its HTML artifact.
//!
//! The page is a single self-contained document: Leaflet from a CDN, OpenStreetMap
//! tiles, the joined GeoJSON inline, and a server-rendered legend.

use crate::config::{MapConfig, StyleConfig};
use crate::error::{Error, Result};
use crate::geocode::Point;
use crate::geometry::{GeometryCollection, KEY_PATH};
use crate::join::JoinResult;
use geojson::FeatureCollection;
use serde_json::json;
use std::fs;
use std::path::Path;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<!-- generated by choropleth {{version}} at {{generated}} -->
<html>
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
  html, body, #map { height: 100%; margin: 0; }
  .legend { background: #fff; padding: 6px 10px; font: 12px sans-serif; line-height: 18px; border-radius: 4px; }
  .legend i { width: 16px; height: 16px; float: left; margin-right: 6px; }
</style>
</head>
<body>
<div id="map"></div>
<script>
const data = {{geojson}};
const opts = {{options}};
const keyOf = f => opts.key_path.split('.').slice(1).reduce((o, k) => (o == null ? o : o[k]), f);

const map = L.map('map').setView(opts.center, opts.zoom);
L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
  maxZoom: 19,
  attribution: '&copy; OpenStreetMap contributors'
}).addTo(map);

const layer = L.geoJSON(data, {
  style: f => ({
    fillColor: f.properties.fill,
    fillOpacity: opts.fill_opacity,
    color: '#000',
    weight: 1,
    opacity: opts.line_opacity
  }),
  onEachFeature: (f, l) => {
    const v = f.properties.value;
    l.bindTooltip(keyOf(f) + ': ' + (v === null ? 'no data' : v.toLocaleString()));
  }
}).addTo(map);

L.control.layers(null, { [opts.title]: layer }, { collapsed: false }).addTo(map);

const legend = L.control({ position: 'bottomright' });
legend.onAdd = () => {
  const div = L.DomUtil.create('div', 'legend');
  div.innerHTML = opts.legend_html;
  return div;
};
legend.addTo(map);
</script>
</body>
</html>
"#;

/// Everything the renderer needs, borrowed from one pipeline run.
pub struct RenderRequest<'a> {
    pub collection: &'a GeometryCollection,
    pub join: &'a JoinResult,
    pub key_path: &'a str,
    pub style: &'a StyleConfig,
    pub title: &'a str,
    pub legend: &'a str,
    pub center: Point,
    pub zoom: u8,
}

impl<'a> RenderRequest<'a> {
    /// Title, legend and zoom come from `map`; the centre is resolved by the caller.
    pub fn new(
        collection: &'a GeometryCollection,
        join: &'a JoinResult,
        map: &'a MapConfig,
        style: &'a StyleConfig,
        center: Point,
    ) -> Self {
        Self {
            collection,
            join,
            key_path: KEY_PATH,
            style,
            title: &map.title,
            legend: &map.legend,
            center,
            zoom: map.zoom,
        }
    }

    /// The collection with `value`, `bin` and `fill` added to every feature's
    /// properties. No-data features get the no-data colour.
    pub fn joined_geojson(&self) -> Result<FeatureCollection> {
        if self.join.features.len() != self.collection.len() {
            return Err(Error::Misaligned {
                join: self.join.features.len(),
                collection: self.collection.len(),
            });
        }
        let colors = self.style.colors()?;

        let mut fc = self.collection.to_geojson();
        for (feature, joined) in fc.features.iter_mut().zip(&self.join.features) {
            let fill = joined
                .bin
                .and_then(|b| colors.get(b).copied())
                .unwrap_or(self.style.no_data_color.as_str());
            let props = feature.properties.get_or_insert_with(Default::default);
            props.insert("value".into(), json!(joined.value));
            props.insert("bin".into(), json!(joined.bin));
            props.insert("fill".into(), json!(fill));
        }
        Ok(fc)
    }

    fn legend_html(&self, colors: &[&str]) -> String {
        let mut html = format!("<strong>{}</strong><br>", escape_html(self.legend));
        let breaks = &self.join.classification.breaks;
        for (i, window) in breaks.windows(2).enumerate() {
            if let Some(color) = colors.get(i) {
                html.push_str(&format!(
                    "<i style=\"background:{}\"></i>{} &ndash; {}<br>",
                    color,
                    format_number(window[0]),
                    format_number(window[1])
                ));
            }
        }
        html.push_str(&format!(
            "<i style=\"background:{}\"></i>no data",
            escape_html(&self.style.no_data_color)
        ));
        html
    }

    pub fn to_html(&self) -> Result<String> {
        let geojson = serde_json::to_string(&self.joined_geojson()?)?;
        let colors = self.style.colors()?;
        let options = json!({
            "key_path": self.key_path,
            "title": self.title,
            "center": [self.center.lat, self.center.lon],
            "zoom": self.zoom,
            "fill_opacity": self.style.fill_opacity,
            "line_opacity": self.style.line_opacity,
            "palette": self.style.palette,
            "legend_html": self.legend_html(&colors),
        });

        Ok(TEMPLATE
            .replace("{{version}}", env!("CARGO_PKG_VERSION"))
            .replace("{{generated}}", &chrono::Utc::now().to_rfc3339())
            .replace("{{title}}", &escape_html(self.title))
            .replace("{{geojson}}", &script_safe(&geojson))
            .replace("{{options}}", &script_safe(&options.to_string())))
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        let html = self.to_html()?;
        fs::write(path, html).map_err(|e| Error::io(path, e))?;
        tracing::info!(path = %path.display(), features = self.collection.len(), "wrote map");
        Ok(())
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// JSON inside a `<script>` element must not close the element early.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}
