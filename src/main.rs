use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use choropleth::aggregate::PolygonAggregator;
use choropleth::config::{AppConfig, DEFAULT_CONFIG_FILE};
use choropleth::dataset;
use choropleth::geocode::{AddressResolver, GeocodeClient, GeocodeError, Point};
use choropleth::geometry::GeometryCollection;
use choropleth::join::{DatasetJoiner, JoinResult};
use choropleth::render::RenderRequest;
use choropleth::server;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Geocoded choropleth maps.
///
/// Resolves place names to boundary polygons through a Nominatim-compatible
/// service, joins a delimited dataset to them by name, and renders a map.
///
/// Examples:
///   choropleth fetch Budapest Pest Baranya -o geodata.json
///   choropleth fetch --input counties.txt
///   choropleth locate "Budapest"
///   choropleth render --data hun_county.csv
///   choropleth serve
#[derive(Parser)]
#[command(name = "choropleth", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults to ./choropleth.toml when present.
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Do not contact the geocoder for the map centre; use map.default_center.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve place names to polygons and write the geometry file.
    Fetch {
        /// Place names, resolved in the given order.
        addresses: Vec<String>,

        /// Read additional place names from a file, one per line.
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Geometry file to write. Defaults to map.geometry.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Look up the coordinates of one place.
    Locate {
        place: String,
    },
    /// Join the dataset to the geometry file and write the HTML map.
    Render {
        /// Geometry file. Defaults to map.geometry.
        #[arg(long, short = 'g')]
        geometry: Option<PathBuf>,

        /// Delimited dataset. Defaults to dataset.path.
        #[arg(long, short = 'd')]
        data: Option<PathBuf>,

        /// HTML file to write. Defaults to map.output.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Render in memory and serve the map over HTTP.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "choropleth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let client = config.geocode_client();

    match cli.command {
        Commands::Fetch {
            addresses,
            input,
            output,
        } => fetch(&config, client, addresses, input, output),
        Commands::Locate { place } => locate(&config, client, &place),
        Commands::Render {
            geometry,
            data,
            output,
        } => {
            let geometry = geometry.unwrap_or_else(|| config.map.geometry.clone());
            let data = data.unwrap_or_else(|| config.dataset.path.clone());
            let output = output.unwrap_or_else(|| config.map.output.clone());

            let (collection, join) = load_and_join(&config, &geometry, &data)?;
            let center = map_center(&config, client, cli.offline);
            request(&config, &collection, &join, center).write_html(&output)?;
            report_join(&join);
            Ok(())
        }
        Commands::Serve { host, port } => {
            let (collection, join) =
                load_and_join(&config, &config.map.geometry, &config.dataset.path)?;
            report_join(&join);
            let center = map_center(&config, client.clone(), cli.offline);
            let app = server::build_router(
                &request(&config, &collection, &join, center),
                config.coordinate_lookup(client),
            )?;

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            tokio::runtime::Runtime::new()
                .context("cannot start async runtime")?
                .block_on(server::start(app, &host, port))
                .with_context(|| format!("server on {}:{} failed", host, port))
        }
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    match explicit {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            AppConfig::load_from_file(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("failed to load config {}", DEFAULT_CONFIG_FILE))
        }
        None => Ok(AppConfig::default()),
    }
}

fn fetch(
    config: &AppConfig,
    client: GeocodeClient,
    mut addresses: Vec<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(path) = input {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read address list {}", path.display()))?;
        addresses.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string),
        );
    }
    if addresses.is_empty() {
        bail!("no addresses given; pass them as arguments or with --input");
    }

    let resolver = AddressResolver::new(client, config.geocoder.name_rule.clone());
    tracing::info!(
        addresses = addresses.len(),
        min_interval_ms = config.geocoder.min_interval_ms,
        name_rule = %resolver.name_rule(),
        "resolving polygons"
    );
    let aggregation = PolygonAggregator::new(resolver).aggregate(&addresses);

    let output = output.unwrap_or_else(|| config.map.geometry.clone());
    aggregation.collection.write_to(&output)?;
    tracing::info!(
        path = %output.display(),
        features = aggregation.collection.len(),
        "geometry file written"
    );

    // Failures go to stdout as JSON so partial success is machine-checkable.
    println!("{}", serde_json::to_string_pretty(&aggregation.failures)?);
    Ok(())
}

fn locate(config: &AppConfig, client: GeocodeClient, place: &str) -> anyhow::Result<()> {
    let mut lookup = config.coordinate_lookup(client);
    match lookup.locate(place) {
        Ok(point) => {
            println!("{}", serde_json::to_string_pretty(&point)?);
            tracing::info!(place, %point, "located");
            Ok(())
        }
        Err(e @ GeocodeError::NotFound(_)) => bail!(e),
        Err(e) => Err(e).with_context(|| format!("lookup of '{}' failed", place)),
    }
}

fn load_and_join(
    config: &AppConfig,
    geometry: &Path,
    data: &Path,
) -> anyhow::Result<(GeometryCollection, JoinResult)> {
    let collection = GeometryCollection::read_from(geometry)
        .with_context(|| format!("failed to read geometry file {}", geometry.display()))?;
    let rows = dataset::load_rows(data, &config.table_layout()?)
        .with_context(|| format!("failed to load dataset {}", data.display()))?;
    let join = DatasetJoiner::new(config.style.bins).join(&collection, &rows);
    Ok((collection, join))
}

fn map_center(config: &AppConfig, client: GeocodeClient, offline: bool) -> Point {
    let default = config.default_center();
    match (&config.map.center, offline) {
        (Some(place), false) => config.coordinate_lookup(client).locate_or(place, default),
        _ => default,
    }
}

fn request<'a>(
    config: &'a AppConfig,
    collection: &'a GeometryCollection,
    join: &'a JoinResult,
    center: Point,
) -> RenderRequest<'a> {
    RenderRequest::new(collection, join, &config.map, &config.style, center)
}

fn report_join(join: &JoinResult) {
    tracing::info!(
        features = join.features.len(),
        matched = join.matched(),
        mismatched_rows = join.mismatches.len(),
        "dataset joined"
    );
    for f in join.no_data() {
        tracing::warn!(name = %f.name, "feature has no data");
    }
    for name in &join.duplicate_features {
        tracing::warn!(name = %name, "duplicate feature name; later occurrence left without data");
    }
    for row in &join.shadowed_rows {
        tracing::warn!(key = %row.key, value = row.value, "duplicate dataset key ignored");
    }
}
