use anyhow::{bail, Context, Result};
use listing_map::{
    data::{parse_feature_collection, parse_listings_json},
    EngineConfig, HeadlessSurface, LatLng, ListingMap, Point, Viewport,
};
use std::path::{Path, PathBuf};

const USAGE: &str = "usage: listing-map-app <listings.json|listings.geojson> \
[--config FILE] [--center LAT,LNG] [--zoom Z] [--size WxH] [--region ID]";

struct Args {
    listings: PathBuf,
    config: Option<PathBuf>,
    center: LatLng,
    zoom: f64,
    size: Point,
    region: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut listings = None;
    let mut parsed = Args {
        listings: PathBuf::new(),
        config: None,
        center: LatLng::new(0.0, 0.0),
        zoom: 2.0,
        size: Point::new(1200.0, 800.0),
        region: None,
    };

    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().with_context(|| format!("{} needs a value", name));
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--center" => parsed.center = parse_center(&value("--center")?)?,
            "--zoom" => {
                parsed.zoom = value("--zoom")?
                    .parse()
                    .context("--zoom must be a number")?
            }
            "--size" => parsed.size = parse_size(&value("--size")?)?,
            "--region" => parsed.region = Some(value("--region")?),
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if listings.is_none() && !other.starts_with("--") => {
                listings = Some(PathBuf::from(other))
            }
            other => bail!("unexpected argument '{}'\n{}", other, USAGE),
        }
    }

    parsed.listings = listings.with_context(|| USAGE.to_string())?;
    Ok(parsed)
}

fn parse_center(text: &str) -> Result<LatLng> {
    let (lat, lng) = text
        .split_once(',')
        .context("--center must look like LAT,LNG")?;
    Ok(LatLng::new(lat.trim().parse()?, lng.trim().parse()?))
}

fn parse_size(text: &str) -> Result<Point> {
    let (w, h) = text.split_once('x').context("--size must look like WxH")?;
    Ok(Point::new(w.parse()?, h.parse()?))
}

fn load_listings(path: &Path) -> Result<listing_map::data::ListingBatch> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let is_geojson = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("geojson"))
        .unwrap_or(false);

    let batch = if is_geojson {
        parse_feature_collection(&text)
    } else {
        parse_listings_json(&text)
    };
    batch.with_context(|| format!("parsing {}", path.display()))
}

/// Headless listing map viewer
fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let batch = load_listings(&args.listings)?;
    if batch.rejected > 0 {
        log::warn!("{} records had no usable coordinates", batch.rejected);
    }

    let surface = HeadlessSurface::new(Viewport::new(args.center, args.zoom, args.size));
    let mut map = ListingMap::new(surface, config)?;
    let outcome = map.set_listings(batch.listings)?;
    log::info!("index: {:?}", outcome);

    if let Some(region) = &args.region {
        map.select_region(region)?;
        map.surface_mut().finish_camera();
        map.process_surface_events()?;
    }

    let camera = map.surface().camera();
    println!(
        "camera ({:.5}, {:.5}) z{:.2}, {} listings indexed",
        camera.center.lat,
        camera.center.lng,
        camera.zoom,
        map.index().len()
    );
    for marker in map.surface().markers() {
        println!(
            "{:<24} {:>10.5} {:>11.5}  {}",
            marker.key.to_string(),
            marker.position.lat,
            marker.position.lng,
            marker.graphic.label()
        );
    }
    println!("{} markers", map.surface().marker_count());

    map.teardown();
    Ok(())
}
