//! `kurort fetch-pois` — Warm the OpenStreetMap POI cache for every
//! configured city.

use anyhow::Context;
use tracing::warn;

use kurort_config::AppConfig;
use kurort_core::PoiSource;
use kurort_sources::OsmPoiSource;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let source = OsmPoiSource::new(Some(config.poi_cache_path()))?;

    let cities = config.cities.all();
    println!("Fetching POI data for {} cities...", cities.len());

    for city in &cities {
        match source.fetch(city).await {
            Ok(Some(pois)) => {
                println!(
                    "  {city}: {} attractions, {} beaches, {} entertainment, {} sports",
                    pois.tourist_attractions.len(),
                    pois.beaches.len(),
                    pois.entertainment.len(),
                    pois.sports_facilities.len(),
                );
            }
            Ok(None) => println!("  {city}: no OSM area found"),
            Err(e) => warn!(city = %city, error = %e, "POI fetch failed"),
        }
    }

    println!("Done. Cache at {}", config.poi_cache_path().display());
    Ok(())
}
