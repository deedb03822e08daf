//! OpenStreetMap POI source: Nominatim area lookup + Overpass query.
//!
//! Overpass is rate-limited and slow, so results land in a JSON cache
//! file keyed by city; cached cities never hit the network again. A
//! city Nominatim cannot resolve yields `Ok(None)`.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use kurort_core::{CityPois, PoiRecord, PoiSource, SourceError};

use crate::retry::RetryPolicy;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
const USER_AGENT: &str = "kurort/0.1 (travel advisor)";
/// Politeness delay before each Overpass call.
const OVERPASS_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

/// OSM tag keys that identify a POI.
const POI_TAG_KEYS: [&str; 6] = ["tourism", "historic", "leisure", "sport", "natural", "amenity"];

pub struct OsmPoiSource {
    client: reqwest::Client,
    nominatim_url: String,
    overpass_url: String,
    retry: RetryPolicy,
    cache: Option<PoiFileCache>,
}

impl OsmPoiSource {
    pub fn new(cache_path: Option<PathBuf>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(45))
            .build()
            .map_err(|e| SourceError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            nominatim_url: NOMINATIM_URL.to_string(),
            overpass_url: OVERPASS_URL.to_string(),
            retry: RetryPolicy::default(),
            cache: cache_path.map(PoiFileCache::open),
        })
    }

    /// Resolve a city name to an Overpass area id. Relations and ways
    /// have distinct id offsets; anything else is unusable as an area.
    async fn area_id(&self, city: &str) -> Result<Option<u64>, SourceError> {
        let response = self
            .client
            .get(&self.nominatim_url)
            .query(&[("q", city), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Network(format!(
                "nominatim returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            SourceError::InvalidPayload { origin: "nominatim".into(), reason: e.to_string() }
        })?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        Ok(match place.osm_type.as_str() {
            "relation" => Some(3_600_000_000 + place.osm_id),
            "way" => Some(2_400_000_000 + place.osm_id),
            _ => None,
        })
    }

    async fn query_overpass(&self, area_id: u64) -> Result<Vec<OverpassElement>, SourceError> {
        let query = format!(
            "[out:json][timeout:25];\n\
             area({area_id})->.searchArea;\n\
             (\n\
               node[\"tourism\"~\"museum|attraction|viewpoint\"](area.searchArea);\n\
               node[\"historic\"](area.searchArea);\n\
               node[\"natural\"=\"beach\"](area.searchArea);\n\
               node[\"leisure\"~\"beach_resort|water_park|park|playground|sports_centre\"](area.searchArea);\n\
               node[\"amenity\"~\"theatre|cinema\"](area.searchArea);\n\
               node[\"sport\"~\"skiing|swimming\"](area.searchArea);\n\
             );\n\
             out body;"
        );

        tokio::time::sleep(OVERPASS_DELAY).await;

        let response = self
            .client
            .post(&self.overpass_url)
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Network(format!(
                "overpass returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: OverpassResponse = response.json().await.map_err(|e| {
            SourceError::InvalidPayload { origin: "overpass".into(), reason: e.to_string() }
        })?;

        Ok(body.elements)
    }
}

/// Sort raw Overpass elements into the four POI buckets.
fn categorize(elements: Vec<OverpassElement>) -> CityPois {
    let mut pois = CityPois::default();

    for element in elements {
        let Some(name) = element.tags.get("name") else {
            continue;
        };
        let Some(tag_key) = POI_TAG_KEYS.iter().find(|key| element.tags.contains_key(**key))
        else {
            continue;
        };

        let (bucket, category) = match *tag_key {
            "tourism" | "historic" => (Bucket::Attractions, "attraction"),
            "natural" => (Bucket::Beaches, "beach"),
            "sport" => (Bucket::Sports, "sport"),
            _ => (Bucket::Entertainment, "entertainment"),
        };

        let record = PoiRecord {
            name: name.clone(),
            kind: (*tag_key).to_string(),
            category: category.to_string(),
            description: element.tags.get("description").cloned(),
        };

        match bucket {
            Bucket::Attractions => pois.tourist_attractions.push(record),
            Bucket::Beaches => pois.beaches.push(record),
            Bucket::Entertainment => pois.entertainment.push(record),
            Bucket::Sports => pois.sports_facilities.push(record),
        }
    }

    pois
}

enum Bucket {
    Attractions,
    Beaches,
    Entertainment,
    Sports,
}

#[async_trait]
impl PoiSource for OsmPoiSource {
    fn name(&self) -> &str {
        "osm"
    }

    async fn fetch(&self, city: &str) -> Result<Option<CityPois>, SourceError> {
        if let Some(cache) = &self.cache {
            if let Some(pois) = cache.get(city).await {
                debug!(city = %city, "POI cache hit");
                return Ok(Some(pois));
            }
        }

        let area_id = self.retry.run("nominatim", || self.area_id(city)).await?;
        let Some(area_id) = area_id else {
            warn!(city = %city, "nominatim could not resolve an area");
            return Ok(None);
        };

        let elements = self.retry.run("overpass", || self.query_overpass(area_id)).await?;
        let pois = categorize(elements);

        info!(
            city = %city,
            attractions = pois.tourist_attractions.len(),
            beaches = pois.beaches.len(),
            entertainment = pois.entertainment.len(),
            sports = pois.sports_facilities.len(),
            "POIs fetched"
        );
        if pois.is_empty() {
            warn!(city = %city, "no POIs found, area query may be off");
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(city, pois.clone()).await {
                warn!(city = %city, error = %e, "failed to persist POI cache");
            }
        }

        Ok(Some(pois))
    }
}

/// JSON file cache mapping city name to its categorized POIs. The whole
/// map rewrites on every put; POI data is small and fetches are rare.
pub struct PoiFileCache {
    path: PathBuf,
    entries: RwLock<HashMap<String, CityPois>>,
}

impl PoiFileCache {
    pub fn open(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt POI cache, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!(path = %path.display(), cities = entries.len(), "POI cache loaded");
        Self { path, entries: RwLock::new(entries) }
    }

    pub async fn get(&self, city: &str) -> Option<CityPois> {
        self.entries.read().await.get(city).cloned()
    }

    pub async fn put(&self, city: &str, pois: CityPois) -> Result<(), SourceError> {
        let mut entries = self.entries.write().await;
        entries.insert(city.to_string(), pois);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SourceError::Storage(format!("failed to create cache directory: {e}"))
            })?;
        }
        let content = serde_json::to_string_pretty(&*entries)
            .map_err(|e| SourceError::Storage(format!("failed to serialize POI cache: {e}")))?;
        std::fs::write(&self.path, content)
            .map_err(|e| SourceError::Storage(format!("failed to write POI cache: {e}")))
    }
}

// --- API types (internal) ---

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    osm_id: u64,
    osm_type: String,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn element(pairs: &[(&str, &str)]) -> OverpassElement {
        OverpassElement {
            tags: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn categorization_buckets() {
        let pois = categorize(vec![
            element(&[("name", "Музей истории"), ("tourism", "museum")]),
            element(&[("name", "Крепость"), ("historic", "fortress")]),
            element(&[("name", "Центральный пляж"), ("natural", "beach")]),
            element(&[("name", "Аквапарк"), ("leisure", "water_park")]),
            element(&[("name", "Бассейн"), ("sport", "swimming")]),
            element(&[("tourism", "museum")]), // nameless, dropped
        ]);

        assert_eq!(pois.tourist_attractions.len(), 2);
        assert_eq!(pois.beaches.len(), 1);
        assert_eq!(pois.entertainment.len(), 1);
        assert_eq!(pois.sports_facilities.len(), 1);
        assert_eq!(pois.beaches[0].name, "Центральный пляж");
        assert_eq!(pois.beaches[0].kind, "natural");
    }

    #[test]
    fn nameless_elements_are_dropped() {
        let pois = categorize(vec![element(&[("tourism", "attraction")])]);
        assert!(pois.is_empty());
    }

    #[test]
    fn parse_nominatim_response() {
        let data = r#"[{"osm_id": 1053471, "osm_type": "relation", "display_name": "Сочи"}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(data).unwrap();
        assert_eq!(places[0].osm_id, 1053471);
        assert_eq!(places[0].osm_type, "relation");
    }

    #[tokio::test]
    async fn poi_cache_round_trip() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let cache = PoiFileCache::open(path.clone());
        let pois = CityPois {
            beaches: vec![PoiRecord {
                name: "Маяк".into(),
                kind: "natural".into(),
                category: "beach".into(),
                description: None,
            }],
            ..Default::default()
        };
        cache.put("Анапа", pois).await.unwrap();

        let reloaded = PoiFileCache::open(path);
        let hit = reloaded.get("Анапа").await.unwrap();
        assert_eq!(hit.beaches[0].name, "Маяк");
        assert!(reloaded.get("Сочи").await.is_none());
    }

    #[tokio::test]
    async fn corrupt_cache_starts_empty() {
        let tmp = NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "{ not json").unwrap();
        let cache = PoiFileCache::open(tmp.path().to_path_buf());
        assert!(cache.get("Сочи").await.is_none());
    }
}
