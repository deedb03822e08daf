//! External data sources for Kurort: Wikipedia article content and
//! OpenStreetMap points of interest, both with bounded retry on
//! transport failures.

pub mod osm;
pub mod retry;
pub mod wiki;

pub use osm::{OsmPoiSource, PoiFileCache};
pub use retry::RetryPolicy;
pub use wiki::WikiSource;
