pub mod ask;
pub mod fetch_pois;
pub mod onboard;
