use crate::stations::StationManager;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use dashmap::DashMap;

use serde::{Deserialize, Serialize};

// The dashboard is single-user; every favorites route operates on this id.
pub const USER_ID: &str = "anonymous_user";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CongestionReading {
    pub bus_number: CompactString,
    pub total_congestion: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FavoritesRecord {
    // Insertion-ordered, no duplicates.
    pub favorite_buses: Vec<CompactString>,
}

pub struct AppState {
    // Map UserID -> favorites record
    pub favorites: DashMap<CompactString, FavoritesRecord>,

    // Map BusNumber -> readings sorted ascending by timestamp
    pub readings: DashMap<CompactString, Vec<CongestionReading>>,

    pub stations: StationManager,
}

impl AppState {
    pub fn new(stations_url: String) -> Self {
        Self {
            favorites: DashMap::new(),
            readings: DashMap::new(),
            stations: StationManager::new(stations_url),
        }
    }
}
