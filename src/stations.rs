use anyhow::Result;
use gtfs_structures::Gtfs;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Holds the station reference list loaded from the static GTFS feed.
/// Stations change rarely, so the list is rebuilt at most once an hour
/// by a background thread; readers keep whatever loaded last on
/// refresh failure.
pub struct StationManager {
    url: String,
    data: Arc<RwLock<Vec<Station>>>,
}

impl StationManager {
    pub fn new(url: String) -> Self {
        Self {
            url,
            data: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn start_updater(&self) {
        let data_clone = self.data.clone();
        let url = self.url.clone();

        thread::spawn(move || {
            loop {
                thread::sleep(Duration::from_secs(3600));
                log_info("Refreshing station data...");
                match Self::download_and_build(&url) {
                    Ok(stations) => {
                        let count = stations.len();
                        {
                            let mut d = data_clone.write().unwrap();
                            *d = stations;
                        }
                        log_info(&format!("Station data refreshed: {} stations.", count));
                    }
                    Err(e) => {
                        eprintln!("Failed to refresh station data: {:?}", e);
                    }
                }
            }
        });
    }

    // Try to load immediately (blocking), returns error if fails
    pub fn load_initial(&self) -> Result<()> {
        log_info("Performing initial station load...");
        let stations = Self::download_and_build(&self.url)?;
        let count = stations.len();
        {
            let mut d = self.data.write().unwrap();
            *d = stations;
        }
        log_info(&format!("Initial station load complete: {} stations.", count));
        Ok(())
    }

    pub fn all_stations(&self) -> Vec<Station> {
        self.data.read().unwrap().clone()
    }

    /// Case-insensitive substring match on the station name. An empty
    /// query matches everything.
    pub fn search(&self, query: &str) -> Vec<Station> {
        let needle = query.to_lowercase();
        self.data
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn has_data(&self) -> bool {
        !self.data.read().unwrap().is_empty()
    }

    #[cfg(test)]
    pub fn set_stations(&self, stations: Vec<Station>) {
        *self.data.write().unwrap() = stations;
    }

    fn download_and_build(url: &str) -> Result<Vec<Station>> {
        let gtfs = Gtfs::new(url).map_err(|e| anyhow::anyhow!("Gtfs error: {:?}", e))?;
        println!("Downloaded stations GTFS");

        // Stops without a name or coordinates are useless on the map.
        let mut stations = Vec::new();
        for stop in gtfs.stops.values() {
            let (Some(name), Some(lat), Some(lon)) =
                (stop.name.as_ref(), stop.latitude, stop.longitude)
            else {
                continue;
            };
            stations.push(Station {
                name: name.clone(),
                lat,
                lon,
            });
        }
        Ok(stations)
    }
}

pub fn log_info(msg: &str) {
    println!("[{}] {}", chrono::Utc::now().to_rfc3339(), msg);
}
