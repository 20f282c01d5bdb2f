use crate::state::{AppState, CongestionReading, FavoritesRecord};
use compact_str::CompactString;

use anyhow::Result;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

pub fn save_state(state: &AppState, dir: &str) -> Result<()> {
    let _ = std::fs::create_dir_all(dir);

    // 1. Save Favorites (Bincode)
    let favorites_path = format!("{}/favorites.bin", dir);
    // Collect DashMap to HashMap for serialization
    let mut fav_map = HashMap::new();
    for r in state.favorites.iter() {
        fav_map.insert(r.key().clone(), r.value().clone());
    }
    let f = File::create(favorites_path)?;
    bincode::serialize_into(f, &fav_map)?;

    // 2. Save Readings (Bincode)
    let readings_path = format!("{}/readings.bin", dir);
    let mut reading_map = HashMap::new();
    for r in state.readings.iter() {
        reading_map.insert(r.key().clone(), r.value().clone());
    }
    let f = File::create(readings_path)?;
    bincode::serialize_into(f, &reading_map)?;

    Ok(())
}

pub fn load_state(state: &AppState, dir: &str) -> Result<()> {
    let favorites_path = format!("{}/favorites.bin", dir);
    if Path::new(&favorites_path).exists() {
        let f = File::open(favorites_path)?;
        let fav_map: HashMap<CompactString, FavoritesRecord> = bincode::deserialize_from(f)?;

        for (user, record) in fav_map {
            state.favorites.insert(user, record);
        }
        println!("Loaded favorites for {} users.", state.favorites.len());
    }

    let readings_path = format!("{}/readings.bin", dir);
    if Path::new(&readings_path).exists() {
        let f = File::open(readings_path)?;
        let reading_map: HashMap<CompactString, Vec<CongestionReading>> =
            bincode::deserialize_from(f)?;

        for (bus_no, readings) in reading_map {
            state.readings.insert(bus_no, readings);
        }
        println!("Loaded readings for {} buses.", state.readings.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::add_favorite;
    use crate::readings::{latest_reading, record_reading};
    use chrono::Utc;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();

        let state = AppState::new("http://localhost".to_string());
        add_favorite(&state, "anonymous_user", "314");
        add_favorite(&state, "anonymous_user", "102");
        record_reading(
            &state,
            CongestionReading {
                bus_number: CompactString::from("314"),
                total_congestion: 72.5,
                timestamp: Utc::now(),
            },
        );

        save_state(&state, dir_str).unwrap();

        let restored = AppState::new("http://localhost".to_string());
        load_state(&restored, dir_str).unwrap();

        assert_eq!(
            restored
                .favorites
                .get("anonymous_user")
                .unwrap()
                .favorite_buses,
            vec!["314", "102"]
        );
        let latest = latest_reading(&restored, "314").unwrap();
        assert_eq!(latest.total_congestion, 72.5);
    }

    #[test]
    fn test_load_missing_files_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new("http://localhost".to_string());
        load_state(&state, dir.path().to_str().unwrap()).unwrap();
        assert!(state.favorites.is_empty());
        assert!(state.readings.is_empty());
    }
}
