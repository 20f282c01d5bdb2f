use crate::state::AppState;
use chrono::Utc;
use compact_str::CompactString;
use std::time::Duration;

/// Drops readings older than the threshold so the history store stays
/// bounded. Buses left with no readings at all are removed from the
/// map. Favorites are never touched.
pub fn cleanup_old_readings(state: &AppState, threshold: Duration) {
    let cutoff = Utc::now() - chrono::Duration::seconds(threshold.as_secs() as i64);

    let mut removed = 0usize;
    let mut buses_to_remove: Vec<CompactString> = Vec::new();

    for mut r in state.readings.iter_mut() {
        let list = r.value_mut();
        let before = list.len();
        // Sorted ascending, so expired readings are a prefix.
        let keep_from = list.partition_point(|rec| rec.timestamp < cutoff);
        list.drain(..keep_from);
        removed += before - list.len();

        if list.is_empty() {
            buses_to_remove.push(r.key().clone());
        }
    }

    for bus_no in &buses_to_remove {
        state.readings.remove(bus_no);
    }

    if removed > 0 {
        println!(
            "GC: Removed {} expired readings ({} buses emptied).",
            removed,
            buses_to_remove.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::record_reading;
    use crate::state::CongestionReading;

    fn reading(bus: &str, congestion: f64, age_secs: i64) -> CongestionReading {
        CongestionReading {
            bus_number: CompactString::from(bus),
            total_congestion: congestion,
            timestamp: Utc::now() - chrono::Duration::seconds(age_secs),
        }
    }

    #[test]
    fn test_cleanup_old_readings() {
        let state = AppState::new("http://localhost".to_string());

        // 1. Bus with one fresh and one expired reading (2 hours old)
        record_reading(&state, reading("314", 40.0, 7200));
        record_reading(&state, reading("314", 85.0, 60));

        // 2. Bus with only expired readings
        record_reading(&state, reading("102", 20.0, 7200));

        // Run GC with 1 hour threshold
        cleanup_old_readings(&state, Duration::from_secs(3600));

        let kept = state.readings.get("314").unwrap();
        assert_eq!(kept.len(), 1, "Fresh reading should remain");
        assert_eq!(kept[0].total_congestion, 85.0);

        assert!(
            !state.readings.contains_key("102"),
            "Emptied bus should be removed"
        );
    }

    #[test]
    fn test_cleanup_noop_when_all_fresh() {
        let state = AppState::new("http://localhost".to_string());
        record_reading(&state, reading("314", 55.0, 30));

        cleanup_old_readings(&state, Duration::from_secs(3600));

        assert_eq!(state.readings.get("314").unwrap().len(), 1);
    }
}
