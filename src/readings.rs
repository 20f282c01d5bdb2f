use crate::state::{AppState, CongestionReading};
use chrono::{DateTime, Duration, Utc};

/// Most recent reading for the bus, or None if it has never reported.
pub fn latest_reading(state: &AppState, bus_no: &str) -> Option<CongestionReading> {
    state
        .readings
        .get(bus_no)
        .and_then(|r| r.value().last().cloned())
}

/// All readings for the bus with timestamp >= now - hours, ascending.
/// The boundary timestamp itself is included. `hours` comes straight
/// from a query parameter; a window too wide to represent means
/// "everything", and a negative window starts in the future and so
/// matches nothing.
pub fn history(state: &AppState, bus_no: &str, hours: i64) -> Vec<CongestionReading> {
    let threshold = Duration::try_hours(hours)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    history_since(state, bus_no, threshold)
}

fn history_since(
    state: &AppState,
    bus_no: &str,
    threshold: DateTime<Utc>,
) -> Vec<CongestionReading> {
    match state.readings.get(bus_no) {
        Some(r) => r
            .value()
            .iter()
            .filter(|rec| rec.timestamp >= threshold)
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

/// Inserts a reading, keeping the per-bus vec sorted ascending by
/// timestamp. Readings normally arrive in order, so this is an append;
/// the occasional late arrival is placed where it belongs.
pub fn record_reading(state: &AppState, reading: CongestionReading) {
    let mut entry = state.readings.entry(reading.bus_number.clone()).or_default();
    let list = entry.value_mut();
    let out_of_order = list
        .last()
        .is_some_and(|last| last.timestamp > reading.timestamp);
    if out_of_order {
        let pos = list.partition_point(|r| r.timestamp <= reading.timestamp);
        list.insert(pos, reading);
    } else {
        list.push(reading);
    }
}
