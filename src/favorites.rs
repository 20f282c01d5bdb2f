use crate::state::AppState;
use compact_str::CompactString;

// All three operations go through the DashMap entry for the user's key,
// so the whole read-modify-write happens under that shard's lock. No
// full-document overwrite, no lost updates between concurrent callers.

pub fn list_favorites(state: &AppState, user: &str) -> Vec<CompactString> {
    state
        .favorites
        .get(user)
        .map(|r| r.favorite_buses.clone())
        .unwrap_or_default()
}

/// Adds `bus_no` to the user's favorites. Returns false (and writes
/// nothing) when the bus is already favorited. Matching is
/// case-sensitive exact.
pub fn add_favorite(state: &AppState, user: &str, bus_no: &str) -> bool {
    let mut record = state
        .favorites
        .entry(CompactString::from(user))
        .or_default();
    if record.favorite_buses.iter().any(|b| b == bus_no) {
        return false;
    }
    record.favorite_buses.push(CompactString::from(bus_no));
    true
}

/// Removes `bus_no` if present. Returns whether anything was removed.
pub fn remove_favorite(state: &AppState, user: &str, bus_no: &str) -> bool {
    if let Some(mut record) = state.favorites.get_mut(user) {
        let before = record.favorite_buses.len();
        record.favorite_buses.retain(|b| b != bus_no);
        return record.favorite_buses.len() != before;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn test_state() -> AppState {
        AppState::new("http://localhost".to_string())
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let state = test_state();
        assert!(add_favorite(&state, "u1", "314"));
        assert!(!add_favorite(&state, "u1", "314"));
        assert_eq!(list_favorites(&state, "u1"), vec!["314"]);
    }

    #[test]
    fn test_remove_absent_unchanged() {
        let state = test_state();
        add_favorite(&state, "u1", "314");
        assert!(!remove_favorite(&state, "u1", "102"));
        assert_eq!(list_favorites(&state, "u1"), vec!["314"]);

        // Removing for a user with no record at all is also a no-op.
        assert!(!remove_favorite(&state, "nobody", "314"));
    }

    #[test]
    fn test_add_remove_round_trip() {
        let state = test_state();
        add_favorite(&state, "u1", "314");
        add_favorite(&state, "u1", "102");
        let prior = list_favorites(&state, "u1");

        assert!(add_favorite(&state, "u1", "608"));
        assert!(remove_favorite(&state, "u1", "608"));
        assert_eq!(list_favorites(&state, "u1"), prior);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let state = test_state();
        for bus in ["608", "102", "314"] {
            add_favorite(&state, "u1", bus);
        }
        assert_eq!(list_favorites(&state, "u1"), vec!["608", "102", "314"]);
    }

    #[test]
    fn test_case_sensitive_match() {
        let state = test_state();
        add_favorite(&state, "u1", "B1");
        assert!(add_favorite(&state, "u1", "b1"));
        assert_eq!(list_favorites(&state, "u1").len(), 2);
    }

    #[test]
    fn test_empty_for_unknown_user() {
        let state = test_state();
        assert!(list_favorites(&state, "nobody").is_empty());
    }
}
