use anyhow::Result;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use warp::Filter;
use warp::http::StatusCode;

mod congestion;
mod favorites;
mod gc;
mod persistence;
mod readings;
mod state;
mod stations;

use congestion::classify;
use favorites::{add_favorite, list_favorites, remove_favorite};
use persistence::{load_state, save_state};
use readings::{history, latest_reading, record_reading};
use state::{AppState, CongestionReading, USER_ID};
use stations::log_info;

// Stations GTFS provided by Catenary
const STATIONS_GTFS_URL: &str = "https://github.com/catenarytransit/pfaedled-gtfs-actions/releases/download/latest/southkoreadaejeon.zip";
const DATA_DIR: &str = "./data";

// Readings older than a week are of no use to the history chart.
const READING_RETENTION: Duration = Duration::from_secs(7 * 24 * 3600);

#[derive(Serialize)]
struct FavoritesResponse {
    favorites: Vec<CompactString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    added: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<bool>,
}

impl FavoritesResponse {
    fn list(favorites: Vec<CompactString>) -> Self {
        Self {
            favorites,
            added: None,
            removed: None,
        }
    }
}

#[derive(Serialize)]
struct CongestionResponse {
    bus_number: CompactString,
    total_congestion: f64,
    timestamp: DateTime<Utc>,
    status: &'static str,
    color: &'static str,
}

#[derive(Serialize)]
struct HistoryPoint {
    timestamp: DateTime<Utc>,
    total_congestion: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct AddFavoriteBody {
    bus_no: String,
}

#[derive(Deserialize)]
struct IngestBody {
    total_congestion: f64,
    // Defaults to now when the producer does not timestamp the reading.
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct FavoritesQuery {
    remove: Option<String>,
}

#[derive(Deserialize)]
struct HistoryQuery {
    hours: Option<i64>,
}

#[derive(Deserialize)]
struct StationsQuery {
    q: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize State
    log_info("Initializing Application State...");
    let stations_url =
        std::env::var("STATIONS_GTFS_URL").unwrap_or_else(|_| STATIONS_GTFS_URL.to_string());
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| DATA_DIR.to_string());
    let state = Arc::new(AppState::new(stations_url));

    // 2. Load Persistence (Recovery)
    if let Err(e) = load_state(&state, &data_dir) {
        eprintln!("Warning: Failed to load previous state: {}", e);
    }

    // 3. Start Station Manager (Background Update)
    if let Err(e) = state.stations.load_initial() {
        eprintln!(
            "Warning: Initial station load failed: {}. Background updater will retry.",
            e
        );
    }
    state.stations.start_updater();

    // 4. Persistence Loop
    let state_clone_persist = state.clone();
    let data_dir_persist = data_dir.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            if let Err(e) = save_state(&state_clone_persist, &data_dir_persist) {
                eprintln!("Error saving state: {}", e);
            }
        }
    });

    // 5. Retention Loop
    let state_clone_gc = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            gc::cleanup_old_readings(&state_clone_gc, READING_RETENTION);
        }
    });

    // 6. HTTP Server
    // Use .boxed() to simplify types
    let state_filter_base = state.clone();
    let state_filter = warp::any().map(move || state_filter_base.clone()).boxed();

    // GET /favorites
    // The dashboard encodes its "remove favorite" link as ?remove=<bus_no>,
    // so the removal is applied before the list is returned.
    let favorites_list_route = warp::path!("favorites")
        .and(warp::get())
        .and(warp::query::<FavoritesQuery>())
        .and(state_filter.clone())
        .map(|query: FavoritesQuery, state: Arc<AppState>| {
            if let Some(bus_no) = &query.remove {
                remove_favorite(&state, USER_ID, bus_no);
            }
            warp::reply::json(&FavoritesResponse::list(list_favorites(&state, USER_ID)))
        });

    // POST /favorites
    let favorites_add_route = warp::path!("favorites")
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .map(|body: AddFavoriteBody, state: Arc<AppState>| {
            let added = add_favorite(&state, USER_ID, &body.bus_no);
            warp::reply::json(&FavoritesResponse {
                favorites: list_favorites(&state, USER_ID),
                added: Some(added),
                removed: None,
            })
        });

    // DELETE /favorites/{bus_no}
    let favorites_remove_route = warp::path!("favorites" / String)
        .and(warp::delete())
        .and(state_filter.clone())
        .map(|bus_no: String, state: Arc<AppState>| {
            let removed = remove_favorite(&state, USER_ID, &bus_no);
            warp::reply::json(&FavoritesResponse {
                favorites: list_favorites(&state, USER_ID),
                added: None,
                removed: Some(removed),
            })
        });

    // GET /congestion/{bus_no}
    let congestion_route = warp::path!("congestion" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .map(|bus_no: String, state: Arc<AppState>| match latest_reading(&state, &bus_no) {
            Some(reading) => {
                let level = classify(reading.total_congestion);
                warp::reply::with_status(
                    warp::reply::json(&CongestionResponse {
                        bus_number: reading.bus_number,
                        total_congestion: reading.total_congestion,
                        timestamp: reading.timestamp,
                        status: level.status(),
                        color: level.color(),
                    }),
                    StatusCode::OK,
                )
            }
            None => warp::reply::with_status(
                warp::reply::json(&ErrorResponse {
                    error: format!("No congestion data for bus {}", bus_no),
                }),
                StatusCode::NOT_FOUND,
            ),
        });

    // POST /congestion/{bus_no} (ingest)
    let ingest_route = warp::path!("congestion" / String)
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .map(|bus_no: String, body: IngestBody, state: Arc<AppState>| {
            record_reading(
                &state,
                CongestionReading {
                    bus_number: CompactString::from(bus_no),
                    total_congestion: body.total_congestion,
                    timestamp: body.timestamp.unwrap_or_else(Utc::now),
                },
            );
            warp::reply::with_status(warp::reply(), StatusCode::OK)
        });

    // GET /congestion_history/{bus_no}?hours=N
    let history_route = warp::path!("congestion_history" / String)
        .and(warp::get())
        .and(warp::query::<HistoryQuery>())
        .and(state_filter.clone())
        .map(|bus_no: String, query: HistoryQuery, state: Arc<AppState>| {
            let hours = query.hours.unwrap_or(24);
            let points: Vec<HistoryPoint> = history(&state, &bus_no, hours)
                .into_iter()
                .map(|r| HistoryPoint {
                    timestamp: r.timestamp,
                    total_congestion: r.total_congestion,
                })
                .collect();
            warp::reply::json(&points)
        });

    // GET /stations?q=<substring>
    let stations_route = warp::path!("stations")
        .and(warp::get())
        .and(warp::query::<StationsQuery>())
        .and(state_filter.clone())
        .map(|query: StationsQuery, state: Arc<AppState>| {
            let stations = match &query.q {
                Some(q) => state.stations.search(q),
                None => state.stations.all_stations(),
            };
            warp::reply::json(&stations)
        });

    let routes = favorites_list_route
        .or(favorites_add_route)
        .or(favorites_remove_route)
        .or(congestion_route)
        .or(ingest_route)
        .or(history_route)
        .or(stations_route)
        .boxed();

    let server_port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid PORT env variable"))?;
    println!("Server running at http://localhost:{}", server_port);
    warp::serve(routes).run(([0, 0, 0, 0], server_port)).await;

    Ok(())
}
