use serde::Serialize;

/// Three-level congestion band. Thresholds are inclusive at the lower
/// bound of each band: 80 is congested, 50 is moderate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CongestionLevel {
    Congested,
    Moderate,
    Light,
}

impl CongestionLevel {
    pub fn status(&self) -> &'static str {
        match self {
            CongestionLevel::Congested => "congested",
            CongestionLevel::Moderate => "moderate",
            CongestionLevel::Light => "light",
        }
    }

    // Colors match the dashboard's status blocks.
    pub fn color(&self) -> &'static str {
        match self {
            CongestionLevel::Congested => "#ff4b4b",
            CongestionLevel::Moderate => "#ffdd57",
            CongestionLevel::Light => "#4caf50",
        }
    }
}

pub fn classify(congestion: f64) -> CongestionLevel {
    if congestion >= 80.0 {
        CongestionLevel::Congested
    } else if congestion >= 50.0 {
        CongestionLevel::Moderate
    } else {
        // Also catches NaN: both comparisons above are false for it.
        CongestionLevel::Light
    }
}
