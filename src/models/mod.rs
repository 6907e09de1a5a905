use serde::{Deserialize, Serialize};

/// A bookable room/rate combination found on the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub name: String,
    pub price: f64,
}

impl RoomRecord {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// Rooms found by a single scrape attempt
pub type RunResult = Vec<RoomRecord>;
