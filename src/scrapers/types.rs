use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Search parameters submitted to the booking engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    /// Check-in date
    pub checkin: NaiveDate,
    /// Number of nights
    pub nights: u32,
    /// Number of adults
    pub adults: u32,
    /// Number of rooms
    pub rooms: u32,
    /// Currency code shown by the booking engine
    pub currency: String,
    /// Price ceiling for reported rooms
    pub max_price: f64,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            checkin: NaiveDate::from_ymd_opt(2025, 9, 30).unwrap_or_default(),
            nights: 2,
            adults: 2,
            rooms: 1,
            currency: "ILS".to_string(),
            max_price: 1500.0,
        }
    }
}

impl SearchRequest {
    /// Build the results URL by appending the search as query parameters
    pub fn target_url(&self, base_url: &str) -> String {
        let checkin = self.checkin.format("%Y-%m-%d").to_string();
        let rooms = self.rooms.to_string();
        let nights = self.nights.to_string();
        let adults = self.adults.to_string();

        let query = [
            ("checkin", checkin.as_str()),
            ("rooms", rooms.as_str()),
            ("nights", nights.as_str()),
            ("adults", adults.as_str()),
            ("currency", self.currency.as_str()),
        ]
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

        format!("{}?{}", base_url, query)
    }

    /// Ceiling applied while scraping; a non-positive value disables it
    pub fn price_ceiling(&self) -> Option<f64> {
        (self.max_price > 0.0).then_some(self.max_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url_encodes_params_in_order() {
        let request = SearchRequest::default();
        let url = request.target_url("https://oporacountryliving.reserve-online.net/");
        assert_eq!(
            url,
            "https://oporacountryliving.reserve-online.net/?checkin=2025-09-30&rooms=1&nights=2&adults=2&currency=ILS"
        );
    }

    #[test]
    fn test_target_url_escapes_values() {
        let request = SearchRequest {
            currency: "US D&".to_string(),
            ..SearchRequest::default()
        };
        let url = request.target_url("https://example.test/");
        assert!(url.ends_with("currency=US%20D%26"));
    }

    #[test]
    fn test_price_ceiling() {
        assert_eq!(SearchRequest::default().price_ceiling(), Some(1500.0));

        let request = SearchRequest {
            max_price: 0.0,
            ..SearchRequest::default()
        };
        assert_eq!(request.price_ceiling(), None);
    }
}
