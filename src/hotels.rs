//! Hotel lookup against the SerpApi Google Hotels engine.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::config::SearchConfig;
use crate::error::PlannerError;

const SERVICE: &str = "hotel search";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelListing {
    pub name: String,
    /// Lowest nightly rate in USD.
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    pub link: Option<String>,
}

/// Outcome of a hotel lookup. A failed lookup is not an error for the
/// session: it yields no listings and a warning to show next to the plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelLookup {
    pub listings: Vec<HotelListing>,
    pub warning: Option<String>,
}

#[async_trait]
pub trait HotelSearch: Send + Sync {
    /// One round trip to the search API.
    async fn search(
        &self,
        destination: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Vec<HotelListing>, PlannerError>;

    /// Look up hotels for a stay covering `start_date..=end_date`. Never fails;
    /// problems are folded into [`HotelLookup::warning`].
    async fn find_hotels(
        &self,
        destination: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> HotelLookup {
        // Stays are counted in nights, so the last day of the trip is checkout eve.
        let Some(check_out) = end_date.checked_add_days(Days::new(1)) else {
            warn!(%end_date, "no check-out date after the end of the trip");
            return HotelLookup {
                listings: Vec::new(),
                warning: Some(format!(
                    "Hotels could not be searched: no check-out date exists after {end_date}."
                )),
            };
        };
        match self.search(destination, start_date, check_out).await {
            Ok(listings) if listings.is_empty() => HotelLookup {
                listings,
                warning: Some(format!("No hotel listings were found for {destination}.")),
            },
            Ok(listings) => HotelLookup {
                listings,
                warning: None,
            },
            Err(err) => {
                warn!(error = %err, "hotel lookup failed");
                HotelLookup {
                    listings: Vec::new(),
                    warning: Some(err.user_message()),
                }
            }
        }
    }
}

pub struct SerpApiHotelClient {
    http: Client,
    config: SearchConfig,
}

impl SerpApiHotelClient {
    pub fn new(config: SearchConfig) -> Result<Self, PlannerError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PlannerError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl HotelSearch for SerpApiHotelClient {
    #[instrument(skip(self))]
    async fn search(
        &self,
        destination: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Vec<HotelListing>, PlannerError> {
        let url = format!("{}/search.json", self.config.base_url.trim_end_matches('/'));
        let check_in = check_in.format("%Y-%m-%d").to_string();
        let check_out = check_out.format("%Y-%m-%d").to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("engine", "google_hotels"),
                ("q", destination),
                ("check_in_date", check_in.as_str()),
                ("check_out_date", check_out.as_str()),
                ("currency", "USD"),
                ("hl", "en"),
                ("api_key", self.config.api_key.expose()),
            ])
            .send()
            .await
            .map_err(|e| PlannerError::from_transport(SERVICE, self.config.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "hotel search API request failed");
            return Err(PlannerError::upstream(
                SERVICE,
                format!("status {status}: {}", api_error_message(&body)),
            ));
        }

        let payload: HotelSearchResponse = response
            .json()
            .await
            .map_err(|e| PlannerError::from_transport(SERVICE, self.config.timeout, e))?;

        if let Some(message) = payload.error {
            return Err(PlannerError::upstream(SERVICE, message));
        }

        let listings: Vec<HotelListing> = payload
            .properties
            .into_iter()
            .filter_map(RawProperty::into_listing)
            .take(self.config.max_results)
            .collect();
        debug!(count = listings.len(), "received hotel listings");
        Ok(listings)
    }
}

/// Pull the `error` field out of a SerpApi error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<HotelSearchResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .unwrap_or_else(|| body.to_string())
}

#[derive(Debug, Deserialize)]
struct HotelSearchResponse {
    #[serde(default)]
    properties: Vec<RawProperty>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    name: Option<String>,
    rate_per_night: Option<RawRate>,
    overall_rating: Option<f64>,
    reviews: Option<u64>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRate {
    extracted_lowest: Option<f64>,
}

impl RawProperty {
    fn into_listing(self) -> Option<HotelListing> {
        let name = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
        Some(HotelListing {
            name,
            price: self.rate_per_night.and_then(|r| r.extracted_lowest),
            rating: self.overall_rating,
            reviews: self.reviews,
            link: self
                .link
                .filter(|l| l.starts_with("https://") || l.starts_with("http://")),
        })
    }
}
