//! Ties the clients to the session: one submission resets the session, then
//! generates the itinerary and looks up hotels side by side.

use std::sync::{Arc, Mutex};

use tracing::{info, instrument, warn};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::hotels::{HotelSearch, SerpApiHotelClient};
use crate::llm_interaction::{ItineraryClient, LanguageModel};
use crate::preferences::TripPreferences;
use crate::qa::{self, lock};
use crate::session::{ConversationTurn, Itinerary, SessionSnapshot, SessionState};

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The itinerary is now the session's current one.
    Stored(Itinerary),
    /// A newer submission arrived first; this result was dropped.
    Superseded,
}

pub struct Planner {
    model: Arc<dyn LanguageModel>,
    hotels: Arc<dyn HotelSearch>,
    session: Mutex<SessionState>,
}

impl Planner {
    pub fn new(model: Arc<dyn LanguageModel>, hotels: Arc<dyn HotelSearch>) -> Self {
        Self {
            model,
            hotels,
            session: Mutex::new(SessionState::new()),
        }
    }

    /// Build a planner backed by the real HTTP clients.
    pub fn from_config(config: PlannerConfig) -> Result<Self, PlannerError> {
        let model = ItineraryClient::new(config.llm)?;
        let hotels = SerpApiHotelClient::new(config.search)?;
        Ok(Self::new(Arc::new(model), Arc::new(hotels)))
    }

    /// Start over with new preferences. The hotel lookup runs independently
    /// of itinerary generation; its failure only leaves a warning behind.
    #[instrument(skip_all, fields(destination = %prefs.destination))]
    pub async fn submit(&self, prefs: TripPreferences) -> Result<SubmitOutcome, PlannerError> {
        let ticket = lock(&self.session).reset();
        info!(days = prefs.trip_days(), "generating travel plan");

        let (itinerary, hotels) = tokio::join!(
            self.model.generate_itinerary(&prefs),
            self.hotels
                .find_hotels(&prefs.destination, prefs.start_date, prefs.end_date),
        );

        let mut session = lock(&self.session);
        session.store_hotels(ticket, hotels);
        match itinerary {
            Ok(itinerary) => {
                if session.store_itinerary(ticket, itinerary.clone()) {
                    Ok(SubmitOutcome::Stored(itinerary))
                } else {
                    info!("itinerary superseded by a newer submission");
                    Ok(SubmitOutcome::Superseded)
                }
            }
            Err(err) if !session.is_current(ticket) => {
                info!(error = %err, "failed itinerary superseded by a newer submission");
                Ok(SubmitOutcome::Superseded)
            }
            Err(err) => {
                warn!(error = %err, "itinerary generation failed");
                Err(err)
            }
        }
    }

    pub async fn ask(&self, question: &str) -> Result<ConversationTurn, PlannerError> {
        qa::ask(&self.session, self.model.as_ref(), question).await
    }

    pub fn clear_history(&self) {
        lock(&self.session).clear_history();
    }

    pub fn reset(&self) {
        lock(&self.session).reset();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.session).snapshot()
    }
}
