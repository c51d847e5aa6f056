//! Wayfarer - AI-powered trip planning.
//!
//! Collects trip preferences, asks a language model for a day-by-day plan,
//! looks up hotels through a search API, and answers follow-up questions
//! about the plan within one interactive session.

pub mod config;
pub mod constants;
pub mod error;
pub mod hotels;
pub mod llm_interaction;
pub mod planner;
pub mod preferences;
pub mod prompt;
pub mod qa;
pub mod session;
pub mod web_server;

pub use config::PlannerConfig;
pub use error::PlannerError;
pub use hotels::{HotelListing, HotelLookup, HotelSearch, SerpApiHotelClient};
pub use llm_interaction::{ItineraryClient, LanguageModel};
pub use planner::{Planner, SubmitOutcome};
pub use preferences::{Budget, BudgetTier, PreferenceForm, TripPreferences};
pub use session::{ConversationTurn, Itinerary, QaPhase, SessionSnapshot, SessionState};
