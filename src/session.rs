//! Per-session state: the current itinerary, hotel listings, and Q&A history.
//!
//! The state is owned by exactly one session. Callers keep it behind a short
//! lived lock and never hold that lock across a network call; instead each
//! request takes a [`RequestTicket`] and hands it back with its result. A
//! result whose ticket no longer matches (because the session was reset in
//! the meantime) is discarded, so only the latest submission is ever stored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::PlannerError;
use crate::hotels::{HotelListing, HotelLookup};
use crate::preferences::TripPreferences;
use crate::prompt::build_followup_prompt;

/// A generated day-by-day plan. Replaced wholesale on regeneration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub raw_text: String,
    pub generated_at: DateTime<Utc>,
    pub source_preferences: TripPreferences,
}

impl Itinerary {
    pub fn new<S: Into<String>>(raw_text: S, source_preferences: TripPreferences) -> Self {
        Self {
            raw_text: raw_text.into(),
            generated_at: Utc::now(),
            source_preferences,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    /// The answer is an error placeholder rather than model output.
    pub failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QaPhase {
    Idle,
    AwaitingAnswer,
}

/// Identifies the session generation a request was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// A question that has been accepted and is waiting for its answer.
#[derive(Debug)]
pub struct PendingQuestion {
    ticket: RequestTicket,
    question: String,
    prompt: String,
}

impl PendingQuestion {
    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }
}

#[derive(Debug)]
pub struct SessionState {
    itinerary: Option<Itinerary>,
    hotels: Option<Vec<HotelListing>>,
    hotel_warning: Option<String>,
    history: Vec<ConversationTurn>,
    qa_phase: QaPhase,
    generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            itinerary: None,
            hotels: None,
            hotel_warning: None,
            history: Vec::new(),
            qa_phase: QaPhase::Idle,
            generation: 0,
        }
    }

    /// Clear itinerary, hotels, and history in one step and invalidate every
    /// request issued before the reset. Returns the ticket for the next one.
    pub fn reset(&mut self) -> RequestTicket {
        self.itinerary = None;
        self.hotels = None;
        self.hotel_warning = None;
        self.history.clear();
        self.qa_phase = QaPhase::Idle;
        self.generation += 1;
        debug!(generation = self.generation, "session reset");
        self.current_ticket()
    }

    pub fn current_ticket(&self) -> RequestTicket {
        RequestTicket(self.generation)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.generation
    }

    pub fn set_itinerary(&mut self, itinerary: Itinerary) {
        self.itinerary = Some(itinerary);
    }

    /// Store an itinerary unless a newer submission has superseded it.
    pub fn store_itinerary(&mut self, ticket: RequestTicket, itinerary: Itinerary) -> bool {
        if !self.is_current(ticket) {
            debug!(?ticket, generation = self.generation, "discarding stale itinerary");
            return false;
        }
        self.set_itinerary(itinerary);
        true
    }

    /// Store a hotel lookup unless a newer submission has superseded it.
    pub fn store_hotels(&mut self, ticket: RequestTicket, lookup: HotelLookup) -> bool {
        if !self.is_current(ticket) {
            debug!(?ticket, generation = self.generation, "discarding stale hotel listings");
            return false;
        }
        self.hotels = Some(lookup.listings);
        self.hotel_warning = lookup.warning;
        true
    }

    pub fn append_turn(&mut self, turn: ConversationTurn) {
        self.history.push(turn);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.itinerary.as_ref()
    }

    pub fn hotels(&self) -> Option<&[HotelListing]> {
        self.hotels.as_deref()
    }

    pub fn hotel_warning(&self) -> Option<&str> {
        self.hotel_warning.as_deref()
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn qa_phase(&self) -> QaPhase {
        self.qa_phase
    }

    /// Idle -> AwaitingAnswer. Builds the follow-up prompt from the state as
    /// it is now, so later changes cannot leak into an in-flight question.
    pub fn begin_question(&mut self, question: &str) -> Result<PendingQuestion, PlannerError> {
        let itinerary = self
            .itinerary
            .as_ref()
            .filter(|i| !i.raw_text.trim().is_empty())
            .ok_or(PlannerError::NoItinerary)?;
        if self.qa_phase == QaPhase::AwaitingAnswer {
            return Err(PlannerError::QuestionInFlight);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(PlannerError::validation("please enter a question"));
        }

        let prompt = build_followup_prompt(itinerary, question, &self.history);
        self.qa_phase = QaPhase::AwaitingAnswer;
        Ok(PendingQuestion {
            ticket: self.current_ticket(),
            question: question.to_string(),
            prompt,
        })
    }

    /// AwaitingAnswer -> Idle, recording the outcome as a turn. Failures are
    /// recorded with a placeholder answer. Returns `None` if the session was
    /// reset while the question was in flight.
    pub fn finish_question(
        &mut self,
        pending: PendingQuestion,
        outcome: &Result<String, PlannerError>,
    ) -> Option<&ConversationTurn> {
        if !self.is_current(pending.ticket) {
            debug!(question = %pending.question, "discarding answer for a reset session");
            return None;
        }
        self.qa_phase = QaPhase::Idle;

        let (answer, failed) = match outcome {
            Ok(answer) => (answer.clone(), false),
            Err(err) => (format!("Unable to answer: {}", err.user_message()), true),
        };
        self.history.push(ConversationTurn {
            question: pending.question,
            answer,
            timestamp: Utc::now(),
            failed,
        });
        self.history.last()
    }

    /// AwaitingAnswer -> Idle without touching history.
    pub fn cancel_question(&mut self, ticket: RequestTicket) {
        if self.is_current(ticket) {
            self.qa_phase = QaPhase::Idle;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            itinerary: self.itinerary.clone(),
            hotels: self.hotels.clone(),
            hotel_warning: self.hotel_warning.clone(),
            history: self.history.clone(),
            qa_phase: self.qa_phase,
        }
    }
}

/// Read-only copy of the session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub itinerary: Option<Itinerary>,
    pub hotels: Option<Vec<HotelListing>>,
    pub hotel_warning: Option<String>,
    pub history: Vec<ConversationTurn>,
    pub qa_phase: QaPhase,
}
