//! Follow-up question loop.
//!
//! A question moves the session from Idle to AwaitingAnswer; the answer (or
//! the error) moves it back, appending one turn. If the caller drops the
//! future mid-flight the question is cancelled and history is left alone.

use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use crate::error::PlannerError;
use crate::llm_interaction::LanguageModel;
use crate::session::{ConversationTurn, RequestTicket, SessionState};

pub(crate) fn lock(session: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    // Every mutation is a single assignment or push, so poisoned state is still whole.
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns the session to Idle if the in-flight question is abandoned.
struct CancelOnDrop<'a> {
    session: &'a Mutex<SessionState>,
    ticket: Option<RequestTicket>,
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            info!("question cancelled before an answer arrived");
            lock(self.session).cancel_question(ticket);
        }
    }
}

/// Ask a follow-up question about the current itinerary.
///
/// Rejected without touching the session when there is no itinerary, the
/// question is blank, or another question is still waiting. Upstream
/// failures are recorded as a failed turn and then returned.
pub async fn ask(
    session: &Mutex<SessionState>,
    model: &dyn LanguageModel,
    question: &str,
) -> Result<ConversationTurn, PlannerError> {
    let pending = lock(session).begin_question(question)?;
    let mut guard = CancelOnDrop {
        session,
        ticket: Some(pending.ticket()),
    };

    let outcome = model.answer_question(pending.prompt()).await;
    guard.ticket = None;

    let asked = pending.question().to_string();
    let recorded = lock(session).finish_question(pending, &outcome).cloned();
    match (outcome, recorded) {
        (Ok(_), Some(turn)) => Ok(turn),
        (Err(err), _) => {
            warn!(error = %err, "follow-up question failed");
            Err(err)
        }
        (Ok(answer), None) => {
            info!("answer arrived after the session was reset; not recorded");
            Ok(ConversationTurn {
                question: asked,
                answer,
                timestamp: chrono::Utc::now(),
                failed: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{Budget, BudgetTier, TripPreferences};
    use crate::session::{Itinerary, QaPhase};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::time::Duration;

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn complete(&self, prompt: &str) -> Result<String, PlannerError> {
            Ok(format!("answered {} chars", prompt.len()))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        async fn complete(&self, _prompt: &str) -> Result<String, PlannerError> {
            Err(PlannerError::Timeout {
                service: "itinerary",
                after: Duration::from_secs(30),
            })
        }
    }

    struct HangingModel;

    #[async_trait]
    impl LanguageModel for HangingModel {
        async fn complete(&self, _prompt: &str) -> Result<String, PlannerError> {
            std::future::pending().await
        }
    }

    /// Resets the session while the answer is being produced.
    struct ResettingModel<'a> {
        session: &'a Mutex<SessionState>,
    }

    #[async_trait]
    impl LanguageModel for ResettingModel<'_> {
        async fn complete(&self, _prompt: &str) -> Result<String, PlannerError> {
            lock(self.session).reset();
            Ok("Late spring.".to_string())
        }
    }

    fn session_with_itinerary() -> Mutex<SessionState> {
        let mut state = SessionState::new();
        let ticket = state.reset();
        let prefs = TripPreferences::new(
            "Paris",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            ["art"],
            Budget::Tier(BudgetTier::Moderate),
        )
        .unwrap();
        state.store_itinerary(ticket, Itinerary::new("Day 1: ... Day 3: ...", prefs));
        Mutex::new(state)
    }

    #[tokio::test]
    async fn test_ask_appends_one_turn() {
        let session = session_with_itinerary();
        let turn = ask(&session, &EchoModel, "What's the best time to visit?").await.unwrap();
        assert_eq!(turn.question, "What's the best time to visit?");
        assert!(!turn.answer.is_empty());

        let state = lock(&session);
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0], turn);
        assert_eq!(state.qa_phase(), QaPhase::Idle);
    }

    #[tokio::test]
    async fn test_ask_without_itinerary() {
        let session = Mutex::new(SessionState::new());
        let err = ask(&session, &EchoModel, "Hello?").await.unwrap_err();
        assert!(matches!(err, PlannerError::NoItinerary));
        assert!(lock(&session).history().is_empty());
    }

    #[tokio::test]
    async fn test_failure_records_marker_and_returns_error() {
        let session = session_with_itinerary();
        let err = ask(&session, &FailingModel, "Is it busy in June?").await.unwrap_err();
        assert!(err.is_upstream());

        let state = lock(&session);
        assert_eq!(state.history().len(), 1);
        assert!(state.history()[0].failed);
        assert_eq!(state.qa_phase(), QaPhase::Idle);
    }

    #[tokio::test]
    async fn test_dropped_question_leaves_state_unchanged() {
        let session = session_with_itinerary();
        let result = tokio::time::timeout(
            Duration::from_millis(20),
            ask(&session, &HangingModel, "Will this finish?"),
        )
        .await;
        assert!(result.is_err());

        let state = lock(&session);
        assert!(state.history().is_empty());
        assert_eq!(state.qa_phase(), QaPhase::Idle);
    }

    #[tokio::test]
    async fn test_answer_after_reset_is_returned_but_not_recorded() {
        let session = session_with_itinerary();
        let model = ResettingModel { session: &session };
        let turn = ask(&session, &model, "  When should I go?  ").await.unwrap();
        assert_eq!(turn.question, "When should I go?");
        assert_eq!(turn.answer, "Late spring.");
        assert!(!turn.failed);

        let state = lock(&session);
        assert!(state.history().is_empty());
        assert!(state.itinerary().is_none());
        assert_eq!(state.qa_phase(), QaPhase::Idle);
    }
}
