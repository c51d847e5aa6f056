//! Prompt construction. Everything here is pure and deterministic.

use std::fmt::Write;

use crate::preferences::TripPreferences;
use crate::session::{ConversationTurn, Itinerary};

/// Render preferences into the itinerary request.
pub fn build_itinerary_prompt(prefs: &TripPreferences) -> String {
    let days = prefs.trip_days();
    let day_word = if days == 1 { "day" } else { "days" };
    let interests = if prefs.interests.is_empty() {
        "no particular preference".to_string()
    } else {
        prefs.interests_list()
    };

    format!(
        "Plan a {days}-day trip to {destination} from {start} to {end} ({days} {day_word} in total).\n\
         - Budget level: {budget}\n\
         - Travel style and interests: {interests}\n\
         \n\
         Provide:\n\
         1. Best time to visit\n\
         2. Hotel recommendations with links and address links\n\
         3. A day-by-day itinerary with exactly {days} {day_word}, labelled Day 1 to Day {days}\n\
         4. Local food suggestions with restaurant address links\n\
         5. Travel tips (transport, safety, etiquette)\n\
         6. Estimated total cost\n\
         \n\
         Make sure to include reliable links and format nicely using markdown.",
        destination = prefs.destination,
        start = prefs.start_date,
        end = prefs.end_date,
        budget = prefs.budget,
    )
}

/// Render a follow-up question with the itinerary and the earlier turns as
/// context, oldest turn first. Turns that only hold an error placeholder are
/// left out.
pub fn build_followup_prompt(
    itinerary: &Itinerary,
    question: &str,
    history: &[ConversationTurn],
) -> String {
    let mut prompt = format!(
        "Based on this travel plan for {}:\n\n{}\n\n",
        itinerary.source_preferences.destination, itinerary.raw_text
    );

    let answered: Vec<&ConversationTurn> = history.iter().filter(|t| !t.failed).collect();
    if !answered.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in answered {
            // Writing to a String cannot fail.
            let _ = writeln!(prompt, "User: {}\nPlanner: {}", turn.question, turn.answer);
        }
        prompt.push('\n');
    }

    let _ = write!(prompt, "Please answer: {}\nPlanner:", question.trim());
    prompt
}
