//! Trip preferences and the form they are collected from.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_TRIP_DAYS;
use crate::error::PlannerError;

/// Travel styles offered by the form. Free-text interests are accepted too.
pub const SUGGESTED_INTERESTS: &[&str] = &[
    "Culture",
    "Nature",
    "Adventure",
    "Relaxation",
    "Food",
    "Shopping",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Budget,
    Moderate,
    Luxury,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Budget {
    Tier(BudgetTier),
    /// Total amount in USD.
    Amount(f64),
}

impl Budget {
    /// Parse a tier name ("moderate", "Luxury", ...) or a plain amount ("1500", "$1,500").
    pub fn parse(input: &str) -> Result<Self, PlannerError> {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "budget" | "low" => return Ok(Budget::Tier(BudgetTier::Budget)),
            "moderate" | "medium" | "mid" => return Ok(Budget::Tier(BudgetTier::Moderate)),
            "luxury" | "high" => return Ok(Budget::Tier(BudgetTier::Luxury)),
            _ => {}
        }

        let digits: String = trimmed
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        match digits.parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(Budget::Amount(amount)),
            _ => Err(PlannerError::validation(format!(
                "budget '{trimmed}' must be Budget, Moderate, Luxury or a positive amount"
            ))),
        }
    }

    /// Representation accepted back by [`Budget::parse`].
    pub fn form_value(&self) -> String {
        match self {
            Budget::Amount(amount) => format!("{amount:.0}"),
            tier => tier.to_string(),
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Tier(BudgetTier::Budget) => f.write_str("Budget"),
            Budget::Tier(BudgetTier::Moderate) => f.write_str("Moderate"),
            Budget::Tier(BudgetTier::Luxury) => f.write_str("Luxury"),
            Budget::Amount(amount) => write!(f, "about ${amount:.0} total"),
        }
    }
}

/// Validated trip preferences. Construct through [`TripPreferences::new`] or a
/// [`PreferenceForm`]; the fields are public for reading only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPreferences {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interests: BTreeSet<String>,
    pub budget: Budget,
}

impl TripPreferences {
    pub fn new<I, S>(
        destination: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interests: I,
        budget: Budget,
    ) -> Result<Self, PlannerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(PlannerError::validation("please enter a destination"));
        }
        if start_date > end_date {
            return Err(PlannerError::validation(format!(
                "start date {start_date} is after end date {end_date}"
            )));
        }
        let days = (end_date - start_date).num_days() + 1;
        if days > MAX_TRIP_DAYS {
            return Err(PlannerError::validation(format!(
                "trips are limited to {MAX_TRIP_DAYS} days, got {days}"
            )));
        }

        let interests = interests
            .into_iter()
            .map(|i| i.as_ref().trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();

        Ok(Self {
            destination: destination.to_string(),
            start_date,
            end_date,
            interests,
            budget,
        })
    }

    /// Inclusive trip length in days.
    pub fn trip_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn interests_list(&self) -> String {
        self.interests.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Raw form fields as submitted by the browser or the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceForm {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    /// Comma-separated interests.
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub budget: String,
}

impl PreferenceForm {
    pub fn validate(&self) -> Result<TripPreferences, PlannerError> {
        let start_date = parse_date("start date", &self.start_date)?;
        let end_date = parse_date("end date", &self.end_date)?;
        let budget = if self.budget.trim().is_empty() {
            Budget::Tier(BudgetTier::Moderate)
        } else {
            Budget::parse(&self.budget)?
        };
        TripPreferences::new(
            &self.destination,
            start_date,
            end_date,
            self.interests.split(','),
            budget,
        )
    }
}

fn parse_date(label: &str, raw: &str) -> Result<NaiveDate, PlannerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PlannerError::validation(format!("{label} is required")));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| PlannerError::validation(format!("{label} '{raw}' is not a YYYY-MM-DD date")))
}
