//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Notify;
use wayfarer::{Budget, HotelListing, HotelSearch, LanguageModel, PlannerError, TripPreferences};

pub fn paris() -> TripPreferences {
    TripPreferences::new(
        "Paris",
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        ["art", "food"],
        Budget::parse("medium").unwrap(),
    )
    .unwrap()
}

pub fn rome() -> TripPreferences {
    TripPreferences::new(
        "Rome",
        NaiveDate::from_ymd_opt(2024, 9, 10).unwrap(),
        NaiveDate::from_ymd_opt(2024, 9, 11).unwrap(),
        ["history"],
        Budget::parse("Luxury").unwrap(),
    )
    .unwrap()
}

/// Answers itinerary prompts with a fixed plan and questions with a fixed answer.
/// Every prompt it sees is recorded.
pub struct ScriptedModel {
    pub plan: String,
    pub answer: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(plan: &str, answer: &str) -> Self {
        Self {
            plan: plan.to_string(),
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, PlannerError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.starts_with("Plan a ") {
            Ok(self.plan.clone())
        } else {
            Ok(self.answer.clone())
        }
    }
}

/// Holds back any prompt containing `held` until `release` is notified, and
/// signals `started` when such a prompt arrives. Other prompts are answered
/// immediately with a text naming the destination of the prompt.
pub struct GatedModel {
    pub held: String,
    pub fail_held: bool,
    pub started: Notify,
    pub release: Notify,
}

impl GatedModel {
    pub fn new(held: &str) -> Self {
        Self {
            held: held.to_string(),
            fail_held: false,
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Like [`GatedModel::new`], but the held prompt fails once released.
    pub fn failing(held: &str) -> Self {
        Self {
            fail_held: true,
            ..Self::new(held)
        }
    }
}

#[async_trait]
impl LanguageModel for GatedModel {
    async fn complete(&self, prompt: &str) -> Result<String, PlannerError> {
        if prompt.contains(&self.held) {
            self.started.notify_one();
            self.release.notified().await;
            if self.fail_held {
                return Err(PlannerError::upstream("itinerary", "status 502 Bad Gateway"));
            }
            return Ok(format!("late answer for {}", self.held));
        }
        if prompt.contains("Rome") {
            Ok("Day 1: Colosseum\nDay 2: Vatican".to_string())
        } else {
            Ok("Day 1: Louvre\nDay 2: Orsay\nDay 3: Marais".to_string())
        }
    }
}

pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _prompt: &str) -> Result<String, PlannerError> {
        Err(PlannerError::upstream("itinerary", "status 503 Service Unavailable"))
    }
}

/// Hotel search returning a fixed result for every query.
pub struct StaticHotels {
    pub result: Result<Vec<HotelListing>, &'static str>,
}

impl StaticHotels {
    pub fn with(listings: Vec<HotelListing>) -> Self {
        Self {
            result: Ok(listings),
        }
    }

    pub fn failing(message: &'static str) -> Self {
        Self {
            result: Err(message),
        }
    }
}

#[async_trait]
impl HotelSearch for StaticHotels {
    async fn search(
        &self,
        _destination: &str,
        _check_in: NaiveDate,
        _check_out: NaiveDate,
    ) -> Result<Vec<HotelListing>, PlannerError> {
        self.result
            .clone()
            .map_err(|message| PlannerError::upstream("hotel search", message))
    }
}

pub fn lutetia() -> HotelListing {
    HotelListing {
        name: "Hotel Lutetia".to_string(),
        price: Some(450.0),
        rating: Some(4.6),
        reviews: Some(2300),
        link: Some("https://www.hotellutetia.com/".to_string()),
    }
}
