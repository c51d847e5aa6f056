//! Error taxonomy shared by the planner, its clients, and the web layer.

use std::time::Duration;
use thiserror::Error;

/// Longest upstream detail we are willing to echo back to a user.
const MAX_DETAIL_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// Malformed trip preferences or an empty question.
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The remote API answered with a failure or a payload we could not use.
    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// The remote API did not answer within the configured bound.
    #[error("{service} request timed out after {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },

    #[error("No itinerary has been generated yet")]
    NoItinerary,

    #[error("A question is already waiting for an answer")]
    QuestionInFlight,

    /// Missing or invalid startup configuration. The only fatal kind.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PlannerError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn upstream<S: Into<String>>(service: &'static str, message: S) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Map a transport error, keeping timeouts distinct. The request URL is
    /// dropped first since some upstreams carry credentials in the query.
    pub fn from_transport(service: &'static str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                service,
                after: timeout,
            };
        }
        Self::upstream(service, err.without_url().to_string())
    }

    /// Timeouts are displayed as upstream failures.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Timeout { .. })
    }

    /// Message safe to render in the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => format!("Invalid input: {}", sanitize(message)),
            Self::Upstream { service, message } => format!(
                "The {service} service could not complete the request ({}). Please try again.",
                sanitize(message)
            ),
            Self::Timeout { service, .. } => {
                format!("The {service} service took too long to respond. Please try again.")
            }
            Self::NoItinerary => "Please generate a travel plan first.".to_string(),
            Self::QuestionInFlight => {
                "Still answering your previous question, please wait.".to_string()
            }
            Self::Config { .. } => {
                "The planner is misconfigured. Please check the API keys.".to_string()
            }
        }
    }
}

/// Strip control characters and cap the length of text that came from outside.
pub fn sanitize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.chars().count() > MAX_DETAIL_CHARS {
        let truncated: String = cleaned.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{truncated}…")
    } else {
        cleaned.to_string()
    }
}
