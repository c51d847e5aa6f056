// Defaults for the planner, overridable through the environment (see config.rs).

pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";
pub const SERP_API_KEY_VAR: &str = "SERP_API_KEY";

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 4096;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://serpapi.com";
pub const DEFAULT_MAX_HOTELS: usize = 10;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 120;

/// Longest trip the form accepts, in days.
pub const MAX_TRIP_DAYS: i64 = 30;

pub const DEFAULT_PORT: u16 = 8501;

/// Standing instructions sent with every language-model request.
pub const PLANNER_INSTRUCTIONS: &[&str] = &[
    "You are a travel planning assistant.",
    "Recommend hotels and attractions that are current and include links where possible.",
    "When recommending a hotel, include 2-3 recent user reviews (if available).",
    "Format the response in markdown with sections.",
    "Use bullet points. Keep it clean and readable.",
];
