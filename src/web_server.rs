use std::{net::SocketAddr, path::Path, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    serve, Form, Json, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    planner::{Planner, SubmitOutcome},
    preferences::{PreferenceForm, SUGGESTED_INTERESTS},
    session::{QaPhase, SessionSnapshot},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    planner: Arc<Planner>,
}

impl AppState {
    pub fn new(planner: Arc<Planner>, template_dir: &Path) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(template_dir)),
            planner,
        }
    }
}

/// Banner rendered above the page content.
#[derive(Debug, Default, serde::Serialize)]
struct Notice {
    error: Option<String>,
    info: Option<String>,
}

impl Notice {
    fn error(message: String) -> Self {
        Self {
            error: Some(message),
            info: None,
        }
    }

    fn info(message: &str) -> Self {
        Self {
            error: None,
            info: Some(message.to_string()),
        }
    }
}

// Minijinja Environment setup
fn create_minijinja_env(template_dir: &Path) -> AutoReloader {
    let template_dir = template_dir.to_path_buf();
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&template_dir));
        // Watch the templates directory for changes
        notifier.watch_path(&template_dir, true);
        Ok(env)
    })
}

fn render_page(
    state: &AppState,
    snapshot: &SessionSnapshot,
    form: &PreferenceForm,
    notice: &Notice,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(minijinja::context! {
                    title => "AI Travel Planner",
                    session => snapshot,
                    form => form,
                    notice => notice,
                    suggested_interests => SUGGESTED_INTERESTS,
                    plan_budget => snapshot
                        .itinerary
                        .as_ref()
                        .map(|it| it.source_preferences.budget.to_string()),
                    qa_enabled => snapshot.itinerary.is_some()
                        && snapshot.qa_phase == QaPhase::Idle,
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("Internal Server Error".to_string()),
            )
        })
}

/// Pre-fill the form from the preferences the current itinerary came from.
fn form_for(snapshot: &SessionSnapshot) -> PreferenceForm {
    match &snapshot.itinerary {
        Some(itinerary) => {
            let prefs = &itinerary.source_preferences;
            PreferenceForm {
                destination: prefs.destination.clone(),
                start_date: prefs.start_date.to_string(),
                end_date: prefs.end_date.to_string(),
                interests: prefs.interests_list(),
                budget: prefs.budget.form_value(),
            }
        }
        None => PreferenceForm {
            interests: "Culture, Nature".to_string(),
            budget: "Moderate".to_string(),
            ..PreferenceForm::default()
        },
    }
}

async fn index_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.planner.snapshot();
    render_page(&state, &snapshot, &form_for(&snapshot), &Notice::default())
}

async fn plan_handler(
    State(state): State<AppState>,
    Form(form): Form<PreferenceForm>,
) -> impl IntoResponse {
    let prefs = match form.validate() {
        Ok(prefs) => prefs,
        Err(err) => {
            warn!(error = %err, "rejected trip preferences");
            let snapshot = state.planner.snapshot();
            return render_page(&state, &snapshot, &form, &Notice::error(err.user_message()));
        }
    };

    let notice = match state.planner.submit(prefs).await {
        Ok(SubmitOutcome::Stored(_)) => Notice::default(),
        Ok(SubmitOutcome::Superseded) => {
            Notice::info("A newer request replaced this one; showing the latest plan.")
        }
        Err(err) => Notice::error(format!(
            "An error occurred while generating your plan: {}",
            err.user_message()
        )),
    };
    let snapshot = state.planner.snapshot();
    render_page(&state, &snapshot, &form, &notice)
}

#[derive(Debug, Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    question: String,
}

async fn ask_handler(
    State(state): State<AppState>,
    Form(form): Form<QuestionForm>,
) -> impl IntoResponse {
    let notice = match state.planner.ask(&form.question).await {
        Ok(_) => Notice::default(),
        Err(err) => Notice::error(format!("Error fetching answer: {}", err.user_message())),
    };
    let snapshot = state.planner.snapshot();
    render_page(&state, &snapshot, &form_for(&snapshot), &notice)
}

async fn clear_history_handler(State(state): State<AppState>) -> Redirect {
    info!("Clearing Q&A history");
    state.planner.clear_history();
    Redirect::to("/")
}

async fn session_handler(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.planner.snapshot())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Build the application router. Split out from [`start_web_server`] so tests
/// can drive it without binding a socket.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/plan", post(plan_handler))
        .route("/ask", post(ask_handler))
        .route("/history/clear", post(clear_history_handler))
        .route("/api/session", get(session_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(port: u16, planner: Arc<Planner>) -> Result<()> {
    let state = AppState::new(planner, Path::new("templates"));
    let app = router(state, Path::new("static"));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
