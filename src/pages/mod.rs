pub mod stats;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use minijinja::{context, value::Value};
use tower_sessions::Session;

use crate::{auth::session::CurrentUser, model::user::User, notices, templates, AppState};

use stats::FleetStats;

/// Guarded pages: everything here requires a resolved identity.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/dashboard", get(dashboard))
        .route("/robots", get(robots))
        .route("/mapping", get(mapping))
        .route("/reminders", get(reminders))
        .route("/video-call", get(video_call))
}

// Only the fields the templates need; the verifier never reaches a page.
fn user_ctx(user: &User) -> Value {
    context! {
        username => user.username,
        email => user.email,
    }
}

async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Html<String>, (StatusCode, String)> {
    let robots = state
        .store
        .robots_for_user(&user.id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let stats = FleetStats::from_robots(&robots);
    let notices = notices::take(&session).await;

    templates::render(
        "dashboard.html",
        context! {
            title => "Dashboard",
            user => user_ctx(&user),
            stats => stats,
            notices => notices,
        },
    )
}

async fn robots(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Html<String>, (StatusCode, String)> {
    let mut robots = state
        .store
        .robots_for_user(&user.id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    robots.sort_by(|a, b| a.name.cmp(&b.name));

    let notices = notices::take(&session).await;

    templates::render(
        "robots.html",
        context! {
            title => "Robots",
            user => user_ctx(&user),
            robots => robots,
            notices => notices,
        },
    )
}

async fn mapping(
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Html<String>, (StatusCode, String)> {
    let notices = notices::take(&session).await;
    templates::render(
        "mapping.html",
        context! { title => "Mapping", user => user_ctx(&user), notices => notices },
    )
}

async fn reminders(
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Html<String>, (StatusCode, String)> {
    let notices = notices::take(&session).await;
    templates::render(
        "reminders.html",
        context! { title => "Reminders", user => user_ctx(&user), notices => notices },
    )
}

async fn video_call(
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Html<String>, (StatusCode, String)> {
    let notices = notices::take(&session).await;
    templates::render(
        "video_call.html",
        context! { title => "Video call", user => user_ctx(&user), notices => notices },
    )
}
