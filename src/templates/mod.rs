use axum::{http::StatusCode, response::Html};
use minijinja::{value::Value, Environment};
use std::sync::OnceLock;

static TEMPLATES: OnceLock<Environment<'static>> = OnceLock::new();

// Compiled once; the `.html` names keep minijinja's HTML auto-escaping on.
const SOURCES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("register.html", include_str!("../../templates/register.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("robots.html", include_str!("../../templates/robots.html")),
    ("mapping.html", include_str!("../../templates/mapping.html")),
    ("reminders.html", include_str!("../../templates/reminders.html")),
    ("video_call.html", include_str!("../../templates/video_call.html")),
];

fn environment() -> &'static Environment<'static> {
    TEMPLATES.get_or_init(|| {
        let mut env = Environment::new();
        for &(name, source) in SOURCES {
            env.add_template(name, source)
                .unwrap_or_else(|err| panic!("failed to compile template {name}: {err}"));
        }
        env
    })
}

pub fn render(name: &str, ctx: Value) -> Result<Html<String>, (StatusCode, String)> {
    let html = environment()
        .get_template(name)
        .and_then(|tpl| tpl.render(ctx))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Html(html))
}
