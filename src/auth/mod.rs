pub mod handlers;
pub mod password;
pub mod session;

use axum::{routing::get, Router};

use crate::AppState;

use handlers::{login_form, login_submit, logout, register_form, register_submit};

/// Account routes: sign-in, sign-out, registration.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login_submit))
        .route("/register", get(register_form).post(register_submit))
        .route("/logout", get(logout))
}
