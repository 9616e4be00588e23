use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use minijinja::context;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, info};

use crate::{
    auth::password::{hash_password, verify_password},
    auth::session::{clear, establish, CurrentUser, SessionLifetime},
    model::user::User,
    notices::{self, Notice},
    store::{CreateUserOutcome, Store},
    templates, AppState,
};

const MIN_PASSWORD_CHARS: usize = 6;

const INVALID_CREDENTIALS: &str = "Invalid username or password.";
const USERNAME_TAKEN: &str = "That username is already taken.";
const EMAIL_TAKEN: &str = "That email is already registered.";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    // Checkbox: present when ticked, absent otherwise.
    pub remember: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

// ------------------------------------------------------------
// LOGIN
// ------------------------------------------------------------
pub async fn login_form(session: Session) -> Result<Html<String>, (StatusCode, String)> {
    let notices = notices::take(&session).await;
    templates::render(
        "login.html",
        context! { title => "Sign in", notices => notices },
    )
}

pub async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let user = authenticate(&state.store, &form.username, &form.password)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match user {
        Some(user) => {
            let lifetime = SessionLifetime::from_remember(form.remember.is_some());
            establish(&session, &user, lifetime)
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

            notices::push(&session, Notice::success("You are signed in."))
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

            info!(username = %user.username, "user signed in");
            Ok(Redirect::to("/dashboard"))
        }
        None => {
            // Unknown username and wrong password answer identically.
            notices::push(&session, Notice::danger(INVALID_CREDENTIALS))
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

            debug!("rejected login attempt");
            Ok(Redirect::to("/login"))
        }
    }
}

/// Resolve credentials to a user. Returns `None` both for an unknown
/// username and for a wrong password; callers cannot tell the cases apart.
pub(crate) async fn authenticate(
    store: &Store,
    username: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let Some(user) = store.find_user_by_username(username).await? else {
        return Ok(None);
    };

    if verify_password(&user.password_hash, password)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

// ------------------------------------------------------------
// REGISTRATION
// ------------------------------------------------------------
pub async fn register_form(session: Session) -> Result<Html<String>, (StatusCode, String)> {
    let notices = notices::take(&session).await;
    templates::render(
        "register.html",
        context! { title => "Create account", notices => notices },
    )
}

pub async fn register_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, (StatusCode, String)> {
    if let Err(reason) = validate_registration(&form) {
        return reject_registration(&session, reason).await;
    }

    // Advisory pre-checks; the store re-checks both indexes under its
    // write lock, which is where a racing duplicate actually loses.
    if state
        .store
        .find_user_by_username(&form.username)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .is_some()
    {
        return reject_registration(&session, USERNAME_TAKEN).await;
    }
    if state
        .store
        .find_user_by_email(&form.email)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .is_some()
    {
        return reject_registration(&session, EMAIL_TAKEN).await;
    }

    let hash =
        hash_password(&form.password).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let outcome = state
        .store
        .create_user(&form.username, &form.email, &hash)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match outcome {
        CreateUserOutcome::Created(user) => {
            // Default fleet provisioning: every robot known right now is
            // granted to the new account.
            let attached = state
                .store
                .attach_all_robots(&user.id)
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

            info!(
                username = %user.username,
                robots = attached,
                "registered account; provisioned default fleet"
            );

            notices::push(&session, Notice::success("Account created. You can sign in now."))
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
            Ok(Redirect::to("/login"))
        }
        CreateUserOutcome::UsernameTaken => reject_registration(&session, USERNAME_TAKEN).await,
        CreateUserOutcome::EmailTaken => reject_registration(&session, EMAIL_TAKEN).await,
    }
}

async fn reject_registration(
    session: &Session,
    reason: &str,
) -> Result<Redirect, (StatusCode, String)> {
    notices::push(session, Notice::danger(reason))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Redirect::to("/register"))
}

/// Field validation, in order, stopping at the first failure. No user is
/// touched until every check passes.
pub(crate) fn validate_registration(form: &RegisterForm) -> Result<(), &'static str> {
    if form.username.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return Err("Please fill in every field.");
    }
    if form.password != form.confirm_password {
        return Err("Passwords do not match.");
    }
    if form.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err("Password must be at least 6 characters long.");
    }
    Ok(())
}

// ------------------------------------------------------------
// LOGOUT
// ------------------------------------------------------------
pub async fn logout(
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Redirect, (StatusCode, String)> {
    clear(&session)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    notices::push(&session, Notice::info("You have been signed out."))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(username = %user.username, "user signed out");
    Ok(Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use super::{authenticate, validate_registration, RegisterForm};
    use crate::auth::password::hash_password;
    use crate::store::{CreateUserOutcome, Store};

    fn form(username: &str, email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn registration_requires_every_field() {
        assert!(validate_registration(&form("", "a@b.c", "secret1", "secret1")).is_err());
        assert!(validate_registration(&form("ana", "", "secret1", "secret1")).is_err());
        assert!(validate_registration(&form("ana", "a@b.c", "", "")).is_err());
    }

    #[test]
    fn registration_rejects_mismatched_passwords() {
        let err = validate_registration(&form("ana", "a@b.c", "secret1", "secret2")).unwrap_err();
        assert_eq!(err, "Passwords do not match.");
    }

    #[test]
    fn registration_rejects_short_passwords() {
        let err = validate_registration(&form("ana", "a@b.c", "five5", "five5")).unwrap_err();
        assert_eq!(err, "Password must be at least 6 characters long.");
    }

    #[test]
    fn registration_accepts_a_well_formed_submission() {
        assert!(validate_registration(&form("ana", "a@b.c", "secret1", "secret1")).is_ok());
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().to_str().unwrap()).unwrap();

        let hash = hash_password("right-password").unwrap();
        let created = store.create_user("ana", "ana@example.com", &hash).await.unwrap();
        assert!(matches!(created, CreateUserOutcome::Created(_)));

        let wrong_password = authenticate(&store, "ana", "wrong-password").await.unwrap();
        let unknown_user = authenticate(&store, "nobody", "right-password").await.unwrap();
        assert!(wrong_password.is_none());
        assert!(unknown_user.is_none());

        let ok = authenticate(&store, "ana", "right-password").await.unwrap();
        assert_eq!(ok.unwrap().username, "ana");
    }
}
