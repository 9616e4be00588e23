use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use time::Duration;
use tower_sessions::{Expiry, Session};

use crate::{model::user::User, AppState};

pub const SESSION_USER_ID_KEY: &str = "user_id";

const PERSISTENT_SESSION_DAYS: i64 = 30;

/// How long a login outlives the browser tab. Chosen by the "remember me"
/// checkbox on the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifetime {
    SessionScoped,
    Persistent,
}

impl SessionLifetime {
    pub fn from_remember(remember: bool) -> Self {
        if remember {
            SessionLifetime::Persistent
        } else {
            SessionLifetime::SessionScoped
        }
    }

    pub fn expiry(self) -> Expiry {
        match self {
            SessionLifetime::SessionScoped => Expiry::OnSessionEnd,
            SessionLifetime::Persistent => {
                Expiry::OnInactivity(Duration::days(PERSISTENT_SESSION_DAYS))
            }
        }
    }
}

/// Bind the session to `user` under a fresh session id.
pub async fn establish(session: &Session, user: &User, lifetime: SessionLifetime) -> anyhow::Result<()> {
    session.cycle_id().await?;
    session.set_expiry(Some(lifetime.expiry()));
    session.insert(SESSION_USER_ID_KEY, user.id.clone()).await?;
    Ok(())
}

/// Drop the identity and rotate the id so a replayed cookie no longer
/// resolves. The session itself stays alive to carry the sign-out notice.
pub async fn clear(session: &Session) -> anyhow::Result<()> {
    session.remove::<String>(SESSION_USER_ID_KEY).await?;
    session.cycle_id().await?;
    Ok(())
}

/// The resolved identity, injected into every guarded handler. Requests
/// without a session that resolves to an existing user are redirected to
/// the login form before the handler runs.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, msg)| (status, msg.to_string()).into_response())?;

        let user_id: Option<String> = session
            .get(SESSION_USER_ID_KEY)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response())?;

        let Some(user_id) = user_id else {
            return Err(Redirect::to("/login").into_response());
        };

        match state.store.load_user(&user_id).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            // Stale identity (user gone from the store) counts as signed out.
            Ok(None) => Err(Redirect::to("/login").into_response()),
            Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{clear, establish, SessionLifetime, SESSION_USER_ID_KEY};
    use crate::model::user::User;
    use std::sync::Arc;
    use tower_sessions::{Expiry, MemoryStore, Session};

    fn user() -> User {
        User {
            id: "u-1".into(),
            username: "ana".into(),
            email: "ana@example.com".into(),
            password_hash: "phc".into(),
            created_ts: 0,
        }
    }

    #[test]
    fn remember_flag_selects_a_persistent_lifetime() {
        assert_eq!(
            SessionLifetime::from_remember(true),
            SessionLifetime::Persistent
        );
        assert_eq!(
            SessionLifetime::from_remember(false),
            SessionLifetime::SessionScoped
        );

        assert!(matches!(
            SessionLifetime::Persistent.expiry(),
            Expiry::OnInactivity(_)
        ));
        assert!(matches!(
            SessionLifetime::SessionScoped.expiry(),
            Expiry::OnSessionEnd
        ));
    }

    #[tokio::test]
    async fn clearing_makes_the_identity_unrecoverable() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        establish(&session, &user(), SessionLifetime::SessionScoped)
            .await
            .unwrap();
        let stored: Option<String> = session.get(SESSION_USER_ID_KEY).await.unwrap();
        assert_eq!(stored.as_deref(), Some("u-1"));

        clear(&session).await.unwrap();
        let stored: Option<String> = session.get(SESSION_USER_ID_KEY).await.unwrap();
        assert!(stored.is_none());
    }
}
