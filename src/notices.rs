use anyhow::Result;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const SESSION_NOTICES_KEY: &str = "notices";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeCategory {
    Success,
    Danger,
    Info,
}

/// One-shot user-facing message. Queued in the session and discarded after
/// the next page renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub category: NoticeCategory,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: NoticeCategory::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            category: NoticeCategory::Danger,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: NoticeCategory::Info,
            message: message.into(),
        }
    }
}

pub async fn push(session: &Session, notice: Notice) -> Result<()> {
    let mut pending: Vec<Notice> = session.get(SESSION_NOTICES_KEY).await?.unwrap_or_default();
    pending.push(notice);
    session.insert(SESSION_NOTICES_KEY, pending).await?;
    Ok(())
}

/// Drain all pending notices. A failed read renders as "no notices" rather
/// than failing the page.
pub async fn take(session: &Session) -> Vec<Notice> {
    session
        .remove::<Vec<Notice>>(SESSION_NOTICES_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{push, take, Notice, NoticeCategory};
    use std::sync::Arc;
    use tower_sessions::{MemoryStore, Session};

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn notices_display_once_then_disappear() {
        let session = session();

        push(&session, Notice::success("account created")).await.unwrap();
        push(&session, Notice::info("signed out")).await.unwrap();

        let drained = take(&session).await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].category, NoticeCategory::Success);
        assert_eq!(drained[1].message, "signed out");

        assert!(take(&session).await.is_empty());
    }
}
