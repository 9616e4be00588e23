use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,       // UUID
    pub username: String, // unique, exact-match login key
    pub email: String,    // unique
    pub password_hash: String,
    pub created_ts: i64,
}
