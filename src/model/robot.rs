use serde::{Deserialize, Serialize};

/// A companion device. Lifecycle is managed outside the account flow; the
/// portal only reads status and membership in a user's fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub id: String,
    pub name: String,
    pub online: bool,
    pub battery: u8, // 0-100
    pub created_ts: i64,
}
