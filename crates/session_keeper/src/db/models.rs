use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as seen by the session layer. Credentials never leave the users table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub class_year: String,
    pub account_created: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Durable row backing a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: i64,
    pub expire_time: DateTime<Utc>,
}
