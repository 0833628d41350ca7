#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(String),
    #[error("user lookup failed: {0}")]
    UserLookup(String),
    #[error("user {0} does not exist")]
    UserNotFound(i64),
    #[error("session expiry out of range for ttl {0}")]
    ExpiryOutOfRange(chrono::TimeDelta),
}
