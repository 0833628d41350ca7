use super::models::{SessionRecord, UserRecord};
use tokio_postgres::{Client, Row};

fn session_from_row(row: &Row) -> SessionRecord {
    SessionRecord {
        token: row.get("token"),
        user_id: row.get("user_id"),
        expire_time: row.get("expire_time"),
    }
}

/// Look up a session that has not expired yet. Expired and unknown tokens
/// both come back as `None`.
pub async fn select_live_session(
    client: &Client,
    token: &str,
) -> Result<Option<SessionRecord>, tokio_postgres::Error> {
    let row = client
        .query_opt(
            r#"
            SELECT token, user_id, expire_time
            FROM user_session
            WHERE token = $1 AND expire_time > NOW()
            "#,
            &[&token],
        )
        .await?;

    Ok(row.as_ref().map(session_from_row))
}

pub async fn insert_session(
    client: &Client,
    record: &SessionRecord,
) -> Result<u64, tokio_postgres::Error> {
    client
        .execute(
            r#"
            INSERT INTO user_session (token, user_id, expire_time)
            VALUES ($1, $2, $3)
            "#,
            &[&record.token, &record.user_id, &record.expire_time],
        )
        .await
}

pub async fn delete_session(client: &Client, token: &str) -> Result<u64, tokio_postgres::Error> {
    client
        .execute("DELETE FROM user_session WHERE token = $1", &[&token])
        .await
}

/// Remove every session row whose expiry has passed. Returns the number of rows removed.
pub async fn delete_expired_sessions(client: &Client) -> Result<u64, tokio_postgres::Error> {
    client
        .execute("DELETE FROM user_session WHERE expire_time <= NOW()", &[])
        .await
}

pub async fn select_user_by_id(
    client: &Client,
    user_id: i64,
) -> Result<Option<UserRecord>, tokio_postgres::Error> {
    let row = client
        .query_opt(
            r#"
            SELECT id, username, email, first_name, last_name, class_year,
                   account_created, last_login
            FROM users
            WHERE id = $1
            "#,
            &[&user_id],
        )
        .await?;

    Ok(row.map(|r| UserRecord {
        id: r.get("id"),
        username: r.get("username"),
        email: r.get("email"),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        class_year: r.get("class_year"),
        account_created: r.get("account_created"),
        last_login: r.get("last_login"),
    }))
}
