use common::consts::SESSION_QUERY_PARAM;
use hyper::header::AUTHORIZATION;
use hyper::{Request, StatusCode};
use tracing::{debug, warn};

use super::response::{error_response, json_response, status_response, HandlerResponse};
use crate::session::{redact, SessionManager};

const EXPIRED_MESSAGE: &str = "session has expired, please log in again";

/// Pull the session token from `Authorization: Bearer ...`, falling back to
/// the `session` query parameter.
pub fn extract_token<B>(req: &Request<B>) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    let query = req.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == SESSION_QUERY_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Handle GET /session/check.
///
/// An unknown or expired token is a 401; a storage or user lookup failure is
/// a 500 so clients do not mistake an outage for a logout.
pub async fn handle_session_check<B>(
    req: Request<B>,
    sessions: &SessionManager,
) -> Result<HandlerResponse, hyper::Error> {
    let Some(token) = extract_token(&req) else {
        return Ok(error_response(StatusCode::UNAUTHORIZED, "missing session token"));
    };

    match sessions.get_session(&token).await {
        Ok(Some(session)) => {
            debug!(
                user_id = session.user.id,
                token = redact(&token),
                "session check passed"
            );
            match serde_json::to_value(&*session) {
                Ok(body) => Ok(json_response(StatusCode::OK, &body)),
                Err(e) => {
                    warn!(error = %e, "failed to serialize session");
                    Ok(error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "failed to serialize session",
                    ))
                }
            }
        }
        Ok(None) => Ok(error_response(StatusCode::UNAUTHORIZED, EXPIRED_MESSAGE)),
        Err(e) => {
            warn!(error = %e, token = redact(&token), "session check error");
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("session error: {}", e),
            ))
        }
    }
}

/// Handle POST /session/logout.
pub async fn handle_logout<B>(
    req: Request<B>,
    sessions: &SessionManager,
) -> Result<HandlerResponse, hyper::Error> {
    let Some(token) = extract_token(&req) else {
        return Ok(error_response(StatusCode::UNAUTHORIZED, "missing session token"));
    };

    match sessions.destroy_session(&token).await {
        Ok(()) => Ok(status_response(StatusCode::NO_CONTENT)),
        Err(e) => {
            warn!(error = %e, token = redact(&token), "logout error");
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("session error: {}", e),
            ))
        }
    }
}
