use common::configuration::Configuration;
use common::consts::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, SESSION_CHECK_PATH, SESSION_LOGOUT_PATH};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use opentelemetry::global;
use opentelemetry::trace::FutureExt;
use opentelemetry_http::HeaderExtractor;
use session_keeper::app_state::AppState;
use session_keeper::db::DbPool;
use session_keeper::handlers::response::{status_response, HandlerResponse};
use session_keeper::handlers::session::{handle_logout, handle_session_check};
use session_keeper::session::{
    PostgresSessionBackend, PostgresUserDirectory, SessionConfig, SessionManager,
};
use session_keeper::utils::tracing::init_tracer;
use std::sync::Arc;
use std::{env, fs};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Configuration loading
// ---------------------------------------------------------------------------

/// Load and parse the YAML configuration file.
///
/// The path is read from `SESSION_KEEPER_CONFIG` (env) or falls back to
/// `./session_keeper.yaml`. `DATABASE_URL` overrides `database.url`.
fn load_config() -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    eprintln!("loading session keeper config from {}", path);

    let contents = fs::read_to_string(&path).map_err(|e| format!("failed to read {path}: {e}"))?;
    let mut config = Configuration::from_yaml_str(&contents)
        .map_err(|e| format!("failed to parse {path}: {e}"))?;

    if let Ok(url) = env::var("DATABASE_URL") {
        config.database.url = url;
    }

    Ok(config)
}

// ---------------------------------------------------------------------------
// Application state initialization
// ---------------------------------------------------------------------------

fn init_app_state(
    config: &Configuration,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let pool = DbPool::new(&config.database.url)?;
    let session_config = SessionConfig::from(&config.session_settings());

    info!(
        cache_capacity = session_config.cache_capacity,
        ttl_secs = session_config.ttl.as_secs(),
        reap_interval_secs = session_config.reap_interval.as_secs(),
        "initializing session manager"
    );

    let sessions = SessionManager::new(
        session_config,
        Arc::new(PostgresSessionBackend::new(pool.clone())),
        Arc::new(PostgresUserDirectory::new(pool)),
    );

    Ok(AppState {
        sessions: Arc::new(sessions),
    })
}

// ---------------------------------------------------------------------------
// Request routing
// ---------------------------------------------------------------------------

async fn route(req: Request<Incoming>, state: Arc<AppState>) -> Result<HandlerResponse, hyper::Error> {
    let parent_cx = global::get_text_map_propagator(|p| p.extract(&HeaderExtractor(req.headers())));
    let path = req.uri().path().to_string();

    match (req.method(), path.as_str()) {
        (&Method::GET, SESSION_CHECK_PATH) => {
            handle_session_check(req, &state.sessions)
                .with_context(parent_cx)
                .await
        }
        (&Method::POST, SESSION_LOGOUT_PATH) => {
            handle_logout(req, &state.sessions)
                .with_context(parent_cx)
                .await
        }
        _ => {
            debug!(method = %req.method(), path = %path, "no route found");
            Ok(status_response(StatusCode::NOT_FOUND))
        }
    }
}

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

/// Accept connections and spawn a task per connection until ctrl-c.
async fn run_server(
    state: Arc<AppState>,
    bind_address: String,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "server listening");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = result?;
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::task::spawn(async move {
                    debug!(peer = ?peer_addr, "accepted connection");

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { route(req, state).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        warn!(error = ?err, "error serving connection");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("received shutdown signal, stopping server");
                break;
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config()?;
    let tracer_provider = init_tracer(config.tracing.as_ref())?;

    let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| config.bind_address().to_string());
    let state = Arc::new(init_app_state(&config)?);
    let result = run_server(state, bind_address).await;

    if let Err(e) = tracer_provider.shutdown() {
        warn!(error = %e, "failed to flush spans on shutdown");
    }
    result
}
