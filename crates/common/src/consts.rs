pub const CONFIG_PATH_ENV: &str = "SESSION_KEEPER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./session_keeper.yaml";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9092";

pub const SESSION_CHECK_PATH: &str = "/session/check";
pub const SESSION_LOGOUT_PATH: &str = "/session/logout";
pub const SESSION_QUERY_PARAM: &str = "session";

pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 48 * 60 * 60;
pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 60 * 60;
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

pub const DEFAULT_OTEL_ENDPOINT: &str = "http://localhost:4317";
pub const DEFAULT_SERVICE_NAME: &str = "session_keeper";
