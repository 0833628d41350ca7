pub mod app_state;
pub mod db;
pub mod handlers;
pub mod session;
pub mod utils;
