pub mod response;
pub mod session;
