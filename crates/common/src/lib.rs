pub mod configuration;
pub mod consts;
