pub mod config;
pub mod token;
pub mod user;
