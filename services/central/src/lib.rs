pub mod broker;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod infra;
pub mod protocol;
pub mod session;
pub mod usecase;
pub mod workers;
