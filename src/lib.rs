pub mod config;
pub mod constants;
pub mod domain;
pub mod draw;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod logging;
pub mod platform;
pub mod sources;
