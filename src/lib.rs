//! Gold Master backend library
//!
//! XAUUSD dashboard data, AI commentary and signals, the admin console and
//! the live analyst voice session.

pub mod application;
pub mod auth;
pub mod config;
pub mod content;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
pub mod secrets;
pub mod task_runner;
