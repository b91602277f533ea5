pub mod insight_service;
pub mod signal_engine;
