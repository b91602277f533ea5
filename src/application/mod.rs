pub mod actors;
pub mod handlers;
pub mod services;
pub mod shell;
pub mod state;
