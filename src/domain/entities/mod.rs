pub mod database;
pub mod post;
pub mod signal;
pub mod user;
